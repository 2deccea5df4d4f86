//! Unified error type for planar-closest public APIs.
//!
//! Every failure is fatal to the whole distributed run: there is no retry
//! and no partial-result recovery. Fallible phases end with a collective
//! agreement (see [`crate::comm::agree_result`]) so a failure on one rank
//! surfaces as [`SolverError::PeerFailure`] on every other rank before any
//! rank finalizes its transport.

use std::path::PathBuf;

use thiserror::Error;

use crate::comm::CommError;

/// Unified error type for solver operations.
#[derive(Debug, Error)]
pub enum SolverError {
    /// Opening or touching a file by path failed.
    #[error("I/O failure on `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// A byte stream could not be read or written.
    #[error("stream failure: {0}")]
    Stream(#[from] std::io::Error),
    /// The sample file is malformed.
    #[error("parse failure at line {line}: {reason}")]
    Parse { line: usize, reason: String },
    /// The sample file declares a dimension other than 2.
    #[error("unsupported dimension {0} (this solver is strictly planar)")]
    UnsupportedDimension(usize),
    /// The distributed sort produced an out-of-order sequence. This is a
    /// merge or partitioning bug, never a valid input condition.
    #[error("sort postcondition violated: element {index} precedes a smaller key")]
    SortOrder { index: usize },
    /// The message transport failed.
    #[error(transparent)]
    Comm(#[from] CommError),
    /// Another rank reported a fatal error during the named phase.
    #[error("a peer rank failed during the `{phase}` phase")]
    PeerFailure { phase: &'static str },
}
