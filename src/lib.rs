//! # planar-closest
//!
//! planar-closest computes the minimum pairwise distance among a set of 2-D
//! points, split across a fixed number of cooperating workers that
//! communicate only by message passing (no shared memory). The pipeline:
//! distributed sort of all points by x, re-partition into contiguous
//! per-worker zones, a per-zone divide-and-conquer solve, and a pipelined
//! strip exchange that reconciles closest pairs straddling zone boundaries.
//!
//! ## Transports
//! All cross-worker traffic goes through the pluggable
//! [`Communicator`](comm::Communicator) trait: `NoComm` for serial runs,
//! `LocalComm` for in-process threaded groups (used heavily by the tests),
//! and `MpiComm` for real multi-process runs behind the `mpi-support`
//! feature.
//!
//! ## Determinism
//! Quicksort pivots are drawn from per-rank `SmallRng` streams seeded from
//! the run configuration, so runs are reproducible; the numeric result is
//! independent of the seed.
//!
//! ## Usage
//! ```
//! use planar_closest::prelude::*;
//!
//! let points = vec![
//!     Point::new(0.0, 0.0),
//!     Point::new(1.0, 0.0),
//!     Point::new(1.1, 0.0),
//!     Point::new(10.0, 10.0),
//! ];
//! let report = solve(&NoComm, Some(points), &SolveConfig::default())
//!     .unwrap()
//!     .unwrap();
//! assert!((report.distance - 0.1).abs() < 1e-12);
//! ```

pub mod algs;
pub mod comm;
pub mod geometry;
pub mod io;
pub mod solver_error;

/// A convenient prelude importing the most-used types.
pub mod prelude {
    pub use crate::algs::local::{brute_force, closest_pair, closest_pair_sorted};
    pub use crate::algs::{
        MergeStrategy, SolveConfig, SolveReport, ZoneLayout, distributed_sort, solve,
    };
    #[cfg(feature = "mpi-support")]
    pub use crate::comm::MpiComm;
    pub use crate::comm::{Communicator, LocalComm, NoComm};
    pub use crate::geometry::{Point, SortAxis};
    pub use crate::io::{Domain, SampleFile};
    pub use crate::solver_error::SolverError;
}
