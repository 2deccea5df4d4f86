//! The distributed closest-pair protocol, phase by phase.

pub mod local;
pub mod partition;
pub mod reconcile;
pub mod solve;
pub mod sort;
pub(crate) mod wire;

pub use partition::{ZoneLayout, midpoints};
pub use reconcile::reconcile_boundaries;
pub use solve::{SolveConfig, SolveReport, solve};
pub use sort::{MergeStrategy, distributed_sort};
