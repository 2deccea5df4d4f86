//! Planar primitives shared by every phase of the solver.

pub mod point;

pub use point::{Point, SortAxis};
