//! The 2-D point value type and its coordinate orderings.
//!
//! `Point` is plain old data: two `f64` coordinates, no identity beyond
//! value. Workers exchange points as raw bytes, so the layout is `repr(C)`
//! and checked at compile time.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// An immutable planar point.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

static_assertions::assert_eq_size!(Point, [u8; 16]);

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    #[inline]
    pub fn distance(self, other: Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Which coordinate a sort orders by.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortAxis {
    X,
    Y,
}

impl SortAxis {
    /// The sort key of `p` along this axis.
    #[inline]
    pub fn key(self, p: Point) -> f64 {
        match self {
            SortAxis::X => p.x,
            SortAxis::Y => p.y,
        }
    }
}
