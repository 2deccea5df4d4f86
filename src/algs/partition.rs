//! Zone layout and boundary midpoints.
//!
//! A [`ZoneLayout`] maps each rank to a contiguous (count, offset) range of
//! the global point sequence. The pipeline computes one layout for the
//! sorter's initial chunking and a second, independent one for the final
//! zone assignment; both use the same near-equal split policy, where the
//! first `total % parts` ranks receive one extra element.

use std::mem::size_of;

use crate::geometry::Point;

/// Per-rank counts and element offsets over a contiguous global sequence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ZoneLayout {
    counts: Vec<usize>,
    offsets: Vec<usize>,
}

impl ZoneLayout {
    /// Near-equal split of `total` elements over `parts` ranks; the first
    /// `total % parts` ranks get one extra element.
    pub fn split(total: usize, parts: usize) -> Self {
        assert!(parts > 0, "layout needs at least one rank");
        let base = total / parts;
        let remainder = total % parts;
        let mut counts = Vec::with_capacity(parts);
        let mut offsets = Vec::with_capacity(parts);
        let mut acc = 0;
        for rank in 0..parts {
            let count = base + usize::from(rank < remainder);
            counts.push(count);
            offsets.push(acc);
            acc += count;
        }
        Self { counts, offsets }
    }

    pub fn ranks(&self) -> usize {
        self.counts.len()
    }

    pub fn count(&self, rank: usize) -> usize {
        self.counts[rank]
    }

    pub fn offset(&self, rank: usize) -> usize {
        self.offsets[rank]
    }

    pub fn counts(&self) -> &[usize] {
        &self.counts
    }

    /// Element counts scaled to bytes for the byte-oriented transport.
    pub fn byte_counts(&self) -> Vec<usize> {
        self.counts
            .iter()
            .map(|&c| c * size_of::<Point>())
            .collect()
    }
}

/// Boundary midpoints over a globally x-sorted sequence.
///
/// `mid[i]` is the average of the x-coordinates of the last point of zone
/// `i` and the first point of zone `i+1`. It is a boundary marker for strip
/// membership, not a value-range split: duplicate coordinates may straddle
/// it. When every point falls on one side of a cut (possible once ranks
/// outnumber points), the midpoint clamps to the nearest existing
/// coordinate.
pub fn midpoints(sorted: &[Point], layout: &ZoneLayout) -> Vec<f64> {
    let n = sorted.len();
    let mut mids = Vec::with_capacity(layout.ranks().saturating_sub(1));
    for boundary in 0..layout.ranks().saturating_sub(1) {
        let cut = layout.offset(boundary + 1);
        let mid = if n == 0 {
            0.0
        } else if cut == 0 {
            sorted[0].x
        } else if cut >= n {
            sorted[n - 1].x
        } else {
            0.5 * (sorted[cut - 1].x + sorted[cut].x)
        };
        mids.push(mid);
    }
    mids
}
