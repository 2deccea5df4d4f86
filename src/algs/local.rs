//! Serial closest-pair subroutines: brute force, planar divide-and-conquer,
//! and the bounded strip scan shared with the boundary reconciliation phase.
//!
//! The divide-and-conquer solver operates on a zone that is already sorted
//! by x (the distributed pipeline hands each worker a contiguous slice of a
//! globally sorted sequence). `closest_pair` is the standalone entry point
//! that sorts first.

use rand::Rng;
use rand::rngs::SmallRng;

use crate::geometry::{Point, SortAxis};

/// O(N²) reference: the exact minimum pairwise distance, or infinity for
/// fewer than two points.
pub fn brute_force(points: &[Point]) -> f64 {
    let mut best = f64::INFINITY;
    for (i, &a) in points.iter().enumerate() {
        for &b in &points[i + 1..] {
            let d = a.distance(b);
            if d < best {
                best = d;
            }
        }
    }
    best
}

/// Randomized-pivot quicksort by the given axis.
///
/// Used by the distributed sorter for the per-worker local sort. Pivot
/// choices come from the caller's seeded RNG, so runs are reproducible.
pub fn quicksort(points: &mut [Point], axis: SortAxis, rng: &mut SmallRng) {
    let n = points.len();
    if n < 2 {
        return;
    }
    let pivot_index = rng.gen_range(0..n);
    points.swap(pivot_index, n - 1);
    let pivot_key = axis.key(points[n - 1]);
    let mut store = 0;
    for i in 0..n - 1 {
        if axis.key(points[i]) < pivot_key {
            points.swap(store, i);
            store += 1;
        }
    }
    points.swap(store, n - 1);
    let (left, right) = points.split_at_mut(store);
    quicksort(left, axis, rng);
    quicksort(&mut right[1..], axis, rng);
}

/// Closest pair over an arbitrary (unsorted) point set.
pub fn closest_pair(points: &mut [Point], rng: &mut SmallRng) -> f64 {
    quicksort(points, SortAxis::X, rng);
    closest_pair_sorted(points)
}

/// Closest pair over a slice pre-sorted by x.
pub fn closest_pair_sorted(points: &[Point]) -> f64 {
    debug_assert!(points.windows(2).all(|w| w[0].x <= w[1].x));
    recurse(points)
}

fn recurse(points: &[Point]) -> f64 {
    match points.len() {
        0 | 1 => f64::INFINITY,
        2 => points[0].distance(points[1]),
        n => {
            let mid = n / 2;
            let mid_x = points[mid].x;
            let d = recurse(&points[..mid]).min(recurse(&points[mid..]));
            let mut strip: Vec<Point> = points
                .iter()
                .filter(|p| (p.x - mid_x).abs() < d)
                .copied()
                .collect();
            strip_closest(&mut strip, d)
        }
    }
}

/// Minimum distance within a strip, never exceeding `bound`.
///
/// Sorts the strip by y, then scans each point forward only while the y-gap
/// to later points is below the running minimum. A packing argument over a
/// box of side `bound` caps the inner loop at 6 useful comparisons per
/// point, so the scan is linear after the sort.
pub fn strip_closest(strip: &mut [Point], bound: f64) -> f64 {
    strip.sort_by(|a, b| a.y.total_cmp(&b.y));
    let mut best = bound;
    for i in 0..strip.len() {
        for j in i + 1..strip.len() {
            if strip[j].y - strip[i].y >= best {
                break;
            }
            let d = strip[i].distance(strip[j]);
            if d < best {
                best = d;
            }
        }
    }
    best
}
