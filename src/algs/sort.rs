//! Distributed sort of the full point sequence by one coordinate.
//!
//! The coordinator scatters near-equal contiguous chunks, every rank
//! quicksorts its chunk locally, and the sorted runs are combined by one of
//! two interchangeable merge strategies:
//!
//! - **tree merge** (default): ⌈log₂ P⌉ rounds with a doubling step `s`; in
//!   round `s` a rank that is a multiple of `2s` receives the run of rank
//!   `rank + s` and two-way merges it into its own, while the sender leaves
//!   the reduction after its send completes. Rank 0 ends with the full
//!   sequence.
//! - **gather + k-way select**: runs are gathered back at their original
//!   chunk offsets and the coordinator repeatedly takes the smallest
//!   chunk-head. O(N·P) at the coordinator, kept as an alternative policy.
//!
//! Both strategies break key ties in favor of the lower-ranked chunk, so
//! they produce identical sequences. The coordinator always verifies the
//! postcondition that the result is non-decreasing in the sort key, and the
//! verdict is agreed collectively: an out-of-order sequence is a merge bug
//! and aborts the run on every rank.

use rand::rngs::SmallRng;

use crate::algs::local::quicksort;
use crate::algs::partition::ZoneLayout;
use crate::algs::wire;
use crate::comm::{Communicator, agree_result};
use crate::geometry::{Point, SortAxis};
use crate::solver_error::SolverError;

/// How sorted per-rank runs are combined into one global sequence.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MergeStrategy {
    #[default]
    Tree,
    GatherKWay,
}

/// Sort the coordinator's point sequence across all ranks.
///
/// The coordinator passes `Some(points)` with `points.len() == total` and
/// receives `Some(sorted)`; every other rank passes `None` and receives
/// `None`. The coordinator's input buffer is consumed by the initial
/// scatter.
pub fn distributed_sort<C: Communicator>(
    comm: &C,
    points: Option<Vec<Point>>,
    total: usize,
    axis: SortAxis,
    strategy: MergeStrategy,
    rng: &mut SmallRng,
) -> Result<Option<Vec<Point>>, SolverError> {
    let rank = comm.rank();
    debug_assert_eq!(points.is_some(), rank == 0);

    let layout = ZoneLayout::split(total, comm.size());
    let mut chunk = vec![Point::default(); layout.count(rank)];
    comm.scatterv(
        0,
        points.as_deref().map(bytemuck::cast_slice),
        &layout.byte_counts(),
        bytemuck::cast_slice_mut(&mut chunk),
    )?;
    drop(points);

    quicksort(&mut chunk, axis, rng);
    log::debug!("rank {rank}: local run of {} points sorted", chunk.len());

    let sorted = match strategy {
        MergeStrategy::Tree => tree_merge(comm, chunk, axis)?,
        MergeStrategy::GatherKWay => gather_kway(comm, chunk, &layout, total, axis)?,
    };

    let check = match &sorted {
        Some(seq) => verify_sorted(seq, axis),
        None => Ok(()),
    };
    agree_result(comm, "sort", check)?;
    Ok(sorted)
}

fn tree_merge<C: Communicator>(
    comm: &C,
    mut run: Vec<Point>,
    axis: SortAxis,
) -> Result<Option<Vec<Point>>, SolverError> {
    let rank = comm.rank();
    let size = comm.size();
    comm.barrier();
    let mut step = 1;
    while step < size {
        if rank % (2 * step) == 0 {
            if rank + step < size {
                let incoming = wire::recv_points(comm, rank + step)?;
                log::debug!(
                    "rank {rank}: merging {} incoming with {} held (step {step})",
                    incoming.len(),
                    run.len()
                );
                run = merge_sorted(&run, &incoming, axis);
            }
        } else {
            wire::send_points(comm, rank - step, &run)?;
            // this rank's run has moved up the tree; it leaves the reduction
            return Ok(None);
        }
        step *= 2;
    }
    Ok(Some(run))
}

/// Linear two-way merge of runs sorted by `axis`; ties keep `a` first.
fn merge_sorted(a: &[Point], b: &[Point], axis: SortAxis) -> Vec<Point> {
    let mut merged = Vec::with_capacity(a.len() + b.len());
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        if axis.key(a[i]) <= axis.key(b[j]) {
            merged.push(a[i]);
            i += 1;
        } else {
            merged.push(b[j]);
            j += 1;
        }
    }
    merged.extend_from_slice(&a[i..]);
    merged.extend_from_slice(&b[j..]);
    merged
}

fn gather_kway<C: Communicator>(
    comm: &C,
    chunk: Vec<Point>,
    layout: &ZoneLayout,
    total: usize,
    axis: SortAxis,
) -> Result<Option<Vec<Point>>, SolverError> {
    let byte_counts = layout.byte_counts();
    if comm.rank() != 0 {
        comm.gatherv(0, bytemuck::cast_slice(&chunk), &byte_counts, None)?;
        return Ok(None);
    }

    let mut gathered = vec![Point::default(); total];
    comm.gatherv(
        0,
        bytemuck::cast_slice(&chunk),
        &byte_counts,
        Some(bytemuck::cast_slice_mut(&mut gathered)),
    )?;

    // Repeatedly take the smallest of the chunk heads; strict `<` keeps the
    // lowest-ranked chunk first on ties, matching the tree merge.
    let mut heads = vec![0usize; layout.ranks()];
    let mut merged = Vec::with_capacity(total);
    while merged.len() < total {
        let mut best: Option<(usize, f64)> = None;
        for r in 0..layout.ranks() {
            if heads[r] < layout.count(r) {
                let key = axis.key(gathered[layout.offset(r) + heads[r]]);
                if best.is_none_or(|(_, k)| key < k) {
                    best = Some((r, key));
                }
            }
        }
        match best {
            Some((r, _)) => {
                merged.push(gathered[layout.offset(r) + heads[r]]);
                heads[r] += 1;
            }
            None => break,
        }
    }
    Ok(Some(merged))
}

/// The mandatory sort postcondition: non-decreasing in the sort key.
pub fn verify_sorted(points: &[Point], axis: SortAxis) -> Result<(), SolverError> {
    for (i, pair) in points.windows(2).enumerate() {
        if axis.key(pair[0]) > axis.key(pair[1]) {
            return Err(SolverError::SortOrder { index: i + 1 });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comm::NoComm;
    use rand::SeedableRng;

    fn pts(xs: &[f64]) -> Vec<Point> {
        xs.iter().map(|&x| Point::new(x, -x)).collect()
    }

    #[test]
    fn merge_keeps_left_run_first_on_ties() {
        let a = [Point::new(1.0, 10.0), Point::new(3.0, 10.0)];
        let b = [Point::new(1.0, 20.0), Point::new(2.0, 20.0)];
        let merged = merge_sorted(&a, &b, SortAxis::X);
        assert_eq!(
            merged,
            vec![
                Point::new(1.0, 10.0),
                Point::new(1.0, 20.0),
                Point::new(2.0, 20.0),
                Point::new(3.0, 10.0)
            ]
        );
    }

    #[test]
    fn verify_sorted_reports_the_offending_index() {
        let seq = pts(&[0.0, 1.0, 0.5]);
        match verify_sorted(&seq, SortAxis::X) {
            Err(SolverError::SortOrder { index: 2 }) => {}
            other => panic!("unexpected: {other:?}"),
        }
        assert!(verify_sorted(&pts(&[0.0, 0.0, 1.0]), SortAxis::X).is_ok());
        assert!(verify_sorted(&[], SortAxis::X).is_ok());
    }

    #[test]
    fn single_rank_sort_is_a_plain_local_sort() {
        let comm = NoComm;
        let mut rng = SmallRng::seed_from_u64(3);
        for strategy in [MergeStrategy::Tree, MergeStrategy::GatherKWay] {
            let input = pts(&[5.0, 1.0, 4.0, 1.0, 3.0]);
            let sorted = distributed_sort(&comm, Some(input), 5, SortAxis::X, strategy, &mut rng)
                .unwrap()
                .unwrap();
            assert_eq!(
                sorted.iter().map(|p| p.x).collect::<Vec<_>>(),
                vec![1.0, 1.0, 3.0, 4.0, 5.0]
            );
        }
    }
}
