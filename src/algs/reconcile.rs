//! Boundary reconciliation: the pipelined strip exchange that catches
//! closest pairs straddling zone boundaries.
//!
//! After the first reduction every rank holds the candidate distance `D`,
//! an upper bound valid for the whole point set. Any pair crossing a zone
//! boundary and beating `D` must have both members within `D` of that
//! boundary, so each rank restricts its contribution to the strip of points
//! within `D` of the boundary midpoint.
//!
//! The pipeline runs strictly rank 0 → rank P−1. Every interior rank
//! *receives* its left neighbor's strip, merges it with its own left strip,
//! scores the merge buffer, and only then sends onward. The
//! receive-before-send ordering is load-bearing: sending first can deadlock
//! the whole chain once transports stop buffering, because rank i's send to
//! i+1 sits on the critical path of i+1's own send to i+2.
//!
//! The onward send carries this rank's own right strip plus any received
//! points that also fall within `D` of the right boundary. Forwarding
//! matters when a whole zone is thinner than `D` (ranks close to the point
//! count): the improving pair may then span more than one cut, and its left
//! member must ride through the intermediate zones to meet its partner.

use crate::algs::local::strip_closest;
use crate::algs::wire;
use crate::comm::Communicator;
use crate::geometry::Point;
use crate::solver_error::SolverError;

/// Run this rank's share of the P−1 boundary checks.
///
/// `zone` is this rank's x-sorted zone, `midpoints` the P−1 boundary
/// markers, `bound` the broadcast candidate distance `D`. Returns this
/// rank's boundary minimum; ranks that perform no check (rank 0, or any
/// rank when P = 1) contribute infinity.
pub fn reconcile_boundaries<C: Communicator>(
    comm: &C,
    zone: &[Point],
    midpoints: &[f64],
    bound: f64,
) -> Result<f64, SolverError> {
    let rank = comm.rank();
    let size = comm.size();
    if size == 1 {
        return Ok(f64::INFINITY);
    }
    debug_assert_eq!(midpoints.len(), size - 1);

    let in_strip = |p: &Point, boundary: f64| (p.x - boundary).abs() < bound;

    let mut boundary_min = f64::INFINITY;
    let incoming = if rank > 0 {
        wire::recv_points(comm, rank - 1)?
    } else {
        Vec::new()
    };
    if rank > 0 {
        let boundary = midpoints[rank - 1];
        let mut merged: Vec<Point> = incoming
            .iter()
            .chain(zone.iter().filter(|p| in_strip(p, boundary)))
            .copied()
            .collect();
        log::debug!(
            "rank {rank}: boundary check over {} strip points, bound {bound}",
            merged.len()
        );
        boundary_min = strip_closest(&mut merged, bound);
    }
    if rank + 1 < size {
        let boundary = midpoints[rank];
        let outgoing: Vec<Point> = zone
            .iter()
            .chain(incoming.iter())
            .filter(|p| in_strip(p, boundary))
            .copied()
            .collect();
        wire::send_points(comm, rank + 1, &outgoing)?;
    }
    Ok(boundary_min)
}
