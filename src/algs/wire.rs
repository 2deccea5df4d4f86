//! Framing for point runs on the byte transport: a `u64` count followed by
//! the raw point bytes, always between one ordered pair of ranks.

use crate::comm::{CommResult, Communicator};
use crate::geometry::Point;

pub(crate) fn send_points<C: Communicator>(
    comm: &C,
    peer: usize,
    points: &[Point],
) -> CommResult<()> {
    comm.send(peer, &(points.len() as u64).to_le_bytes())?;
    comm.send(peer, bytemuck::cast_slice(points))
}

pub(crate) fn recv_points<C: Communicator>(comm: &C, peer: usize) -> CommResult<Vec<Point>> {
    let mut header = [0u8; 8];
    comm.recv(peer, &mut header)?;
    let count = u64::from_le_bytes(header) as usize;
    let mut points = vec![Point::default(); count];
    comm.recv(peer, bytemuck::cast_slice_mut(&mut points))?;
    Ok(points)
}
