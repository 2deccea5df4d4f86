//! Pluggable message transports for the rank-specialized solver.
//!
//! Business logic never touches a transport directly; it goes through the
//! [`Communicator`] trait, which exposes the blocking point-to-point and
//! collective operations the protocol needs. Three backends are provided:
//!
//! - [`NoComm`]: a single-rank no-op backend for serial runs and unit tests;
//! - [`LocalComm`]: an in-process threaded backend where a group of ranks
//!   shares per-pair FIFO mailboxes, used by the multi-rank integration
//!   tests;
//! - `MpiComm` (feature `mpi-support`): a thin wrapper over the `mpi` crate.
//!
//! Messages are contiguous byte slices with explicit lengths; a length
//! mismatch between sender and receiver is a protocol bug and reported as
//! [`CommError::Truncated`]. Between a fixed ordered pair of ranks, delivery
//! order equals send order; nothing is guaranteed across different pairs.

use std::collections::VecDeque;
use std::sync::{Arc, Barrier};

use bytes::Bytes;
use dashmap::DashMap;
use parking_lot::{Condvar, Mutex};
use thiserror::Error;

use crate::solver_error::SolverError;

#[cfg(feature = "mpi-support")]
mod mpi_backend;
#[cfg(feature = "mpi-support")]
pub use mpi_backend::MpiComm;

/// Transport-level failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommError {
    /// Sender and receiver disagreed on the message length.
    #[error("message from rank {peer} has {got} bytes, receiver expected {expected}")]
    Truncated {
        peer: usize,
        expected: usize,
        got: usize,
    },
    /// A peer rank outside `[0, size)` was addressed.
    #[error("rank {rank} out of range for a communicator of size {size}")]
    RankOutOfRange { rank: usize, size: usize },
    /// The root of a collective did not supply its buffer.
    #[error("collective root did not supply a send/recv buffer")]
    MissingRootBuffer,
    /// A point-to-point operation addressed the issuing rank itself.
    #[error("rank {0} attempted a point-to-point transfer with itself")]
    SelfMessage(usize),
}

pub type CommResult<T> = Result<T, CommError>;

/// Blocking message-passing interface, minimal by design.
///
/// Every point-to-point call blocks the issuing rank until the transfer is
/// locally complete; collectives block every participant until the
/// collective completes for it.
pub trait Communicator {
    /// This rank's ordinal in `[0, size)`.
    fn rank(&self) -> usize;
    /// Number of cooperating ranks.
    fn size(&self) -> usize;

    /// Send `buf` to `peer`.
    fn send(&self, peer: usize, buf: &[u8]) -> CommResult<()>;
    /// Receive exactly `buf.len()` bytes from `peer`.
    fn recv(&self, peer: usize, buf: &mut [u8]) -> CommResult<()>;

    /// Broadcast `buf` from `root` to every rank.
    fn broadcast(&self, root: usize, buf: &mut [u8]) -> CommResult<()>;
    /// Scatter variable-size contiguous slices from `root`.
    ///
    /// `counts[i]` bytes go to rank `i`, taken from `send` at the prefix-sum
    /// offset; `recv` on rank `i` must be exactly `counts[i]` bytes. Only
    /// the root supplies `send`.
    fn scatterv(
        &self,
        root: usize,
        send: Option<&[u8]>,
        counts: &[usize],
        recv: &mut [u8],
    ) -> CommResult<()>;
    /// Gather one fixed-size contribution per rank at `root`.
    ///
    /// Every rank must pass the same `send.len()`; the root's `recv` holds
    /// `size * send.len()` bytes, in rank order.
    fn gather(&self, root: usize, send: &[u8], recv: Option<&mut [u8]>) -> CommResult<()>;
    /// Gather variable-size contributions at `root`; `counts[i]` is the byte
    /// count contributed by rank `i`, placed at its prefix-sum offset.
    fn gatherv(
        &self,
        root: usize,
        send: &[u8],
        counts: &[usize],
        recv: Option<&mut [u8]>,
    ) -> CommResult<()>;
    /// Block until every rank has arrived.
    fn barrier(&self);

    /// Failure-propagation collective: logical AND of `local_ok` over all
    /// ranks. Run after every fallible phase so that any rank's fatal error
    /// reaches every peer before anyone finalizes the transport.
    fn agree(&self, local_ok: bool) -> CommResult<bool> {
        let root = 0;
        let mut flags = vec![0u8; if self.rank() == root { self.size() } else { 0 }];
        let recv = if self.rank() == root {
            Some(flags.as_mut_slice())
        } else {
            None
        };
        self.gather(root, &[local_ok as u8], recv)?;
        let mut verdict = [0u8];
        if self.rank() == root {
            verdict[0] = flags.iter().all(|&f| f != 0) as u8;
        }
        self.broadcast(root, &mut verdict)?;
        Ok(verdict[0] != 0)
    }
}

/// Fold a phase-local result through the failure-agreement collective.
///
/// Returns the local value only when every rank succeeded; a locally
/// successful rank whose peer failed gets [`SolverError::PeerFailure`].
pub fn agree_result<C: Communicator, T>(
    comm: &C,
    phase: &'static str,
    local: Result<T, SolverError>,
) -> Result<T, SolverError> {
    let all_ok = comm.agree(local.is_ok())?;
    match (local, all_ok) {
        (Ok(v), true) => Ok(v),
        (Err(e), _) => Err(e),
        (Ok(_), false) => Err(SolverError::PeerFailure { phase }),
    }
}

fn prefix_offsets(counts: &[usize]) -> Vec<usize> {
    let mut offsets = Vec::with_capacity(counts.len());
    let mut acc = 0;
    for &c in counts {
        offsets.push(acc);
        acc += c;
    }
    offsets
}

/// Single-rank no-op backend for serial runs and unit tests.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoComm;

impl Communicator for NoComm {
    fn rank(&self) -> usize {
        0
    }
    fn size(&self) -> usize {
        1
    }

    fn send(&self, _peer: usize, _buf: &[u8]) -> CommResult<()> {
        Err(CommError::SelfMessage(0))
    }
    fn recv(&self, _peer: usize, _buf: &mut [u8]) -> CommResult<()> {
        Err(CommError::SelfMessage(0))
    }

    fn broadcast(&self, _root: usize, _buf: &mut [u8]) -> CommResult<()> {
        Ok(())
    }

    fn scatterv(
        &self,
        _root: usize,
        send: Option<&[u8]>,
        counts: &[usize],
        recv: &mut [u8],
    ) -> CommResult<()> {
        let send = send.ok_or(CommError::MissingRootBuffer)?;
        let n = counts.first().copied().unwrap_or(0);
        recv[..n].copy_from_slice(&send[..n]);
        Ok(())
    }

    fn gather(&self, _root: usize, send: &[u8], recv: Option<&mut [u8]>) -> CommResult<()> {
        let recv = recv.ok_or(CommError::MissingRootBuffer)?;
        recv[..send.len()].copy_from_slice(send);
        Ok(())
    }

    fn gatherv(
        &self,
        _root: usize,
        send: &[u8],
        _counts: &[usize],
        recv: Option<&mut [u8]>,
    ) -> CommResult<()> {
        let recv = recv.ok_or(CommError::MissingRootBuffer)?;
        recv[..send.len()].copy_from_slice(send);
        Ok(())
    }

    fn barrier(&self) {}
}

/// One FIFO mailbox per ordered rank pair.
#[derive(Default)]
struct Mailbox {
    queue: Mutex<VecDeque<Bytes>>,
    ready: Condvar,
}

struct LocalGroup {
    size: usize,
    boxes: DashMap<(usize, usize), Arc<Mailbox>>,
    barrier: Barrier,
}

/// In-process threaded backend.
///
/// [`LocalComm::group`] hands out one handle per rank; each handle is moved
/// onto its own thread. Mailboxes are scoped to the group, so concurrently
/// running groups (e.g. parallel tests) cannot observe each other's traffic.
#[derive(Clone)]
pub struct LocalComm {
    rank: usize,
    group: Arc<LocalGroup>,
}

impl LocalComm {
    /// Create a fresh group of `size` connected rank handles.
    pub fn group(size: usize) -> Vec<LocalComm> {
        assert!(size > 0, "communicator size must be positive");
        let group = Arc::new(LocalGroup {
            size,
            boxes: DashMap::new(),
            barrier: Barrier::new(size),
        });
        (0..size)
            .map(|rank| LocalComm {
                rank,
                group: Arc::clone(&group),
            })
            .collect()
    }

    fn check_peer(&self, peer: usize) -> CommResult<()> {
        if peer >= self.group.size {
            return Err(CommError::RankOutOfRange {
                rank: peer,
                size: self.group.size,
            });
        }
        if peer == self.rank {
            return Err(CommError::SelfMessage(self.rank));
        }
        Ok(())
    }

    fn mailbox(&self, src: usize, dst: usize) -> Arc<Mailbox> {
        Arc::clone(
            &self
                .group
                .boxes
                .entry((src, dst))
                .or_insert_with(|| Arc::new(Mailbox::default())),
        )
    }
}

impl Communicator for LocalComm {
    fn rank(&self) -> usize {
        self.rank
    }
    fn size(&self) -> usize {
        self.group.size
    }

    fn send(&self, peer: usize, buf: &[u8]) -> CommResult<()> {
        self.check_peer(peer)?;
        let mailbox = self.mailbox(self.rank, peer);
        mailbox.queue.lock().push_back(Bytes::copy_from_slice(buf));
        mailbox.ready.notify_one();
        Ok(())
    }

    fn recv(&self, peer: usize, buf: &mut [u8]) -> CommResult<()> {
        self.check_peer(peer)?;
        let mailbox = self.mailbox(peer, self.rank);
        let msg = {
            let mut queue = mailbox.queue.lock();
            loop {
                if let Some(msg) = queue.pop_front() {
                    break msg;
                }
                mailbox.ready.wait(&mut queue);
            }
        };
        if msg.len() != buf.len() {
            return Err(CommError::Truncated {
                peer,
                expected: buf.len(),
                got: msg.len(),
            });
        }
        buf.copy_from_slice(&msg);
        Ok(())
    }

    fn broadcast(&self, root: usize, buf: &mut [u8]) -> CommResult<()> {
        if self.rank == root {
            for peer in (0..self.group.size).filter(|&p| p != root) {
                self.send(peer, buf)?;
            }
        } else {
            self.recv(root, buf)?;
        }
        Ok(())
    }

    fn scatterv(
        &self,
        root: usize,
        send: Option<&[u8]>,
        counts: &[usize],
        recv: &mut [u8],
    ) -> CommResult<()> {
        if self.rank == root {
            let send = send.ok_or(CommError::MissingRootBuffer)?;
            let offsets = prefix_offsets(counts);
            for peer in 0..self.group.size {
                let chunk = &send[offsets[peer]..offsets[peer] + counts[peer]];
                if peer == root {
                    recv.copy_from_slice(chunk);
                } else {
                    self.send(peer, chunk)?;
                }
            }
        } else {
            self.recv(root, recv)?;
        }
        Ok(())
    }

    fn gather(&self, root: usize, send: &[u8], recv: Option<&mut [u8]>) -> CommResult<()> {
        let counts = vec![send.len(); self.group.size];
        self.gatherv(root, send, &counts, recv)
    }

    fn gatherv(
        &self,
        root: usize,
        send: &[u8],
        counts: &[usize],
        recv: Option<&mut [u8]>,
    ) -> CommResult<()> {
        if self.rank == root {
            let recv = recv.ok_or(CommError::MissingRootBuffer)?;
            let offsets = prefix_offsets(counts);
            for peer in 0..self.group.size {
                let slot = &mut recv[offsets[peer]..offsets[peer] + counts[peer]];
                if peer == root {
                    slot.copy_from_slice(send);
                } else {
                    self.recv(peer, slot)?;
                }
            }
        } else {
            self.send(root, send)?;
        }
        Ok(())
    }

    fn barrier(&self) {
        self.group.barrier.wait();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nocomm_is_a_lonely_world() {
        let comm = NoComm;
        assert_eq!(comm.rank(), 0);
        assert_eq!(comm.size(), 1);
        let mut out = [0u8; 4];
        comm.scatterv(0, Some(&[1, 2, 3, 4]), &[4], &mut out).unwrap();
        assert_eq!(out, [1, 2, 3, 4]);
        assert_eq!(comm.agree(true).unwrap(), true);
        assert_eq!(comm.agree(false).unwrap(), false);
    }

    #[test]
    fn local_send_is_buffered_fifo() {
        let comms = LocalComm::group(2);
        for i in 0..4u8 {
            comms[0].send(1, &[i]).unwrap();
        }
        let mut got = Vec::new();
        for _ in 0..4 {
            let mut b = [0u8; 1];
            comms[1].recv(0, &mut b).unwrap();
            got.push(b[0]);
        }
        assert_eq!(got, vec![0, 1, 2, 3]);
    }

    #[test]
    fn length_mismatch_is_reported() {
        let comms = LocalComm::group(2);
        comms[0].send(1, &[0u8; 6]).unwrap();
        let mut small = [0u8; 4];
        let err = comms[1].recv(0, &mut small).unwrap_err();
        assert_eq!(
            err,
            CommError::Truncated {
                peer: 0,
                expected: 4,
                got: 6
            }
        );
    }

    #[test]
    fn self_and_out_of_range_peers_are_rejected() {
        let comms = LocalComm::group(2);
        assert_eq!(
            comms[0].send(0, &[]).unwrap_err(),
            CommError::SelfMessage(0)
        );
        assert_eq!(
            comms[0].send(7, &[]).unwrap_err(),
            CommError::RankOutOfRange { rank: 7, size: 2 }
        );
    }
}
