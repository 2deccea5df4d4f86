//! MPI transport (feature `mpi-support`), a thin wrapper over `rsmpi`.
//!
//! Point-to-point transfers map to matched blocking send/receive; the
//! collectives map to their native MPI counterparts. MPI's default error
//! handler aborts the job on transport faults, which matches the fail-stop
//! model: a `CommError` never surfaces from this backend in practice.

use mpi::Count;
use mpi::datatype::{Partition, PartitionMut};
use mpi::environment::Universe;
use mpi::topology::SimpleCommunicator;
use mpi::traits::*;

use super::{CommResult, prefix_offsets};

/// Inter-process backend over `MPI_COMM_WORLD`.
pub struct MpiComm {
    // The universe must outlive the communicator; dropping it finalizes MPI.
    _universe: Universe,
    world: SimpleCommunicator,
}

impl MpiComm {
    /// Initialize MPI and wrap the world communicator. Returns `None` when
    /// MPI was already initialized in this process.
    pub fn new() -> Option<Self> {
        let universe = mpi::initialize()?;
        let world = universe.world();
        Some(Self {
            _universe: universe,
            world,
        })
    }

    fn counts_and_displs(counts: &[usize]) -> (Vec<Count>, Vec<Count>) {
        let offsets = prefix_offsets(counts);
        (
            counts.iter().map(|&c| c as Count).collect(),
            offsets.iter().map(|&o| o as Count).collect(),
        )
    }
}

impl super::Communicator for MpiComm {
    fn rank(&self) -> usize {
        self.world.rank() as usize
    }

    fn size(&self) -> usize {
        self.world.size() as usize
    }

    fn send(&self, peer: usize, buf: &[u8]) -> CommResult<()> {
        self.world.process_at_rank(peer as Count).send(buf);
        Ok(())
    }

    fn recv(&self, peer: usize, buf: &mut [u8]) -> CommResult<()> {
        self.world.process_at_rank(peer as Count).receive_into(buf);
        Ok(())
    }

    fn broadcast(&self, root: usize, buf: &mut [u8]) -> CommResult<()> {
        self.world
            .process_at_rank(root as Count)
            .broadcast_into(buf);
        Ok(())
    }

    fn scatterv(
        &self,
        root: usize,
        send: Option<&[u8]>,
        counts: &[usize],
        recv: &mut [u8],
    ) -> CommResult<()> {
        let root_proc = self.world.process_at_rank(root as Count);
        if self.rank() == root {
            let send = send.ok_or(super::CommError::MissingRootBuffer)?;
            let (counts, displs) = Self::counts_and_displs(counts);
            let partition = Partition::new(send, counts, displs);
            root_proc.scatter_varcount_into_root(&partition, recv);
        } else {
            root_proc.scatter_varcount_into(recv);
        }
        Ok(())
    }

    fn gather(&self, root: usize, send: &[u8], recv: Option<&mut [u8]>) -> CommResult<()> {
        let root_proc = self.world.process_at_rank(root as Count);
        if self.rank() == root {
            let recv = recv.ok_or(super::CommError::MissingRootBuffer)?;
            root_proc.gather_into_root(send, recv);
        } else {
            root_proc.gather_into(send);
        }
        Ok(())
    }

    fn gatherv(
        &self,
        root: usize,
        send: &[u8],
        counts: &[usize],
        recv: Option<&mut [u8]>,
    ) -> CommResult<()> {
        let root_proc = self.world.process_at_rank(root as Count);
        if self.rank() == root {
            let recv = recv.ok_or(super::CommError::MissingRootBuffer)?;
            let (counts, displs) = Self::counts_and_displs(counts);
            let mut partition = PartitionMut::new(recv, counts, displs);
            root_proc.gather_varcount_into_root(send, &mut partition);
        } else {
            root_proc.gather_varcount_into(send);
        }
        Ok(())
    }

    fn barrier(&self) {
        self.world.barrier();
    }
}
