//! Collective communication seam.
//!
//! The generator itself is deterministic per rank and only needs two
//! collectives: an all-gather of per-rank element counts and, for overlap
//! growth, an all-to-all. [SerialComm] serves single-process runs; enabling
//! the `mpi` feature provides `MpiComm`, a thin wrapper over any rsmpi
//! communicator.

use crate::{error::MeshResult, grid::Mesh, types::RealScalar};

#[cfg(feature = "mpi")]
use mpi::{
    point_to_point::{Destination, Source},
    request::WaitGuard,
    traits::{Communicator, CommunicatorCollectives},
};

/// The collective operations the generator relies on
pub trait Collective {
    /// This process' rank
    fn rank(&self) -> usize;

    /// Number of processes
    fn size(&self) -> usize;

    /// Gather one value from every rank, in rank order
    fn all_gather(&self, value: u64, out: &mut Vec<u64>);

    /// Exchange one message per rank pair; `send[p]` goes to rank `p` and
    /// `out[p]` is what rank `p` sent here
    fn all_to_all(&self, send: &[Vec<u64>], out: &mut Vec<Vec<u64>>);
}

/// Trivial single-process communicator
#[derive(Debug, Default, Clone, Copy)]
pub struct SerialComm;

impl Collective for SerialComm {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn all_gather(&self, value: u64, out: &mut Vec<u64>) {
        out.clear();
        out.push(value);
    }

    fn all_to_all(&self, send: &[Vec<u64>], out: &mut Vec<Vec<u64>>) {
        out.clear();
        out.extend_from_slice(send);
    }
}

/// Collective operations over an MPI communicator
#[cfg(feature = "mpi")]
pub struct MpiComm<'a, C: Communicator> {
    comm: &'a C,
}

#[cfg(feature = "mpi")]
impl<'a, C: Communicator> MpiComm<'a, C> {
    /// Wrap an MPI communicator
    pub fn new(comm: &'a C) -> Self {
        Self { comm }
    }
}

#[cfg(feature = "mpi")]
impl<'a, C: Communicator> Collective for MpiComm<'a, C> {
    fn rank(&self) -> usize {
        self.comm.rank() as usize
    }

    fn size(&self) -> usize {
        self.comm.size() as usize
    }

    fn all_gather(&self, value: u64, out: &mut Vec<u64>) {
        let mut gathered = vec![0u64; self.size()];
        self.comm.all_gather_into(&value, &mut gathered[..]);
        *out = gathered;
    }

    fn all_to_all(&self, send: &[Vec<u64>], out: &mut Vec<Vec<u64>>) {
        let rank = self.rank();
        mpi::request::scope(|scope| {
            for p in 0..self.size() {
                if p != rank {
                    let process = self.comm.process_at_rank(p as i32);
                    let _ = WaitGuard::from(process.immediate_send(scope, &send[p]));
                }
            }
        });
        out.clear();
        for p in 0..self.size() {
            if p == rank {
                out.push(send[rank].clone());
            } else {
                let process = self.comm.process_at_rank(p as i32);
                let (received, _status) = process.receive_vec::<u64>();
                out.push(received);
            }
        }
    }
}

/// External collaborator that adds one ring of ghost cells per call.
///
/// Overlap growth needs full inter-rank connectivity and lives outside this
/// crate; the generator only invokes the hook the requested number of times.
pub trait OverlapGrower<T: RealScalar> {
    /// Grow the mesh by one ghost-cell ring
    fn grow<C: Collective>(&mut self, comm: &C, mesh: &mut Mesh<T>) -> MeshResult<()>;
}
