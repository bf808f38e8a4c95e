#![warn(missing_docs)]

//! SPMD collectives for the irrad radiative-transport engine.
//!
//! The engine runs single-program-multiple-data: one logical process
//! per mesh partition, advancing in lockstep through collective calls.
//! This crate defines the [`Communicator`] seam plus two in-process
//! implementations: [`SingleProcess`] for serial runs and
//! [`ThreadedComm`] for running N ranks as threads in one address
//! space, which is how the multi-partition tests exercise migration
//! and aggregation without an MPI launcher.
//!
//! All ranks of a group must issue the same sequence of collective
//! calls with the same payload type; a rank that drops out of a
//! collective abandons the group.

use std::any::Any;
use std::sync::{Arc, Barrier, Mutex};

use thiserror::Error;

/// Errors from the communication layer.
#[derive(Error, Debug)]
pub enum CommError {
    /// An exchange was given the wrong number of outbound buckets.
    #[error("outbound bucket count {got} does not match communicator size {size}")]
    WrongFanout {
        /// Buckets provided by the caller.
        got: usize,
        /// Ranks in the group.
        size: usize,
    },

    /// Ranks disagreed on the payload type or call sequence of a
    /// collective.
    #[error("collective mismatch between ranks")]
    CollectiveMismatch,

    /// A peer rank panicked while holding shared communicator state.
    #[error("peer rank failed during a collective")]
    PeerFailed,
}

/// Result type for communicator operations.
pub type Result<T> = std::result::Result<T, CommError>;

/// Collective communication between the ranks of one SPMD group.
pub trait Communicator {
    /// This process's rank, in `0..size`.
    fn rank(&self) -> usize;

    /// Number of ranks in the group.
    fn size(&self) -> usize;

    /// All-to-all exchange: `outbound[dst]` is delivered to rank `dst`;
    /// returns the messages received, indexed by source rank.
    ///
    /// Blocks until every rank has contributed. `outbound.len()` must
    /// equal [`size`](Communicator::size).
    fn exchange<T: Send + 'static>(&self, outbound: Vec<Vec<T>>) -> Result<Vec<Vec<T>>>;

    /// Sum `value` over all ranks; every rank receives the total.
    fn all_reduce_sum(&self, value: u64) -> Result<u64>;
}

/// The trivial single-rank communicator.
#[derive(Debug, Clone, Copy, Default)]
pub struct SingleProcess;

impl Communicator for SingleProcess {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn exchange<T: Send + 'static>(&self, outbound: Vec<Vec<T>>) -> Result<Vec<Vec<T>>> {
        if outbound.len() != 1 {
            return Err(CommError::WrongFanout {
                got: outbound.len(),
                size: 1,
            });
        }
        Ok(outbound)
    }

    fn all_reduce_sum(&self, value: u64) -> Result<u64> {
        Ok(value)
    }
}

/// Mailbox matrix shared by one group: `slots[dst][src]` holds the
/// type-erased message bucket from `src` to `dst` for the collective
/// in flight.
struct Shared {
    barrier: Barrier,
    slots: Mutex<Vec<Vec<Option<Box<dyn Any + Send>>>>>,
    sums: Mutex<Vec<u64>>,
}

/// One rank of an in-process SPMD group backed by threads.
///
/// Create a group with [`ThreadedComm::group`] and move one handle
/// into each rank's thread. Collectives synchronize on a shared
/// barrier, so all ranks must call them in lockstep.
pub struct ThreadedComm {
    rank: usize,
    size: usize,
    shared: Arc<Shared>,
}

impl ThreadedComm {
    /// Create the communicator handles for a group of `size` ranks.
    pub fn group(size: usize) -> Vec<ThreadedComm> {
        assert!(size >= 1, "group needs at least one rank");
        let shared = Arc::new(Shared {
            barrier: Barrier::new(size),
            slots: Mutex::new((0..size).map(|_| (0..size).map(|_| None).collect()).collect()),
            sums: Mutex::new(vec![0; size]),
        });
        (0..size)
            .map(|rank| ThreadedComm {
                rank,
                size,
                shared: Arc::clone(&shared),
            })
            .collect()
    }
}

impl Communicator for ThreadedComm {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn exchange<T: Send + 'static>(&self, outbound: Vec<Vec<T>>) -> Result<Vec<Vec<T>>> {
        if outbound.len() != self.size {
            return Err(CommError::WrongFanout {
                got: outbound.len(),
                size: self.size,
            });
        }

        {
            let mut slots = self.shared.slots.lock().map_err(|_| CommError::PeerFailed)?;
            for (dst, bucket) in outbound.into_iter().enumerate() {
                slots[dst][self.rank] = Some(Box::new(bucket));
            }
        }
        self.shared.barrier.wait();

        let mut inbound = Vec::with_capacity(self.size);
        {
            let mut slots = self.shared.slots.lock().map_err(|_| CommError::PeerFailed)?;
            for src in 0..self.size {
                let boxed = slots[self.rank][src]
                    .take()
                    .ok_or(CommError::CollectiveMismatch)?;
                let bucket = boxed
                    .downcast::<Vec<T>>()
                    .map_err(|_| CommError::CollectiveMismatch)?;
                inbound.push(*bucket);
            }
        }
        // Hold everyone until the matrix is drained, so the next
        // collective cannot race this one's slots.
        self.shared.barrier.wait();
        Ok(inbound)
    }

    fn all_reduce_sum(&self, value: u64) -> Result<u64> {
        {
            let mut sums = self.shared.sums.lock().map_err(|_| CommError::PeerFailed)?;
            sums[self.rank] = value;
        }
        self.shared.barrier.wait();
        let total = {
            let sums = self.shared.sums.lock().map_err(|_| CommError::PeerFailed)?;
            sums.iter().sum()
        };
        self.shared.barrier.wait();
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_single_process_exchange() {
        let comm = SingleProcess;
        let inbound = comm.exchange(vec![vec![1, 2, 3]]).unwrap();
        assert_eq!(inbound, vec![vec![1, 2, 3]]);
        assert_eq!(comm.all_reduce_sum(7).unwrap(), 7);
    }

    #[test]
    fn test_single_process_wrong_fanout() {
        let comm = SingleProcess;
        let result = comm.exchange(vec![vec![1], vec![2]]);
        assert!(matches!(result, Err(CommError::WrongFanout { got: 2, size: 1 })));
    }

    #[test]
    fn test_threaded_exchange() {
        let comms = ThreadedComm::group(3);
        let handles: Vec<_> = comms
            .into_iter()
            .map(|comm| {
                thread::spawn(move || {
                    // Rank r sends [r*10 + dst] to each dst
                    let outbound: Vec<Vec<usize>> =
                        (0..comm.size()).map(|dst| vec![comm.rank() * 10 + dst]).collect();
                    let inbound = comm.exchange(outbound).unwrap();
                    for (src, bucket) in inbound.iter().enumerate() {
                        assert_eq!(bucket, &vec![src * 10 + comm.rank()]);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
    }

    #[test]
    fn test_threaded_all_reduce() {
        let comms = ThreadedComm::group(4);
        let handles: Vec<_> = comms
            .into_iter()
            .map(|comm| {
                thread::spawn(move || {
                    let total = comm.all_reduce_sum(comm.rank() as u64 + 1).unwrap();
                    assert_eq!(total, 10);
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
    }

    #[test]
    fn test_threaded_repeated_collectives() {
        let comms = ThreadedComm::group(2);
        let handles: Vec<_> = comms
            .into_iter()
            .map(|comm| {
                thread::spawn(move || {
                    for round in 0..5u64 {
                        let total = comm.all_reduce_sum(round).unwrap();
                        assert_eq!(total, round * 2);
                        let inbound = comm
                            .exchange(vec![vec![round]; comm.size()])
                            .unwrap();
                        assert_eq!(inbound.len(), comm.size());
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
    }
}
