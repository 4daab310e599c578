//! Per-range search loop and the rayon pool that runs one loop per range.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use log::{debug, trace};
use rayon::ThreadPool;
use tokio::sync::mpsc::UnboundedSender;

use crate::error::Error;
use crate::oracle::{contains_marker, Oracle};
use crate::partition::WorkerRange;
use crate::space::SearchSpace;

/// State shared between the coordinator and every worker: the cancellation
/// flag and the advisory tried-candidates counter.
#[derive(Debug, Clone, Default)]
pub struct Shared {
    cancelled: Arc<AtomicBool>,
    tried: Arc<AtomicU64>,
}

impl Shared {
    pub fn new(already_tried: u64) -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            tried: Arc::new(AtomicU64::new(already_tried)),
        }
    }

    /// Ask every worker to stop before its next candidate. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Candidates tried so far, process wide. Never used for correctness.
    pub fn tried(&self) -> u64 {
        self.tried.load(Ordering::Relaxed)
    }

    fn record_try(&self) {
        self.tried.fetch_add(1, Ordering::Relaxed);
    }
}

/// The single terminal message each worker sends.
#[derive(Debug)]
pub enum WorkerReport {
    Found {
        worker: usize,
        passphrase: String,
        plaintext: Vec<u8>,
    },
    Exhausted {
        worker: usize,
    },
    /// Stopped by the cancellation flag after testing `consumed` ordinals
    /// from the start of its range.
    Cancelled {
        worker: usize,
        consumed: u64,
    },
    Failed {
        worker: usize,
        error: Error,
    },
}

/// Walk `range` in ascending order until a match, the end of the range, a
/// cancellation or an oracle failure.
pub fn search_range<O: Oracle + ?Sized>(
    worker: usize,
    range: WorkerRange,
    space: &SearchSpace,
    oracle: &O,
    ciphertext: &[u8],
    shared: &Shared,
) -> WorkerReport {
    let mut buf = String::new();
    let mut ordinal = range.start;

    while ordinal < range.end {
        if shared.is_cancelled() {
            return WorkerReport::Cancelled {
                worker,
                consumed: ordinal - range.start,
            };
        }

        let candidate = space.candidate(ordinal, &mut buf);
        let plaintext = match oracle.decrypt(ciphertext, candidate) {
            Ok(plaintext) => plaintext,
            Err(error) => return WorkerReport::Failed { worker, error },
        };
        shared.record_try();

        if contains_marker(&plaintext) {
            return WorkerReport::Found {
                worker,
                passphrase: candidate.to_owned(),
                plaintext,
            };
        }
        trace!("worker {worker}: {ordinal} rejected");
        ordinal += 1;
    }

    WorkerReport::Exhausted { worker }
}

/// Spawn one [`search_range`] job per range on `pool`. Each job sends exactly
/// one report on `tx`.
pub fn spawn_workers<O: Oracle + 'static>(
    pool: &ThreadPool,
    ranges: &[WorkerRange],
    space: &Arc<SearchSpace>,
    oracle: &Arc<O>,
    ciphertext: &Arc<[u8]>,
    shared: &Shared,
    tx: &UnboundedSender<WorkerReport>,
) {
    for (worker, &range) in ranges.iter().enumerate() {
        debug!(
            "worker {worker}: ordinals [{}, {}) ({} candidates)",
            range.start,
            range.end,
            range.len()
        );
        let space = Arc::clone(space);
        let oracle = Arc::clone(oracle);
        let ciphertext = Arc::clone(ciphertext);
        let shared = shared.clone();
        let tx = tx.clone();
        pool.spawn(move || {
            let report = search_range(worker, range, &space, &*oracle, &ciphertext, &shared);
            if tx.send(report).is_err() {
                debug!("worker {worker}: coordinator gone, report dropped");
            }
        });
    }
}
