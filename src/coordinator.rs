//! Runs the worker pool for one chunk and folds worker reports into an
//! [`Outcome`].
//!
//! ## Cancellation and resume
//! An external interrupt only raises the shared cancellation flag. Each
//! worker notices it before its next candidate and reports how many ordinals
//! it consumed from its own start. The run ends once every worker has
//! reported; the resume offset is the smallest consumed count plus the offset
//! this run was started with. Re-running at that offset may retest a few
//! candidates in faster workers' ranges but never skips one.
//!
//! ## Match priority
//! A match wins over cancellation regardless of arrival order: if any worker
//! reports a match, the outcome is [`Outcome::Found`] even when an interrupt
//! already landed and other workers reported positions.
//!
//! On a match or a fatal oracle error the coordinator raises the flag itself
//! and waits for the remaining workers before returning, so no worker keeps
//! burning CPU after the run ends.

use std::future::Future;
use std::pin::pin;
use std::sync::Arc;

use log::{debug, error, info, warn};
use tokio::sync::mpsc;

use crate::error::{Error, Result};
use crate::oracle::Oracle;
use crate::partition::{partition, ChunkSpec, Partition, WorkerRange};
use crate::space::SearchSpace;
use crate::worker::{spawn_workers, Shared, WorkerReport};

/// How a run ended, short of an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Found {
        passphrase: String,
        plaintext: Vec<u8>,
    },
    /// Every assigned candidate was tested without a match.
    Exhausted,
    /// Interrupted. Pass `resume_offset` back in to continue.
    Cancelled { resume_offset: u64 },
}

/// A search space together with this invocation's share of it.
#[derive(Debug, Clone)]
pub struct SearchPlan {
    space: Arc<SearchSpace>,
    partition: Partition,
    ranges: Vec<WorkerRange>,
    resume: u64,
}

impl SearchPlan {
    pub fn new(space: SearchSpace, chunk: ChunkSpec, workers: usize, resume: u64) -> Result<Self> {
        let (partition, ranges) =
            partition(space.size(), chunk.total, chunk.index, workers, resume)?;
        Ok(Self {
            space: Arc::new(space),
            partition,
            ranges,
            resume,
        })
    }

    pub fn partition(&self) -> Partition {
        self.partition
    }

    pub fn ranges(&self) -> &[WorkerRange] {
        &self.ranges
    }

    /// Candidates the workers will actually test, resume offset applied.
    pub fn candidates(&self) -> u64 {
        self.ranges.iter().map(WorkerRange::len).sum()
    }

    pub fn workers(&self) -> usize {
        self.ranges.len()
    }

    pub fn resume(&self) -> u64 {
        self.resume
    }
}

/// Aggregates worker reports.
#[derive(Debug)]
struct Tally {
    remaining: usize,
    resume: u64,
    min_resume: Option<u64>,
}

impl Tally {
    fn new(workers: usize, resume: u64) -> Self {
        Self {
            remaining: workers,
            resume,
            min_resume: None,
        }
    }

    /// Fold one report in. Returns the verdict once one is known.
    fn record(&mut self, report: WorkerReport) -> Option<Result<Outcome>> {
        self.remaining = self.remaining.saturating_sub(1);
        match report {
            WorkerReport::Found {
                worker,
                passphrase,
                plaintext,
            } => {
                info!("worker {worker} found the passphrase");
                return Some(Ok(Outcome::Found {
                    passphrase,
                    plaintext,
                }));
            }
            WorkerReport::Failed { worker, error } => {
                error!("worker {worker} aborted the search: {error}");
                return Some(Err(error));
            }
            WorkerReport::Exhausted { worker } => {
                debug!("worker {worker} exhausted its range");
            }
            WorkerReport::Cancelled { worker, consumed } => {
                let offset = consumed.saturating_add(self.resume);
                debug!("worker {worker} stopped after {consumed} candidates");
                self.min_resume = Some(self.min_resume.map_or(offset, |m| m.min(offset)));
            }
        }

        (self.remaining == 0).then(|| {
            Ok(match self.min_resume {
                Some(resume_offset) => Outcome::Cancelled { resume_offset },
                None => Outcome::Exhausted,
            })
        })
    }
}

/// Owns the shared flag and counter for one run.
pub struct Coordinator<O> {
    plan: SearchPlan,
    oracle: Arc<O>,
    ciphertext: Arc<[u8]>,
    shared: Shared,
}

impl<O: Oracle + 'static> Coordinator<O> {
    pub fn new(plan: SearchPlan, oracle: O, ciphertext: impl Into<Arc<[u8]>>) -> Self {
        let already_tried = plan.resume.saturating_mul(plan.workers() as u64);
        Self {
            plan,
            oracle: Arc::new(oracle),
            ciphertext: ciphertext.into(),
            shared: Shared::new(already_tried),
        }
    }

    /// Handle on the cancellation flag and progress counter.
    pub fn shared(&self) -> Shared {
        self.shared.clone()
    }

    /// Search until a match, exhaustion, or `interrupt` completes and every
    /// worker has reported its position.
    pub async fn run<F>(self, interrupt: F) -> Result<Outcome>
    where
        F: Future<Output = ()>,
    {
        let workers = self.plan.workers();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("search-{i}"))
            .panic_handler(|_| error!("search worker panicked"))
            .build()?;

        let (tx, mut rx) = mpsc::unbounded_channel();
        spawn_workers(
            &pool,
            &self.plan.ranges,
            &self.plan.space,
            &self.oracle,
            &self.ciphertext,
            &self.shared,
            &tx,
        );
        drop(tx);

        let mut interrupt = pin!(interrupt);
        let mut interrupted = false;
        let mut tally = Tally::new(workers, self.plan.resume);

        let verdict = loop {
            tokio::select! {
                report = rx.recv() => match report {
                    Some(report) => {
                        if let Some(verdict) = tally.record(report) {
                            break verdict;
                        }
                    }
                    None => {
                        return Err(Error::WorkersLost {
                            remaining: tally.remaining,
                        })
                    }
                },
                _ = &mut interrupt, if !interrupted => {
                    interrupted = true;
                    self.shared.cancel();
                    warn!(
                        "interrupt received, waiting for {} worker(s) to report",
                        tally.remaining
                    );
                }
            }
        };

        if matches!(verdict, Ok(Outcome::Found { .. }) | Err(_)) {
            self.shared.cancel();
            debug!("stopping {} remaining worker(s)", tally.remaining);
            while tally.remaining > 0 && rx.recv().await.is_some() {
                tally.remaining -= 1;
            }
        }
        drop(pool);

        verdict
    }
}
