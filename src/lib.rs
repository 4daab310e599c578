//! Parallel, resumable passphrase search for Samourai wallet backups.
//!
//! A run enumerates a [`space::SearchSpace`] (charset + `?` pattern, or an
//! in-memory password list), takes its share via [`partition`], and hands one
//! contiguous range to each worker thread. Workers test candidates against an
//! [`oracle::Oracle`] until one decrypts to a plaintext carrying the success
//! marker. The [`coordinator::Coordinator`] turns an interrupt into a resume
//! offset that never skips an untested candidate.

pub mod config;
pub mod coordinator;
pub mod error;
pub mod oracle;
pub mod partition;
pub mod payload;
pub mod space;
pub mod wordlist;
pub mod worker;

pub use coordinator::{Coordinator, Outcome, SearchPlan};
pub use error::{Error, Result};
pub use oracle::{Aes256CbcOracle, Oracle};
pub use partition::{ChunkSpec, Partition, WorkerRange};
pub use space::{PatternSpace, SearchSpace};
