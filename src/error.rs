use thiserror::Error;

/// Result alias used across the search library.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Everything the search library can fail with.
///
/// A wrong passphrase is never an error: it only ever produces garbage
/// plaintext. Running out of candidates and being interrupted are outcomes
/// (see [`crate::coordinator::Outcome`]), not errors either.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Chunk, thread, length or pattern parameters that cannot describe a
    /// search. Raised before any worker starts.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The encrypted container is structurally unusable (too short, not block
    /// aligned, not base64, no `payload` key). Fatal for the whole run.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// The dedicated worker thread pool could not be created.
    #[error("failed to build worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    /// The result channel closed while workers still owed a report.
    #[error("{remaining} worker(s) exited without reporting")]
    WorkersLost { remaining: usize },
}

impl Error {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedPayload(msg.into())
    }
}
