//! Static division of a search space across machines (chunks) and, within a
//! chunk, across worker threads.

use core::fmt;
use core::str::FromStr;

use crate::error::{Error, Result};

/// "This invocation is chunk `index` of `total`", written `N/T`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkSpec {
    pub index: u64,
    pub total: u64,
}

impl Default for ChunkSpec {
    fn default() -> Self {
        Self { index: 0, total: 1 }
    }
}

impl FromStr for ChunkSpec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (index, total) = s
            .split_once('/')
            .ok_or_else(|| Error::config(format!("chunk {s:?} is not of the form N/T")))?;
        let parse = |part: &str| {
            part.trim()
                .parse::<u64>()
                .map_err(|e| Error::config(format!("chunk {s:?}: {e}")))
        };
        let spec = Self {
            index: parse(index)?,
            total: parse(total)?,
        };
        if spec.total == 0 || spec.index >= spec.total {
            return Err(Error::config(format!("chunk {s:?} parameter invalid")));
        }
        Ok(spec)
    }
}

impl fmt::Display for ChunkSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.index, self.total)
    }
}

/// The ordinal range `[start, end)` handled by this invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partition {
    pub start: u64,
    pub end: u64,
}

impl Partition {
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The ordinal range `[start, end)` owned by one worker.
///
/// `start >= end` is a legal empty range (a resume offset past the worker's
/// block).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerRange {
    pub start: u64,
    pub end: u64,
}

impl WorkerRange {
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Split `[0, size)` into `total_chunks` chunks, pick `chunk_index`, and
/// split that chunk into `workers` contiguous ranges.
///
/// The last chunk and the last worker absorb division remainders.
/// `resume` is added to every worker's start and is not clamped.
pub fn partition(
    size: u64,
    total_chunks: u64,
    chunk_index: u64,
    workers: usize,
    resume: u64,
) -> Result<(Partition, Vec<WorkerRange>)> {
    if total_chunks == 0 {
        return Err(Error::config("chunk count must be at least 1"));
    }
    if chunk_index >= total_chunks {
        return Err(Error::config(format!(
            "chunk index {chunk_index} out of range for {total_chunks} chunk(s)"
        )));
    }
    if workers == 0 {
        return Err(Error::config("worker count must be at least 1"));
    }

    let chunk_size = size / total_chunks;
    let global_start = chunk_size * chunk_index;
    let global_end = if chunk_index == total_chunks - 1 {
        size
    } else {
        global_start + chunk_size
    };

    let block_size = chunk_size / workers as u64;
    let ranges = (0..workers as u64)
        .map(|i| {
            let start = global_start
                .checked_add(i * block_size)
                .and_then(|s| s.checked_add(resume))
                .ok_or_else(|| {
                    Error::config(format!("resume offset {resume} overflows the ordinal space"))
                })?;
            let end = if i == workers as u64 - 1 {
                global_end
            } else {
                global_start + (i + 1) * block_size
            };
            Ok(WorkerRange { start, end })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok((
        Partition {
            start: global_start,
            end: global_end,
        },
        ranges,
    ))
}
