//! Loading a password list fully into memory.

use std::path::Path;

use anyhow::Context;
use indicatif::HumanBytes;
use log::info;

/// One candidate per line; blank lines are skipped. Lines are trimmed of
/// surrounding whitespace unless `trim` is false.
pub fn parse_wordlist(data: &str, trim: bool) -> Vec<String> {
    data.lines()
        .map(|line| if trim { line.trim() } else { line })
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Read a password list, converting invalid UTF-8 lossily.
pub fn read_wordlist(path: &Path, trim: bool) -> anyhow::Result<Vec<String>> {
    info!("Reading password file into memory: {path:?}");
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read wordlist file {path:?}"))?;
    let words = parse_wordlist(&String::from_utf8_lossy(&bytes), trim);

    let held: usize = words.iter().map(String::capacity).sum::<usize>()
        + words.capacity() * std::mem::size_of::<String>();
    info!(
        "Loaded {} candidate passwords ({} in memory)",
        words.len(),
        HumanBytes(held as u64)
    );
    Ok(words)
}
