//! Search spaces and the ordinal → candidate mapping.
//!
//! A pattern space enumerates every way of filling the `?` wildcards of a
//! pattern from a charset. Ordinals are decoded in mixed radix `|charset|`
//! with the least-significant digit at the first wildcard, so ordinal `1`
//! over charset `ab` and pattern `??` is `"ba"`.
//!
//! There is no escape for a literal `?`: every `?` in a pattern is a
//! wildcard.

use crate::error::{Error, Result};

/// Charset used when none is supplied: digits, space, ASCII letters.
pub const DEFAULT_CHARSET: &str =
    "0123456789 ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

pub const WILDCARD: char = '?';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Fixed(char),
    Wildcard,
}

/// A charset + pattern pair.
#[derive(Debug, Clone)]
pub struct PatternSpace {
    charset: Vec<char>,
    slots: Vec<Slot>,
    wildcards: usize,
    size: u64,
}

impl PatternSpace {
    /// Build a space from a charset and a `?` pattern.
    ///
    /// The charset may contain duplicates; they are enumerated as distinct
    /// digits.
    pub fn new(charset: &str, pattern: &str) -> Result<Self> {
        let charset: Vec<char> = charset.chars().collect();
        if charset.is_empty() {
            return Err(Error::config("charset must not be empty"));
        }

        let slots: Vec<Slot> = pattern
            .chars()
            .map(|c| if c == WILDCARD { Slot::Wildcard } else { Slot::Fixed(c) })
            .collect();
        let wildcards = slots.iter().filter(|s| **s == Slot::Wildcard).count();
        if wildcards == 0 {
            return Err(Error::config(format!(
                "pattern {pattern:?} must contain at least one '{WILDCARD}'"
            )));
        }

        let size = u32::try_from(wildcards)
            .ok()
            .and_then(|k| (charset.len() as u64).checked_pow(k))
            .ok_or_else(|| {
                Error::config(format!(
                    "search space of {}^{} candidates does not fit in 64 bits",
                    charset.len(),
                    wildcards
                ))
            })?;

        Ok(Self {
            charset,
            slots,
            wildcards,
            size,
        })
    }

    /// A pattern made only of wildcards.
    pub fn of_length(charset: &str, length: usize) -> Result<Self> {
        if length == 0 {
            return Err(Error::config("password length must be at least 1"));
        }
        Self::new(charset, &WILDCARD.to_string().repeat(length))
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn wildcards(&self) -> usize {
        self.wildcards
    }

    /// Pattern length in characters.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn charset(&self) -> String {
        self.charset.iter().collect()
    }

    pub fn pattern(&self) -> String {
        self.slots
            .iter()
            .map(|s| match s {
                Slot::Fixed(c) => *c,
                Slot::Wildcard => WILDCARD,
            })
            .collect()
    }

    /// Write the candidate for `ordinal` into `buf`, replacing its contents.
    pub fn fill(&self, ordinal: u64, buf: &mut String) {
        debug_assert!(ordinal < self.size);
        buf.clear();
        let radix = self.charset.len() as u64;
        let mut acc = ordinal;
        for slot in &self.slots {
            match slot {
                Slot::Fixed(c) => buf.push(*c),
                Slot::Wildcard => {
                    buf.push(self.charset[(acc % radix) as usize]);
                    acc /= radix;
                }
            }
        }
    }
}

/// The full set of candidates a run may draw from.
#[derive(Debug, Clone)]
pub enum SearchSpace {
    Pattern(PatternSpace),
    List(Vec<String>),
}

impl SearchSpace {
    pub fn size(&self) -> u64 {
        match self {
            Self::Pattern(p) => p.size(),
            Self::List(words) => words.len() as u64,
        }
    }

    /// Candidate for `ordinal`, borrowing from the list or from `buf`.
    ///
    /// Only defined for `ordinal < self.size()`.
    pub fn candidate<'a>(&'a self, ordinal: u64, buf: &'a mut String) -> &'a str {
        match self {
            Self::Pattern(p) => {
                p.fill(ordinal, buf);
                buf.as_str()
            }
            Self::List(words) => words[ordinal as usize].as_str(),
        }
    }

    /// Owned candidate for `ordinal`. Allocates; use [`Self::candidate`] in
    /// loops.
    pub fn generate(&self, ordinal: u64) -> String {
        let mut buf = String::new();
        self.candidate(ordinal, &mut buf).to_owned()
    }
}
