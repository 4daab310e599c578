//! Command-line surface and its validation into a [`SearchConfig`].
//!
//! clap handles syntax and flag conflicts; [`SearchConfig::try_from`] checks
//! the rules clap cannot express, such as `-s` needing `-i`.

use std::path::PathBuf;

use anyhow::bail;
use clap::Parser;

use crate::partition::ChunkSpec;
use crate::space::{PatternSpace, SearchSpace, DEFAULT_CHARSET, WILDCARD};
use crate::wordlist::read_wordlist;

/// Length searched when neither a length, a pattern nor a list is given.
pub const DEFAULT_LENGTH: usize = 4;

/// Longest all-wildcard length accepted on the command line.
pub const MAX_LENGTH: usize = 1024;

pub const DEFAULT_WALLET: &str = "samourai.txt";

/// Command-line arguments.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "brute-samourai",
    version,
    about = "Recover a Samourai wallet backup passphrase by brute force",
    after_help = "CAVEAT: a pattern has no way to represent a literal '?' character; \
                  every '?' matches an unknown character."
)]
pub struct CliArgs {
    /// Split the space into T pieces and process piece N (zero based), for
    /// running the same search on several machines.
    #[arg(long, value_name = "N/T", default_value_t = ChunkSpec::default())]
    pub chunk: ChunkSpec,

    /// Characters to draw unknown positions from. Keep it as small as
    /// possible: it dominates the size of the search space.
    #[arg(long, value_name = "S", conflicts_with = "input")]
    pub charset: Option<String>,

    /// Worker threads. Defaults to the number of CPUs.
    #[arg(short = 't', long = "threads", value_name = "N")]
    pub threads: Option<usize>,

    /// Continue an interrupted run from the offset it printed.
    #[arg(long, value_name = "NUM", default_value_t = 0)]
    pub resume: u64,

    /// Backup file to crack.
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_WALLET)]
    pub wallet: PathBuf,

    /// Try the passwords in FILE, one per line, instead of a pattern.
    #[arg(short, long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Do not trim whitespace from lines read with --input.
    #[arg(short = 's', long = "no-trim", requires = "input")]
    pub no_trim: bool,

    /// Enable verbose logging.
    #[arg(short, long)]
    pub verbose: bool,

    /// Passphrase length, or a pattern where '?' marks unknown characters
    /// (e.g. `foo??bar?`). Defaults to 4.
    #[arg(value_name = "PWLEN_OR_PATTERN", conflicts_with = "input")]
    pub pwlen_or_pattern: Option<String>,
}

/// What to enumerate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Pattern { charset: String, pattern: String },
    Wordlist { path: PathBuf, trim: bool },
}

impl Target {
    /// Build the in-memory search space. Reads the list file in list mode.
    pub fn load(&self) -> anyhow::Result<SearchSpace> {
        Ok(match self {
            Self::Pattern { charset, pattern } => {
                SearchSpace::Pattern(PatternSpace::new(charset, pattern)?)
            }
            Self::Wordlist { path, trim } => SearchSpace::List(read_wordlist(path, *trim)?),
        })
    }
}

/// Validated run configuration.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub chunk: ChunkSpec,
    pub threads: usize,
    pub resume: u64,
    pub wallet: PathBuf,
    pub target: Target,
}

/// Turn the positional argument into a pattern. Integers are lengths.
pub fn parse_pwlen_or_pattern(arg: &str) -> anyhow::Result<String> {
    if let Ok(length) = arg.parse::<i64>() {
        if length < 1 {
            bail!("pwlen must be greater than or equal to 1!");
        }
        if length > MAX_LENGTH as i64 {
            bail!("pwlen must not exceed {MAX_LENGTH}");
        }
        return Ok(WILDCARD.to_string().repeat(length as usize));
    }
    if !arg.contains(WILDCARD) {
        bail!("Error parsing pattern. Make sure it contains at least one '{WILDCARD}' character!");
    }
    Ok(arg.to_owned())
}

impl TryFrom<CliArgs> for SearchConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if args.no_trim && args.input.is_none() {
            bail!("Option -s can only be used if using -i mode!");
        }

        let threads = args.threads.unwrap_or_else(rayon::current_num_threads);
        if threads == 0 {
            bail!("thread count must be greater than 0");
        }

        let target = match args.input {
            Some(path) => Target::Wordlist {
                path,
                trim: !args.no_trim,
            },
            None => {
                let charset = args
                    .charset
                    .filter(|c| !c.is_empty())
                    .unwrap_or_else(|| DEFAULT_CHARSET.to_owned());
                let pattern = match args.pwlen_or_pattern {
                    Some(arg) => parse_pwlen_or_pattern(&arg)?,
                    None => WILDCARD.to_string().repeat(DEFAULT_LENGTH),
                };
                Target::Pattern { charset, pattern }
            }
        };

        Ok(Self {
            chunk: args.chunk,
            threads,
            resume: args.resume,
            wallet: args.wallet,
            target,
        })
    }
}
