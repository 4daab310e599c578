//! # brute-samourai
//!
//! Recovers the passphrase of a Samourai wallet backup (`samourai.txt`). The
//! backup's base64 `payload` is decrypted with every candidate in turn until
//! the plaintext starts with the wallet JSON (it contains `"seed"` within the
//! first 50 bytes).
//!
//! Candidates come from a charset and a pattern (`foo??bar?`, or a plain
//! length such as `4`) or from a password list read into memory with `-i`.
//!
//! ## Cryptography
//! - Key derivation via PBKDF2-HMAC-SHA256, 15000 iterations, salt at bytes 8..16.
//! - Decryption via AES-256-CBC, IV = first 16 bytes of the container.
//!
//! ## Usage
//!
//! ```sh
//! cargo build --release
//! ./target/release/brute-samourai --charset='mopab' -w samourai.txt 3
//! ./target/release/brute-samourai --resume=3 -w samourai.txt 'm?p'
//! ./target/release/brute-samourai --chunk=1/4 -t 8 -i wordlist.txt
//! ```
//!
//! Press ^C to stop; the offset to pass to `--resume` is printed.
//!
//! ## Exit codes
//! `0` found, `1` error, `2` not found, `3` interrupted, `4` workers vanished.

use std::process::ExitCode;
use std::time::Duration;

use anyhow::Result;
use brute_samourai::config::{CliArgs, SearchConfig};
use brute_samourai::coordinator::{Coordinator, Outcome, SearchPlan};
use brute_samourai::oracle::{self, Aes256CbcOracle};
use brute_samourai::payload::read_wallet;
use brute_samourai::space::SearchSpace;
use brute_samourai::worker::Shared;
use brute_samourai::Error;
use clap::error::ErrorKind;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info};
use tokio::task::JoinHandle;

const EXIT_FOUND: u8 = 0;
const EXIT_ERROR: u8 = 1;
const EXIT_NOT_FOUND: u8 = 2;
const EXIT_INTERRUPTED: u8 = 3;
const EXIT_UNREACHABLE: u8 = 4;

/// Completes on the first ^C. Never completes if the handler can't be set.
async fn interrupt() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("(interrupt)"),
        Err(e) => {
            error!("Failed to listen for ^C: {e:?}");
            std::future::pending::<()>().await
        }
    }
}

/// Progress bar fed from the shared tried-candidates counter.
struct Progress {
    bar: ProgressBar,
    ticker: JoinHandle<()>,
}

impl Progress {
    /// `len` counts only this run's candidates; `shared.tried()` is offset by
    /// the resume estimate it was seeded with.
    fn start(shared: Shared, len: u64) -> Result<Self> {
        let seed = shared.tried();
        let bar = ProgressBar::new(len);
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] \
                 {pos}/{len} passphrases tried ({per_sec})",
            )?
            .progress_chars("#>-"),
        );
        let handle = bar.clone();
        let ticker = tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_millis(200));
            loop {
                interval.tick().await;
                handle.set_position(shared.tried().saturating_sub(seed));
            }
        });
        Ok(Self { bar, ticker })
    }

    fn finish(self) {
        self.ticker.abort();
        self.bar.finish_and_clear();
    }
}

fn describe(space: &SearchSpace) {
    match space {
        SearchSpace::Pattern(p) => {
            info!("Using character set: {:?}", p.charset());
            info!("Pattern: {}", p.pattern());
            info!("Unknown chars: {}", p.wildcards());
            info!("Password length: {}", p.len());
            info!("Total passphrase space size: {}", p.size());
        }
        SearchSpace::List(words) => {
            info!("Number of passphrases to try: {}", words.len());
        }
    }
}

/// Exit status for a command-line error, or `None` for help and version
/// output, which clap prints and exits on by itself.
fn usage_exit(err: &clap::Error) -> Option<u8> {
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => None,
        _ => Some(EXIT_ERROR),
    }
}

/// `0` found, `2` not found, `3` interrupted, `4` workers lost, `1` otherwise.
fn exit_code(outcome: &brute_samourai::Result<Outcome>) -> u8 {
    match outcome {
        Ok(Outcome::Found { .. }) => EXIT_FOUND,
        Ok(Outcome::Exhausted) => EXIT_NOT_FOUND,
        Ok(Outcome::Cancelled { .. }) => EXIT_INTERRUPTED,
        Err(Error::WorkersLost { .. }) => EXIT_UNREACHABLE,
        Err(_) => EXIT_ERROR,
    }
}

fn report(outcome: &brute_samourai::Result<Outcome>) {
    match outcome {
        Ok(Outcome::Found {
            passphrase,
            plaintext,
        }) => println!(
            "\n\n!!! PASSPHRASE FOUND !!!!\n\n{}\n\n\n{}",
            passphrase,
            String::from_utf8_lossy(plaintext)
        ),
        Ok(Outcome::Exhausted) => println!("\nNot found."),
        Ok(Outcome::Cancelled { resume_offset }) => {
            println!("Exiting... to resume, use offset {resume_offset}")
        }
        Err(e) => error!("{e}"),
    }
}

/// Main function:
/// - Parses CLI arguments and validates them into a search configuration.
/// - Loads the wallet payload and, in list mode, the password list.
/// - Runs the coordinator until a match, exhaustion, or ^C.
/// - Maps the outcome onto the process exit code.
#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) => match usage_exit(&e) {
            Some(code) => {
                e.print()?;
                return Ok(ExitCode::from(code));
            }
            None => e.exit(),
        },
    };

    let env = env_logger::Env::default().default_filter_or("info");
    if args.verbose {
        env_logger::Builder::from_env(env)
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::Builder::from_env(env).init();
    }
    info!("Starting brute-samourai");

    let config = SearchConfig::try_from(args)?;

    let ciphertext = read_wallet(&config.wallet)?;
    oracle::validate_container(&ciphertext)?;
    if let Some(salt) = oracle::salt(&ciphertext) {
        debug!("Payload salt: {}", hex::encode(salt));
    }

    let space = config.target.load()?;
    describe(&space);

    let plan = SearchPlan::new(space, config.chunk, config.threads, config.resume)?;
    let partition = plan.partition();
    if config.chunk.total > 1 {
        info!(
            "Chunk {} passphrase space size: {}  Starting from point: {}",
            config.chunk,
            partition.len(),
            partition.start
        );
    }
    if config.resume > 0 {
        info!("Resuming each worker at offset {}", config.resume);
    }
    info!(
        "Running brute force on {} threads for wallet file: {:?}",
        plan.workers(),
        config.wallet
    );

    let candidates = plan.candidates();
    let coordinator = Coordinator::new(plan, Aes256CbcOracle::new(), ciphertext);
    let progress = Progress::start(coordinator.shared(), candidates)?;
    let outcome = coordinator.run(interrupt()).await;
    progress.finish();

    report(&outcome);
    Ok(ExitCode::from(exit_code(&outcome)))
}
