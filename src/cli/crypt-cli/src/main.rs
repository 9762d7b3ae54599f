//! crypt - hash passphrases with crypt(3)-style algorithms.

use std::io;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{ArgAction, Parser};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crypt_cleanup::GuardedTerminal;
use crypt_provider::CryptProvider;
use crypt_session::{InputMode, OsEntropy, Session, SessionConfig, SessionSummary};
use crypt_terminal::{RawStdin, Terminal, TerminalError};

const USAGE: &str = "\
Hashes one or more passphrases read from the terminal or stdin.

Example session:

    $ crypt '$2b' 12
    Password: <passphrase typed, then Enter>
    Hash: $2b$12$Z0vgnP2jil4YioUAGsDwa.nIkRS.we6hBNHyy4WutXlPT3V5D/ktO
    Password: <Enter pressed on an empty line>
    $

<prefix> selects the algorithm, for example \"$2b$\" (bcrypt) or
\"$argon2id$\". Without it the best available method is used.

<rounds> is the algorithm's cost parameter; its meaning depends on the
algorithm. Without it (or with 0) the algorithm picks its own default.

When stdin is a terminal the passphrase is read from it without echo.
Otherwise one passphrase is read per line until an empty line or end of
input.";

#[derive(Parser, Debug)]
#[command(name = "crypt")]
#[command(about = "Hash passphrases from the terminal or stdin")]
#[command(long_about = USAGE)]
#[command(version)]
struct Cli {
    /// Algorithm prefix such as "$2b$" (empty selects the best available)
    prefix: Option<String>,

    /// Rounds of hashing (empty or 0 lets the algorithm decide)
    #[arg(value_parser = parse_rounds)]
    rounds: Option<u64>,

    /// Log more (-v info, -vv debug, -vvv trace); logs go to stderr
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn session_config(&self) -> SessionConfig {
        SessionConfig::new(self.prefix.as_deref(), self.rounds.unwrap_or(0))
    }
}

fn parse_rounds(value: &str) -> Result<u64, String> {
    if value.is_empty() {
        return Ok(0);
    }
    value
        .parse()
        .map_err(|e| format!("expected a non-negative integer ({})", e))
}

fn log_filter(verbose: u8) -> EnvFilter {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    EnvFilter::new(level)
}

fn run(cli: &Cli) -> Result<SessionSummary> {
    let config = cli.session_config();

    let context = crypt_cleanup::install().context("failed to install signal handlers")?;

    let mode = match Terminal::open() {
        Ok(terminal) => InputMode::Interactive(
            GuardedTerminal::new(context, terminal).context("failed to track terminal")?,
        ),
        Err(TerminalError::NotATerminal) => {
            tracing::debug!("stdin is not a terminal, reading lines from it");
            InputMode::Batch(RawStdin)
        }
        Err(e) => return Err(e).context("failed to open controlling terminal"),
    };

    let mut session = Session::new(
        config,
        mode,
        CryptProvider::new(),
        OsEntropy,
        context,
        io::stdout(),
        io::stderr(),
    )
    .context("failed to start session")?;

    session.run().context("session aborted")
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            };
        }
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(log_filter(cli.verbose))
        .init();

    // Every guard is dropped inside `run`, before the exit code is returned.
    match run(&cli) {
        Ok(summary) => {
            tracing::debug!(hashed = summary.hashed, rejected = summary.rejected, "exiting");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("fatal: {:#}", err);
            ExitCode::FAILURE
        }
    }
}
