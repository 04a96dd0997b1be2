//! Consulate CLI - administrative access to the credential store.
//!
//! ```text
//! main() -> load config -> init_tracing() -> Session::open() -> commands::run()
//!                                                                   |
//!                                                                   v
//!                                                   JSON on stdout, exit code by error kind
//! ```
//!
//! Each invocation performs exactly one store operation.

mod commands;

use std::io::{IsTerminal, stderr};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use consulate_config::ConsulateConfig;
use consulate_store::{Session, SessionOptions, StoreError};

use commands::Command;

const LOG_ENV: &str = "CONSULATE_LOG";

#[derive(Debug, Parser)]
#[command(name = "consulate", version, about = "Account, network and node credential store")]
struct Cli {
    /// Config file (default: ~/.consulate/config.toml)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Database file, overriding [store] path
    #[arg(long, global = true, value_name = "FILE", env = "CONSULATE_DB")]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

fn init_tracing(config_filter: Option<&str>, warnings: &[String]) {
    let env_filter = EnvFilter::try_from_env(LOG_ENV)
        .ok()
        .or_else(|| config_filter.and_then(|raw| EnvFilter::try_new(raw).ok()))
        .unwrap_or_else(|| EnvFilter::new("info"));

    // stdout carries command output; logs go to stderr.
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(stderr)
                .with_ansi(stderr().is_terminal()),
        )
        .with(env_filter)
        .init();

    for warning in warnings {
        tracing::warn!("{warning}");
    }
}

/// Exit status by failure kind, so scripts can branch without parsing text.
fn exit_status(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<StoreError>() {
        Some(store) if store.is_fatal() => 1,
        Some(StoreError::Unauthorized { .. }) => 3,
        Some(StoreError::NotFound { .. }) => 4,
        Some(StoreError::Conflict { .. }) => 5,
        _ => 1,
    }
}

fn run(cli: Cli, config: &ConsulateConfig) -> Result<()> {
    let path = cli.db.unwrap_or_else(|| config.store_path());
    let options = SessionOptions {
        busy_timeout: config.busy_timeout(),
        recovery: config.recovery_window(),
    };

    let session = Session::open(&path, options)?;
    let outcome = commands::run(cli.command, &session, &path);
    session.close()?;
    outcome
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let (config, warnings) = match &cli.config {
        Some(path) => ConsulateConfig::load_from(path),
        None => ConsulateConfig::load(),
    };
    init_tracing(config.log_filter(), &warnings);

    match run(cli, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<StoreError>() {
                Some(store) => {
                    tracing::debug!(op = store.op(), error = ?err, "Store operation failed");
                }
                None => tracing::debug!(error = ?err, "Command failed"),
            }
            eprintln!("error: {err:#}");
            ExitCode::from(exit_status(&err))
        }
    }
}
