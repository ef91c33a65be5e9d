//! dn7x7 - the DairyNews7x7 dashboard from the terminal.
//!
//! Log in, check credits, manage API keys, browse usage logs, administer
//! users and read the news feed. Sessions survive between runs and expired
//! access tokens are refreshed transparently.

mod cli;
mod commands;
mod context;
mod format;

use std::io;
use std::path::Path;

use anyhow::{Context as _, Result};
use clap::Parser;
use tracing::{debug, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::Cli;
use context::Context;
use dn7x7_core::Config;

/// Initialize the tracing subscriber for logging.
///
/// Logs go to stderr unless `log_file` is given. The returned guard must be
/// held until exit so buffered lines reach the file.
fn init_tracing(log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    match log_file {
        Some(path) => {
            let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
            let file_name = path
                .file_name()
                .with_context(|| format!("Invalid log file path {}", path.display()))?;
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;

            let appender = tracing_appender::rolling::never(dir, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(writer).with_ansi(false))
                .with(filter)
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(io::stderr))
                .with(filter)
                .init();
            Ok(None)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let _log_guard = init_tracing(cli.log_file.as_deref())?;
    info!("dn7x7 starting");

    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("Warning: ignoring unreadable config ({:#})", e);
        Config::default()
    });
    let mut ctx = Context::new(config, cli.api_url, cli.json)?;
    debug!(base_url = %ctx.base_url(), "Using backend");

    let result = commands::run(cli.command, &mut ctx).await;
    if result.is_err() && ctx.login_requested() {
        eprintln!("Session expired. Run `dn7x7 login` to sign in again.");
    }

    info!("dn7x7 finished");
    result
}
