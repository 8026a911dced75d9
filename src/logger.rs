use anyhow::{Context, Result};
use std::path::Path;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::__tracing_subscriber_SubscriberExt;
use tracing_subscriber::registry::Registry;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Sets up logging for the library.
///
/// The level is taken from the `RUST_LOG` environment variable and defaults
/// to `info`. If `log_file` is given, log messages are additionally written
/// there without ANSI escapes.
///
/// Returns an error if a subscriber is already installed, so tests can call
/// this repeatedly without panicking.
pub fn setup_log(log_file: Option<&Path>) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = Registry::default().with(env_filter);

    let file_layer = match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            Some(fmt::layer().with_writer(file).with_ansi(false))
        }
        None => None,
    };

    let stdout_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_ansi(true)
        .with_target(false);

    subscriber
        .with(file_layer)
        .with(stdout_layer)
        .try_init()
        .context("a global logging subscriber is already installed")?;
    tracing::debug!("logging is configured");
    Ok(())
}
