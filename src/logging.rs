//! `tracing` subscriber setup.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::error::AppError;

pub const DEFAULT_FILTER: &str = "green_prism=info";

/// Where log lines go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget<'a> {
    Stderr,
    /// Append to a file. Used by the TUI so the screen is not corrupted.
    File(&'a Path),
    /// No subscriber at all.
    Off,
}

fn filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber. A second call is a no-op.
pub fn init(target: LogTarget<'_>) -> Result<(), AppError> {
    let result = match target {
        LogTarget::Off => return Ok(()),
        LogTarget::Stderr => tracing_subscriber::registry()
            .with(filter())
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init(),
        LogTarget::File(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| {
                    AppError::new(2, format!("Failed to open log file {}: {e}", path.display()))
                })?;
            tracing_subscriber::registry()
                .with(filter())
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(Mutex::new(file)),
                )
                .try_init()
        }
    };

    if result.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
    Ok(())
}
