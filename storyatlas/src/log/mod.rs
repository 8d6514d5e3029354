//! Tracing subscriber setup.
//!
//! The library itself only emits `tracing` events; subscriber installation
//! is owned here and invoked by the binary. Console output honors
//! `RUST_LOG` (or a verbosity level), file output goes through a
//! non-blocking daily-rolling appender.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::LocalTime;
use tracing_subscriber::EnvFilter;

/// Map a `-v` count onto a default filter directive.
fn default_filter(verbosity: u8) -> EnvFilter {
    let directive = match verbosity {
        0 => "storyatlas=info",
        1 => "storyatlas=debug",
        _ => "storyatlas=trace",
    };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive))
}

/// Install a console subscriber.
///
/// Returns an error string when a global subscriber is already installed.
pub fn init_console(verbosity: u8) -> Result<(), String> {
    tracing_subscriber::fmt()
        .with_env_filter(default_filter(verbosity))
        .with_timer(LocalTime::rfc_3339())
        .with_target(false)
        .try_init()
        .map_err(|e| e.to_string())
}

/// Install a console subscriber plus a daily-rolling log file.
///
/// The returned guard must be held for the lifetime of the process;
/// dropping it stops the background writer and loses buffered lines.
pub fn init_with_file(verbosity: u8, directory: &Path) -> Result<WorkerGuard, String> {
    let appender = tracing_appender::rolling::daily(directory, "storyatlas.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_env_filter(default_filter(verbosity))
        .with_timer(LocalTime::rfc_3339())
        .with_target(false)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .map_err(|e| e.to_string())?;
    Ok(guard)
}
