//! Run log: timestamped records appended to `<log_dir>/<log_file>`, with an
//! optional untimed mirror on stderr.
//!
//! `RUST_LOG` overrides the default `info` level of both outputs.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;
use tracing_subscriber::{EnvFilter, Layer as _, fmt};

use crate::domain::RenewerConfig;

/// Resolve the log file path for `config`.
#[must_use]
pub fn log_path(config: &RenewerConfig) -> PathBuf {
    Path::new(&config.log_dir).join(&config.log_file)
}

/// Open the log file for appending, creating its directory if absent.
///
/// # Errors
///
/// Returns an error if the directory or file cannot be created.
pub fn open_log_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("cannot create log directory {}", parent.display()))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("cannot open log file {}", path.display()))
}

/// Install the global subscriber. Returns the log file path.
///
/// With `verbose`, records are mirrored to stderr; otherwise the terminal
/// only shows progress lines and the final error.
///
/// # Errors
///
/// Returns an error if the log file cannot be opened or a global subscriber
/// is already installed.
pub fn init(config: &RenewerConfig, verbose: bool) -> Result<PathBuf> {
    let path = log_path(config);
    let file = open_log_file(&path)?;

    let file_layer = fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .with_filter(env_filter());

    let stderr_layer = verbose.then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .without_time()
            .with_target(false)
            .with_filter(env_filter())
    });

    tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .context("cannot install log subscriber")?;
    Ok(path)
}

fn env_filter() -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy()
}
