//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, or `std::process`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator.

use std::path::PathBuf;

use thiserror::Error;

use crate::domain::renewal::Step;

// ── Exit codes ────────────────────────────────────────────────────────────────

/// Process exit code for failures that are not part of the renewal taxonomy
/// (bad configuration, invalid target, unwritable log file).
pub const EXIT_FAILURE: i32 = 1;
/// Process exit code when the SSH session could not be established.
pub const EXIT_CONNECTION: i32 = 3;
/// Process exit code when a remote command exited non-zero.
pub const EXIT_COMMAND: i32 = 4;
/// Process exit code when the archive could not be copied locally.
pub const EXIT_TRANSFER: i32 = 5;

// ── Renewal errors ────────────────────────────────────────────────────────────

/// Terminal failures of a renewal run. None of them is retried.
#[derive(Debug, Error)]
pub enum RenewalError {
    #[error("cannot connect to {user}@{host}: {reason}")]
    Connection {
        host: String,
        user: String,
        reason: String,
    },

    #[error("{step} command failed ({}): {command}{}", exit_label(*.code), detail(.stderr))]
    Command {
        step: Step,
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("cannot transfer {remote} to {}: {reason}", .local.display())]
    Transfer {
        remote: String,
        local: PathBuf,
        reason: String,
    },
}

impl RenewalError {
    /// The pipeline step that produced this error.
    #[must_use]
    pub fn step(&self) -> Step {
        match self {
            Self::Connection { .. } => Step::Connect,
            Self::Command { step, .. } => *step,
            Self::Transfer { .. } => Step::Transfer,
        }
    }

    /// Taxonomy name used in log records.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Connection { .. } => "ConnectionError",
            Self::Command { .. } => "CommandError",
            Self::Transfer { .. } => "TransferError",
        }
    }

    /// Process exit code reported for this error.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Connection { .. } => EXIT_CONNECTION,
            Self::Command { .. } => EXIT_COMMAND,
            Self::Transfer { .. } => EXIT_TRANSFER,
        }
    }
}

/// Maps any top-level error to the process exit code.
///
/// Renewal failures keep their dedicated codes even when wrapped in context;
/// everything else exits with [`EXIT_FAILURE`].
#[must_use]
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<RenewalError>())
        .map_or(EXIT_FAILURE, RenewalError::exit_code)
}

fn exit_label(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "no exit code".to_string(),
    }
}

fn detail(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("\n{trimmed}")
    }
}

// ── Target errors ─────────────────────────────────────────────────────────────

/// Errors related to the invocation parameters.
#[derive(Debug, Error)]
pub enum TargetError {
    #[error("Invalid host '{0}': expected a hostname or IP address")]
    InvalidHost(String),

    #[error("Invalid SSH user '{0}': expected a POSIX login name")]
    InvalidUser(String),

    #[error("Backup destination must not be empty")]
    EmptyDestination,
}

// ── Config errors ─────────────────────────────────────────────────────────────

/// Errors related to configuration validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}\n\n{hint}")]
    InvalidValue {
        key: &'static str,
        value: String,
        hint: &'static str,
    },
}
