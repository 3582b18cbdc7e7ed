//! Domain types and validators for certrenewer configuration.
//!
//! Pure functions only: no I/O, no async, no filesystem access.

use std::sync::LazyLock;
use std::time::Duration;

use anyhow::Result;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::error::ConfigError;

/// Characters allowed in paths that end up inside remote shell commands.
static REMOTE_PATH_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^/[A-Za-z0-9._/-]*$").expect("valid regex")
});

static FILE_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9._-]*$").expect("valid regex")
});

// ── Config schema ────────────────────────────────────────────────────────────

/// Run settings stored in `~/.certrenewer/config.yaml`.
///
/// Every field is optional in the file; missing fields take the built-in
/// defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenewerConfig {
    /// Local directory holding the log file.
    pub log_dir: String,
    /// Log file name inside `log_dir`.
    pub log_file: String,
    /// Remote directory the archive is written to.
    pub remote_tmp: String,
    /// File name of the archive, both remotely and locally.
    pub archive_name: String,
    /// Remote certificate tree to bundle.
    pub cert_dir: String,
    /// Remote command that performs the renewal.
    pub renew_command: String,
    /// Store each run under `<dest>/YYYYMMDD/` and maintain a `latest` link.
    pub dated_backups: bool,
    /// Delete the remote archive after a successful transfer.
    pub remove_remote_archive: bool,
    pub connect_timeout_secs: u64,
    pub command_timeout_secs: u64,
}

impl Default for RenewerConfig {
    fn default() -> Self {
        Self {
            log_dir: "logs".to_string(),
            log_file: "app.log".to_string(),
            remote_tmp: "/tmp".to_string(),
            archive_name: "certs.tar.gz".to_string(),
            cert_dir: "/etc/letsencrypt".to_string(),
            renew_command: "sudo certbot renew --quiet".to_string(),
            dated_backups: false,
            remove_remote_archive: true,
            connect_timeout_secs: 15,
            command_timeout_secs: 600,
        }
    }
}

impl RenewerConfig {
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    #[must_use]
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    /// Checks every field that is interpolated into remote commands or
    /// local paths.
    ///
    /// # Errors
    ///
    /// Returns the first invalid field as a [`ConfigError`].
    pub fn validate(&self) -> Result<()> {
        validate_file_name("log_file", &self.log_file)?;
        validate_file_name("archive_name", &self.archive_name)?;
        validate_remote_path("remote_tmp", &self.remote_tmp)?;
        validate_remote_path("cert_dir", &self.cert_dir)?;
        if self.cert_dir.trim_end_matches('/').is_empty() {
            return Err(invalid("cert_dir", &self.cert_dir, "cert_dir must not be '/'"));
        }
        if self.log_dir.trim().is_empty() {
            return Err(invalid("log_dir", &self.log_dir, "log_dir must not be empty"));
        }
        if self.renew_command.trim().is_empty() {
            return Err(invalid(
                "renew_command",
                &self.renew_command,
                "renew_command must not be empty",
            ));
        }
        if self.connect_timeout_secs == 0 {
            return Err(invalid("connect_timeout_secs", "0", "timeouts must be at least 1 second"));
        }
        if self.command_timeout_secs == 0 {
            return Err(invalid("command_timeout_secs", "0", "timeouts must be at least 1 second"));
        }
        Ok(())
    }
}

// ── Validators ───────────────────────────────────────────────────────────────

fn validate_file_name(key: &'static str, value: &str) -> Result<()> {
    if FILE_NAME_RE.is_match(value) {
        Ok(())
    } else {
        Err(invalid(
            key,
            value,
            "expected a plain file name (letters, digits, '.', '_', '-')",
        ))
    }
}

fn validate_remote_path(key: &'static str, value: &str) -> Result<()> {
    if REMOTE_PATH_RE.is_match(value) && !value.split('/').any(|part| part == "..") {
        Ok(())
    } else {
        Err(invalid(
            key,
            value,
            "expected an absolute path without spaces, quotes or '..'",
        ))
    }
}

fn invalid(key: &'static str, value: &str, hint: &'static str) -> anyhow::Error {
    ConfigError::InvalidValue {
        key,
        value: value.to_string(),
        hint,
    }
    .into()
}

// ── Unit tests ───────────────────────────────────────────────────────────────
