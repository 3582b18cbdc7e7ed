//! The remote host a run operates on, and where its backup goes.
//!
//! Host and user are passed straight to `ssh`/`scp`, so both are checked
//! here before any process is spawned.

use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;

use crate::domain::error::TargetError;

/// Hostname, IPv4 or IPv6 literal. Must not start with `-` so it can never
/// be read as an option by the SSH client.
static HOST_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^[A-Za-z0-9:][A-Za-z0-9._:-]{0,252}$").expect("valid regex")
});

/// POSIX portable login name, at most 32 characters. No leading `-`.
static USER_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9._-]{0,31}$").expect("valid regex")
});

/// Invocation parameters of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenewalTarget {
    pub host: String,
    pub user: String,
    pub destination: PathBuf,
}

impl RenewalTarget {
    /// Validates and builds a target.
    ///
    /// # Errors
    ///
    /// Returns a [`TargetError`] if the host or user is malformed or the
    /// destination is empty.
    pub fn new(
        host: impl Into<String>,
        user: impl Into<String>,
        destination: impl Into<PathBuf>,
    ) -> Result<Self, TargetError> {
        let host = host.into();
        let user = user.into();
        let destination = destination.into();

        validate_host(&host)?;
        validate_user(&user)?;
        if destination.as_os_str().is_empty() {
            return Err(TargetError::EmptyDestination);
        }
        Ok(Self {
            host,
            user,
            destination,
        })
    }

    /// `user@host` as understood by `scp`, bracketing IPv6 literals.
    #[must_use]
    pub fn scp_remote(&self, path: &str) -> String {
        if self.host.contains(':') {
            format!("{}@[{}]:{path}", self.user, self.host)
        } else {
            format!("{}@{}:{path}", self.user, self.host)
        }
    }
}

/// # Errors
///
/// Returns [`TargetError::InvalidHost`] if `host` is not a plausible hostname
/// or IP literal.
pub fn validate_host(host: &str) -> Result<(), TargetError> {
    if HOST_RE.is_match(host) {
        Ok(())
    } else {
        Err(TargetError::InvalidHost(host.to_string()))
    }
}

/// # Errors
///
/// Returns [`TargetError::InvalidUser`] if `user` is not a POSIX login name.
pub fn validate_user(user: &str) -> Result<(), TargetError> {
    if USER_RE.is_match(user) {
        Ok(())
    } else {
        Err(TargetError::InvalidUser(user.to_string()))
    }
}
