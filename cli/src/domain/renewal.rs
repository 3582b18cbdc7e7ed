//! Renewal pipeline domain types and pure helpers.
//!
//! This module is intentionally free of I/O, async, and external layer imports.
//! Remote commands are built here as plain strings; executing them is the
//! job of the application layer.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::domain::config::RenewerConfig;

/// Substring certbot prints when no certificate was due for renewal.
pub const NO_RENEWALS_MARKER: &str = "No renewals were attempted";

/// Name of the symlink that tracks the newest dated backup directory.
pub const LATEST_LINK: &str = "latest";

/// One stage of a renewal run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Connect,
    Renew,
    Archive,
    Transfer,
    Cleanup,
    Link,
}

impl Step {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::Renew => "renew",
            Self::Archive => "archive",
            Self::Transfer => "transfer",
            Self::Cleanup => "cleanup",
            Self::Link => "link",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Local facts about a fetched archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveInfo {
    pub path: PathBuf,
    pub size: u64,
    pub sha256: String,
}

/// Outcome of a fully successful renewal run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenewalReport {
    /// The archive as stored in the backup destination.
    pub archive: ArchiveInfo,
    /// `true` when certbot reported that no certificate was due.
    pub nothing_due: bool,
    /// Target of the `latest` link, when dated backups updated it.
    pub latest: Option<String>,
}

/// Returns `true` when certbot's output says nothing was renewed.
#[must_use]
pub fn nothing_due(output: &[u8]) -> bool {
    String::from_utf8_lossy(output).contains(NO_RENEWALS_MARKER)
}

/// Full path of the archive on the remote host.
#[must_use]
pub fn remote_archive_path(config: &RenewerConfig) -> String {
    format!(
        "{}/{}",
        config.remote_tmp.trim_end_matches('/'),
        config.archive_name
    )
}

/// Remote command that bundles the certificate tree and hands the archive
/// to the SSH user, readable by that user only.
///
/// `cert_dir` is split so the archive holds the directory by name
/// (`letsencrypt/...`) rather than its absolute path.
#[must_use]
pub fn archive_command(config: &RenewerConfig, user: &str) -> String {
    let archive = remote_archive_path(config);
    let cert_dir = Path::new(&config.cert_dir);
    let parent = cert_dir
        .parent()
        .map_or_else(|| "/".to_string(), |p| p.display().to_string());
    let parent = if parent.is_empty() { "/".to_string() } else { parent };
    let name = cert_dir
        .file_name()
        .map_or_else(|| ".".to_string(), |n| n.to_string_lossy().into_owned());

    format!(
        "sudo tar -czf {archive} -C {parent} {name} && \
         sudo chown {user} {archive} && \
         sudo chmod 600 {archive}"
    )
}

/// Remote command that deletes the archive once it has been copied.
#[must_use]
pub fn cleanup_command(config: &RenewerConfig) -> String {
    format!("rm -f {}", remote_archive_path(config))
}

/// `YYYYMMDD` stamp used for dated backup directories.
#[must_use]
pub fn date_stamp(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// Directory that receives the archive for a run on `date`.
#[must_use]
pub fn backup_dir(destination: &Path, dated: bool, date: NaiveDate) -> PathBuf {
    if dated {
        destination.join(date_stamp(date))
    } else {
        destination.to_path_buf()
    }
}

/// Hidden name the archive is fetched under before it replaces the final file.
#[must_use]
pub fn staging_name(archive_name: &str) -> String {
    format!(".{archive_name}.partial")
}

/// Lowercase hex encoding of a digest.
#[must_use]
pub fn hex_encode(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for &b in bytes {
        out.push(char::from(HEX[(b >> 4) as usize]));
        out.push(char::from(HEX[(b & 0xf) as usize]));
    }
    out
}
