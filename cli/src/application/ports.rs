//! Seams between the renewal service and the outside world.
//!
//! The service sees a remote host, a process runner, a local backup
//! directory and a progress sink only through these traits. Nothing here
//! depends on `crate::infra` or the presentation modules.

use std::path::{Path, PathBuf};
use std::process::Output;
use std::time::Duration;

use anyhow::Result;

use crate::domain::{ArchiveInfo, RenewalTarget, RenewerConfig};

// ── Remote Session Ports ──────────────────────────────────────────────────────

/// Opens authenticated sessions to a remote host.
#[allow(async_fn_in_trait)]
pub trait SessionConnector {
    type Session: RemoteSession;

    /// Establish a session to `target`.
    ///
    /// # Errors
    ///
    /// Returns an error if the host is unreachable, authentication fails,
    /// or the connect timeout expires.
    async fn connect(&self, target: &RenewalTarget) -> Result<Self::Session>;
}

/// An open session used for both command execution and file retrieval.
///
/// Callers must `close` the session on every exit path; implementations
/// should still release the connection if the value is dropped unclosed.
#[allow(async_fn_in_trait)]
pub trait RemoteSession {
    /// Run a shell command on the remote host and capture its output.
    ///
    /// A non-zero exit status is returned as `Ok`; `Err` means the command
    /// could not be run at all.
    async fn exec(&self, command: &str) -> Result<Output>;
    /// Copy `remote` from the remote host to the local path `local`.
    async fn fetch(&self, remote: &str, local: &Path) -> Result<Output>;
    /// Tear the session down.
    async fn close(self) -> Result<()>;
}

// ── Processes ─────────────────────────────────────────────────────────────────

/// Spawns local programs (`ssh`, `scp`) for the session implementation.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Same as `run_with_timeout` with the runner's default timeout.
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output>;
    /// Run `program` to completion, collecting stdout and stderr.
    ///
    /// # Errors
    ///
    /// Fails when the program cannot be started or is still running after
    /// `timeout`, in which case it has already been killed.
    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<Output>;
}

// ── Progress ──────────────────────────────────────────────────────────────────

/// Terminal feedback for the pipeline steps. The log file is written
/// separately through `tracing`.
pub trait ProgressReporter {
    /// A step has started.
    fn step(&self, message: &str);
    /// The current step finished.
    fn success(&self, message: &str);
    /// Something went wrong that does not stop the run.
    fn warn(&self, message: &str);
    /// The current step failed and the run is aborting.
    fn fail(&self, message: &str);
}

// ── Local Backup Port ─────────────────────────────────────────────────────────

/// Local side of the transfer: where archives land and how they are kept.
pub trait BackupStore {
    /// Create `dir` if needed and check that it accepts new files.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or written to.
    fn prepare_dir(&self, dir: &Path) -> Result<()>;
    /// Describe a fully fetched `staged` file, then move it over `target`.
    ///
    /// # Errors
    ///
    /// Returns an error if the digest or the rename fails. `target` is left
    /// untouched in both cases.
    fn finalize(&self, staged: &Path, target: &Path) -> Result<ArchiveInfo>;
    /// Remove a staged file left by a failed fetch. Best-effort.
    fn discard(&self, staged: &Path);
    /// Point `<destination>/latest` at the sibling directory `dir_name`.
    ///
    /// # Errors
    ///
    /// Returns an error if `latest` exists and is not a symlink, or the link
    /// cannot be replaced.
    fn update_latest_link(&self, destination: &Path, dir_name: &str) -> Result<()>;
}

// ── Config Port ───────────────────────────────────────────────────────────────

/// Abstracts where run settings come from.
pub trait ConfigStore {
    /// Load the configuration, falling back to defaults when no file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed, or
    /// if a value fails validation.
    fn load(&self) -> Result<RenewerConfig>;
    /// Resolve the configuration file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    fn path(&self) -> Result<PathBuf>;
}
