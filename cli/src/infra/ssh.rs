//! OpenSSH-backed remote sessions.
//!
//! A session is an `ssh` control master (`ControlMaster=yes`, backgrounded
//! with `-f -N`) whose socket lives in a private temporary directory. Remote
//! commands and `scp` transfers are multiplexed over that socket, so the
//! host is authenticated exactly once per run.
//!
//! Host keys are checked against the user's known_hosts and `BatchMode=yes`
//! turns every interactive prompt into a failure.

use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::Duration;

use anyhow::{Context, Result};
use tempfile::TempDir;
use tracing::debug;

use crate::application::ports::{CommandRunner, RemoteSession, SessionConnector};
use crate::domain::RenewalTarget;

/// Extra time granted to the `ssh` process beyond its own `ConnectTimeout`.
const CONNECT_GRACE: Duration = Duration::from_secs(5);

/// Timeout for tearing the control master down.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(10);

/// Opens [`OpenSshSession`]s with the system `ssh` client.
pub struct OpenSshConnector<R> {
    runner: R,
    connect_timeout: Duration,
    ssh_program: String,
    scp_program: String,
}

impl<R: CommandRunner + Clone> OpenSshConnector<R> {
    #[must_use]
    pub fn new(runner: R, connect_timeout: Duration) -> Self {
        Self {
            runner,
            connect_timeout,
            ssh_program: "ssh".to_string(),
            scp_program: "scp".to_string(),
        }
    }

    /// Use different client binaries (e.g. a wrapper script).
    #[must_use]
    pub fn with_programs(mut self, ssh: impl Into<String>, scp: impl Into<String>) -> Self {
        self.ssh_program = ssh.into();
        self.scp_program = scp.into();
        self
    }
}

impl<R: CommandRunner + Clone> SessionConnector for OpenSshConnector<R> {
    type Session = OpenSshSession<R>;

    async fn connect(&self, target: &RenewalTarget) -> Result<OpenSshSession<R>> {
        let control_dir = tempfile::Builder::new()
            .prefix("certrenewer-")
            .tempdir()
            .context("cannot create control socket directory")?;
        let control_path = control_dir.path().join("ctl");

        let args = master_args(target, &control_path, self.connect_timeout);
        let argv: Vec<&str> = args.iter().map(String::as_str).collect();
        let output = self
            .runner
            .run_with_timeout(&self.ssh_program, &argv, self.connect_timeout + CONNECT_GRACE)
            .await?;

        if !output.status.success() {
            anyhow::bail!(failure_reason(&self.ssh_program, &output));
        }
        debug!(control_path = %control_path.display(), "ssh control master started");

        Ok(OpenSshSession {
            runner: self.runner.clone(),
            ssh_program: self.ssh_program.clone(),
            scp_program: self.scp_program.clone(),
            target: target.clone(),
            control_path,
            _control_dir: control_dir,
            closed: false,
        })
    }
}

/// A live control master. Dropping it unclosed still shuts the master down.
pub struct OpenSshSession<R> {
    runner: R,
    ssh_program: String,
    scp_program: String,
    target: RenewalTarget,
    control_path: PathBuf,
    _control_dir: TempDir,
    closed: bool,
}

impl<R> OpenSshSession<R> {
    /// Path of the control socket.
    #[must_use]
    pub fn control_path(&self) -> &Path {
        &self.control_path
    }

    fn control_option(&self) -> String {
        format!("ControlPath={}", self.control_path.display())
    }

    fn exit_args(&self) -> Vec<String> {
        vec![
            "-o".to_string(),
            self.control_option(),
            "-O".to_string(),
            "exit".to_string(),
            "-l".to_string(),
            self.target.user.clone(),
            self.target.host.clone(),
        ]
    }
}

impl<R: CommandRunner> RemoteSession for OpenSshSession<R> {
    async fn exec(&self, command: &str) -> Result<Output> {
        let control = self.control_option();
        let args = [
            "-o",
            "BatchMode=yes",
            "-o",
            "ControlMaster=no",
            "-o",
            control.as_str(),
            "-l",
            self.target.user.as_str(),
            self.target.host.as_str(),
            command,
        ];
        self.runner.run(&self.ssh_program, &args).await
    }

    async fn fetch(&self, remote: &str, local: &Path) -> Result<Output> {
        let control = self.control_option();
        let source = self.target.scp_remote(remote);
        let local = local
            .to_str()
            .with_context(|| format!("local path is not valid UTF-8: {}", local.display()))?;
        let args = [
            "-q",
            "-o",
            "BatchMode=yes",
            "-o",
            "ControlMaster=no",
            "-o",
            control.as_str(),
            source.as_str(),
            local,
        ];
        self.runner.run(&self.scp_program, &args).await
    }

    async fn close(mut self) -> Result<()> {
        self.closed = true;
        let args = self.exit_args();
        let argv: Vec<&str> = args.iter().map(String::as_str).collect();
        let output = self
            .runner
            .run_with_timeout(&self.ssh_program, &argv, CLOSE_TIMEOUT)
            .await?;
        anyhow::ensure!(
            output.status.success(),
            failure_reason(&self.ssh_program, &output)
        );
        Ok(())
    }
}

impl<R> Drop for OpenSshSession<R> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        debug!("closing ssh control master from drop");
        let _ = std::process::Command::new(&self.ssh_program)
            .args(self.exit_args())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();
    }
}

fn master_args(target: &RenewalTarget, control_path: &Path, timeout: Duration) -> Vec<String> {
    vec![
        "-o".to_string(),
        "BatchMode=yes".to_string(),
        "-o".to_string(),
        format!("ConnectTimeout={}", timeout.as_secs().max(1)),
        "-o".to_string(),
        "ControlMaster=yes".to_string(),
        "-o".to_string(),
        format!("ControlPath={}", control_path.display()),
        "-o".to_string(),
        "ControlPersist=yes".to_string(),
        "-f".to_string(),
        "-N".to_string(),
        "-l".to_string(),
        target.user.clone(),
        target.host.clone(),
    ]
}

fn failure_reason(program: &str, output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();
    if !stderr.is_empty() {
        return stderr.to_string();
    }
    match output.status.code() {
        Some(code) => format!("{program} exited with code {code}"),
        None => format!("{program} was terminated by a signal"),
    }
}
