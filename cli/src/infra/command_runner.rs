//! Infrastructure implementation of the `CommandRunner` port.
//!
//! Every `ssh`/`scp` invocation goes through here, so a hung remote command
//! or a stalled copy is bounded by the configured timeout.

use std::process::{Output, Stdio};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, warn};

use crate::application::ports::CommandRunner;

/// Production `CommandRunner` backed by `tokio::process`.
///
/// On timeout the child is killed explicitly before returning; dropping the
/// future alone would leave it running. Stdin is closed so a child can never
/// block waiting for input.
#[derive(Debug, Clone)]
pub struct TokioCommandRunner {
    timeout: Duration,
}

impl TokioCommandRunner {
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl CommandRunner for TokioCommandRunner {
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output> {
        self.run_with_timeout(program, args, self.timeout).await
    }

    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<Output> {
        debug!(program, ?args, timeout_secs = timeout.as_secs(), "spawning");
        let started = Instant::now();

        let mut child = tokio::process::Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to spawn {program}"))?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let collected = tokio::time::timeout(timeout, async {
            tokio::join!(child.wait(), drain(stdout), drain(stderr))
        })
        .await;

        let Ok((status, stdout, stderr)) = collected else {
            let _ = child.kill().await;
            warn!(program, timeout_secs = timeout.as_secs(), "killed after timeout");
            anyhow::bail!("{program} timed out after {}s", timeout.as_secs());
        };

        let status = status.with_context(|| format!("waiting for {program}"))?;
        debug!(
            program,
            code = ?status.code(),
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "exited"
        );
        Ok(Output {
            status,
            stdout,
            stderr,
        })
    }
}

/// Read a child pipe to the end. A read error keeps what was read so far.
async fn drain<R: AsyncRead + Unpin>(pipe: Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        let _ = pipe.read_to_end(&mut buf).await;
    }
    buf
}
