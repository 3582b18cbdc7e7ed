//! Shared test helpers: a scripted remote session, a recording reporter, and
//! output constructors.

#![allow(dead_code)]

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Output};
use std::rc::Rc;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use certrenewer::application::ports::{ProgressReporter, RemoteSession, SessionConnector};
use certrenewer::domain::RenewalTarget;

// ── Cross-platform ExitStatus construction ───────────────────────────────────

/// Build an `ExitStatus` from a logical exit code (0 = success, non-zero = failure).
///
/// On Unix the raw wait-status encodes the exit code in bits 8–15, so we shift.
#[cfg(unix)]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;
    ExitStatus::from_raw(code << 8)
}

#[cfg(windows)]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;
    #[allow(clippy::cast_sign_loss)]
    ExitStatus::from_raw(code as u32)
}

// ── Output constructors ──────────────────────────────────────────────────────

pub fn ok_output(stdout: &[u8]) -> Output {
    Output {
        status: exit_status(0),
        stdout: stdout.to_vec(),
        stderr: Vec::new(),
    }
}

pub fn err_output(code: i32, stderr: &[u8]) -> Output {
    Output {
        status: exit_status(code),
        stdout: Vec::new(),
        stderr: stderr.to_vec(),
    }
}

// ── Scripted remote session ──────────────────────────────────────────────────

/// Everything the service asked of the remote side, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Connect(String),
    Exec(String),
    Fetch(String, PathBuf),
    Close,
}

/// What `fetch` does when called.
#[derive(Clone)]
pub enum FetchBehavior {
    /// Write these bytes to the local path and exit 0.
    Write(Vec<u8>),
    /// Exit with `code` and `stderr`, leaving a partial file behind.
    Exit(i32, &'static str),
    /// The copy tool could not be run at all.
    SpawnError(&'static str),
    /// Exit 0 but leave a directory where the file should be.
    Directory,
}

#[derive(Clone)]
struct Script {
    connect_error: Option<&'static str>,
    exec: Vec<(&'static str, Output)>,
    exec_error: Option<&'static str>,
    fetch: FetchBehavior,
    close_error: bool,
}

/// A connector whose session follows a script and records every call.
///
/// Commands not matched by `on_exec` succeed with empty output.
#[derive(Clone)]
pub struct ScriptedConnector {
    script: Script,
    calls: Rc<RefCell<Vec<Call>>>,
}

impl Default for ScriptedConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedConnector {
    pub fn new() -> Self {
        Self {
            script: Script {
                connect_error: None,
                exec: Vec::new(),
                exec_error: None,
                fetch: FetchBehavior::Write(b"archive-bytes".to_vec()),
                close_error: false,
            },
            calls: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Make `connect` fail with `reason`.
    pub fn refuse(mut self, reason: &'static str) -> Self {
        self.script.connect_error = Some(reason);
        self
    }

    /// Answer commands containing `pattern` with `output`.
    pub fn on_exec(mut self, pattern: &'static str, output: Output) -> Self {
        self.script.exec.push((pattern, output));
        self
    }

    /// Make commands containing `pattern` fail to run at all.
    pub fn exec_spawn_error(mut self, pattern: &'static str) -> Self {
        self.script.exec_error = Some(pattern);
        self
    }

    pub fn fetch(mut self, behavior: FetchBehavior) -> Self {
        self.script.fetch = behavior;
        self
    }

    pub fn failing_close(mut self) -> Self {
        self.script.close_error = true;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn exec_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Exec(cmd) => Some(cmd),
                _ => None,
            })
            .collect()
    }

    pub fn close_count(&self) -> usize {
        self.calls().iter().filter(|c| **c == Call::Close).count()
    }

    pub fn fetch_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Fetch(..)))
            .count()
    }
}

pub struct ScriptedSession {
    script: Script,
    calls: Rc<RefCell<Vec<Call>>>,
}

impl SessionConnector for ScriptedConnector {
    type Session = ScriptedSession;

    async fn connect(&self, target: &RenewalTarget) -> Result<ScriptedSession> {
        self.calls
            .borrow_mut()
            .push(Call::Connect(format!("{}@{}", target.user, target.host)));
        if let Some(reason) = self.script.connect_error {
            anyhow::bail!("{reason}");
        }
        Ok(ScriptedSession {
            script: self.script.clone(),
            calls: Rc::clone(&self.calls),
        })
    }
}

impl RemoteSession for ScriptedSession {
    async fn exec(&self, command: &str) -> Result<Output> {
        self.calls.borrow_mut().push(Call::Exec(command.to_string()));
        if self
            .script
            .exec_error
            .is_some_and(|pattern| command.contains(pattern))
        {
            anyhow::bail!("ssh timed out after 600s");
        }
        Ok(self
            .script
            .exec
            .iter()
            .find(|(pattern, _)| command.contains(pattern))
            .map_or_else(|| ok_output(b""), |(_, output)| output.clone()))
    }

    async fn fetch(&self, remote: &str, local: &Path) -> Result<Output> {
        self.calls
            .borrow_mut()
            .push(Call::Fetch(remote.to_string(), local.to_path_buf()));
        match &self.script.fetch {
            FetchBehavior::Write(bytes) => match std::fs::write(local, bytes) {
                Ok(()) => Ok(ok_output(b"")),
                Err(e) => Ok(err_output(1, e.to_string().as_bytes())),
            },
            FetchBehavior::Exit(code, stderr) => {
                let _ = std::fs::write(local, b"trunc");
                Ok(err_output(*code, stderr.as_bytes()))
            }
            FetchBehavior::SpawnError(msg) => anyhow::bail!("{msg}"),
            FetchBehavior::Directory => {
                std::fs::create_dir_all(local)?;
                Ok(ok_output(b""))
            }
        }
    }

    async fn close(self) -> Result<()> {
        self.calls.borrow_mut().push(Call::Close);
        if self.script.close_error {
            anyhow::bail!("control socket already gone");
        }
        Ok(())
    }
}

// ── Recording reporter ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Step,
    Success,
    Warn,
    Fail,
}

#[derive(Default)]
pub struct RecordingReporter {
    events: RefCell<Vec<(Event, String)>>,
}

impl RecordingReporter {
    pub fn messages(&self, kind: Event) -> Vec<String> {
        self.events
            .borrow()
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, m)| m.clone())
            .collect()
    }
}

impl ProgressReporter for RecordingReporter {
    fn step(&self, message: &str) {
        self.events
            .borrow_mut()
            .push((Event::Step, message.to_string()));
    }
    fn success(&self, message: &str) {
        self.events
            .borrow_mut()
            .push((Event::Success, message.to_string()));
    }
    fn warn(&self, message: &str) {
        self.events
            .borrow_mut()
            .push((Event::Warn, message.to_string()));
    }
    fn fail(&self, message: &str) {
        self.events
            .borrow_mut()
            .push((Event::Fail, message.to_string()));
    }
}

// ── Log capture ──────────────────────────────────────────────────────────────

/// In-memory sink for `tracing` output, formatted like the log file but
/// without timestamps.
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl std::io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0
            .lock()
            .expect("log buffer poisoned")
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl LogCapture {
    /// Install as the thread's default subscriber until the guard drops.
    ///
    /// `#[tokio::test]` runs on the current thread, so every record the
    /// service emits lands here.
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let sink = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || sink.clone())
            .with_ansi(false)
            .without_time()
            .with_max_level(tracing::Level::INFO)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn lines(&self) -> Vec<String> {
        let buf = self.0.lock().expect("log buffer poisoned");
        String::from_utf8_lossy(&buf)
            .lines()
            .map(str::to_string)
            .collect()
    }

    /// Index of the first line containing every needle.
    pub fn position(&self, needles: &[&str]) -> Option<usize> {
        self.lines()
            .iter()
            .position(|line| needles.iter().all(|n| line.contains(n)))
    }
}
