//! Application service: renew-and-backup use-case.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.
//! All I/O is routed through injected port traits.
//!
//! The run is strictly sequential: connect, renew, archive, transfer. Any
//! failure ends the run; later steps are never attempted. Cleanup of the
//! remote archive and the `latest` link are best-effort and only warn.

use std::path::Path;
use std::process::Output;

use chrono::NaiveDate;
use tracing::{debug, error, info, warn};

use crate::application::ports::{BackupStore, ProgressReporter, RemoteSession, SessionConnector};
use crate::domain::renewal::{
    archive_command, backup_dir, cleanup_command, date_stamp, nothing_due, remote_archive_path,
    staging_name,
};
use crate::domain::{ArchiveInfo, RenewalError, RenewalReport, RenewalTarget, RenewerConfig, Step};

/// Inputs of one run.
pub struct RenewalPlan<'a> {
    pub target: &'a RenewalTarget,
    pub config: &'a RenewerConfig,
    /// Local date used for dated backup directories.
    pub date: NaiveDate,
}

/// Renew certificates on the target host and copy the archive locally.
///
/// The session opened here is closed before returning, on success and on
/// failure alike.
///
/// # Errors
///
/// Returns the [`RenewalError`] of the first step that failed. The error has
/// already been logged and reported when this returns.
pub async fn renew_and_backup<C: SessionConnector>(
    connector: &C,
    store: &impl BackupStore,
    reporter: &impl ProgressReporter,
    plan: &RenewalPlan<'_>,
) -> Result<RenewalReport, RenewalError> {
    let target = plan.target;
    info!(
        host = %target.host,
        user = %target.user,
        destination = %target.destination.display(),
        "starting renewal and backup"
    );

    reporter.step(&format!("connecting to {}@{}...", target.user, target.host));
    info!(step = %Step::Connect, "step started");
    let session = match connector.connect(target).await {
        Ok(session) => session,
        Err(e) => {
            return Err(failed(
                reporter,
                RenewalError::Connection {
                    host: target.host.clone(),
                    user: target.user.clone(),
                    reason: format!("{e:#}"),
                },
            ));
        }
    };
    succeeded(reporter, Step::Connect, &format!("connected to {}", target.host));

    let result = run_session(&session, store, reporter, plan)
        .await
        .map_err(|e| failed(reporter, e));

    match session.close().await {
        Ok(()) => debug!("remote session closed"),
        Err(e) => warn!(error = %format!("{e:#}"), "failed to close remote session"),
    }

    if let Ok(report) = &result {
        info!(
            archive = %report.archive.path.display(),
            "renewal and backup completed successfully"
        );
    }
    result
}

async fn run_session(
    session: &impl RemoteSession,
    store: &impl BackupStore,
    reporter: &impl ProgressReporter,
    plan: &RenewalPlan<'_>,
) -> Result<RenewalReport, RenewalError> {
    let RenewalPlan { target, config, date } = plan;

    // renew
    reporter.step("renewing certificates...");
    let output = run_step(session, Step::Renew, &config.renew_command).await?;
    let idle = nothing_due(&output.stdout) || nothing_due(&output.stderr);
    if idle {
        info!(step = %Step::Renew, "no certificates were due for renewal");
        succeeded(reporter, Step::Renew, "no certificates were due for renewal");
    } else {
        succeeded(reporter, Step::Renew, "certificates renewed");
    }

    // archive
    reporter.step("archiving certificates...");
    run_step(session, Step::Archive, &archive_command(config, &target.user)).await?;
    let remote = remote_archive_path(config);
    succeeded(reporter, Step::Archive, &format!("archive created at {remote}"));

    // transfer
    reporter.step("copying archive...");
    let archive = transfer(session, store, target, config, *date, &remote).await?;
    info!(
        step = %Step::Transfer,
        path = %archive.path.display(),
        bytes = archive.size,
        sha256 = %archive.sha256,
        "archive stored"
    );
    succeeded(
        reporter,
        Step::Transfer,
        &format!("archive copied to {}", archive.path.display()),
    );

    if config.remove_remote_archive {
        cleanup(session, reporter, config).await;
    }

    let latest = if config.dated_backups {
        link_latest(store, reporter, &target.destination, *date)
    } else {
        None
    };

    Ok(RenewalReport {
        archive,
        nothing_due: idle,
        latest,
    })
}

/// Execute one remote command, turning a spawn error or non-zero exit into
/// a [`RenewalError::Command`].
async fn run_step(
    session: &impl RemoteSession,
    step: Step,
    command: &str,
) -> Result<Output, RenewalError> {
    info!(step = %step, command, "step started");
    let output = session
        .exec(command)
        .await
        .map_err(|e| RenewalError::Command {
            step,
            command: command.to_string(),
            code: None,
            stderr: format!("{e:#}"),
        })?;

    log_output(step, &output);
    if !output.status.success() {
        return Err(RenewalError::Command {
            step,
            command: command.to_string(),
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }
    Ok(output)
}

async fn transfer(
    session: &impl RemoteSession,
    store: &impl BackupStore,
    target: &RenewalTarget,
    config: &RenewerConfig,
    date: NaiveDate,
    remote: &str,
) -> Result<ArchiveInfo, RenewalError> {
    let dir = backup_dir(&target.destination, config.dated_backups, date);
    let final_path = dir.join(&config.archive_name);
    info!(step = %Step::Transfer, remote, local = %final_path.display(), "step started");

    store
        .prepare_dir(&dir)
        .map_err(|e| transfer_error(remote, &final_path, format!("{e:#}")))?;

    let staged = dir.join(staging_name(&config.archive_name));
    let reason = match session.fetch(remote, &staged).await {
        Ok(output) if output.status.success() => None,
        Ok(output) => Some(fetch_failure(&output)),
        Err(e) => Some(format!("{e:#}")),
    };
    if let Some(reason) = reason {
        store.discard(&staged);
        return Err(transfer_error(remote, &final_path, reason));
    }

    store.finalize(&staged, &final_path).map_err(|e| {
        store.discard(&staged);
        transfer_error(remote, &final_path, format!("{e:#}"))
    })
}

async fn cleanup(
    session: &impl RemoteSession,
    reporter: &impl ProgressReporter,
    config: &RenewerConfig,
) {
    let command = cleanup_command(config);
    match run_step(session, Step::Cleanup, &command).await {
        Ok(_) => info!(step = %Step::Cleanup, "step succeeded"),
        Err(e) => {
            warn!(step = %Step::Cleanup, error = %e, "remote archive was not removed");
            reporter.warn("remote archive was not removed");
        }
    }
}

fn link_latest(
    store: &impl BackupStore,
    reporter: &impl ProgressReporter,
    destination: &Path,
    date: NaiveDate,
) -> Option<String> {
    let stamp = date_stamp(date);
    match store.update_latest_link(destination, &stamp) {
        Ok(()) => {
            info!(step = %Step::Link, latest = %stamp, "updated 'latest' symlink");
            Some(stamp)
        }
        Err(e) => {
            warn!(step = %Step::Link, error = %format!("{e:#}"), "cannot update 'latest' symlink");
            reporter.warn(&format!("cannot update 'latest' symlink: {e:#}"));
            None
        }
    }
}

fn log_output(step: Step, output: &Output) {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stdout.trim().is_empty() {
        info!(step = %step, stdout = %stdout.trim(), "command output");
    }
    if !stderr.trim().is_empty() {
        debug!(step = %step, stderr = %stderr.trim(), "command stderr");
    }
}

fn fetch_failure(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();
    match (output.status.code(), stderr.is_empty()) {
        (_, false) => stderr.to_string(),
        (Some(code), true) => format!("copy exited with code {code}"),
        (None, true) => "copy was terminated by a signal".to_string(),
    }
}

fn transfer_error(remote: &str, local: &Path, reason: String) -> RenewalError {
    RenewalError::Transfer {
        remote: remote.to_string(),
        local: local.to_path_buf(),
        reason,
    }
}

fn succeeded(reporter: &impl ProgressReporter, step: Step, message: &str) {
    info!(step = %step, "step succeeded");
    reporter.success(message);
}

fn failed(reporter: &impl ProgressReporter, err: RenewalError) -> RenewalError {
    error!(step = %err.step(), kind = err.kind(), error = %err, "step failed");
    reporter.fail(&err.to_string());
    err
}
