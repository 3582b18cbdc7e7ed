//! Run command: renew certificates on the remote host and back them up.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::services::renewal::{RenewalPlan, renew_and_backup};
use crate::domain::{RenewalReport, RenewalTarget};
use crate::infra::command_runner::TokioCommandRunner;
use crate::infra::fs::LocalBackupStore;
use crate::infra::ssh::OpenSshConnector;
use crate::output::{OutputContext, TerminalReporter};

/// Arguments for the run command.
#[derive(Args)]
pub struct RunArgs {
    /// Host running certbot
    #[arg(long, env = "ZEPPELIN_HOST", value_name = "HOST")]
    pub zeppelin_host: String,

    /// Login user on that host; needs passwordless sudo
    #[arg(long, env = "ZEPPELIN_USER", value_name = "USER")]
    pub zeppelin_user: String,

    /// Local directory receiving the archive
    #[arg(long, env = "DATA_BACKUP_DEST", value_name = "PATH")]
    pub data_backup_dest: PathBuf,
}

/// Entry point for `certrenewer run`.
///
/// # Errors
///
/// Returns an error if the arguments are invalid or any pipeline step fails.
/// Pipeline failures carry a `RenewalError` for exit code mapping.
pub async fn run(app: &AppContext, args: &RunArgs) -> Result<()> {
    let target = RenewalTarget::new(
        args.zeppelin_host.as_str(),
        args.zeppelin_user.as_str(),
        args.data_backup_dest.as_path(),
    )?;
    let config = &app.config;

    let runner = TokioCommandRunner::new(config.command_timeout());
    let connector = OpenSshConnector::new(runner, config.connect_timeout());
    let reporter = TerminalReporter::new(&app.output);
    let plan = RenewalPlan {
        target: &target,
        config,
        date: chrono::Local::now().date_naive(),
    };

    let report = renew_and_backup(&connector, &LocalBackupStore, &reporter, &plan).await?;
    drop(reporter);

    print_summary(&app.output, &report, &app.log_path);
    Ok(())
}

fn print_summary(ctx: &OutputContext, report: &RenewalReport, log_path: &Path) {
    if ctx.quiet {
        return;
    }
    println!();
    ctx.header("Backup complete");
    if report.nothing_due {
        ctx.kv("renewal ", "no certificates were due");
    }
    ctx.kv("archive ", &report.archive.path.display().to_string());
    ctx.kv("size    ", &format!("{} bytes", report.archive.size));
    ctx.kv("sha256  ", &report.archive.sha256);
    if let Some(latest) = &report.latest {
        ctx.kv("latest  ", &format!("-> {latest}"));
    }
    ctx.kv("log     ", &log_path.display().to_string());
}
