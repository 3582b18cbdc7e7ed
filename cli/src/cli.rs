//! CLI argument parsing with clap derive

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::app::{AppContext, AppFlags};
use crate::commands;

/// Renew Let's Encrypt certificates on a remote host and back them up locally
#[derive(Parser)]
#[command(
    name = "certrenewer",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output (also set by a non-empty NO_COLOR)
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Also print log records to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file [default: ~/.certrenewer/config.yaml]
    #[arg(long, global = true, env = "CERTRENEWER_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Renew certificates and copy the archive to the backup destination
    Run(commands::run::RunArgs),

    /// Show version
    Version {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration or logging cannot be set up, or the
    /// command fails.
    pub async fn run(self) -> Result<()> {
        let Cli {
            quiet,
            no_color,
            verbose,
            config,
            command,
        } = self;
        match command {
            Command::Version { json } => commands::version::run(json),
            Command::Run(args) => {
                let app = AppContext::new(&AppFlags {
                    no_color,
                    quiet,
                    verbose,
                    config,
                })?;
                commands::run::run(&app, &args).await
            }
        }
    }
}
