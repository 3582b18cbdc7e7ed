//! Application context: state shared by command handlers that talk to a
//! remote host.
//!
//! Built once in `Cli::run()`: it loads the configuration, installs the run
//! log, and prepares terminal output.

use std::path::PathBuf;

use anyhow::Result;

use crate::application::ports::ConfigStore;
use crate::domain::RenewerConfig;
use crate::infra::config::YamlConfigStore;
use crate::infra::logging;
use crate::output::OutputContext;

/// Flags passed from the top-level CLI to `AppContext::new`.
pub struct AppFlags {
    /// Disable ANSI color output.
    pub no_color: bool,
    /// Suppress non-error output.
    pub quiet: bool,
    /// Mirror log records on stderr.
    pub verbose: bool,
    /// Configuration file given on the command line.
    pub config: Option<PathBuf>,
}

/// Unified application context passed to command handlers.
pub struct AppContext {
    /// Terminal output context (colors, quiet mode).
    pub output: OutputContext,
    /// Validated run settings.
    pub config: RenewerConfig,
    /// File receiving this run's log records.
    pub log_path: PathBuf,
}

impl AppContext {
    /// Load configuration and install logging.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is unreadable or invalid, or
    /// the log file cannot be opened.
    pub fn new(flags: &AppFlags) -> Result<Self> {
        Self::with_store(flags, &YamlConfigStore::new(flags.config.clone()))
    }

    /// Like [`AppContext::new`] with an explicit configuration source.
    ///
    /// # Errors
    ///
    /// See [`AppContext::new`].
    pub fn with_store(flags: &AppFlags, store: &impl ConfigStore) -> Result<Self> {
        let config = store.load()?;
        let log_path = logging::init(&config, flags.verbose)?;
        Ok(Self {
            output: OutputContext::new(flags.no_color, flags.quiet).with_verbose(flags.verbose),
            config,
            log_path,
        })
    }
}
