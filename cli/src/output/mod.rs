//! Terminal output: styled status lines, spinners, and the progress reporter
//! handed to the renewal service.
//!
//! Everything except errors is silenced by `--quiet`; errors go to stderr.

pub mod progress;
pub mod reporter;
pub mod styles;

use console::Term;
use owo_colors::{OwoColorize as _, Style};
pub use reporter::TerminalReporter;
pub use styles::Styles;

/// Styling and terminal state for one invocation.
pub struct OutputContext {
    pub styles: Styles,
    /// Whether stdout is a TTY.
    pub is_tty: bool,
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Log records are mirrored on stderr.
    pub verbose: bool,
}

impl OutputContext {
    /// Colors are used only on a TTY, without `--no-color` or `NO_COLOR`.
    #[must_use]
    pub fn new(no_color: bool, quiet: bool) -> Self {
        let is_tty = Term::stdout().is_term();
        let mut styles = Styles::default();
        if !no_color && is_tty && !no_color_env() {
            styles.colorize();
        }
        Self {
            styles,
            is_tty,
            quiet,
            verbose: false,
        }
    }

    #[must_use]
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Spinners are only drawn on an interactive, non-quiet terminal, and
    /// never while log records are written to stderr.
    #[must_use]
    pub fn show_progress(&self) -> bool {
        self.is_tty && !self.quiet && !self.verbose
    }

    /// `  → msg`
    pub fn step(&self, msg: &str) {
        self.line("→", self.styles.info, msg);
    }

    /// `  ✓ msg`
    pub fn success(&self, msg: &str) {
        self.line("✓", self.styles.success, msg);
    }

    /// `  ⚠ msg`
    pub fn warn(&self, msg: &str) {
        self.line("⚠", self.styles.warning, msg);
    }

    /// `  ✗ msg` on stderr, printed even when quiet.
    pub fn error(&self, msg: &str) {
        eprintln!("  {} {msg}", "✗".style(self.styles.error));
    }

    pub fn header(&self, msg: &str) {
        if !self.quiet {
            println!("  {}", msg.style(self.styles.header));
        }
    }

    /// Summary row with the key dimmed.
    pub fn kv(&self, key: &str, value: &str) {
        if !self.quiet {
            println!("  {}  {value}", key.style(self.styles.dim));
        }
    }

    fn line(&self, mark: &str, style: Style, msg: &str) {
        if !self.quiet {
            println!("  {} {msg}", mark.style(style));
        }
    }
}

/// `NO_COLOR` disables colors when set to any non-empty value.
fn no_color_env() -> bool {
    std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty())
}
