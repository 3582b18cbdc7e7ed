//! Colors for status marks and the run summary.

use owo_colors::Style;

/// Centralized stylesheet for CLI output colors. Plain by default.
#[derive(Default, Clone)]
pub struct Styles {
    /// Success marks (green)
    pub success: Style,
    /// Warning marks (yellow)
    pub warning: Style,
    /// Error marks (red)
    pub error: Style,
    /// Step arrows (cyan)
    pub info: Style,
    /// Summary keys
    pub dim: Style,
    /// Summary title
    pub header: Style,
}

impl Styles {
    /// Switch from plain output to colored marks.
    pub fn colorize(&mut self) {
        self.success = Style::new().green();
        self.warning = Style::new().yellow();
        self.error = Style::new().red();
        self.info = Style::new().cyan();
        self.dim = Style::new().dimmed();
        self.header = Style::new().bold();
    }
}
