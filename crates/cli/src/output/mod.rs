//! Output formatting utilities
//!
//! Formatters for human-readable and JSON output, plus progress bars
//! that know when to stay invisible.

mod formatter;
mod progress;

pub use formatter::Formatter;
pub use progress::ProgressBar;

/// Output configuration derived from the global CLI flags
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputConfig {
    /// Use JSON output format
    pub json: bool,
    /// Disable colored output
    pub no_color: bool,
    /// Disable progress bars
    pub no_progress: bool,
    /// Suppress non-error output
    pub quiet: bool,
}
