//! Progress bars for transfer commands
//!
//! Thin wrapper over `indicatif` that stays invisible in quiet, JSON,
//! and `--no-progress` modes. The wrapper is `Clone` so a copy can be
//! moved into a transfer progress callback.

use super::OutputConfig;

/// Byte-count progress bar
#[derive(Debug, Clone)]
pub struct ProgressBar {
    bar: Option<indicatif::ProgressBar>,
}

impl ProgressBar {
    /// Create a progress bar for `total` bytes
    pub fn new(config: OutputConfig, total: u64) -> Self {
        let bar = if config.quiet || config.json || config.no_progress {
            None
        } else {
            let bar = indicatif::ProgressBar::new(total);
            bar.set_style(
                indicatif::ProgressStyle::default_bar()
                    .template("{spinner:.green} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
                    .expect("valid template")
                    .progress_chars("#>-"),
            );
            Some(bar)
        };

        Self { bar }
    }

    /// Advance by `delta` bytes
    pub fn inc(&self, delta: u64) {
        if let Some(bar) = &self.bar {
            bar.inc(delta);
        }
    }

    /// Finish and erase the bar so following output starts on a clean line
    pub fn finish_and_clear(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }

    /// Check if the bar is actually drawn
    pub fn is_visible(&self) -> bool {
        self.bar.is_some()
    }
}
