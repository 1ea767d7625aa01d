//! Progress indicators for long-running packaging operations.
//!
//! Progress output goes to stderr and is hidden entirely when disabled, so callers
//! can drive the bar unconditionally.
//!
//! # Examples
//!
//! ```rust,no_run
//! use pspack::utils::progress::ProgressBar;
//!
//! let progress = ProgressBar::new(3, true);
//! progress.set_message("Packaging files");
//! for _ in 0..3 {
//!     progress.inc(1);
//! }
//! progress.finish_and_clear();
//! ```

use indicatif::{ProgressBar as IndicatifBar, ProgressStyle as IndicatifStyle};

/// Thin wrapper over [`indicatif::ProgressBar`] with the pspack style applied.
#[derive(Clone)]
pub struct ProgressBar {
    inner: IndicatifBar,
}

impl ProgressBar {
    /// Creates a bar for `len` work units; a hidden bar when `enabled` is false.
    #[must_use]
    pub fn new(len: u64, enabled: bool) -> Self {
        let bar = if enabled {
            let bar = IndicatifBar::new(len);
            bar.set_style(default_style());
            bar
        } else {
            IndicatifBar::hidden()
        };
        Self {
            inner: bar,
        }
    }

    /// Creates a bar that never draws.
    #[must_use]
    pub fn hidden() -> Self {
        Self {
            inner: IndicatifBar::hidden(),
        }
    }

    /// Sets the message displayed next to the bar.
    pub fn set_message(&self, msg: impl Into<String>) {
        self.inner.set_message(msg.into());
    }

    /// Grows the total length, used when work is discovered incrementally.
    pub fn inc_length(&self, delta: u64) {
        self.inner.inc_length(delta);
    }

    /// Advances the bar.
    pub fn inc(&self, delta: u64) {
        self.inner.inc(delta);
    }

    /// Removes the bar from the terminal.
    pub fn finish_and_clear(&self) {
        self.inner.finish_and_clear();
    }
}

fn default_style() -> IndicatifStyle {
    IndicatifStyle::default_bar()
        .template("{prefix} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| IndicatifStyle::default_bar())
        .progress_chars("=>-")
}
