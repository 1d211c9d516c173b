//! Progress bar helpers
//!
//! Consistent spinner styling for downloads and extraction. Every constructor
//! takes an `enabled` flag and returns a hidden bar when progress is off, so
//! callers never branch on it.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Standard spinner characters used throughout speedclone
const SPINNER_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// Standard tick interval for spinners
const TICK_INTERVAL_MS: u64 = 80;

fn styled(template: &str) -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template(template)
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars(SPINNER_CHARS)
}

/// Create a spinner progress bar with standard styling.
pub fn create_spinner(message: &str, enabled: bool) -> ProgressBar {
    if !enabled {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(styled("     {spinner:.cyan} {msg}"));
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(TICK_INTERVAL_MS));
    pb
}

/// Create a spinner that counts transferred bytes.
///
/// Archive endpoints usually stream without a content length, so this shows
/// bytes and throughput instead of a bar. Feed it with `ProgressBar::wrap_read`.
pub fn create_byte_spinner(message: &str, enabled: bool) -> ProgressBar {
    if !enabled {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(styled(
        "     {spinner:.cyan} {msg} {bytes} ({bytes_per_sec})",
    ));
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(TICK_INTERVAL_MS));
    pb
}

/// RAII guard that clears a progress bar when dropped.
///
/// Keeps the terminal clean when a tier fails halfway through a download.
pub struct ProgressGuard(ProgressBar);

impl ProgressGuard {
    pub fn new(pb: ProgressBar) -> Self {
        Self(pb)
    }

    pub fn bar(&self) -> &ProgressBar {
        &self.0
    }
}

impl Drop for ProgressGuard {
    fn drop(&mut self) {
        self.0.finish_and_clear();
    }
}
