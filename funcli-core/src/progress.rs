//! Reporting seam for import progress, plus the pure helpers renderers share.
//!
//! Core code only calls [`ImportReporter`]; what gets printed (and whether
//! anything does) is up to the implementor. [`SilentReporter`] discards
//! everything and is what tests use.

use crate::contract::ImportSession;

/// Width of the progress bar in cells.
pub const BAR_WIDTH: usize = 20;

/// Events emitted while an import runs. Every method defaults to a no-op.
pub trait ImportReporter: Send + Sync {
    fn session_resumed(&self, _session_id: &str) {}

    fn obsidian_detected(&self) {}

    fn scan_started(&self) {}

    fn scan_finished(&self, _files: usize, _total_bytes: u64) {}

    fn session_created(&self, _session_id: &str) {}

    fn manifest_submitting(&self) {}

    fn manifest_submitted(&self, _to_upload: usize, _already_uploaded: usize) {}

    /// Called after each acknowledged upload; `done` never decreases.
    fn upload_progress(&self, _done: usize, _total: usize) {}

    fn uploads_finished(&self) {}

    fn processing_started(&self, _session_id: &str) {}

    fn retry_requested(&self, _session_id: &str) {}

    /// Called after every status poll.
    fn processing_progress(&self, _session: &ImportSession, _percent: u8) {}

    fn import_finished(&self, _session: &ImportSession) {}
}

/// Reporter that drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentReporter;

impl ImportReporter for SilentReporter {}

/// `round(done / total * 100)`, clamped to 0..=100; 0 when `total` is 0.
pub fn percentage(done: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    let pct = (done as f64 / total as f64 * 100.0).round();
    pct.clamp(0.0, 100.0) as u8
}

/// `[████░░░░]`-style bar of `width` cells.
pub fn progress_bar(percent: u8, width: usize) -> String {
    let percent = percent.min(100) as usize;
    let filled = ((width * percent) as f64 / 100.0).round() as usize;
    let filled = filled.min(width);
    format!("[{}{}]", "█".repeat(filled), "░".repeat(width - filled))
}
