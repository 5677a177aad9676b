use std::time::Duration;
use tracing::{debug, info};

/// Upload pool size used when nothing else is configured.
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Files hashed at once while building the manifest.
pub const DEFAULT_CHECKSUM_CONCURRENCY: usize = 8;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Tunables for an [`ImportSessionManager`](crate::import::ImportSessionManager).
#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Concurrent direct uploads. Values below 1 are treated as 1.
    pub concurrency: usize,
    /// Wildcard patterns matched against entry names during the scan.
    pub ignore: Vec<String>,
    pub poll_interval: Duration,
    pub checksum_concurrency: usize,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            ignore: Vec::new(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            checksum_concurrency: DEFAULT_CHECKSUM_CONCURRENCY,
        }
    }
}

impl ImportOptions {
    pub fn trace_loaded(&self) {
        info!(
            concurrency = self.concurrency,
            ignore_count = self.ignore.len(),
            poll_interval_ms = self.poll_interval.as_millis() as u64,
            "Loaded import options"
        );
        debug!(options = ?self, "Import options (full debug)");
    }

    pub(crate) fn effective_concurrency(&self) -> usize {
        self.concurrency.max(1)
    }
}
