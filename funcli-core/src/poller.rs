use std::time::Duration;
use tracing::{debug, info};

use crate::contract::{ImportSession, RemoteApi};
use crate::error::{ImportError, Result};
use crate::progress::{percentage, ImportReporter};

/// Polls an import session until the server reports a terminal status.
///
/// There is no overall timeout: server-side processing time is unbounded.
/// Stopping the poll does not stop the remote session.
#[derive(Debug, Clone, Copy)]
pub struct ProgressPoller {
    interval: Duration,
}

impl ProgressPoller {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    /// Sleep, read, report; repeat until terminal. Returns the final read.
    pub async fn poll_until_terminal<A>(
        &self,
        api: &A,
        session_id: &str,
        reporter: &dyn ImportReporter,
    ) -> Result<ImportSession>
    where
        A: RemoteApi + ?Sized,
    {
        loop {
            tokio::time::sleep(self.interval).await;

            let session = api
                .get_import_session(session_id)
                .await
                .map_err(ImportError::remote("get import session"))?;

            let pct = percentage(session.processed_files, session.total_files);
            debug!(
                session_id,
                status = %session.status,
                processed = session.processed_files,
                total = session.total_files,
                "Polled import session"
            );
            reporter.processing_progress(&session, pct);

            if session.status.is_terminal() {
                info!(
                    session_id,
                    status = %session.status,
                    failed = session.failed_files,
                    processed = session.processed_files,
                    "Import session reached a terminal status"
                );
                reporter.import_finished(&session);
                return Ok(session);
            }
        }
    }
}
