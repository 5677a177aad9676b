//! Bounded upload pool.
//!
//! Every file the server still needs (it carries a `direct_upload_url`) is put
//! on one shared queue. `min(concurrency, files)` workers pull from it until it
//! is empty. Per file, a worker transfers the content and then immediately
//! acknowledges it to the Remote API before taking the next file.
//!
//! A failed transfer or acknowledgement stops the pool: no worker takes a new
//! file, transfers already in flight finish, and the first error is returned.

use futures::future::join_all;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, info, warn};

use crate::contract::{ContentTransfer, FileUploadEntry, RemoteApi};
use crate::error::{ImportError, Result};
use crate::progress::ImportReporter;

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Debug)]
struct UploadJob {
    entry: FileUploadEntry,
    url: String,
    path: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UploadSummary {
    /// Files transferred and acknowledged in this run.
    pub uploaded: usize,
}

pub struct UploadScheduler<'a, A: ?Sized, T: ?Sized> {
    api: &'a A,
    transfer: &'a T,
    concurrency: usize,
}

impl<'a, A, T> UploadScheduler<'a, A, T>
where
    A: RemoteApi + ?Sized,
    T: ContentTransfer + ?Sized,
{
    pub fn new(api: &'a A, transfer: &'a T, concurrency: usize) -> Self {
        Self {
            api,
            transfer,
            concurrency: concurrency.max(1),
        }
    }

    /// Upload and acknowledge every entry that has a direct upload URL.
    ///
    /// `local_paths` maps relative paths back to files on disk; entries with no
    /// local counterpart are skipped with a warning.
    pub async fn run(
        &self,
        session_id: &str,
        entries: Vec<FileUploadEntry>,
        local_paths: &HashMap<String, PathBuf>,
        reporter: &dyn ImportReporter,
    ) -> Result<UploadSummary> {
        let jobs: Vec<UploadJob> = entries
            .into_iter()
            .filter_map(|entry| {
                let url = entry.direct_upload_url.clone()?;
                match local_paths.get(&entry.relative_path) {
                    Some(path) => Some(UploadJob {
                        path: path.clone(),
                        url,
                        entry,
                    }),
                    None => {
                        warn!(path = %entry.relative_path, "Server requested a file that is not in the local scan, skipping");
                        None
                    }
                }
            })
            .collect();

        let total = jobs.len();
        if total == 0 {
            return Ok(UploadSummary::default());
        }

        let (tx, rx) = mpsc::unbounded_channel();
        for job in jobs {
            // rx is alive for the whole function, so send cannot fail
            let _ = tx.send(job);
        }
        drop(tx);

        let queue = Mutex::new(rx);
        let done = AtomicUsize::new(0);
        let abort = AtomicBool::new(false);
        let workers = self.concurrency.min(total);
        info!(session_id, files = total, workers, "Starting uploads");

        let results = join_all((0..workers).map(|worker| {
            self.worker(worker, session_id, &queue, &done, &abort, total, reporter)
        }))
        .await;

        for result in results {
            result?;
        }

        let uploaded = done.load(Ordering::SeqCst);
        info!(session_id, uploaded, "Uploads finished");
        Ok(UploadSummary { uploaded })
    }

    #[allow(clippy::too_many_arguments)]
    async fn worker(
        &self,
        worker: usize,
        session_id: &str,
        queue: &Mutex<mpsc::UnboundedReceiver<UploadJob>>,
        done: &AtomicUsize,
        abort: &AtomicBool,
        total: usize,
        reporter: &dyn ImportReporter,
    ) -> Result<()> {
        loop {
            if abort.load(Ordering::SeqCst) {
                debug!(worker, "Stopping worker after a failed upload");
                return Ok(());
            }
            let job = queue.lock().await.recv().await;
            let Some(job) = job else {
                return Ok(());
            };

            if let Err(e) = self.upload_one(session_id, &job).await {
                error!(worker, path = %job.entry.relative_path, error = %e, "Upload failed, stopping pool");
                abort.store(true, Ordering::SeqCst);
                return Err(e);
            }

            let finished = done.fetch_add(1, Ordering::SeqCst) + 1;
            reporter.upload_progress(finished, total);
        }
    }

    async fn upload_one(&self, session_id: &str, job: &UploadJob) -> Result<()> {
        let content_type = job
            .entry
            .content_type
            .as_deref()
            .unwrap_or(DEFAULT_CONTENT_TYPE);

        self.transfer
            .put_file(&job.url, content_type, &job.path)
            .await
            .map_err(|source| ImportError::Transfer {
                relative_path: job.entry.relative_path.clone(),
                source,
            })?;

        self.api
            .mark_file_uploaded(session_id, &job.entry.id)
            .await
            .map_err(ImportError::remote("mark file uploaded"))?;

        debug!(path = %job.entry.relative_path, file_id = %job.entry.id, "Uploaded and acknowledged");
        Ok(())
    }
}
