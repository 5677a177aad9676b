//! High-level import orchestration: directory → manifest → uploads → processing.
//!
//! [`ImportSessionManager`] owns a [`RemoteApi`] and a [`ContentTransfer`] and
//! exposes the session lifecycle operations:
//!
//! - [`start`](ImportSessionManager::start): resume-or-create, scan, checksum,
//!   submit the manifest, upload what the server is missing, trigger
//!   processing and poll until a terminal status.
//! - [`status`](ImportSessionManager::status), [`cancel`](ImportSessionManager::cancel),
//!   [`retry`](ImportSessionManager::retry), [`log`](ImportSessionManager::log):
//!   single-session operations by id, independent of any local directory.
//!
//! # Resumption
//! A session record next to the import root (or at an explicit path) binds the
//! directory to its remote session. When a usable record exists the remote
//! session is reused and no new one is created. The record's location is
//! reserved before a remote session is created. The record is written right
//! after creation, before any upload, and is never removed here.
//!
//! # Errors
//! Scan and checksum failures abort before the first remote call. Transport and
//! API failures propagate to the caller unchanged; the session record is left
//! as it was.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::config::ImportOptions;
use crate::contract::{
    ContentTransfer, FileStatus, FileUploadEntry, ImportSession, RemoteApi, SourceFormat,
};
use crate::error::{ImportError, Result};
use crate::manifest::build_manifest;
use crate::poller::ProgressPoller;
use crate::progress::{ImportReporter, SilentReporter};
use crate::scanner::scan_directory;
use crate::session_store::{self, SessionRecord};
use crate::upload::UploadScheduler;

/// Marker directory that identifies an Obsidian vault.
pub const OBSIDIAN_MARKER: &str = ".obsidian";

/// Per-run options for [`ImportSessionManager::start`].
#[derive(Debug, Clone, Default)]
pub struct StartOptions {
    /// Explicit source format; auto-detected when `None`.
    pub format: Option<SourceFormat>,
    /// Session record location; defaults to a file inside the import root.
    pub session_file: Option<PathBuf>,
}

/// What a completed `start` did.
#[derive(Debug, Clone)]
pub struct ImportOutcome {
    pub session_id: String,
    pub resumed: bool,
    pub source_format: SourceFormat,
    pub scanned_files: usize,
    pub uploaded: usize,
    pub already_uploaded: usize,
    /// Last read of the session, in a terminal status.
    pub session: ImportSession,
}

/// `explicit` if given, otherwise Obsidian when the vault marker directory exists.
pub fn detect_source_format(directory: &Path, explicit: Option<SourceFormat>) -> SourceFormat {
    explicit.unwrap_or_else(|| {
        if directory.join(OBSIDIAN_MARKER).is_dir() {
            SourceFormat::Obsidian
        } else {
            SourceFormat::Generic
        }
    })
}

pub struct ImportSessionManager<A, T> {
    api: A,
    transfer: T,
    options: ImportOptions,
    reporter: Box<dyn ImportReporter>,
}

impl<A, T> ImportSessionManager<A, T>
where
    A: RemoteApi,
    T: ContentTransfer,
{
    pub fn new(api: A, transfer: T, options: ImportOptions) -> Self {
        options.trace_loaded();
        Self {
            api,
            transfer,
            options,
            reporter: Box::new(SilentReporter),
        }
    }

    pub fn with_reporter(mut self, reporter: impl ImportReporter + 'static) -> Self {
        self.reporter = Box::new(reporter);
        self
    }

    fn poller(&self) -> ProgressPoller {
        ProgressPoller::new(self.options.poll_interval)
    }

    /// Import `directory` into `space_id`, resuming a previous run when possible.
    pub async fn start(
        &self,
        space_id: &str,
        directory: &Path,
        start: StartOptions,
    ) -> Result<ImportOutcome> {
        let reporter = self.reporter.as_ref();
        let session_path = session_store::session_file_path(directory, start.session_file.as_deref());
        info!(space_id, directory = %directory.display(), session_file = %session_path.display(), "Starting import");

        let existing = session_store::load(&session_path);
        if let Some(record) = &existing {
            if record.space_id != space_id {
                warn!(
                    recorded_space = %record.space_id,
                    requested_space = space_id,
                    "Session file belongs to a different space; resuming the recorded session"
                );
            }
            reporter.session_resumed(&record.session_id);
        }

        let source_format = detect_source_format(directory, start.format);
        if start.format.is_none() && source_format == SourceFormat::Obsidian {
            reporter.obsidian_detected();
        }

        reporter.scan_started();
        let files = scan_directory(directory, &self.options.ignore)?;
        let total_bytes: u64 = files.iter().map(|f| f.size_bytes).sum();
        reporter.scan_finished(files.len(), total_bytes);

        let manifest = build_manifest(&files, self.options.checksum_concurrency).await?;

        let (session_id, resumed) = match existing {
            Some(record) => (record.session_id, true),
            None => {
                let pending = session_store::prepare(&session_path).map_err(|source| {
                    error!(path = %session_path.display(), error = %source, "Session file location is not writable");
                    ImportError::SessionFile {
                        path: session_path.clone(),
                        session_id: None,
                        source,
                    }
                })?;
                let created = self
                    .api
                    .create_import_session(space_id, source_format)
                    .await
                    .map_err(ImportError::remote("create import session"))?;
                let record = SessionRecord {
                    session_id: created.id.clone(),
                    space_id: space_id.to_string(),
                };
                pending.commit(&record).map_err(|source| {
                    error!(session_id = %created.id, error = %source, "Could not persist session file");
                    ImportError::SessionFile {
                        path: session_path.clone(),
                        session_id: Some(created.id.clone()),
                        source,
                    }
                })?;
                reporter.session_created(&created.id);
                (created.id, false)
            }
        };

        reporter.manifest_submitting();
        let entries = self
            .api
            .submit_manifest(&session_id, manifest)
            .await
            .map_err(ImportError::remote("submit manifest"))?;

        let (to_upload, already): (Vec<FileUploadEntry>, Vec<FileUploadEntry>) =
            entries.into_iter().partition(FileUploadEntry::needs_upload);
        info!(
            session_id = %session_id,
            to_upload = to_upload.len(),
            already_uploaded = already.len(),
            "Manifest accepted"
        );
        reporter.manifest_submitted(to_upload.len(), already.len());

        let uploaded = if to_upload.is_empty() {
            0
        } else {
            let local_paths: HashMap<String, PathBuf> = files
                .iter()
                .map(|f| (f.relative_path.clone(), f.absolute_path.clone()))
                .collect();
            let scheduler =
                UploadScheduler::new(&self.api, &self.transfer, self.options.effective_concurrency());
            let summary = scheduler
                .run(&session_id, to_upload, &local_paths, reporter)
                .await?;
            reporter.uploads_finished();
            summary.uploaded
        };

        self.api
            .trigger_processing(&session_id)
            .await
            .map_err(ImportError::remote("trigger processing"))?;
        reporter.processing_started(&session_id);

        let session = self
            .poller()
            .poll_until_terminal(&self.api, &session_id, reporter)
            .await?;

        Ok(ImportOutcome {
            session_id,
            resumed,
            source_format,
            scanned_files: files.len(),
            uploaded,
            already_uploaded: already.len(),
            session,
        })
    }

    /// One read of the session; changes nothing.
    pub async fn status(&self, session_id: &str) -> Result<ImportSession> {
        self.api
            .get_import_session(session_id)
            .await
            .map_err(ImportError::remote("get import session"))
    }

    /// Ask the server to cancel. Any local session record is kept.
    pub async fn cancel(&self, session_id: &str) -> Result<()> {
        self.api
            .cancel_import_session(session_id)
            .await
            .map_err(ImportError::remote("cancel import session"))?;
        info!(session_id, "Import session cancelled");
        Ok(())
    }

    /// Ask the server to retry failed files, then poll to a terminal status.
    pub async fn retry(&self, session_id: &str) -> Result<ImportSession> {
        self.api
            .retry_import_session(session_id)
            .await
            .map_err(ImportError::remote("retry import session"))?;
        self.reporter.retry_requested(session_id);
        info!(session_id, "Retry requested");
        self.poller()
            .poll_until_terminal(&self.api, session_id, self.reporter.as_ref())
            .await
    }

    /// Per-file list of the session, optionally only the failed files.
    pub async fn log(&self, session_id: &str, failed_only: bool) -> Result<Vec<FileUploadEntry>> {
        let session = self.status(session_id).await?;
        let files = if failed_only {
            session
                .files
                .into_iter()
                .filter(|f| f.status == FileStatus::Failed)
                .collect()
        } else {
            session.files
        };
        Ok(files)
    }
}
