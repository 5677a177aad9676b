//! # contract: the Remote API seam and its wire types
//!
//! This module defines the two traits the import pipeline talks to and the
//! plain data types that cross them:
//!
//! - [`RemoteApi`]: the Fundamento import-session endpoints (create session,
//!   submit manifest, acknowledge uploads, trigger processing, read/cancel/retry).
//! - [`ContentTransfer`]: the direct, pre-signed upload of one file's bytes.
//!
//! Both traits are `Send + Sync` and async. Production implementations live in
//! the CLI crate (HTTP client) and in [`crate::transfer`]; tests use the
//! `mockall` mocks generated here.
//!
//! ## Mocking & Testing
//! - `MockRemoteApi` and `MockContentTransfer` are exported when the
//!   `test-export-mocks` feature is on (default), so integration tests under
//!   `tests/` can use them.
//!
//! ## Wire format
//! All types serialize with snake_case field names and enum values, matching
//! the JSON the server speaks.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

use mockall::automock;

/// Boxed error returned by every seam method.
pub type RemoteError = Box<dyn std::error::Error + Send + Sync>;

/// How the server should interpret the imported tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceFormat {
    Generic,
    Obsidian,
}

impl SourceFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceFormat::Generic => "generic",
            SourceFormat::Obsidian => "obsidian",
        }
    }
}

impl std::fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SourceFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "generic" => Ok(SourceFormat::Generic),
            "obsidian" => Ok(SourceFormat::Obsidian),
            other => Err(format!(
                "unknown source format '{other}' (expected generic or obsidian)"
            )),
        }
    }
}

/// Document or attachment, as declared in the manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileType {
    Document,
    Attachment,
}

/// Content-type classification sent with each manifest entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Format {
    Markdown,
    Docx,
    Odt,
    Doc,
    Image,
    Pdf,
    Video,
    Other,
}

/// One local file as declared to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// POSIX-style path relative to the import root.
    pub relative_path: String,
    /// Base64 MD5 digest of the file content.
    pub checksum: String,
    pub file_size: u64,
    pub format: Format,
    pub file_type: FileType,
}

/// Server-side state of one file in an import session.
///
/// A status this client does not know is kept verbatim in `Unknown`, so it
/// serializes back exactly as the server sent it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileStatus {
    PendingUpload,
    Uploaded,
    Processing,
    Completed,
    Failed,
    Skipped,
    Unknown(String),
}

impl FileStatus {
    pub fn as_str(&self) -> &str {
        match self {
            FileStatus::PendingUpload => "pending_upload",
            FileStatus::Uploaded => "uploaded",
            FileStatus::Processing => "processing",
            FileStatus::Completed => "completed",
            FileStatus::Failed => "failed",
            FileStatus::Skipped => "skipped",
            FileStatus::Unknown(raw) => raw,
        }
    }
}

impl From<String> for FileStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "pending_upload" => FileStatus::PendingUpload,
            "uploaded" => FileStatus::Uploaded,
            "processing" => FileStatus::Processing,
            "completed" => FileStatus::Completed,
            "failed" => FileStatus::Failed,
            "skipped" => FileStatus::Skipped,
            _ => FileStatus::Unknown(raw),
        }
    }
}

impl Serialize for FileStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FileStatus {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(FileStatus::from)
    }
}

/// The server's authoritative answer for one manifest entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileUploadEntry {
    pub id: String,
    pub relative_path: String,
    pub status: FileStatus,
    /// Present only while the server still needs the content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direct_upload_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Fields this client does not model, passed through untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl FileUploadEntry {
    pub fn needs_upload(&self) -> bool {
        self.direct_upload_url.is_some()
    }
}

/// Lifecycle of an import session. The server owns every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Created,
    ManifestSubmitted,
    Uploading,
    Processing,
    Completed,
    Partial,
    Failed,
    Cancelled,
    /// A status newer than this client; never terminal.
    #[serde(other)]
    Unknown,
}

impl SessionStatus {
    /// No further automatic transitions happen from a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionStatus::Completed
                | SessionStatus::Partial
                | SessionStatus::Failed
                | SessionStatus::Cancelled
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Created => "created",
            SessionStatus::ManifestSubmitted => "manifest_submitted",
            SessionStatus::Uploading => "uploading",
            SessionStatus::Processing => "processing",
            SessionStatus::Completed => "completed",
            SessionStatus::Partial => "partial",
            SessionStatus::Failed => "failed",
            SessionStatus::Cancelled => "cancelled",
            SessionStatus::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned by session creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedSession {
    pub id: String,
}

/// A full read of an import session, including the per-file list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSession {
    pub id: String,
    #[serde(default)]
    pub space_id: String,
    #[serde(default = "default_source_format")]
    pub source_format: SourceFormat,
    pub status: SessionStatus,
    #[serde(default)]
    pub total_files: u64,
    #[serde(default)]
    pub processed_files: u64,
    #[serde(default)]
    pub failed_files: u64,
    #[serde(default)]
    pub files: Vec<FileUploadEntry>,
}

fn default_source_format() -> SourceFormat {
    SourceFormat::Generic
}

/// The Fundamento import-session endpoints.
///
/// Implementors own authentication and transport; every method maps one
/// remote call and does not buffer partial results.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait RemoteApi: Send + Sync {
    /// Create a new import session for a space.
    async fn create_import_session(
        &self,
        space_id: &str,
        source_format: SourceFormat,
    ) -> Result<CreatedSession, RemoteError>;

    /// Declare the local files; the server answers which still need content.
    async fn submit_manifest(
        &self,
        session_id: &str,
        entries: Vec<ManifestEntry>,
    ) -> Result<Vec<FileUploadEntry>, RemoteError>;

    /// Acknowledge that one file's content has been transferred.
    async fn mark_file_uploaded(&self, session_id: &str, file_id: &str)
        -> Result<(), RemoteError>;

    async fn trigger_processing(&self, session_id: &str) -> Result<(), RemoteError>;

    async fn get_import_session(&self, session_id: &str) -> Result<ImportSession, RemoteError>;

    async fn cancel_import_session(&self, session_id: &str) -> Result<(), RemoteError>;

    /// Ask the server to reprocess the files that failed.
    async fn retry_import_session(&self, session_id: &str) -> Result<(), RemoteError>;
}

/// Direct transfer of one file's raw content to a pre-signed URL.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ContentTransfer: Send + Sync {
    async fn put_file(
        &self,
        url: &str,
        content_type: &str,
        path: &Path,
    ) -> Result<(), RemoteError>;
}
