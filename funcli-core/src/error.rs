use std::path::PathBuf;
use thiserror::Error;

use crate::contract::RemoteError;

/// Why a directory scan could not produce a file list.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("invalid ignore pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("import root {} is not a directory", .0.display())]
    NotADirectory(PathBuf),
}

/// Everything that can abort an import operation.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("scan failed: {0}")]
    Scan(#[from] ScanError),

    #[error("cannot checksum {}: {source}", path.display())]
    Checksum {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "cannot write session file {} (session: {}): {source}",
        path.display(),
        session_id.as_deref().unwrap_or("none created")
    )]
    SessionFile {
        path: PathBuf,
        /// Remote session that exists but could not be recorded, if any.
        session_id: Option<String>,
        #[source]
        source: std::io::Error,
    },

    #[error("{operation} failed: {source}")]
    Remote {
        operation: &'static str,
        #[source]
        source: RemoteError,
    },

    #[error("upload failed for {relative_path}: {source}")]
    Transfer {
        relative_path: String,
        #[source]
        source: RemoteError,
    },
}

impl ImportError {
    pub(crate) fn remote(operation: &'static str) -> impl FnOnce(RemoteError) -> ImportError {
        move |source| ImportError::Remote { operation, source }
    }
}

pub type Result<T> = std::result::Result<T, ImportError>;
