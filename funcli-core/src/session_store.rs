//! Local record binding an import root to its remote session.
//!
//! Reading fails open: a missing, unreadable, or corrupt file means "no prior
//! session" and the import starts fresh. Writing replaces the whole file
//! atomically.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// File name used when no `--session-file` override is given.
pub const SESSION_FILE_NAME: &str = ".fundamento-session.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_id: String,
    pub space_id: String,
}

/// Where the session record for `directory` lives, unless overridden.
pub fn session_file_path(directory: &Path, override_path: Option<&Path>) -> PathBuf {
    match override_path {
        Some(path) => path.to_path_buf(),
        None => directory.join(SESSION_FILE_NAME),
    }
}

/// Load the record at `path`, or `None` if there is no usable one.
pub fn load(path: &Path) -> Option<SessionRecord> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "No session file");
            return None;
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Unreadable session file, starting fresh");
            return None;
        }
    };

    match serde_json::from_str::<SessionRecord>(&content) {
        Ok(record) if !record.session_id.is_empty() => {
            info!(path = %path.display(), session_id = %record.session_id, "Loaded session file");
            Some(record)
        }
        Ok(_) => {
            warn!(path = %path.display(), "Session file has an empty session_id, starting fresh");
            None
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Corrupt session file, starting fresh");
            None
        }
    }
}

/// A temp file already created next to the record's final location.
///
/// Obtained before anything remote exists, so an unwritable location is
/// reported before a session is created. Dropping it removes the temp file.
pub struct PendingRecord {
    path: PathBuf,
    tmp: tempfile::NamedTempFile,
}

impl PendingRecord {
    /// Write `record` and rename it over the final path.
    pub fn commit(mut self, record: &SessionRecord) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(record)?;
        self.tmp.write_all(json.as_bytes())?;
        self.tmp.as_file().sync_all()?;
        self.tmp.persist(&self.path).map_err(|e| e.error)?;

        info!(path = %self.path.display(), session_id = %record.session_id, "Saved session file");
        Ok(())
    }
}

/// Reserve a temp file in the directory that will hold the record at `path`.
pub fn prepare(path: &Path) -> std::io::Result<PendingRecord> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let tmp = tempfile::NamedTempFile::new_in(dir)?;
    debug!(path = %path.display(), "Reserved session file location");
    Ok(PendingRecord {
        path: path.to_path_buf(),
        tmp,
    })
}

/// Write `record` to `path` in one step (temp file in the same directory, then rename).
pub fn save(path: &Path, record: &SessionRecord) -> std::io::Result<()> {
    prepare(path)?.commit(record)
}
