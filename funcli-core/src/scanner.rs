//! Directory walk that produces the candidate file list for an import.
//!
//! The walk is depth-first, never follows symlinks, and prunes:
//! - every entry whose name starts with `.` (always, patterns cannot re-include it)
//! - every entry whose name matches one of the ignore patterns
//!
//! Files whose extension is neither a document nor an attachment extension are
//! left out of the result. The returned list is sorted by relative path.

use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::error::ScanError;

pub const DOCUMENT_EXTENSIONS: &[&str] = &["md", "docx", "odt", "doc"];

pub const ATTACHMENT_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "webp", "svg", "pdf", "mp4", "mov", "avi",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Document,
    Attachment,
}

impl FileKind {
    /// Classify a lowercase extension (without the dot).
    pub fn from_extension(ext: &str) -> Option<FileKind> {
        if DOCUMENT_EXTENSIONS.contains(&ext) {
            Some(FileKind::Document)
        } else if ATTACHMENT_EXTENSIONS.contains(&ext) {
            Some(FileKind::Attachment)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedFile {
    pub absolute_path: PathBuf,
    /// `/`-separated, relative to the import root. Identity key across runs.
    pub relative_path: String,
    pub size_bytes: u64,
    /// Lowercase, without the leading dot.
    pub extension: String,
    pub kind: FileKind,
}

/// Compiled ignore rules.
#[derive(Debug, Default)]
pub struct IgnoreRules {
    patterns: Vec<Regex>,
}

impl IgnoreRules {
    /// Translate wildcard patterns (`*` = any run of characters) into regexes.
    /// A pattern that does not compile rejects the whole rule set.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, ScanError> {
        let patterns = patterns
            .iter()
            .map(|p| {
                let p = p.as_ref();
                Regex::new(&p.replace('*', ".*")).map_err(|source| ScanError::InvalidPattern {
                    pattern: p.to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    pub fn is_ignored(&self, name: &str) -> bool {
        name.starts_with('.') || self.patterns.iter().any(|re| re.is_match(name))
    }
}

/// Walk `root` and return every importable file under it.
pub fn scan_directory<S: AsRef<str>>(
    root: &Path,
    ignore: &[S],
) -> Result<Vec<ScannedFile>, ScanError> {
    let rules = IgnoreRules::new(ignore)?;

    if !root.is_dir() {
        return Err(ScanError::NotADirectory(root.to_path_buf()));
    }

    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0 || !rules.is_ignored(&entry.file_name().to_string_lossy())
        });

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|err| ScanError::Io {
            path: err.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf()),
            source: err.into(),
        })?;

        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let extension = match path.extension() {
            Some(ext) => ext.to_string_lossy().to_lowercase(),
            None => continue,
        };
        let kind = match FileKind::from_extension(&extension) {
            Some(kind) => kind,
            None => {
                debug!(path = %path.display(), "Skipping file with unsupported extension");
                continue;
            }
        };

        let metadata = entry.metadata().map_err(|err| ScanError::Io {
            path: path.to_path_buf(),
            source: err.into(),
        })?;

        files.push(ScannedFile {
            absolute_path: path.to_path_buf(),
            relative_path: relative_posix_path(root, path),
            size_bytes: metadata.len(),
            extension,
            kind,
        });
    }

    files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    info!(root = %root.display(), files = files.len(), "Directory scan complete");
    Ok(files)
}

fn relative_posix_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Human-readable size, as printed in the scan summary.
pub fn format_bytes(bytes: u64) -> String {
    const MIB: f64 = 1024.0 * 1024.0;
    const GIB: f64 = MIB * 1024.0;
    let b = bytes as f64;
    if b < MIB {
        format!("{:.1} KB", b / 1024.0)
    } else if b < GIB {
        format!("{:.1} MB", b / MIB)
    } else {
        format!("{:.2} GB", b / GIB)
    }
}
