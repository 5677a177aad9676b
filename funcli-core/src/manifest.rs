//! Manifest construction: one [`ManifestEntry`] per scanned file.
//!
//! The checksum is the base64 (standard alphabet, padded) MD5 digest of the
//! file content. The server compares it against what it already stores to
//! decide whether a file needs uploading, so the algorithm and encoding are
//! part of the wire contract.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use futures::stream::{self, StreamExt, TryStreamExt};
use md5::{Digest, Md5};
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncReadExt;
use tracing::{debug, info};

use crate::contract::{FileType, Format, ManifestEntry};
use crate::error::{ImportError, Result};
use crate::scanner::{FileKind, ScannedFile};

const READ_CHUNK: usize = 64 * 1024;

/// Stream `path` through MD5 and return the base64 digest.
pub async fn checksum_file(path: &Path) -> std::io::Result<String> {
    let mut file = File::open(path).await?;
    let mut hasher = Md5::new();
    let mut buf = vec![0u8; READ_CHUNK];
    loop {
        let n = file.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(STANDARD.encode(hasher.finalize()))
}

/// Map a lowercase extension to the server's format classification.
pub fn detect_format(extension: &str) -> Format {
    match extension {
        "md" => Format::Markdown,
        "docx" => Format::Docx,
        "odt" => Format::Odt,
        "doc" => Format::Doc,
        "png" | "jpg" | "jpeg" | "gif" | "webp" | "svg" => Format::Image,
        "pdf" => Format::Pdf,
        "mp4" | "mov" | "avi" => Format::Video,
        _ => Format::Other,
    }
}

impl From<FileKind> for FileType {
    fn from(kind: FileKind) -> Self {
        match kind {
            FileKind::Document => FileType::Document,
            FileKind::Attachment => FileType::Attachment,
        }
    }
}

pub async fn build_entry(file: &ScannedFile) -> Result<ManifestEntry> {
    let checksum =
        checksum_file(&file.absolute_path)
            .await
            .map_err(|source| ImportError::Checksum {
                path: file.absolute_path.clone(),
                source,
            })?;
    debug!(path = %file.relative_path, %checksum, "Checksummed file");
    Ok(ManifestEntry {
        relative_path: file.relative_path.clone(),
        checksum,
        file_size: file.size_bytes,
        format: detect_format(&file.extension),
        file_type: file.kind.into(),
    })
}

/// Checksum up to `concurrency` files at a time. Output order matches `files`.
pub async fn build_manifest(files: &[ScannedFile], concurrency: usize) -> Result<Vec<ManifestEntry>> {
    let manifest: Vec<ManifestEntry> = stream::iter(files.iter().map(build_entry))
        .buffered(concurrency.max(1))
        .try_collect()
        .await?;
    info!(entries = manifest.len(), "Manifest built");
    Ok(manifest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_detection() {
        assert_eq!(detect_format("md"), Format::Markdown);
        assert_eq!(detect_format("jpeg"), Format::Image);
        assert_eq!(detect_format("mov"), Format::Video);
        assert_eq!(detect_format("pdf"), Format::Pdf);
        assert_eq!(detect_format("xyz"), Format::Other);
    }

    #[tokio::test]
    async fn checksum_matches_known_md5() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hello.md");
        std::fs::write(&path, b"hello").unwrap();
        // md5("hello") = 5d41402abc4b2a76b9719d911017c592
        assert_eq!(checksum_file(&path).await.unwrap(), "XUFAKrxLKna5cZ2REBfFkg==");
    }
}
