//! Terminal output for the import commands.
//!
//! [`ConsoleReporter`] prints progress for `import start` and `import retry`.
//! The `format_*` helpers build the text for `status` and `log` so it can be
//! checked without a terminal.

use colored::Colorize;
use std::io::Write;

use funcli_core::contract::{FileStatus, FileUploadEntry, ImportSession, SessionStatus};
use funcli_core::progress::{percentage, progress_bar, ImportReporter, BAR_WIDTH};
use funcli_core::scanner::format_bytes;

const LOG_PATH_WIDTH: usize = 50;
const LOG_RULE_WIDTH: usize = 60;

/// Prints import progress to stdout, rewriting progress lines in place.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleReporter;

impl ConsoleReporter {
    fn flush() {
        let _ = std::io::stdout().flush();
    }
}

impl ImportReporter for ConsoleReporter {
    fn session_resumed(&self, session_id: &str) {
        println!("Resuming session: {}", session_id.cyan());
    }

    fn obsidian_detected(&self) {
        println!("Detected Obsidian vault — using Obsidian format");
    }

    fn scan_started(&self) {
        print!("Scanning files... ");
        Self::flush();
    }

    fn scan_finished(&self, files: usize, total_bytes: u64) {
        println!("{files} files found ({})", format_bytes(total_bytes));
    }

    fn session_created(&self, session_id: &str) {
        println!("Session ID: {}", session_id.cyan());
    }

    fn manifest_submitting(&self) {
        print!("Submitting manifest... ");
        Self::flush();
    }

    fn manifest_submitted(&self, to_upload: usize, already_uploaded: usize) {
        println!("{to_upload} files to upload ({already_uploaded} already uploaded)");
    }

    fn upload_progress(&self, done: usize, total: usize) {
        let pct = percentage(done as u64, total as u64);
        print!(
            "\rUploading  {}  {pct}%   {done} / {total}",
            progress_bar(pct, BAR_WIDTH)
        );
        Self::flush();
    }

    fn uploads_finished(&self) {
        println!();
    }

    fn processing_started(&self, session_id: &str) {
        println!("\nAll files uploaded. Processing started.");
        println!(
            "Session ID: {session_id}  {}",
            format!("(run `funcli import cancel {session_id}` to cancel)").dimmed()
        );
        print!("\nProcessing ");
        Self::flush();
    }

    fn retry_requested(&self, session_id: &str) {
        println!("Retrying failed files in session {session_id}...");
        print!("\nProcessing ");
        Self::flush();
    }

    fn processing_progress(&self, session: &ImportSession, percent: u8) {
        print!(
            "\rProcessing  {}  {percent}%   {} / {}",
            progress_bar(percent, BAR_WIDTH),
            session.processed_files,
            session.total_files
        );
        Self::flush();
    }

    fn import_finished(&self, session: &ImportSession) {
        println!("\n\n{}", format_finished(session));
    }
}

/// `✓ Import <status>  (F failed, P imported)`, coloured by outcome.
pub fn format_finished(session: &ImportSession) -> String {
    let line = format!(
        "✓ Import {}  ({} failed, {} imported)",
        session.status, session.failed_files, session.processed_files
    );
    match session.status {
        SessionStatus::Completed => line.green().to_string(),
        SessionStatus::Partial => line.yellow().to_string(),
        _ => line.red().to_string(),
    }
}

pub fn format_status(session_id: &str, session: &ImportSession) -> String {
    let mut out = format!(
        "\nSession: {session_id}\nStatus: {}\nProgress: {} / {} processed",
        session.status, session.processed_files, session.total_files
    );
    if session.failed_files > 0 {
        out.push_str(&format!("\nFailed: {}", session.failed_files));
    }
    out
}

fn status_icon(status: &FileStatus) -> &'static str {
    match status {
        FileStatus::Completed => "✓",
        FileStatus::Failed => "✗",
        FileStatus::Skipped => "⊘",
        _ => "⏳",
    }
}

/// Header rule plus one line per file: icon, padded path, document or error.
pub fn format_log(session_id: &str, files: &[FileUploadEntry]) -> String {
    let mut out = format!("\nImport Log — {session_id}\n{}", "─".repeat(LOG_RULE_WIDTH));
    for file in files {
        let detail = match (&file.document_id, &file.error_message) {
            (Some(doc), _) => format!("→ {doc}"),
            (None, Some(err)) => err.clone(),
            (None, None) => String::new(),
        };
        out.push_str(&format!(
            "\n  {} {:<width$} {detail}",
            status_icon(&file.status),
            file.relative_path,
            width = LOG_PATH_WIDTH
        ));
    }
    out
}

pub fn format_log_json(files: &[FileUploadEntry]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use funcli_core::contract::SourceFormat;

    fn session(status: SessionStatus, failed: u64) -> ImportSession {
        ImportSession {
            id: "s".into(),
            space_id: "space".into(),
            source_format: SourceFormat::Generic,
            status,
            total_files: 10,
            processed_files: 9,
            failed_files: failed,
            files: Vec::new(),
        }
    }

    fn file(path: &str, status: FileStatus, doc: Option<&str>, err: Option<&str>) -> FileUploadEntry {
        FileUploadEntry {
            id: path.into(),
            relative_path: path.into(),
            status,
            direct_upload_url: None,
            content_type: None,
            document_id: doc.map(Into::into),
            error_message: err.map(Into::into),
            extra: Default::default(),
        }
    }

    #[test]
    fn status_hides_zero_failures() {
        let text = format_status("s", &session(SessionStatus::Completed, 0));
        assert!(text.contains("Status: completed"));
        assert!(text.contains("Progress: 9 / 10 processed"));
        assert!(!text.contains("Failed"));

        let text = format_status("s", &session(SessionStatus::Partial, 1));
        assert!(text.ends_with("Failed: 1"));
    }

    #[test]
    fn log_lines_carry_icon_and_detail() {
        let files = vec![
            file("a.md", FileStatus::Completed, Some("doc-1"), None),
            file("b.docx", FileStatus::Failed, None, Some("Unsupported")),
            file("c.png", FileStatus::Skipped, None, None),
            file("d.md", FileStatus::Processing, None, None),
        ];
        let text = format_log("s", &files);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[1], "Import Log — s");
        assert_eq!(lines[2].chars().count(), LOG_RULE_WIDTH);
        assert!(lines[3].starts_with("  ✓ a.md"));
        assert!(lines[3].ends_with("→ doc-1"));
        assert!(lines[4].starts_with("  ✗ b.docx") && lines[4].ends_with("Unsupported"));
        assert!(lines[5].starts_with("  ⊘ c.png"));
        assert!(lines[6].starts_with("  ⏳ d.md"));
    }

    #[test]
    fn log_json_is_the_file_list() {
        let files = vec![file("a.md", FileStatus::Failed, None, Some("boom"))];
        let parsed: serde_json::Value =
            serde_json::from_str(&format_log_json(&files).unwrap()).unwrap();
        assert_eq!(parsed[0]["relative_path"], "a.md");
        assert_eq!(parsed[0]["status"], "failed");
        assert_eq!(parsed[0]["error_message"], "boom");
    }

    #[test]
    fn log_json_echoes_server_files_unchanged() {
        let raw = serde_json::json!([{
            "id": "f9",
            "relative_path": "vault/x.md",
            "status": "quarantined",
            "created_at": "2026-01-01",
            "attempts": 3
        }]);
        let files: Vec<FileUploadEntry> = serde_json::from_value(raw.clone()).unwrap();

        let printed: serde_json::Value =
            serde_json::from_str(&format_log_json(&files).unwrap()).unwrap();
        assert_eq!(printed, raw);
    }

    #[test]
    fn unknown_file_status_gets_the_pending_icon() {
        let text = format_log("s", &[file("x.md", FileStatus::Unknown("quarantined".into()), None, None)]);
        assert!(text.lines().last().unwrap().starts_with("  ⏳ x.md"));
    }
}
