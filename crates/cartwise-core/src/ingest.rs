//! Receipt file ingestion
//!
//! Files are size-checked before anything is read, read concurrently, then
//! parsed, validated, normalized and merged synchronously. Failures are
//! contained at the narrowest scope: a bad receipt drops that receipt, a bad
//! file drops that file. Ingestion as a whole fails only when nothing valid
//! remains.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::fs;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::merge::merge_receipts;
use crate::models::Receipt;
use crate::normalize::normalize_receipt;
use crate::validate::validate_json_structure;

/// Largest single file accepted (50 MB)
pub const MAX_FILE_BYTES: u64 = 50 * 1024 * 1024;

/// Largest combined upload accepted (100 MB)
pub const MAX_TOTAL_BYTES: u64 = 100 * 1024 * 1024;

/// Detail lines shown before the remainder is summarized as a count
pub const DEFAULT_MAX_SHOWN: usize = 10;

/// Size ceilings checked before reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    pub max_file_bytes: u64,
    pub max_total_bytes: u64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_file_bytes: MAX_FILE_BYTES,
            max_total_bytes: MAX_TOTAL_BYTES,
        }
    }
}

/// A file offered for ingestion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCandidate {
    pub name: String,
    pub size: u64,
}

impl FileCandidate {
    pub fn new(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            size,
        }
    }
}

/// A file refused before reading
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRejection {
    pub name: String,
    pub reason: String,
}

impl fmt::Display for FileRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.reason)
    }
}

fn format_mb(bytes: u64) -> String {
    format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
}

fn has_json_extension(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}

/// Check extensions and size limits.
///
/// Every file must be non-empty `.json` within the per-file cap. Files that
/// pass those checks count toward the total cap; if their combined size
/// exceeds it, every file is rejected.
pub fn check_file_sizes(files: &[FileCandidate], limits: &Limits) -> Vec<FileRejection> {
    let individual = |file: &FileCandidate| -> Option<String> {
        if !has_json_extension(&file.name) {
            Some("not a .json file".to_string())
        } else if file.size == 0 {
            Some("file is empty".to_string())
        } else if file.size > limits.max_file_bytes {
            Some(format!(
                "{} exceeds the {} per-file limit",
                format_mb(file.size),
                format_mb(limits.max_file_bytes)
            ))
        } else {
            None
        }
    };

    let reasons: Vec<Option<String>> = files.iter().map(individual).collect();
    let combined: u64 = files
        .iter()
        .zip(&reasons)
        .filter(|(_, reason)| reason.is_none())
        .map(|(file, _)| file.size)
        .sum();
    let over_total = combined > limits.max_total_bytes;

    files
        .iter()
        .zip(reasons)
        .filter_map(|(file, reason)| {
            let reason = reason.or_else(|| {
                over_total.then(|| {
                    format!(
                        "combined size {} exceeds the {} limit",
                        format_mb(combined),
                        format_mb(limits.max_total_bytes)
                    )
                })
            });
            reason.map(|reason| FileRejection {
                name: file.name.clone(),
                reason,
            })
        })
        .collect()
}

/// What happened to one input file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    /// At least one receipt was accepted
    Loaded,
    /// Refused before reading (extension or size)
    Rejected,
    ReadFailed,
    ParseFailed,
    /// Parsed, but not an array of valid receipts
    Invalid,
}

impl FileStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Loaded => "loaded",
            Self::Rejected => "rejected",
            Self::ReadFailed => "read failed",
            Self::ParseFailed => "parse failed",
            Self::Invalid => "invalid",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileOutcome {
    pub filename: String,
    pub status: FileStatus,
    pub valid_count: usize,
    pub invalid_count: usize,
    pub message: Option<String>,
}

impl FileOutcome {
    fn failed(filename: &str, status: FileStatus, message: String) -> Self {
        Self {
            filename: filename.to_string(),
            status,
            valid_count: 0,
            invalid_count: 0,
            message: Some(message),
        }
    }
}

/// Result of an ingestion run
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestReport {
    /// Merged, deduplicated receipts
    pub receipts: Vec<Receipt>,
    pub files: Vec<FileOutcome>,
    /// Valid receipts before merging
    pub parsed_count: usize,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl IngestReport {
    fn fail_file(&mut self, filename: &str, status: FileStatus, message: String) {
        warn!("{}: {}", filename, message);
        self.errors.push(format!("{}: {}", filename, message));
        self.files.push(FileOutcome::failed(filename, status, message));
    }

    pub fn loaded_files(&self) -> usize {
        self.files
            .iter()
            .filter(|f| f.status == FileStatus::Loaded)
            .count()
    }

    /// Duplicates and cancelled receipts removed by merging
    pub fn dropped_in_merge(&self) -> usize {
        self.parsed_count.saturating_sub(self.receipts.len())
    }

    /// Human-readable summary with detail lists truncated to `max_shown`
    pub fn summary_lines(&self, max_shown: usize) -> Vec<String> {
        let mut lines = vec![format!(
            "Loaded {} receipts from {} of {} files ({} removed as duplicates or cancelled)",
            self.receipts.len(),
            self.loaded_files(),
            self.files.len(),
            self.dropped_in_merge()
        )];

        let mut section = |label: &str, entries: &[String]| {
            if entries.is_empty() {
                return;
            }
            lines.push(format!("{} {}:", entries.len(), label));
            for entry in entries.iter().take(max_shown) {
                lines.push(format!("  - {}", entry));
            }
            if entries.len() > max_shown {
                lines.push(format!("  ... and {} more", entries.len() - max_shown));
            }
        };
        section("errors", &self.errors);
        section("warnings", &self.warnings);

        lines
    }
}

/// Parse, validate, normalize and merge documents already in memory.
///
/// Each document is a `(filename, contents)` pair.
pub fn ingest_documents(documents: Vec<(String, String)>) -> Result<IngestReport> {
    process_documents(IngestReport::default(), documents)
}

fn process_documents(
    mut report: IngestReport,
    documents: Vec<(String, String)>,
) -> Result<IngestReport> {
    let mut batches: Vec<Vec<Receipt>> = Vec::new();

    for (filename, contents) in documents {
        let data: Value = match serde_json::from_str(&contents) {
            Ok(data) => data,
            Err(e) => {
                let message = format!("invalid JSON: {}", e);
                report.fail_file(&filename, FileStatus::ParseFailed, message);
                continue;
            }
        };

        let structure = validate_json_structure(&data, &filename);
        report.warnings.extend(
            structure
                .warnings
                .iter()
                .map(|w| format!("{}: {}", filename, w)),
        );

        if !structure.valid {
            // File-level messages already name the file
            let message = structure
                .errors
                .first()
                .map(|e| e.to_string())
                .unwrap_or_else(|| format!("{}: no valid receipts", filename));
            warn!("{}", message);
            report.errors.extend(structure.errors.iter().map(|e| match e.receipt_index {
                Some(_) => format!("{}: {}", filename, e),
                None => e.to_string(),
            }));
            report.files.push(FileOutcome {
                filename: filename.clone(),
                status: FileStatus::Invalid,
                valid_count: 0,
                invalid_count: structure.invalid_count,
                message: Some(message),
            });
            continue;
        }

        report
            .errors
            .extend(structure.errors.iter().map(|e| format!("{}: {}", filename, e)));

        let batch: Vec<Receipt> = structure
            .receipts
            .iter()
            .map(|(index, raw)| normalize_receipt(raw, *index, &filename))
            .collect();
        info!(
            "{}: loaded {} receipts ({} rejected)",
            filename,
            batch.len(),
            structure.invalid_count
        );

        report.parsed_count += batch.len();
        report.files.push(FileOutcome {
            filename,
            status: FileStatus::Loaded,
            valid_count: structure.valid_count,
            invalid_count: structure.invalid_count,
            message: None,
        });
        batches.push(batch);
    }

    if report.parsed_count == 0 {
        let detail = report
            .errors
            .first()
            .map(|e| format!(": {}", e))
            .unwrap_or_default();
        return Err(Error::Ingest(format!(
            "No valid receipts found in {} file(s){}",
            report.files.len(),
            detail
        )));
    }

    report.receipts = merge_receipts(batches);
    Ok(report)
}

/// Size-check, read and ingest receipt files.
///
/// Reads run concurrently; documents are processed in the order the paths
/// were given so merging stays deterministic.
pub async fn ingest_files(paths: &[PathBuf], limits: &Limits) -> Result<IngestReport> {
    if paths.is_empty() {
        return Err(Error::Ingest("No files to ingest".to_string()));
    }

    let mut report = IngestReport::default();
    let mut candidates: Vec<(PathBuf, FileCandidate)> = Vec::new();

    for path in paths {
        let name = path.display().to_string();
        match fs::metadata(path).await {
            Ok(meta) if meta.is_file() => {
                candidates.push((path.clone(), FileCandidate::new(name, meta.len())))
            }
            Ok(_) => {
                report.fail_file(&name, FileStatus::Rejected, "not a regular file".to_string())
            }
            Err(e) => report.fail_file(&name, FileStatus::ReadFailed, e.to_string()),
        }
    }

    let sizes: Vec<FileCandidate> = candidates.iter().map(|(_, c)| c.clone()).collect();
    let rejections = check_file_sizes(&sizes, limits);
    let rejected: HashSet<&str> = rejections.iter().map(|r| r.name.as_str()).collect();
    for rejection in &rejections {
        report.fail_file(&rejection.name, FileStatus::Rejected, rejection.reason.clone());
    }

    let mut names = Vec::new();
    let mut reads = JoinSet::new();
    for (order, (path, candidate)) in candidates
        .into_iter()
        .filter(|(_, c)| !rejected.contains(c.name.as_str()))
        .enumerate()
    {
        debug!("Reading {} ({} bytes)", candidate.name, candidate.size);
        names.push(candidate.name);
        reads.spawn(async move { (order, fs::read_to_string(&path).await) });
    }

    let documents = collect_reads(reads, &names, &mut report).await;
    process_documents(report, documents)
}

/// Drain finished reads back into input order.
///
/// A task that fails to join leaves its slot empty; that file is reported
/// as a read failure rather than dropped silently.
async fn collect_reads(
    mut reads: JoinSet<(usize, std::io::Result<String>)>,
    names: &[String],
    report: &mut IngestReport,
) -> Vec<(String, String)> {
    let mut slots: Vec<Option<std::io::Result<String>>> = names.iter().map(|_| None).collect();
    let mut task_errors = Vec::new();

    while let Some(joined) = reads.join_next().await {
        match joined {
            Ok((order, result)) => slots[order] = Some(result),
            Err(e) => {
                warn!("File read task failed: {}", e);
                task_errors.push(e.to_string());
            }
        }
    }

    let mut documents = Vec::new();
    for (name, slot) in names.iter().zip(slots) {
        match slot {
            Some(Ok(contents)) => documents.push((name.clone(), contents)),
            Some(Err(e)) => report.fail_file(name, FileStatus::ReadFailed, e.to_string()),
            None => {
                let detail = task_errors.first().cloned().unwrap_or_default();
                let message = format!("read task failed: {}", detail);
                report.fail_file(name, FileStatus::ReadFailed, message);
            }
        }
    }
    documents
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    const RECEIPTS: &str = r#"[
        {"transactionType": "Sales", "total": 10.0, "warehouseNumber": 1, "transactionNumber": 1,
         "transactionBarcode": "B1", "transactionDateTime": "2024-01-05T10:00:00",
         "itemArray": [{"itemNumber": "1", "itemDescription01": "A", "amount": 10.0, "unit": 1}]},
        {"transactionType": "Sales", "warehouseNumber": 1}
    ]"#;

    const OVERLAP: &str = r#"[
        {"transactionType": "Sales", "total": 10.0, "warehouseNumber": 1, "transactionNumber": 1,
         "transactionBarcode": "B1", "transactionDateTime": "2024-01-05T10:00:00",
         "itemArray": [{"itemNumber": "1", "itemDescription01": "A", "amount": 10.0, "unit": 1}]},
        {"transactionType": "Sales", "total": 5.0, "warehouseNumber": 1, "transactionNumber": 2,
         "transactionBarcode": "B2", "transactionDateTime": "2024-01-06T10:00:00",
         "itemArray": [{"itemNumber": "2", "itemDescription01": "B", "amount": 5.0, "unit": 1}]}
    ]"#;

    fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_check_file_sizes_individual() {
        let limits = Limits::default();
        let files = vec![
            FileCandidate::new("ok.json", 10),
            FileCandidate::new("notes.txt", 10),
            FileCandidate::new("empty.json", 0),
            FileCandidate::new("huge.JSON", MAX_FILE_BYTES + 1),
        ];
        let rejections = check_file_sizes(&files, &limits);
        let names: Vec<_> = rejections.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["notes.txt", "empty.json", "huge.JSON"]);
        assert!(rejections[2].reason.contains("per-file"));
    }

    #[test]
    fn test_check_file_sizes_combined_rejects_all() {
        let limits = Limits {
            max_file_bytes: 100,
            max_total_bytes: 150,
        };
        let files = vec![FileCandidate::new("a.json", 80), FileCandidate::new("b.json", 80)];
        let rejections = check_file_sizes(&files, &limits);
        assert_eq!(rejections.len(), 2);
        assert!(rejections.iter().all(|r| r.reason.contains("combined")));
    }

    #[test]
    fn test_check_file_sizes_combined_ignores_rejected_files() {
        let limits = Limits::default();
        let files = vec![
            FileCandidate::new("photo.png", 90 * 1024 * 1024),
            FileCandidate::new("huge.json", 60 * 1024 * 1024),
            FileCandidate::new("receipts.json", 20 * 1024 * 1024),
        ];
        let rejections = check_file_sizes(&files, &limits);
        let names: Vec<_> = rejections.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["photo.png", "huge.json"]);
        assert!(rejections.iter().all(|r| !r.reason.contains("combined")));
    }

    #[tokio::test]
    async fn test_collect_reads_reports_failed_tasks() {
        let names = vec!["a.json".to_string(), "b.json".to_string()];
        let mut reads: JoinSet<(usize, std::io::Result<String>)> = JoinSet::new();
        reads.spawn(async { (0, Ok("[]".to_string())) });
        reads.spawn(async {
            if true {
                panic!("read task crashed");
            }
            (1, Ok(String::new()))
        });

        let mut report = IngestReport::default();
        let documents = collect_reads(reads, &names, &mut report).await;

        assert_eq!(documents, vec![("a.json".to_string(), "[]".to_string())]);
        assert_eq!(report.files.len(), 1);
        assert_eq!(report.files[0].filename, "b.json");
        assert_eq!(report.files[0].status, FileStatus::ReadFailed);
        assert!(report.errors[0].starts_with("b.json: read task failed"));
    }

    #[test]
    fn test_ingest_documents_drops_bad_receipts_and_files() {
        let report = ingest_documents(vec![
            ("a.json".to_string(), RECEIPTS.to_string()),
            ("b.json".to_string(), "{not json".to_string()),
            ("c.json".to_string(), "{}".to_string()),
            ("d.json".to_string(), OVERLAP.to_string()),
        ])
        .unwrap();

        assert_eq!(report.parsed_count, 3);
        assert_eq!(report.receipts.len(), 2);
        assert_eq!(report.dropped_in_merge(), 1);
        assert_eq!(report.loaded_files(), 2);

        let statuses: Vec<_> = report.files.iter().map(|f| f.status).collect();
        assert_eq!(
            statuses,
            vec![
                FileStatus::Loaded,
                FileStatus::ParseFailed,
                FileStatus::Invalid,
                FileStatus::Loaded
            ]
        );
        assert_eq!(report.files[0].invalid_count, 1);
        assert!(report.errors.iter().any(|e| e.starts_with("b.json")));
    }

    #[test]
    fn test_ingest_documents_fails_when_nothing_valid() {
        let err = ingest_documents(vec![("a.json".to_string(), "[]".to_string())]).unwrap_err();
        assert!(matches!(err, Error::Ingest(_)));
    }

    #[test]
    fn test_summary_lines_truncate() {
        let report = IngestReport {
            errors: (0..15).map(|i| format!("error {}", i)).collect(),
            ..Default::default()
        };
        let lines = report.summary_lines(DEFAULT_MAX_SHOWN);
        assert_eq!(lines[1], "15 errors:");
        assert_eq!(lines.iter().filter(|l| l.starts_with("  - ")).count(), 10);
        assert_eq!(lines.last().unwrap(), "  ... and 5 more");
    }

    #[tokio::test]
    async fn test_ingest_files_reads_concurrently_in_order() {
        let dir = TempDir::new().unwrap();
        let first = write(&dir, "first.json", RECEIPTS);
        let second = write(&dir, "second.json", OVERLAP);
        let skipped = write(&dir, "notes.txt", "hello");
        let missing = dir.path().join("missing.json");

        let report = ingest_files(&[first, skipped, second, missing], &Limits::default())
            .await
            .unwrap();

        assert_eq!(report.receipts.len(), 2);
        assert_eq!(report.receipts[0].dedup_key(), "B1");
        assert!(report.receipts[0].source_file.ends_with("first.json"));
        assert_eq!(report.loaded_files(), 2);
        assert!(report
            .files
            .iter()
            .any(|f| f.status == FileStatus::Rejected && f.filename.ends_with("notes.txt")));
        assert!(report
            .files
            .iter()
            .any(|f| f.status == FileStatus::ReadFailed && f.filename.ends_with("missing.json")));
    }

    #[tokio::test]
    async fn test_ingest_files_combined_limit_rejects_everything() {
        let dir = TempDir::new().unwrap();
        let first = write(&dir, "first.json", RECEIPTS);
        let second = write(&dir, "second.json", OVERLAP);
        let limits = Limits {
            max_file_bytes: 10_000,
            max_total_bytes: 100,
        };
        let err = ingest_files(&[first, second], &limits).await.unwrap_err();
        assert!(matches!(err, Error::Ingest(_)));
    }
}
