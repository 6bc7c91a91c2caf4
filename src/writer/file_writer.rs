use crate::error::{AnimCodeError, Result};
use crate::parser::FileRecord;
use crate::ui::GracefulShutdown;
use crate::writer::path_policy::{PathDecision, PathPolicy};
use crate::writer::result::WriteResult;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tempfile::NamedTempFile;

#[cfg(windows)]
const MAX_PATH: usize = 260;

#[cfg(not(windows))]
const MAX_PATH: usize = 4096;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteFailure {
    pub path: String,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct WriteReport {
    pub saved_files: Vec<String>,
    pub skipped_files: Vec<String>,
    pub failures: Vec<WriteFailure>,
    pub bytes_written: u64,
    pub files_processed: usize,
    pub total_files: usize,
    pub current_file: Option<String>,
    pub start_time: Instant,
    pub cancelled: bool,
}

impl WriteReport {
    pub fn new(total_files: usize) -> Self {
        Self {
            saved_files: Vec::new(),
            skipped_files: Vec::new(),
            failures: Vec::new(),
            bytes_written: 0,
            files_processed: 0,
            total_files,
            current_file: None,
            start_time: Instant::now(),
            cancelled: false,
        }
    }

    fn record_saved(&mut self, path: &str, bytes: u64) {
        self.saved_files.push(path.to_string());
        self.bytes_written += bytes;
    }

    fn record_skipped(&mut self, path: &str) {
        self.skipped_files.push(path.to_string());
    }

    fn record_failure<S: Into<String>>(&mut self, path: &str, reason: S) {
        self.failures.push(WriteFailure {
            path: path.to_string(),
            reason: reason.into(),
        });
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    pub fn percentage(&self) -> f64 {
        if self.total_files == 0 {
            0.0
        } else {
            (self.files_processed as f64 / self.total_files as f64) * 100.0
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn into_write_result(self) -> WriteResult {
        if self.cancelled {
            WriteResult::cancelled(self.saved_files)
        } else {
            WriteResult::saved(self.saved_files)
        }
    }
}

pub struct FileWriter {
    policy: PathPolicy,
    shutdown: Option<GracefulShutdown>,
}

impl FileWriter {
    pub fn new() -> Self {
        Self {
            policy: PathPolicy::default(),
            shutdown: None,
        }
    }

    pub fn with_policy(mut self, policy: PathPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Stop starting new files once a shutdown has been requested.
    pub fn with_shutdown(mut self, shutdown: GracefulShutdown) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Write every record under `base_dir`, skipping protected paths.
    ///
    /// A failing record never aborts the batch; it shows up in
    /// `failures` and is left out of `saved_files`.
    pub fn write_files(
        &self,
        base_dir: &Path,
        records: &[FileRecord],
        progress_callback: Option<&dyn Fn(&WriteReport)>,
    ) -> WriteReport {
        let mut report = WriteReport::new(records.len());

        tracing::info!(
            files = records.len(),
            base_dir = %base_dir.display(),
            "Saving animation files"
        );

        for record in records {
            if self.shutdown.as_ref().is_some_and(|s| !s.is_running()) {
                tracing::warn!(
                    remaining = records.len() - report.files_processed,
                    "Shutdown requested, not starting further files"
                );
                report.cancelled = true;
                break;
            }

            report.current_file = Some(record.path.clone());
            if let Some(callback) = progress_callback {
                callback(&report);
            }

            match self.policy.check(&record.path) {
                PathDecision::Write => match self.write_record(base_dir, record) {
                    Ok(bytes) => {
                        tracing::info!(path = %record.path, bytes, "Saved file");
                        report.record_saved(&record.path, bytes);
                    }
                    Err(e) => {
                        tracing::error!(path = %record.path, error = %e, "Failed to save file");
                        report.record_failure(&record.path, e.to_string());
                    }
                },
                PathDecision::Protected(token) => {
                    tracing::warn!(path = %record.path, protected = %token, "Skipping protected file");
                    report.record_skipped(&record.path);
                }
                PathDecision::Unsafe(reason) => {
                    tracing::error!(path = %record.path, reason = %reason, "Rejected unsafe file path");
                    report.record_failure(&record.path, reason);
                }
            }

            report.files_processed += 1;
        }

        report.current_file = None;
        if let Some(callback) = progress_callback {
            callback(&report);
        }

        tracing::info!(
            saved = report.saved_files.len(),
            skipped = report.skipped_files.len(),
            failed = report.failures.len(),
            "Finished saving animation files"
        );

        report
    }

    /// Write a single record, returning the number of bytes written.
    pub fn write_record(&self, base_dir: &Path, record: &FileRecord) -> Result<u64> {
        let target = base_dir.join(&record.path);
        check_path_length(&target)?;

        let parent = target.parent().ok_or_else(|| AnimCodeError::InvalidPath {
            path: record.path.clone(),
            reason: "no parent directory".to_string(),
        })?;
        ensure_directory_exists(parent)?;

        write_atomic(&target, record.content.as_bytes())?;
        Ok(record.content.len() as u64)
    }
}

impl Default for FileWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Replace `target` with `data` without ever exposing a partially written file.
///
/// The bytes go to a temporary file next to the target, which is renamed
/// over it once flushed. On failure the temporary file is removed and any
/// previous target is left as it was. A symlink at `target` is replaced by
/// a regular file, so a write never lands outside the base directory.
pub fn write_atomic(target: &Path, data: &[u8]) -> Result<()> {
    let parent = target.parent().unwrap_or_else(|| Path::new("."));
    let permissions = target_permissions(target);

    let mut temp = NamedTempFile::new_in(parent)?;
    temp.write_all(data)?;
    temp.flush()?;
    temp.as_file().sync_all()?;

    if let Some(permissions) = permissions {
        fs::set_permissions(temp.path(), permissions)?;
    }

    temp.persist(target).map_err(|e| AnimCodeError::Io(e.error))?;
    Ok(())
}

// Temp files are created 0600; keep what the target had, or a fixed 0644
// that does not depend on the process umask.
fn target_permissions(target: &Path) -> Option<fs::Permissions> {
    if let Ok(metadata) = fs::metadata(target) {
        if metadata.is_file() {
            return Some(metadata.permissions());
        }
    }

    default_permissions()
}

#[cfg(unix)]
fn default_permissions() -> Option<fs::Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn default_permissions() -> Option<fs::Permissions> {
    None
}

/// Create `path` and any missing parents. Existing directories are fine.
pub fn ensure_directory_exists<P: AsRef<Path>>(path: P) -> Result<PathBuf> {
    let path = path.as_ref();
    fs::create_dir_all(path)?;
    tracing::debug!(path = %path.display(), "Ensured directory exists");
    Ok(path.to_path_buf())
}

pub fn check_path_length(path: &Path) -> Result<()> {
    let path_str = path.to_string_lossy();

    if path_str.len() > MAX_PATH {
        Err(AnimCodeError::InvalidPath {
            path: path_str.to_string(),
            reason: format!("path too long: {} characters (max: {})", path_str.len(), MAX_PATH),
        })
    } else {
        Ok(())
    }
}
