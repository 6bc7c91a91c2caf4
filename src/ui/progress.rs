use crate::ui::output::format_duration;
use crate::writer::WriteReport;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

pub struct ProgressManager {
    enabled: bool,
}

impl ProgressManager {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn create_write_progress(&self, total_files: u64) -> ProgressBar {
        if !self.enabled {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new(total_files);
        pb.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>4}/{len:4} files {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
        );
        pb.set_message("Writing files...");
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }
}

impl Default for ProgressManager {
    fn default() -> Self {
        Self::new(true)
    }
}

pub fn update_write_progress(pb: &ProgressBar, report: &WriteReport) {
    pb.set_length(report.total_files as u64);
    pb.set_position(report.files_processed as u64);

    match report.current_file {
        Some(ref current_file) => pb.set_message(format!("Writing {}", current_file)),
        None => pb.set_message("Writing files..."),
    }
}

pub fn finish_progress_with_summary(pb: &ProgressBar, message: &str, duration: Duration) {
    let final_message = format!("{} (completed in {})", message, format_duration(duration));
    pb.finish_with_message(final_message);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_manager_returns_hidden_bar() {
        let manager = ProgressManager::new(false);
        assert!(manager.create_write_progress(10).is_hidden());
    }

    #[test]
    fn test_update_write_progress() {
        let pb = ProgressBar::hidden();
        let mut report = WriteReport::new(4);
        report.files_processed = 2;
        report.current_file = Some("pages/a.vue".to_string());

        update_write_progress(&pb, &report);
        assert_eq!(pb.position(), 2);
        assert_eq!(pb.length(), Some(4));
        assert_eq!(pb.message(), "Writing pages/a.vue");

        report.current_file = None;
        update_write_progress(&pb, &report);
        assert_eq!(pb.message(), "Writing files...");
    }

    #[test]
    fn test_finish_progress() {
        let pb = ProgressBar::hidden();
        finish_progress_with_summary(&pb, "Saved 2 files", Duration::from_millis(5));
        assert!(pb.is_finished());
        assert!(pb.message().starts_with("Saved 2 files"));
    }
}
