use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Centralized progress bar creation utilities
pub struct ProgressUtils;

impl ProgressUtils {
    /// Byte progress for a file download. Falls back to a spinner when the size is unknown.
    pub fn create_download_progress(total_bytes: u64) -> ProgressBar {
        if total_bytes == 0 {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} [{elapsed_precise}] {bytes} ({bytes_per_sec}) {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            return pb;
        }

        let pb = ProgressBar::new(total_bytes);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta}) {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb
    }

    /// Spinner shown while the publish challenge is being solved.
    pub fn create_activity_spinner(message: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(120));
        pb
    }
}

/// Common progress bar messages
pub struct ProgressMessages;

impl ProgressMessages {
    pub const SOLVING_CHALLENGE: &'static str = "Solving publish challenge...";
    pub const COMPLETED: &'static str = "✅ Completed";
    pub const FAILED: &'static str = "❌ Failed";

    pub fn downloading(filename: &str) -> String {
        format!("⬇️ {}", filename)
    }
}
