use crate::ports::outbound::ProgressReporter;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use std::sync::Mutex;

/// Writes scan progress to stderr, keeping stdout free for the report.
///
/// Batch progress is drawn with an indicatif bar that is reused across
/// batches and cleared before any plain message is printed.
pub struct StderrProgressReporter {
    progress_bar: Mutex<Option<ProgressBar>>,
}

impl StderrProgressReporter {
    pub fn new() -> Self {
        Self {
            progress_bar: Mutex::new(None),
        }
    }

    fn progress_bar(&self, total: usize) -> Option<ProgressBar> {
        let mut slot = self.progress_bar.lock().ok()?;
        if let Some(pb) = slot.as_ref() {
            if pb.length() != Some(total as u64) {
                pb.set_length(total as u64);
            }
            return Some(pb.clone());
        }

        let pb = ProgressBar::new(total as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("   {spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) - {msg}")
        {
            pb.set_style(style.progress_chars("=>-"));
        }
        *slot = Some(pb.clone());
        Some(pb)
    }

    fn clear_bar(&self) {
        if let Ok(mut slot) = self.progress_bar.lock() {
            if let Some(pb) = slot.take() {
                pb.finish_and_clear();
            }
        }
    }
}

impl Default for StderrProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for StderrProgressReporter {
    fn report(&self, message: &str) {
        self.clear_bar();
        eprintln!("{}", message);
    }

    fn report_progress(&self, current: usize, total: usize, message: Option<&str>) {
        if let Some(pb) = self.progress_bar(total) {
            pb.set_position(current as u64);
            if let Some(msg) = message {
                pb.set_message(msg.to_string());
            }
        }
    }

    fn report_error(&self, message: &str) {
        self.clear_bar();
        eprintln!("{} {}", "⚠".yellow(), message.yellow());
    }

    fn report_completion(&self, message: &str) {
        self.clear_bar();
        eprintln!("{} {}", "✔".green(), message);
    }
}
