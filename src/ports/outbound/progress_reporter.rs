/// ProgressReporter port for user-facing progress output
///
/// Distinct from logging: this is what an interactive user watches while a
/// scan runs. Shared across concurrent project scans, hence `Send + Sync`.
pub trait ProgressReporter: Send + Sync {
    /// Reports a stage message
    fn report(&self, message: &str);

    /// Reports progress through a batch
    ///
    /// # Arguments
    /// * `current` - Items done so far
    /// * `total` - Items expected
    /// * `message` - Optional label
    fn report_progress(&self, current: usize, total: usize, message: Option<&str>);

    /// Reports a warning that does not stop the scan
    fn report_error(&self, message: &str);

    /// Reports the end of a stage
    fn report_completion(&self, message: &str);
}

impl<T: ProgressReporter + ?Sized> ProgressReporter for std::sync::Arc<T> {
    fn report(&self, message: &str) {
        (**self).report(message)
    }

    fn report_progress(&self, current: usize, total: usize, message: Option<&str>) {
        (**self).report_progress(current, total, message)
    }

    fn report_error(&self, message: &str) {
        (**self).report_error(message)
    }

    fn report_completion(&self, message: &str) {
        (**self).report_completion(message)
    }
}
