use crate::shared::Result;

/// OutputPresenter port for delivering the rendered report
pub trait OutputPresenter {
    /// Writes `content` to the destination (stdout or a file).
    ///
    /// # Errors
    /// Returns an error if the destination cannot be written.
    fn present(&self, content: &str) -> Result<()>;
}
