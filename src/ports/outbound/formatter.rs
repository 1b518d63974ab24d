use crate::sbom_generation::domain::ScanResult;
use crate::shared::Result;

/// ReportFormatter port for rendering scan results
pub trait ReportFormatter {
    /// Renders one result per scanned target.
    ///
    /// # Errors
    /// Returns an error if serialization fails
    fn format(&self, results: &[ScanResult]) -> Result<String>;
}
