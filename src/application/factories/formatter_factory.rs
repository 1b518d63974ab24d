use crate::adapters::outbound::formatters::{JsonFormatter, SummaryFormatter, YamlFormatter};
use crate::application::dto::OutputFormat;
use crate::ports::outbound::ReportFormatter;

/// Factory for creating report formatters
///
/// Selects the formatter adapter for the requested output format.
pub struct FormatterFactory;

impl FormatterFactory {
    /// Creates a formatter instance for the specified output format
    ///
    /// # Examples
    /// ```
    /// use dependency_canary::application::dto::OutputFormat;
    /// use dependency_canary::application::factories::FormatterFactory;
    /// use dependency_canary::ports::outbound::ReportFormatter;
    ///
    /// let formatter = FormatterFactory::create(OutputFormat::Yaml);
    /// assert!(formatter.format(&[]).is_ok());
    /// ```
    pub fn create(format: OutputFormat) -> Box<dyn ReportFormatter> {
        match format {
            OutputFormat::Json => Box::new(JsonFormatter::new()),
            OutputFormat::Yaml => Box::new(YamlFormatter::new()),
            OutputFormat::Summary => Box::new(SummaryFormatter::new()),
        }
    }

    /// Returns the progress message for the specified output format
    pub fn progress_message(format: OutputFormat) -> &'static str {
        match format {
            OutputFormat::Json => "📝 Generating JSON report...",
            OutputFormat::Yaml => "📝 Generating YAML report...",
            OutputFormat::Summary => "📝 Generating summary report...",
        }
    }
}
