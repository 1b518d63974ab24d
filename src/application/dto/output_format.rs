/// Output format of the rendered report
///
/// Shared by the CLI, the configuration file and the formatter factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Full ScanResult documents as JSON (default)
    #[default]
    Json,
    /// The same documents as YAML
    Yaml,
    /// Human-readable Markdown summary
    Summary,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "yaml" | "yml" => Ok(OutputFormat::Yaml),
            "summary" | "markdown" | "md" => Ok(OutputFormat::Summary),
            _ => Err(format!(
                "Invalid format: {}. Please specify 'json', 'yaml' or 'summary'",
                s
            )),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Yaml => write!(f, "yaml"),
            OutputFormat::Summary => write!(f, "summary"),
        }
    }
}
