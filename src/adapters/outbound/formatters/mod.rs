/// Formatter adapters for the report output formats
mod json_formatter;
mod summary_formatter;
mod yaml_formatter;

pub use json_formatter::JsonFormatter;
pub use summary_formatter::SummaryFormatter;
pub use yaml_formatter::YamlFormatter;
