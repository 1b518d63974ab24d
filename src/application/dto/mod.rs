/// Data Transfer Objects for application layer
///
/// DTOs carry scan parameters from the CLI (or a remote caller) into the
/// use cases, keeping the domain layer isolated.
mod output_format;
mod scan_request;

pub use output_format::OutputFormat;
pub use scan_request::{ScanOptions, ScanRequest, ScanTarget};
