//! Outbound ports: the interfaces the scan pipeline uses to reach the
//! filesystem, registries, advisory feeds, remote workers and the console.
mod container_inventory;
mod formatter;
mod intelligence_source;
mod manifest_detector;
mod manifest_parser;
mod output_presenter;
mod progress_reporter;
mod registry_client;
mod remote_executor;
mod vulnerability_feed;

pub use container_inventory::ContainerInventory;
pub use formatter::ReportFormatter;
pub use intelligence_source::IntelligenceSource;
pub use manifest_detector::ManifestDetector;
pub use manifest_parser::{ManifestParser, ParserProvider};
pub use output_presenter::OutputPresenter;
pub use progress_reporter::ProgressReporter;
pub use registry_client::{DeclaredDependency, RegistryClient};
pub use remote_executor::RemoteScanExecutor;
pub use vulnerability_feed::VulnerabilityFeed;
