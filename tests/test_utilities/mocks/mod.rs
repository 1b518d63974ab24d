/// Mock implementations for testing
mod mock_intelligence_source;
mod mock_progress_reporter;
mod mock_registry_client;
mod mock_remote_executor;
mod mock_vulnerability_feed;

pub use mock_intelligence_source::MockIntelligenceSource;
pub use mock_progress_reporter::MockProgressReporter;
pub use mock_registry_client::MockRegistryClient;
pub use mock_remote_executor::MockRemoteExecutor;
pub use mock_vulnerability_feed::MockVulnerabilityFeed;
