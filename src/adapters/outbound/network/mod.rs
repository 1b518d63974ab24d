/// Network adapters for registry, advisory feed and remote worker calls
mod caching_registry_client;
mod caching_vulnerability_feed;
mod http;
mod npm_registry;
mod osv_client;
mod pypi_registry;
mod remote_executor;

pub use caching_registry_client::CachingRegistryClient;
pub use caching_vulnerability_feed::CachingVulnerabilityFeed;
pub use http::{HttpClient, DEFAULT_TIMEOUT};
pub use npm_registry::NpmRegistry;
pub use osv_client::OsvClient;
pub use pypi_registry::PyPiRegistry;
pub use remote_executor::{HttpRemoteExecutor, DEFAULT_REMOTE_TIMEOUT};
