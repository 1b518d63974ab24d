use crate::sbom_generation::domain::{Package, Vulnerability};
use crate::shared::Result;
use async_trait::async_trait;

/// VulnerabilityFeed port for advisory databases
#[async_trait]
pub trait VulnerabilityFeed: Send + Sync {
    /// Source tag stored on every returned advisory
    fn source(&self) -> &str;

    /// Returns the advisories affecting `package` at its version; an empty
    /// list when the feed does not cover the package's ecosystem.
    ///
    /// # Errors
    /// Returns an error if the feed cannot be queried.
    async fn query(&self, package: &Package) -> Result<Vec<Vulnerability>>;
}
