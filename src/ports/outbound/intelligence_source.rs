use crate::sbom_generation::domain::{Package, PackageIntelligence};
use crate::shared::Result;
use async_trait::async_trait;

/// IntelligenceSource port for registry popularity and provenance data
#[async_trait]
pub trait IntelligenceSource: Send + Sync {
    /// Whether this source knows the registry behind `package_manager`
    fn supports(&self, package_manager: &str) -> bool;

    /// Gathers download counts, maintainers, publish time, project URLs and
    /// dependency count. Figures the registry does not report stay `None`
    /// or empty; heuristic signals are derived later.
    ///
    /// # Errors
    /// Returns an error only when no figure at all could be gathered.
    async fn gather(&self, package: &Package) -> Result<PackageIntelligence>;
}
