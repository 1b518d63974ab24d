use crate::sbom_generation::domain::Package;
use crate::shared::Result;
use async_trait::async_trait;

/// A dependency as a registry declares it, before version normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredDependency {
    pub name: String,
    pub constraint: String,
}

impl DeclaredDependency {
    pub fn new(name: impl Into<String>, constraint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            constraint: constraint.into(),
        }
    }
}

/// RegistryClient port for reading the dependency list of a published package
///
/// Used by the transitive resolver. Implementations must be `Send + Sync`
/// since one client serves every concurrent lookup of a resolution level.
#[async_trait]
pub trait RegistryClient: Send + Sync {
    /// Fetches the runtime dependencies declared by `package` at its version.
    ///
    /// A version of "latest" asks for the registry's current release.
    ///
    /// # Errors
    /// Returns an error if the request fails, times out, the registry
    /// answers with a non-success status, or the body cannot be decoded.
    async fn fetch_dependencies(&self, package: &Package) -> Result<Vec<DeclaredDependency>>;
}
