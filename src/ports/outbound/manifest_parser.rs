use crate::sbom_generation::domain::{Dependency, PackageManager};
use crate::shared::ParseResult;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

/// ManifestParser port implemented once per ecosystem.
///
/// Implementations provide `read_manifest` and `read_lockfile`, which report
/// every failure as a [`ParseError`](crate::shared::ParseError). Callers use the provided
/// `parse_manifest` and `parse_lockfile`, which log malformed input and
/// degrade it to an empty list, while an unsupported lockfile name still
/// reaches the caller.
#[async_trait]
pub trait ManifestParser: Send + Sync {
    /// Short ecosystem label used in logs and errors
    fn name(&self) -> &'static str;

    /// Managers whose files this parser understands
    fn package_managers(&self) -> &'static [PackageManager];

    /// Extracts the dependencies a manifest declares, all at depth 0
    async fn read_manifest(&self, path: &Path) -> ParseResult<Vec<Dependency>>;

    /// Extracts the full pinned set recorded by a lockfile
    async fn read_lockfile(&self, path: &Path) -> ParseResult<Vec<Dependency>>;

    /// Expands direct dependencies through the ecosystem's registry.
    ///
    /// Returns the input followed by every discovered transitive dependency.
    /// Ecosystems without a registry client return the input unchanged.
    async fn resolve_transitive(&self, dependencies: Vec<Dependency>) -> Vec<Dependency> {
        dependencies
    }

    async fn parse_manifest(&self, path: &Path) -> Vec<Dependency> {
        match self.read_manifest(path).await {
            Ok(deps) => deps,
            Err(e) => {
                tracing::warn!(parser = self.name(), path = %path.display(), error = %e, "skipping unparseable manifest");
                Vec::new()
            }
        }
    }

    /// # Errors
    /// Returns [`ParseError::UnsupportedFormat`](crate::shared::ParseError::UnsupportedFormat) when the file name is not a
    /// lockfile this parser knows.
    async fn parse_lockfile(&self, path: &Path) -> ParseResult<Vec<Dependency>> {
        match self.read_lockfile(path).await {
            Ok(deps) => Ok(deps),
            Err(e) if e.is_unsupported() => Err(e),
            Err(e) => {
                tracing::warn!(parser = self.name(), path = %path.display(), error = %e, "skipping unparseable lockfile");
                Ok(Vec::new())
            }
        }
    }
}

/// Lookup from package manager to the parser that reads its files
pub trait ParserProvider: Send + Sync {
    fn parser_for(&self, manager: PackageManager) -> Option<Arc<dyn ManifestParser>>;
}
