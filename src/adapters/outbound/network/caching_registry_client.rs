use crate::ports::outbound::{DeclaredDependency, RegistryClient};
use crate::sbom_generation::domain::Package;
use crate::shared::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;

/// CachingRegistryClient wraps a RegistryClient and remembers every
/// successful lookup by PURL.
///
/// One instance is shared by all projects of a multi-project scan, so a
/// package reached from several projects is fetched once. Failures are not
/// cached; a later lookup retries.
pub struct CachingRegistryClient<R: RegistryClient> {
    inner: R,
    cache: Arc<DashMap<String, Vec<DeclaredDependency>>>,
}

impl<R: RegistryClient> CachingRegistryClient<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            cache: Arc::new(DashMap::new()),
        }
    }

    #[cfg(test)]
    pub fn cache_size(&self) -> usize {
        self.cache.len()
    }
}

#[async_trait]
impl<R: RegistryClient> RegistryClient for CachingRegistryClient<R> {
    async fn fetch_dependencies(&self, package: &Package) -> Result<Vec<DeclaredDependency>> {
        if let Some(cached) = self.cache.get(package.purl()) {
            return Ok(cached.clone());
        }

        let declared = self.inner.fetch_dependencies(package).await?;
        self.cache
            .insert(package.purl().to_string(), declared.clone());
        Ok(declared)
    }
}
