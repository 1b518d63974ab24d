use crate::ports::outbound::VulnerabilityFeed;
use crate::sbom_generation::domain::{Package, Vulnerability};
use crate::shared::Result;
use async_trait::async_trait;
use dashmap::DashMap;

/// Decorator that answers repeated queries for the same PURL from memory.
pub struct CachingVulnerabilityFeed<F: VulnerabilityFeed> {
    inner: F,
    cache: DashMap<String, Vec<Vulnerability>>,
}

impl<F: VulnerabilityFeed> CachingVulnerabilityFeed<F> {
    pub fn new(inner: F) -> Self {
        Self {
            inner,
            cache: DashMap::new(),
        }
    }
}

#[async_trait]
impl<F: VulnerabilityFeed> VulnerabilityFeed for CachingVulnerabilityFeed<F> {
    fn source(&self) -> &str {
        self.inner.source()
    }

    async fn query(&self, package: &Package) -> Result<Vec<Vulnerability>> {
        if let Some(cached) = self.cache.get(package.purl()) {
            return Ok(cached.clone());
        }
        let vulns = self.inner.query(package).await?;
        self.cache.insert(package.purl().to_string(), vulns.clone());
        Ok(vulns)
    }
}
