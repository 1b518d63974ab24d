use async_trait::async_trait;
use dependency_canary::ports::outbound::VulnerabilityFeed;
use dependency_canary::prelude::*;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Mock VulnerabilityFeed returning canned advisories keyed by PURL
pub struct MockVulnerabilityFeed {
    source: String,
    advisories: HashMap<String, Vec<Vulnerability>>,
    should_fail: bool,
    queries: AtomicUsize,
}

impl MockVulnerabilityFeed {
    pub fn new(source: &str) -> Self {
        Self {
            source: source.to_string(),
            advisories: HashMap::new(),
            should_fail: false,
            queries: AtomicUsize::new(0),
        }
    }

    pub fn with_advisory(mut self, purl: &str, vulnerability: Vulnerability) -> Self {
        self.advisories
            .entry(purl.to_string())
            .or_default()
            .push(vulnerability);
        self
    }

    pub fn with_failure(source: &str) -> Self {
        Self {
            should_fail: true,
            ..Self::new(source)
        }
    }

    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VulnerabilityFeed for MockVulnerabilityFeed {
    fn source(&self) -> &str {
        &self.source
    }

    async fn query(&self, package: &Package) -> Result<Vec<Vulnerability>> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if self.should_fail {
            anyhow::bail!("{} feed unavailable", self.source);
        }
        Ok(self
            .advisories
            .get(package.purl())
            .cloned()
            .unwrap_or_default())
    }
}
