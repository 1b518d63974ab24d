use async_trait::async_trait;
use dependency_canary::ports::outbound::{DeclaredDependency, RegistryClient};
use dependency_canary::prelude::*;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Mock RegistryClient serving a fixed dependency table keyed by package name
///
/// Names listed with `with_failure` answer with an error, as a registry
/// returning a non-2xx status would.
#[derive(Default)]
pub struct MockRegistryClient {
    table: HashMap<String, Vec<DeclaredDependency>>,
    failing: Vec<String>,
    calls: AtomicUsize,
}

impl MockRegistryClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dependencies(mut self, name: &str, deps: &[(&str, &str)]) -> Self {
        self.table.insert(
            name.to_string(),
            deps.iter()
                .map(|(dep, constraint)| DeclaredDependency::new(*dep, *constraint))
                .collect(),
        );
        self
    }

    pub fn with_failure(mut self, name: &str) -> Self {
        self.failing.push(name.to_string());
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RegistryClient for MockRegistryClient {
    async fn fetch_dependencies(&self, package: &Package) -> Result<Vec<DeclaredDependency>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.iter().any(|n| n == package.name()) {
            anyhow::bail!("registry returned status 503 for {}", package.name());
        }
        Ok(self.table.get(package.name()).cloned().unwrap_or_default())
    }
}
