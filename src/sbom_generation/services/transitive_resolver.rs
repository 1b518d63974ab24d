//! Bounded, breadth-first registry resolution of transitive dependencies.
//!
//! Each level of the tree is fetched concurrently; results are merged into
//! the seen-set by the resolving task alone, in input order, so the output
//! does not depend on which request finishes first. A package reachable
//! through several parents is attributed to the first (shallowest) one.

use crate::ports::outbound::RegistryClient;
use crate::sbom_generation::domain::{Dependency, Package, PackageManager};
use crate::sbom_generation::services::normalize_constraint;
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::time::Duration;

/// Upper bound on registry requests in flight for one resolution level.
const MAX_CONCURRENT_LOOKUPS: usize = 16;

pub struct TransitiveResolver<'a> {
    client: &'a dyn RegistryClient,
    max_depth: u32,
    timeout: Duration,
}

impl<'a> TransitiveResolver<'a> {
    pub fn new(client: &'a dyn RegistryClient, max_depth: u32, timeout: Duration) -> Self {
        Self {
            client,
            max_depth,
            timeout,
        }
    }

    /// Returns the transitive dependencies reachable from `direct`, at
    /// depths `1..=max_depth`. The input itself is not repeated.
    pub async fn resolve(&self, direct: &[Dependency]) -> Vec<Dependency> {
        let mut seen: HashSet<String> = direct.iter().map(|d| d.purl().to_string()).collect();
        let mut frontier: Vec<Package> = direct.iter().map(|d| d.package.clone()).collect();
        let mut discovered = Vec::new();
        let mut depth = 0;

        while !frontier.is_empty() && depth < self.max_depth {
            let client = self.client;
            let timeout = self.timeout;
            let lookups: Vec<_> = frontier
                .iter()
                .cloned()
                .map(|parent| async move {
                    tokio::time::timeout(timeout, client.fetch_dependencies(&parent)).await
                })
                .collect();
            let responses: Vec<_> = stream::iter(lookups)
                .buffered(MAX_CONCURRENT_LOOKUPS)
                .collect()
                .await;

            let mut next = Vec::new();
            for (parent, response) in frontier.iter().zip(responses) {
                let declared = match response {
                    Ok(Ok(declared)) => declared,
                    Ok(Err(e)) => {
                        tracing::debug!(package = parent.purl(), error = %e, "registry lookup failed; skipping subtree");
                        continue;
                    }
                    Err(_) => {
                        tracing::debug!(package = parent.purl(), timeout = ?self.timeout, "registry lookup timed out; skipping subtree");
                        continue;
                    }
                };

                let Some(manager) = parent.manager() else {
                    continue;
                };
                for child in declared {
                    let package = child_package(&child.name, &child.constraint, manager);
                    if !seen.insert(package.purl().to_string()) {
                        continue;
                    }
                    discovered.push(Dependency::transitive(
                        package.clone(),
                        Some(parent.purl().to_string()),
                        depth + 1,
                    ));
                    next.push(package);
                }
            }

            frontier = next;
            depth += 1;
        }

        discovered
    }
}

fn child_package(name: &str, constraint: &str, manager: PackageManager) -> Package {
    Package::from_coordinates(name, normalize_constraint(constraint), manager)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::outbound::DeclaredDependency;
    use crate::shared::Result;
    use async_trait::async_trait;
    use std::collections::HashMap;

    /// Registry keyed by "name@version".
    struct FakeRegistry {
        entries: HashMap<String, Vec<DeclaredDependency>>,
        delay: Option<(String, Duration)>,
    }

    impl FakeRegistry {
        fn new(entries: Vec<(&str, Vec<(&str, &str)>)>) -> Self {
            Self {
                entries: entries
                    .into_iter()
                    .map(|(key, deps)| {
                        (
                            key.to_string(),
                            deps.into_iter()
                                .map(|(n, c)| DeclaredDependency::new(n, c))
                                .collect(),
                        )
                    })
                    .collect(),
                delay: None,
            }
        }
    }

    #[async_trait]
    impl RegistryClient for FakeRegistry {
        async fn fetch_dependencies(&self, package: &Package) -> Result<Vec<DeclaredDependency>> {
            let key = format!("{}@{}", package.registry_name(), package.version());
            if let Some((slow, delay)) = &self.delay {
                if *slow == key {
                    tokio::time::sleep(*delay).await;
                }
            }
            self.entries
                .get(&key)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("404 for {}", key))
        }
    }

    fn direct(name: &str, version: &str) -> Dependency {
        Dependency::direct(Package::new(name, version, PackageManager::Npm))
    }

    #[tokio::test]
    async fn test_resolves_levels_with_parents() {
        let registry = FakeRegistry::new(vec![
            ("express@4.18.2", vec![("body-parser", "1.20.1"), ("debug", "2.6.9")]),
            ("body-parser@1.20.1", vec![("bytes", "3.1.2")]),
            ("debug@2.6.9", vec![("ms", "2.0.0")]),
            ("bytes@3.1.2", vec![]),
            ("ms@2.0.0", vec![]),
        ]);
        let resolver = TransitiveResolver::new(&registry, 3, Duration::from_secs(5));
        let found = resolver.resolve(&[direct("express", "4.18.2")]).await;

        let summary: Vec<(&str, u32, Option<&str>)> = found
            .iter()
            .map(|d| (d.package.name(), d.depth, d.parent.as_deref()))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("body-parser", 1, Some("pkg:npm/express@4.18.2")),
                ("debug", 1, Some("pkg:npm/express@4.18.2")),
                ("bytes", 2, Some("pkg:npm/body-parser@1.20.1")),
                ("ms", 2, Some("pkg:npm/debug@2.6.9")),
            ]
        );
    }

    #[tokio::test]
    async fn test_respects_max_depth() {
        let registry = FakeRegistry::new(vec![
            ("a@1.0.0", vec![("b", "^1.0.0")]),
            ("b@1.0.0", vec![("c", "~1.0.0")]),
            ("c@1.0.0", vec![("d", "1.0.0")]),
        ]);
        let resolver = TransitiveResolver::new(&registry, 2, Duration::from_secs(5));
        let found = resolver.resolve(&[direct("a", "1.0.0")]).await;
        let names: Vec<&str> = found.iter().map(|d| d.package.name()).collect();
        assert_eq!(names, vec!["b", "c"]);
        assert!(found.iter().all(|d| d.depth >= 1 && d.depth <= 2));
    }

    #[tokio::test]
    async fn test_cycles_and_direct_duplicates_terminate() {
        let registry = FakeRegistry::new(vec![
            ("a@1.0.0", vec![("b", "1.0.0"), ("a", "1.0.0")]),
            ("b@1.0.0", vec![("a", "1.0.0")]),
        ]);
        let resolver = TransitiveResolver::new(&registry, 10, Duration::from_secs(5));
        let found = resolver.resolve(&[direct("a", "1.0.0")]).await;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].package.name(), "b");
    }

    #[tokio::test]
    async fn test_shared_child_attributed_once() {
        let registry = FakeRegistry::new(vec![
            ("a@1.0.0", vec![("shared", "1.0.0")]),
            ("b@1.0.0", vec![("shared", "1.0.0")]),
            ("shared@1.0.0", vec![]),
        ]);
        let resolver = TransitiveResolver::new(&registry, 3, Duration::from_secs(5));
        let found = resolver
            .resolve(&[direct("a", "1.0.0"), direct("b", "1.0.0")])
            .await;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].parent.as_deref(), Some("pkg:npm/a@1.0.0"));
    }

    #[tokio::test]
    async fn test_failed_branch_does_not_abort_siblings() {
        let registry = FakeRegistry::new(vec![("good@1.0.0", vec![("leaf", "1.0.0")]), ("leaf@1.0.0", vec![])]);
        let resolver = TransitiveResolver::new(&registry, 3, Duration::from_secs(5));
        let found = resolver
            .resolve(&[direct("missing", "1.0.0"), direct("good", "1.0.0")])
            .await;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].package.name(), "leaf");
    }

    #[tokio::test]
    async fn test_slow_branch_times_out() {
        let mut registry = FakeRegistry::new(vec![
            ("slow@1.0.0", vec![("never", "1.0.0")]),
            ("fast@1.0.0", vec![("quick", "1.0.0")]),
            ("quick@1.0.0", vec![]),
        ]);
        registry.delay = Some(("slow@1.0.0".to_string(), Duration::from_secs(5)));
        let resolver = TransitiveResolver::new(&registry, 2, Duration::from_millis(50));
        let found = resolver
            .resolve(&[direct("slow", "1.0.0"), direct("fast", "1.0.0")])
            .await;
        let names: Vec<&str> = found.iter().map(|d| d.package.name()).collect();
        assert_eq!(names, vec!["quick"]);
    }

    #[tokio::test]
    async fn test_resolution_future_is_send() {
        let registry = FakeRegistry::new(vec![("a@1.0.0", vec![("b", "1.0.0")])]);
        let resolver = TransitiveResolver::new(&registry, 2, Duration::from_secs(5));
        let roots = [direct("a", "1.0.0")];
        // Parsers call this from async-trait methods, whose futures must be Send.
        let boxed: std::pin::Pin<Box<dyn std::future::Future<Output = Vec<Dependency>> + Send + '_>> =
            Box::pin(resolver.resolve(&roots));
        let found = boxed.await;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].package.name(), "b");
    }

    #[tokio::test]
    async fn test_scoped_children_keep_namespace() {
        let registry = FakeRegistry::new(vec![("app@1.0.0", vec![("@types/node", "^20.1.0")])]);
        let resolver = TransitiveResolver::new(&registry, 1, Duration::from_secs(5));
        let found = resolver.resolve(&[direct("app", "1.0.0")]).await;
        assert_eq!(found[0].purl(), "pkg:npm/@types/node@20.1.0");
    }
}
