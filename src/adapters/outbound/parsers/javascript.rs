use super::{file_name, from_json, from_yaml};
use crate::adapters::outbound::filesystem::{read_manifest, read_sibling};
use crate::ports::outbound::{ManifestParser, RegistryClient};
use crate::sbom_generation::domain::{Dependency, Package, PackageManager};
use crate::sbom_generation::services::{normalize_constraint, TransitiveResolver};
use crate::shared::{ParseError, ParseResult};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Parser for npm, Yarn and PNPM projects.
///
/// One instance exists per manager so the PURL type of every package
/// matches the tool that produced the file.
pub struct JavaScriptParser {
    manager: PackageManager,
    registry: Option<Arc<dyn RegistryClient>>,
    max_depth: u32,
    timeout: Duration,
}

/// How the sibling `package.json` declares a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Declared {
    Runtime,
    Dev,
    Optional,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PackageJson {
    #[serde(default)]
    dependencies: Map<String, Value>,
    #[serde(default)]
    dev_dependencies: Map<String, Value>,
    #[serde(default)]
    optional_dependencies: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct PackageLock {
    #[serde(default)]
    packages: BTreeMap<String, LockedPackage>,
    #[serde(default)]
    dependencies: BTreeMap<String, LegacyLockedPackage>,
}

#[derive(Debug, Deserialize)]
struct LockedPackage {
    version: Option<String>,
    #[serde(default)]
    dev: bool,
    #[serde(default)]
    optional: bool,
    #[serde(default)]
    link: bool,
}

#[derive(Debug, Deserialize)]
struct LegacyLockedPackage {
    version: Option<String>,
    #[serde(default)]
    dev: bool,
    #[serde(default)]
    dependencies: BTreeMap<String, LegacyLockedPackage>,
}

impl JavaScriptParser {
    pub fn new(
        manager: PackageManager,
        registry: Option<Arc<dyn RegistryClient>>,
        max_depth: u32,
        timeout: Duration,
    ) -> Self {
        Self {
            manager,
            registry,
            max_depth,
            timeout,
        }
    }

    fn package(&self, name: &str, version: impl Into<String>) -> Package {
        Package::from_coordinates(name, version, self.manager)
    }

    fn parse_package_json(&self, manifest: &PackageJson) -> Vec<Dependency> {
        let sections = [
            (&manifest.dependencies, Declared::Runtime),
            (&manifest.dev_dependencies, Declared::Dev),
            (&manifest.optional_dependencies, Declared::Optional),
        ];
        sections
            .into_iter()
            .flat_map(|(section, kind)| {
                section.iter().map(move |(name, constraint)| {
                    let version = normalize_constraint(constraint.as_str().unwrap_or_default());
                    declared(self.package(name, version), kind)
                })
            })
            .collect()
    }

    fn parse_package_lock(&self, lock: &PackageLock) -> Vec<Dependency> {
        if !lock.packages.is_empty() {
            return self.parse_packages_section(&lock.packages);
        }
        let mut deps = Vec::new();
        self.walk_legacy_tree(&lock.dependencies, None, 0, &mut deps);
        deps
    }

    /// lockfileVersion 2+: the key path encodes depth as the number of
    /// `node_modules/` segments.
    fn parse_packages_section(&self, packages: &BTreeMap<String, LockedPackage>) -> Vec<Dependency> {
        let mut deps = Vec::new();
        for (path, info) in packages {
            if path.is_empty() || info.link || !path.contains("node_modules/") {
                continue;
            }
            let Some(version) = &info.version else {
                continue;
            };
            let (parent_path, name) = match path.rsplit_once("node_modules/") {
                Some(split) => split,
                None => continue,
            };
            let depth = path.matches("node_modules/").count().saturating_sub(1) as u32;
            let package = self.package(name, version.as_str());

            let mut dep = if depth == 0 && info.optional && !info.dev {
                Dependency::optional(package)
            } else {
                Dependency::at_depth(package, depth, info.dev)
            };
            dep.is_optional = info.optional;

            let parent_key = parent_path.trim_end_matches('/');
            if let Some(parent) = packages.get(parent_key).filter(|_| depth > 0) {
                if let (Some(parent_version), Some((_, parent_name))) =
                    (&parent.version, parent_key.rsplit_once("node_modules/"))
                {
                    dep = dep.with_parent(
                        self.package(parent_name, parent_version.as_str()).purl(),
                    );
                }
            }
            deps.push(dep);
        }
        deps
    }

    /// lockfileVersion 1: nesting of `dependencies` blocks is the tree.
    fn walk_legacy_tree(
        &self,
        entries: &BTreeMap<String, LegacyLockedPackage>,
        parent: Option<&str>,
        depth: u32,
        out: &mut Vec<Dependency>,
    ) {
        for (name, info) in entries {
            let Some(version) = &info.version else {
                continue;
            };
            let package = self.package(name, version.as_str());
            let purl = package.purl().to_string();
            let mut dep = Dependency::at_depth(package, depth, info.dev);
            if let Some(parent) = parent {
                dep = dep.with_parent(parent);
            }
            out.push(dep);
            self.walk_legacy_tree(&info.dependencies, Some(&purl), depth + 1, out);
        }
    }

    async fn declared_names(&self, lockfile: &Path) -> HashMap<String, Declared> {
        let Some(content) = read_sibling(lockfile, "package.json").await else {
            return HashMap::new();
        };
        let manifest: PackageJson = serde_json::from_str(&content).unwrap_or_default();
        let mut names = HashMap::new();
        // Runtime wins when a name appears in more than one section
        for (section, kind) in [
            (&manifest.optional_dependencies, Declared::Optional),
            (&manifest.dev_dependencies, Declared::Dev),
            (&manifest.dependencies, Declared::Runtime),
        ] {
            for name in section.keys() {
                names.insert(name.clone(), kind);
            }
        }
        names
    }

    fn classify(&self, entries: Vec<(String, String)>, direct: &HashMap<String, Declared>) -> Vec<Dependency> {
        entries
            .into_iter()
            .map(|(name, version)| {
                let package = self.package(&name, version);
                match direct.get(&name) {
                    Some(kind) => declared(package, *kind),
                    None => Dependency::unattributed(package),
                }
            })
            .collect()
    }
}

fn declared(package: Package, kind: Declared) -> Dependency {
    match kind {
        Declared::Runtime => Dependency::direct(package),
        Declared::Dev => Dependency::dev(package),
        Declared::Optional => Dependency::optional(package),
    }
}

/// Reads `(name, version)` pairs from a Yarn classic or Berry lockfile.
fn parse_yarn_lock(content: &str) -> Vec<(String, String)> {
    let mut entries = Vec::new();
    let mut current: Option<String> = None;

    for line in content.lines() {
        if line.trim().is_empty() || line.trim_start().starts_with('#') {
            continue;
        }
        if !line.starts_with(' ') {
            current = line
                .strip_suffix(':')
                .and_then(|header| header.split(',').next())
                .map(|spec| spec.trim().trim_matches('"'))
                .filter(|spec| !spec.contains("@workspace:") && !spec.contains("@link:"))
                .and_then(yarn_spec_name)
                .map(str::to_string);
            continue;
        }

        let trimmed = line.trim();
        let version = trimmed
            .strip_prefix("version:")
            .or_else(|| trimmed.strip_prefix("version "));
        if let (Some(name), Some(version)) = (current.as_ref(), version) {
            let version = version.trim().trim_matches('"');
            if !version.is_empty() {
                entries.push((name.clone(), version.to_string()));
            }
            current = None;
        }
    }
    entries
}

/// `"@babel/core@^7.0.0"` -> `@babel/core`; `lodash@npm:^4.17.21` -> `lodash`.
fn yarn_spec_name(spec: &str) -> Option<&str> {
    let at = spec.get(1..)?.find('@')? + 1;
    Some(&spec[..at])
}

#[derive(Debug, Deserialize)]
struct PnpmLock {
    #[serde(default)]
    packages: BTreeMap<String, serde_yaml_ng::Value>,
}

/// Splits a PNPM package key into name and version across the v5
/// (`/name/1.0.0_peer`), v6 (`/name@1.0.0(peer)`) and v9 (`name@1.0.0`)
/// layouts.
fn parse_pnpm_key(key: &str) -> Option<(String, String)> {
    let key = key.trim_start_matches('/');
    let key = key.split('(').next().unwrap_or(key);

    if let Some((head, tail)) = key.rsplit_once('/') {
        let is_v5 = tail.starts_with(|c: char| c.is_ascii_digit())
            && !head.is_empty()
            && (!head.starts_with('@') || head.contains('/'));
        if is_v5 {
            let version = tail.split('_').next().unwrap_or(tail);
            return Some((head.to_string(), version.to_string()));
        }
    }

    let at = key.get(1..)?.rfind('@')? + 1;
    let (name, version) = (&key[..at], &key[at + 1..]);
    if name.is_empty() || version.is_empty() {
        return None;
    }
    Some((name.to_string(), version.to_string()))
}

#[async_trait]
impl ManifestParser for JavaScriptParser {
    fn name(&self) -> &'static str {
        "javascript"
    }

    fn package_managers(&self) -> &'static [PackageManager] {
        &[PackageManager::Npm, PackageManager::Yarn, PackageManager::Pnpm]
    }

    async fn read_manifest(&self, path: &Path) -> ParseResult<Vec<Dependency>> {
        let content = read_manifest(path).await?;
        let manifest: PackageJson = from_json(path, &content)?;
        Ok(self.parse_package_json(&manifest))
    }

    async fn read_lockfile(&self, path: &Path) -> ParseResult<Vec<Dependency>> {
        match file_name(path) {
            "package-lock.json" => {
                let content = read_manifest(path).await?;
                let lock: PackageLock = from_json(path, &content)?;
                Ok(self.parse_package_lock(&lock))
            }
            "yarn.lock" => {
                let content = read_manifest(path).await?;
                let direct = self.declared_names(path).await;
                Ok(self.classify(parse_yarn_lock(&content), &direct))
            }
            "pnpm-lock.yaml" => {
                let content = read_manifest(path).await?;
                let lock: PnpmLock = from_yaml(path, &content)?;
                let direct = self.declared_names(path).await;
                let entries = lock.packages.keys().filter_map(|k| parse_pnpm_key(k)).collect();
                Ok(self.classify(entries, &direct))
            }
            _ => Err(ParseError::unsupported(self.name(), path)),
        }
    }

    async fn resolve_transitive(&self, dependencies: Vec<Dependency>) -> Vec<Dependency> {
        let Some(registry) = &self.registry else {
            return dependencies;
        };
        let resolver = TransitiveResolver::new(registry.as_ref(), self.max_depth, self.timeout);
        let discovered = resolver.resolve(&dependencies).await;
        tracing::debug!(
            manager = %self.manager,
            direct = dependencies.len(),
            discovered = discovered.len(),
            "resolved npm registry dependencies"
        );
        let mut all = dependencies;
        all.extend(discovered);
        all
    }
}
