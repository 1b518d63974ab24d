use super::{file_name, from_toml};
use crate::adapters::outbound::filesystem::read_manifest;
use crate::ports::outbound::ManifestParser;
use crate::sbom_generation::domain::{Dependency, Package, PackageManager, LATEST_VERSION};
use crate::sbom_generation::services::normalize_constraint;
use crate::shared::{ParseError, ParseResult};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use toml::Value;

/// How many directories above a member manifest are searched for the
/// workspace root.
const MAX_WORKSPACE_ASCENT: usize = 3;

/// Parser for Cargo projects.
pub struct RustParser;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Normal,
    Dev,
    Build,
}

const SECTIONS: [(&str, Section); 3] = [
    ("dependencies", Section::Normal),
    ("dev-dependencies", Section::Dev),
    ("build-dependencies", Section::Build),
];

#[derive(Debug, Deserialize)]
struct CargoLock {
    #[serde(default)]
    package: Vec<LockedCrate>,
}

#[derive(Debug, Deserialize)]
struct LockedCrate {
    name: String,
    version: String,
    source: Option<String>,
}

/// Crate name and representative version of one dependency entry.
///
/// `inherited` is set for `{ workspace = true }` entries whose version lives
/// in the workspace root.
struct Entry {
    name: String,
    version: String,
    inherited: bool,
}

fn entry(key: &str, spec: &Value) -> Entry {
    match spec {
        Value::String(constraint) => Entry {
            name: key.to_string(),
            version: normalize_constraint(constraint),
            inherited: false,
        },
        Value::Table(table) => {
            let name = table
                .get("package")
                .and_then(Value::as_str)
                .unwrap_or(key)
                .to_string();
            let inherited = table.get("workspace").and_then(Value::as_bool) == Some(true);
            let version = table
                .get("version")
                .and_then(Value::as_str)
                .map(normalize_constraint)
                .unwrap_or_else(|| LATEST_VERSION.to_string());
            Entry {
                name,
                version,
                inherited,
            }
        }
        _ => Entry {
            name: key.to_string(),
            version: LATEST_VERSION.to_string(),
            inherited: false,
        },
    }
}

/// Yields every dependency table of a manifest: the top-level sections and
/// their `[target.<cfg>.*]` counterparts.
fn dependency_tables(manifest: &Value) -> Vec<(&toml::Table, Section)> {
    let mut tables = Vec::new();
    for (key, section) in SECTIONS {
        if let Some(table) = manifest.get(key).and_then(Value::as_table) {
            tables.push((table, section));
        }
    }
    if let Some(targets) = manifest.get("target").and_then(Value::as_table) {
        for target in targets.values() {
            for (key, section) in SECTIONS {
                if let Some(table) = target.get(key).and_then(Value::as_table) {
                    tables.push((table, section));
                }
            }
        }
    }
    tables
}

/// `[workspace.dependencies]` of a manifest, keyed by dependency name.
fn workspace_versions(manifest: &Value) -> HashMap<String, String> {
    manifest
        .get("workspace")
        .and_then(|w| w.get("dependencies"))
        .and_then(Value::as_table)
        .map(|table| {
            table
                .iter()
                .map(|(key, spec)| (key.clone(), entry(key, spec).version))
                .collect()
        })
        .unwrap_or_default()
}

fn parse_cargo_toml(manifest: &Value, inherited_versions: &HashMap<String, String>) -> Vec<Dependency> {
    let mut deps = Vec::new();
    for (table, section) in dependency_tables(manifest) {
        for (key, spec) in table {
            let Entry {
                name,
                mut version,
                inherited,
            } = entry(key, spec);
            if inherited {
                if let Some(root_version) = inherited_versions.get(key) {
                    version = root_version.clone();
                }
            }
            let package = Package::new(name, version, PackageManager::Cargo);
            let is_optional = spec.get("optional").and_then(Value::as_bool) == Some(true);
            deps.push(match section {
                Section::Dev => Dependency::dev(package),
                _ if is_optional => Dependency::optional(package),
                Section::Normal | Section::Build => Dependency::direct(package),
            });
        }
    }

    // A workspace root declares shared versions; they are what the
    // workspace depends on even when no member manifest is scanned.
    for (key, spec) in manifest
        .get("workspace")
        .and_then(|w| w.get("dependencies"))
        .and_then(Value::as_table)
        .into_iter()
        .flatten()
    {
        let Entry { name, version, .. } = entry(key, spec);
        deps.push(Dependency::direct(Package::new(name, version, PackageManager::Cargo)));
    }
    deps
}

/// Crates published to a registry or fetched from git; path and workspace
/// members carry no `source`.
fn parse_cargo_lock(lock: &CargoLock) -> Vec<Dependency> {
    lock.package
        .iter()
        .filter(|c| c.source.is_some())
        .map(|c| Dependency::unattributed(Package::new(c.name.as_str(), c.version.as_str(), PackageManager::Cargo)))
        .collect()
}

impl RustParser {
    /// Finds the nearest ancestor manifest with `[workspace.dependencies]`.
    async fn inherited_versions(&self, path: &Path, manifest: &Value) -> HashMap<String, String> {
        let own = workspace_versions(manifest);
        if !own.is_empty() {
            return own;
        }
        let mut dir = path.parent().and_then(Path::parent);
        for _ in 0..MAX_WORKSPACE_ASCENT {
            let Some(current) = dir else {
                break;
            };
            let candidate = current.join("Cargo.toml");
            if candidate.is_file() {
                if let Ok(content) = read_manifest(&candidate).await {
                    if let Ok(root) = toml::from_str::<Value>(&content) {
                        let versions = workspace_versions(&root);
                        if !versions.is_empty() {
                            return versions;
                        }
                    }
                }
            }
            dir = current.parent();
        }
        HashMap::new()
    }
}

#[async_trait]
impl ManifestParser for RustParser {
    fn name(&self) -> &'static str {
        "rust"
    }

    fn package_managers(&self) -> &'static [PackageManager] {
        &[PackageManager::Cargo]
    }

    async fn read_manifest(&self, path: &Path) -> ParseResult<Vec<Dependency>> {
        if file_name(path) != "Cargo.toml" {
            return Err(ParseError::unsupported(self.name(), path));
        }
        let content = read_manifest(path).await?;
        let manifest: Value = from_toml(path, &content)?;
        let inherited = self.inherited_versions(path, &manifest).await;
        Ok(parse_cargo_toml(&manifest, &inherited))
    }

    async fn read_lockfile(&self, path: &Path) -> ParseResult<Vec<Dependency>> {
        if file_name(path) != "Cargo.lock" {
            return Err(ParseError::unsupported(self.name(), path));
        }
        let content = read_manifest(path).await?;
        let lock: CargoLock = from_toml(path, &content)?;
        Ok(parse_cargo_lock(&lock))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sbom_generation::domain::DependencyType;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_cargo_toml_sections_and_targets() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Cargo.toml");
        fs::write(
            &path,
            r#"
[package]
name = "demo"
version = "0.1.0"

[dependencies]
serde = { version = "1.0", features = ["derive"] }
anyhow = "1.0.75"
local = { path = "../local" }
json = { package = "serde_json", version = "^1.0.108", optional = true }

[dev-dependencies]
tempfile = "3"

[target.'cfg(unix)'.dependencies]
libc = "0.2"
"#,
        )
        .unwrap();

        let deps = RustParser.parse_manifest(&path).await;
        let summary: Vec<(&str, &str)> = deps
            .iter()
            .map(|d| (d.package.name(), d.package.version()))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("anyhow", "1.0.75"),
                ("serde_json", "1.0.108"),
                ("local", "latest"),
                ("serde", "1.0"),
                ("tempfile", "3"),
                ("libc", "0.2"),
            ]
        );
        assert!(deps[1].is_optional);
        assert_eq!(deps[4].dependency_type, DependencyType::Dev);
        assert_eq!(deps[5].purl(), "pkg:cargo/libc@0.2");
    }

    #[tokio::test]
    async fn test_workspace_inheritance() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("Cargo.toml"),
            "[workspace]\nmembers = [\"app\"]\n\n[workspace.dependencies]\ntokio = { version = \"1.33\" }\n",
        )
        .unwrap();
        fs::create_dir(dir.path().join("app")).unwrap();
        let member = dir.path().join("app").join("Cargo.toml");
        fs::write(
            &member,
            "[package]\nname = \"app\"\n\n[dependencies]\ntokio = { workspace = true, features = [\"full\"] }\n",
        )
        .unwrap();

        let deps = RustParser.parse_manifest(&member).await;
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].purl(), "pkg:cargo/tokio@1.33");

        let root = RustParser.parse_manifest(&dir.path().join("Cargo.toml")).await;
        assert_eq!(root.len(), 1);
        assert_eq!(root[0].package.name(), "tokio");
    }

    #[tokio::test]
    async fn test_cargo_lock_skips_local_crates() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Cargo.lock");
        fs::write(
            &path,
            r#"version = 3

[[package]]
name = "demo"
version = "0.1.0"
dependencies = ["anyhow"]

[[package]]
name = "anyhow"
version = "1.0.75"
source = "registry+https://github.com/rust-lang/crates.io-index"
checksum = "a4668cab20f66d8d020e1fbc0ebe47217433c1b6c8f2040faf858554e394ace6"
"#,
        )
        .unwrap();

        let deps = RustParser.parse_lockfile(&path).await.unwrap();
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].purl(), "pkg:cargo/anyhow@1.0.75");
        assert_eq!(deps[0].depth, 1);
    }
}
