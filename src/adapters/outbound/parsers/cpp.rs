use super::{file_name, from_json};
use crate::adapters::outbound::filesystem::read_manifest;
use crate::ports::outbound::ManifestParser;
use crate::sbom_generation::domain::{Dependency, Package, PackageManager, Scope, LATEST_VERSION};
use crate::sbom_generation::services::normalize_constraint;
use crate::shared::{ParseError, ParseResult};
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::LazyLock;

/// `requires = ["zlib/1.2.13", ...]` or `requires = "zlib/1.2.13", ...`
static REQUIRES_ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^\s*(requires|tool_requires|build_requires)\s*=\s*(\[[^\]]*\]|\([^)]*\)|["'][^\n]*)"#)
        .expect("static regex")
});

/// `self.requires("zlib/1.2.13")`, `self.tool_requires("cmake/3.27.0")`
static REQUIRES_CALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"self\.(requires|tool_requires|build_requires)\(\s*["']([^"']+)["']"#)
        .expect("static regex")
});

static QUOTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"["']([^"']+)["']"#).expect("static regex"));

/// Parser for vcpkg and Conan projects.
pub struct CppParser {
    manager: PackageManager,
}

/// Splits a Conan reference `name/version[@user/channel][#revision]`.
/// Version ranges such as `[>=1.2 <2]` keep their lower bound.
fn parse_conan_ref(reference: &str) -> Option<(String, String)> {
    let (name, rest) = reference.trim().split_once('/')?;
    let version = rest.split(['@', '#']).next().unwrap_or(rest);
    let version = version.trim_start_matches('[').trim_end_matches(']');
    if name.is_empty() {
        return None;
    }
    Some((name.to_string(), normalize_constraint(version)))
}

fn is_build_tool(kind: &str) -> bool {
    kind != "requires"
}

#[derive(Debug, Deserialize)]
struct VcpkgManifest {
    #[serde(default)]
    dependencies: Vec<Value>,
    #[serde(default)]
    overrides: Vec<VcpkgOverride>,
}

#[derive(Debug, Deserialize)]
struct VcpkgOverride {
    name: String,
    version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ConanLock {
    /// Conan 1 graph lock
    graph_lock: Option<ConanGraphLock>,
    /// Conan 2 lists
    #[serde(default)]
    requires: Vec<String>,
    #[serde(default)]
    build_requires: Vec<String>,
    #[serde(default)]
    python_requires: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ConanGraphLock {
    #[serde(default)]
    nodes: BTreeMap<String, ConanNode>,
}

#[derive(Debug, Deserialize)]
struct ConanNode {
    #[serde(rename = "ref")]
    reference: Option<String>,
}

impl CppParser {
    pub fn new(manager: PackageManager) -> Self {
        Self { manager }
    }

    fn dependency(&self, name: &str, version: impl Into<String>, build_tool: bool) -> Dependency {
        let package = Package::new(name, version, self.manager);
        if build_tool {
            Dependency::dev(package)
        } else {
            Dependency::direct(package)
        }
    }

    fn parse_vcpkg(&self, manifest: &VcpkgManifest) -> Vec<Dependency> {
        let overrides: HashMap<&str, &str> = manifest
            .overrides
            .iter()
            .filter_map(|o| o.version.as_deref().map(|v| (o.name.as_str(), v)))
            .collect();

        manifest
            .dependencies
            .iter()
            .filter_map(|entry| {
                let (name, declared) = match entry {
                    Value::String(name) => (name.as_str(), None),
                    Value::Object(fields) => {
                        let name = fields.get("name")?.as_str()?;
                        // "version>=", "version", ...
                        let version = fields
                            .iter()
                            .find(|(key, _)| key.starts_with("version"))
                            .and_then(|(_, v)| v.as_str());
                        (name, version)
                    }
                    _ => return None,
                };
                let version = overrides
                    .get(name)
                    .copied()
                    .or(declared)
                    .map(normalize_constraint)
                    .unwrap_or_else(|| LATEST_VERSION.to_string());
                let host = entry.get("host").and_then(Value::as_bool) == Some(true);
                Some(self.dependency(name, version, host))
            })
            .collect()
    }

    /// INI-like sections; `[requires]` is runtime, the tool sections are
    /// build-time only.
    fn parse_conanfile_txt(&self, content: &str) -> Vec<Dependency> {
        let mut deps = Vec::new();
        let mut section = String::new();
        for raw in content.lines() {
            let line = raw.split('#').next().unwrap_or(raw).trim();
            if line.is_empty() {
                continue;
            }
            if line.starts_with('[') && line.ends_with(']') && !line.contains('/') {
                section = line[1..line.len() - 1].to_string();
                continue;
            }
            let build_tool = match section.as_str() {
                "requires" => false,
                "tool_requires" | "build_requires" => true,
                _ => continue,
            };
            if let Some((name, version)) = parse_conan_ref(line) {
                deps.push(self.dependency(&name, version, build_tool));
            }
        }
        deps
    }

    /// Best-effort extraction from a Python recipe: literal `requires`
    /// attributes and `self.requires(...)` calls. Requirements computed at
    /// run time are not seen.
    fn parse_conanfile_py(&self, content: &str) -> Vec<Dependency> {
        let mut found: Vec<(usize, Dependency)> = Vec::new();
        for caps in REQUIRES_ATTRIBUTE.captures_iter(content) {
            let (Some(kind), Some(list)) = (caps.get(1), caps.get(2)) else {
                continue;
            };
            for reference in QUOTED.captures_iter(list.as_str()) {
                let Some(m) = reference.get(1) else {
                    continue;
                };
                if let Some((name, version)) = parse_conan_ref(m.as_str()) {
                    found.push((
                        list.start() + m.start(),
                        self.dependency(&name, version, is_build_tool(kind.as_str())),
                    ));
                }
            }
        }
        for caps in REQUIRES_CALL.captures_iter(content) {
            let (Some(kind), Some(reference)) = (caps.get(1), caps.get(2)) else {
                continue;
            };
            if let Some((name, version)) = parse_conan_ref(reference.as_str()) {
                found.push((
                    reference.start(),
                    self.dependency(&name, version, is_build_tool(kind.as_str())),
                ));
            }
        }
        found.sort_by_key(|(offset, _)| *offset);
        found.into_iter().map(|(_, dep)| dep).collect()
    }

    fn parse_conan_lock(&self, lock: &ConanLock) -> Vec<Dependency> {
        let mut deps = Vec::new();
        if let Some(graph) = &lock.graph_lock {
            // node "0" is the consumer recipe itself
            for (id, node) in &graph.nodes {
                if id == "0" {
                    continue;
                }
                if let Some((name, version)) = node.reference.as_deref().and_then(parse_conan_ref) {
                    deps.push(Dependency::unattributed(Package::new(name, version, self.manager)));
                }
            }
        }
        for (refs, build_tool) in [
            (&lock.requires, false),
            (&lock.build_requires, true),
            (&lock.python_requires, true),
        ] {
            for reference in refs {
                if let Some((name, version)) = parse_conan_ref(reference) {
                    let mut dep = Dependency::unattributed(Package::new(name, version, self.manager));
                    if build_tool {
                        dep.scope = Scope::Development;
                    }
                    deps.push(dep);
                }
            }
        }
        deps
    }
}

#[async_trait]
impl ManifestParser for CppParser {
    fn name(&self) -> &'static str {
        "cpp"
    }

    fn package_managers(&self) -> &'static [PackageManager] {
        &[PackageManager::Vcpkg, PackageManager::Conan]
    }

    async fn read_manifest(&self, path: &Path) -> ParseResult<Vec<Dependency>> {
        match file_name(path) {
            "vcpkg.json" => {
                let content = read_manifest(path).await?;
                Ok(self.parse_vcpkg(&from_json(path, &content)?))
            }
            "conanfile.txt" => Ok(self.parse_conanfile_txt(&read_manifest(path).await?)),
            "conanfile.py" => Ok(self.parse_conanfile_py(&read_manifest(path).await?)),
            _ => Err(ParseError::unsupported(self.name(), path)),
        }
    }

    async fn read_lockfile(&self, path: &Path) -> ParseResult<Vec<Dependency>> {
        match file_name(path) {
            "conan.lock" => {
                let content = read_manifest(path).await?;
                Ok(self.parse_conan_lock(&from_json(path, &content)?))
            }
            _ => Err(ParseError::unsupported(self.name(), path)),
        }
    }
}
