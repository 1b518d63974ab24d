use super::{file_name, from_json, from_toml, from_yaml};
use crate::adapters::outbound::filesystem::read_manifest;
use crate::ports::outbound::{ManifestParser, RegistryClient};
use crate::sbom_generation::domain::{Dependency, Package, PackageManager, Scope, LATEST_VERSION};
use crate::sbom_generation::services::{normalize_constraint, parse_requirement, TransitiveResolver};
use crate::shared::{ParseError, ParseResult};
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

static INSTALL_REQUIRES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)install_requires\s*=\s*\[(.*?)\]").expect("static regex")
});

static QUOTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"["']([^"']+)["']"#).expect("static regex"));

/// Characters that start the version part of a conda match spec
const CONDA_OPERATORS: &str = "=<>!~ ";

/// Parser for pip, Poetry, Pipenv and Conda projects.
pub struct PythonParser {
    manager: PackageManager,
    registry: Option<Arc<dyn RegistryClient>>,
    max_depth: u32,
    timeout: Duration,
}

impl PythonParser {
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
        Package::new(name, version, self.manager)
    }

    fn requirement_lines(&self, content: &str) -> Vec<String> {
        content
            .replace("\\\r\n", " ")
            .replace("\\\n", " ")
            .lines()
            .map(|line| line.split(" --").next().unwrap_or(line).to_string())
            .collect()
    }

    fn parse_requirements(&self, content: &str) -> Vec<Dependency> {
        self.requirement_lines(content)
            .iter()
            .filter_map(|line| parse_requirement(line))
            .map(|req| Dependency::direct(self.package(&req.name, req.version)))
            .collect()
    }

    fn parse_pinned_requirements(&self, content: &str) -> Vec<Dependency> {
        self.requirement_lines(content)
            .iter()
            .filter_map(|line| parse_requirement(line))
            .map(|req| Dependency::unattributed(self.package(&req.name, req.version)))
            .collect()
    }

    fn parse_setup_py(&self, content: &str) -> Vec<Dependency> {
        let Some(block) = INSTALL_REQUIRES.captures(content).and_then(|c| c.get(1)) else {
            return Vec::new();
        };
        QUOTED
            .captures_iter(block.as_str())
            .filter_map(|c| c.get(1).and_then(|m| parse_requirement(m.as_str())))
            .map(|req| Dependency::direct(self.package(&req.name, req.version)))
            .collect()
    }

    fn parse_pyproject(&self, pyproject: &toml::Value) -> Vec<Dependency> {
        let mut deps = Vec::new();

        // PEP 621
        if let Some(project) = pyproject.get("project") {
            for req in string_array(project.get("dependencies")) {
                if let Some(req) = parse_requirement(req) {
                    deps.push(Dependency::direct(self.package(&req.name, req.version)));
                }
            }
            if let Some(extras) = project.get("optional-dependencies").and_then(|v| v.as_table()) {
                for group in extras.values() {
                    for req in string_array(Some(group)) {
                        if let Some(req) = parse_requirement(req) {
                            deps.push(Dependency::optional(self.package(&req.name, req.version)));
                        }
                    }
                }
            }
        }

        let tool = pyproject.get("tool");
        if let Some(poetry) = tool.and_then(|t| t.get("poetry")) {
            deps.extend(self.poetry_table(poetry.get("dependencies"), false));
            deps.extend(self.poetry_table(poetry.get("dev-dependencies"), true));
            if let Some(groups) = poetry.get("group").and_then(|g| g.as_table()) {
                for (group, body) in groups {
                    deps.extend(self.poetry_table(body.get("dependencies"), group != "main"));
                }
            }
        }

        if let Some(uv) = tool.and_then(|t| t.get("uv")) {
            for req in string_array(uv.get("dev-dependencies")) {
                if let Some(req) = parse_requirement(req) {
                    deps.push(Dependency::dev(self.package(&req.name, req.version)));
                }
            }
        }

        deps
    }

    fn poetry_table(&self, table: Option<&toml::Value>, dev: bool) -> Vec<Dependency> {
        let Some(table) = table.and_then(|t| t.as_table()) else {
            return Vec::new();
        };
        table
            .iter()
            .filter(|(name, _)| !name.eq_ignore_ascii_case("python"))
            .map(|(name, spec)| {
                let package = self.package(name, spec_version(spec));
                if dev {
                    Dependency::dev(package)
                } else {
                    Dependency::direct(package)
                }
            })
            .collect()
    }

    fn parse_pipfile(&self, pipfile: &toml::Value) -> Vec<Dependency> {
        let mut deps = Vec::new();
        for (section, dev) in [("packages", false), ("dev-packages", true)] {
            let Some(table) = pipfile.get(section).and_then(|t| t.as_table()) else {
                continue;
            };
            for (name, spec) in table {
                let package = self.package(name, spec_version(spec));
                deps.push(if dev {
                    Dependency::dev(package)
                } else {
                    Dependency::direct(package)
                });
            }
        }
        deps
    }

    fn parse_environment(&self, environment: &CondaEnvironment) -> Vec<Dependency> {
        let mut deps = Vec::new();
        for entry in &environment.dependencies {
            match entry {
                CondaEntry::Spec(spec) => {
                    if let Some((name, version)) = parse_conda_spec(spec) {
                        deps.push(Dependency::direct(self.package(&name, version)));
                    }
                }
                CondaEntry::Pip { pip } => {
                    deps.extend(pip.iter().filter_map(|line| parse_requirement(line)).map(|req| {
                        Dependency::direct(Package::new(req.name, req.version, PackageManager::Pip))
                    }));
                }
            }
        }
        deps
    }

    fn parse_poetry_lock(&self, lock: &PoetryLock) -> Vec<Dependency> {
        lock.package
            .iter()
            .map(|p| {
                let mut dep = Dependency::unattributed(self.package(&p.name, p.version.as_str()));
                if p.category.as_deref() == Some("dev") {
                    dep.scope = Scope::Development;
                }
                dep.is_optional = p.optional;
                dep
            })
            .collect()
    }

    fn parse_pipfile_lock(&self, lock: &PipfileLock) -> Vec<Dependency> {
        [(&lock.default, false), (&lock.develop, true)]
            .into_iter()
            .flat_map(|(section, dev)| {
                section.iter().map(move |(name, entry)| {
                    let version = entry
                        .version
                        .as_deref()
                        .map(|v| v.trim_start_matches("==").to_string())
                        .unwrap_or_else(|| LATEST_VERSION.to_string());
                    let mut dep = Dependency::unattributed(self.package(name, version));
                    if dev {
                        dep.scope = Scope::Development;
                    }
                    dep
                })
            })
            .collect()
    }

    fn parse_conda_lock(&self, lock: &CondaLock) -> Vec<Dependency> {
        let mut seen = HashSet::new();
        lock.package
            .iter()
            .filter(|p| seen.insert((p.name.clone(), p.version.clone(), p.manager.clone())))
            .map(|p| {
                let manager = match p.manager.as_deref() {
                    Some("pip") => PackageManager::Pip,
                    _ => PackageManager::Conda,
                };
                let mut dep = Dependency::unattributed(Package::new(&p.name, p.version.as_str(), manager));
                if p.category.as_deref() == Some("dev") {
                    dep.scope = Scope::Development;
                }
                dep
            })
            .collect()
    }
}

fn string_array(value: Option<&toml::Value>) -> impl Iterator<Item = &str> {
    value
        .and_then(|v| v.as_array())
        .into_iter()
        .flatten()
        .filter_map(|v| v.as_str())
}

/// Version of a Poetry or Pipfile entry: a constraint string, an inline
/// table with `version`, or a list of such tables for per-marker pins.
fn spec_version(spec: &toml::Value) -> String {
    match spec {
        toml::Value::String(constraint) => normalize_constraint(constraint),
        toml::Value::Table(table) => table
            .get("version")
            .and_then(|v| v.as_str())
            .map(normalize_constraint)
            .unwrap_or_else(|| LATEST_VERSION.to_string()),
        toml::Value::Array(alternatives) => alternatives
            .first()
            .map(spec_version)
            .unwrap_or_else(|| LATEST_VERSION.to_string()),
        _ => LATEST_VERSION.to_string(),
    }
}

/// Splits a conda match spec such as `conda-forge::numpy=1.24.0=py311h` or
/// `python>=3.9` into name and representative version.
fn parse_conda_spec(spec: &str) -> Option<(String, String)> {
    let spec = spec.rsplit("::").next().unwrap_or(spec).trim();
    let split = spec.find(|c: char| CONDA_OPERATORS.contains(c)).unwrap_or(spec.len());
    let name = spec[..split].trim();
    if name.is_empty() {
        return None;
    }
    let rest = spec[split..].trim_start_matches(|c: char| CONDA_OPERATORS.contains(c));
    let version = rest.split('=').next().unwrap_or_default();
    Some((name.to_string(), normalize_constraint(version)))
}

#[derive(Debug, Default, Deserialize)]
struct CondaEnvironment {
    #[serde(default)]
    dependencies: Vec<CondaEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CondaEntry {
    Spec(String),
    Pip { pip: Vec<String> },
}

#[derive(Debug, Deserialize)]
struct PoetryLock {
    #[serde(default)]
    package: Vec<PoetryLockedPackage>,
}

#[derive(Debug, Deserialize)]
struct PoetryLockedPackage {
    name: String,
    version: String,
    category: Option<String>,
    #[serde(default)]
    optional: bool,
}

#[derive(Debug, Deserialize)]
struct PipfileLock {
    #[serde(default)]
    default: BTreeMap<String, PipfileLockEntry>,
    #[serde(default)]
    develop: BTreeMap<String, PipfileLockEntry>,
}

#[derive(Debug, Deserialize)]
struct PipfileLockEntry {
    version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CondaLock {
    #[serde(default)]
    package: Vec<CondaLockedPackage>,
}

#[derive(Debug, Deserialize)]
struct CondaLockedPackage {
    name: String,
    version: String,
    manager: Option<String>,
    category: Option<String>,
}

fn is_requirements_file(name: &str) -> bool {
    name.starts_with("requirements") && (name.ends_with(".txt") || name.ends_with(".in"))
}

#[async_trait]
impl ManifestParser for PythonParser {
    fn name(&self) -> &'static str {
        "python"
    }

    fn package_managers(&self) -> &'static [PackageManager] {
        &[
            PackageManager::Pip,
            PackageManager::Poetry,
            PackageManager::Pipenv,
            PackageManager::Conda,
        ]
    }

    async fn read_manifest(&self, path: &Path) -> ParseResult<Vec<Dependency>> {
        let name = file_name(path);
        let content = read_manifest(path).await?;
        match name {
            n if is_requirements_file(n) => Ok(self.parse_requirements(&content)),
            "setup.py" => Ok(self.parse_setup_py(&content)),
            "pyproject.toml" => Ok(self.parse_pyproject(&from_toml(path, &content)?)),
            "Pipfile" => Ok(self.parse_pipfile(&from_toml(path, &content)?)),
            "environment.yml" | "environment.yaml" => {
                let environment: Option<CondaEnvironment> = from_yaml(path, &content)?;
                Ok(self.parse_environment(&environment.unwrap_or_default()))
            }
            _ => Err(ParseError::unsupported(self.name(), path)),
        }
    }

    async fn read_lockfile(&self, path: &Path) -> ParseResult<Vec<Dependency>> {
        match file_name(path) {
            "poetry.lock" => {
                let content = read_manifest(path).await?;
                Ok(self.parse_poetry_lock(&from_toml(path, &content)?))
            }
            "Pipfile.lock" => {
                let content = read_manifest(path).await?;
                Ok(self.parse_pipfile_lock(&from_json(path, &content)?))
            }
            "conda-lock.yml" | "conda-lock.yaml" => {
                let content = read_manifest(path).await?;
                Ok(self.parse_conda_lock(&from_yaml(path, &content)?))
            }
            "requirements.lock" | "pip.lock" => {
                let content = read_manifest(path).await?;
                Ok(self.parse_pinned_requirements(&content))
            }
            _ => Err(ParseError::unsupported(self.name(), path)),
        }
    }

    async fn resolve_transitive(&self, dependencies: Vec<Dependency>) -> Vec<Dependency> {
        let Some(registry) = &self.registry else {
            return dependencies;
        };
        let on_pypi: Vec<Dependency> = dependencies
            .iter()
            .filter(|d| d.package.manager().is_some_and(|m| m.is_pypi()))
            .cloned()
            .collect();
        let resolver = TransitiveResolver::new(registry.as_ref(), self.max_depth, self.timeout);
        let discovered = resolver.resolve(&on_pypi).await;
        tracing::debug!(
            manager = %self.manager,
            direct = dependencies.len(),
            discovered = discovered.len(),
            "resolved PyPI dependencies"
        );
        let mut all = dependencies;
        all.extend(discovered);
        all
    }
}
