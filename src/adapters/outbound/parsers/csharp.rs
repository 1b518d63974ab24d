use super::{file_name, from_json};
use crate::adapters::outbound::filesystem::{read_manifest, read_sibling};
use crate::ports::outbound::ManifestParser;
use crate::sbom_generation::domain::{Dependency, Package, PackageManager, LATEST_VERSION};
use crate::sbom_generation::services::normalize_constraint;
use crate::shared::{ParseError, ParseResult};
use async_trait::async_trait;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

/// Central package management file consulted for unversioned references
const CENTRAL_VERSIONS_FILE: &str = "Directory.Packages.props";

/// Parser for NuGet projects: SDK-style project files, `packages.config`,
/// `Directory.Build.props` and `packages.lock.json`.
pub struct CSharpParser;

/// One `<PackageReference>`, `<PackageVersion>` or `<package>` element.
#[derive(Debug, Default)]
struct Reference {
    element: String,
    name: String,
    version: Option<String>,
    development: bool,
}

fn local_name(name: &[u8]) -> String {
    let name = String::from_utf8_lossy(name);
    name.rfind(':')
        .map_or_else(|| name.to_string(), |idx| name[idx + 1..].to_string())
}

fn reference_from(element: &str, start: &BytesStart<'_>) -> Reference {
    let mut reference = Reference {
        element: element.to_string(),
        ..Reference::default()
    };
    for attr in start.attributes().filter_map(std::result::Result::ok) {
        let value = String::from_utf8_lossy(&attr.value).trim().to_string();
        match local_name(attr.key.as_ref()).as_str() {
            "Include" | "Update" | "id" if reference.name.is_empty() => reference.name = value,
            "Version" | "version" => reference.version = Some(value),
            "developmentDependency" => reference.development = value.eq_ignore_ascii_case("true"),
            "PrivateAssets" => reference.development = value.eq_ignore_ascii_case("all"),
            _ => {}
        }
    }
    reference
}

fn is_reference_element(name: &str) -> bool {
    matches!(name, "PackageReference" | "PackageVersion" | "package")
}

/// Walks an MSBuild or `packages.config` document and returns every
/// package element, including versions given as child elements.
fn collect_references(content: &str) -> Result<Vec<Reference>, quick_xml::Error> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut references = Vec::new();
    let mut open: Option<Reference> = None;
    let mut child: Option<String> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Empty(ref e) => {
                let name = local_name(e.name().as_ref());
                if is_reference_element(&name) {
                    references.push(reference_from(&name, e));
                }
            }
            Event::Start(ref e) => {
                let name = local_name(e.name().as_ref());
                if is_reference_element(&name) {
                    open = Some(reference_from(&name, e));
                } else if open.is_some() {
                    child = Some(name);
                }
            }
            Event::Text(ref e) => {
                if let (Some(reference), Some(field)) = (open.as_mut(), child.as_deref()) {
                    let text = e.unescape().unwrap_or_default().trim().to_string();
                    match field {
                        "Version" => reference.version = Some(text),
                        "PrivateAssets" => reference.development = text.eq_ignore_ascii_case("all"),
                        _ => {}
                    }
                }
            }
            Event::End(ref e) => {
                let name = local_name(e.name().as_ref());
                if is_reference_element(&name) {
                    if let Some(reference) = open.take() {
                        references.push(reference);
                    }
                }
                child = None;
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(references)
}

fn nuget(name: &str, version: impl Into<String>) -> Package {
    Package::new(name, version, PackageManager::Nuget)
}

/// `[13.0.1, )` -> `13.0.1`
fn nuget_version(raw: &str) -> String {
    let trimmed = raw.trim_start_matches(['[', '(']).split(',').next().unwrap_or(raw);
    normalize_constraint(trimmed.trim_end_matches([']', ')']))
}

fn to_dependencies(references: Vec<Reference>, central: &HashMap<String, String>) -> Vec<Dependency> {
    references
        .into_iter()
        .filter(|r| r.element != "PackageVersion" && !r.name.is_empty())
        .map(|r| {
            let version = r
                .version
                .as_deref()
                .or_else(|| central.get(&r.name).map(String::as_str))
                .map(nuget_version)
                .unwrap_or_else(|| LATEST_VERSION.to_string());
            let package = nuget(&r.name, version);
            if r.development {
                Dependency::dev(package)
            } else {
                Dependency::direct(package)
            }
        })
        .collect()
}

fn central_versions(content: &str) -> HashMap<String, String> {
    collect_references(content)
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.element == "PackageVersion")
        .filter_map(|r| r.version.map(|v| (r.name, v)))
        .collect()
}

#[derive(Debug, Deserialize)]
struct PackagesLock {
    /// target framework -> package -> entry
    #[serde(default)]
    dependencies: BTreeMap<String, BTreeMap<String, LockedPackage>>,
}

#[derive(Debug, Deserialize)]
struct LockedPackage {
    #[serde(rename = "type")]
    kind: Option<String>,
    resolved: Option<String>,
}

/// Entries are keyed per target framework; a package locked for several
/// frameworks at the same version is reported once.
fn parse_packages_lock(lock: &PackagesLock) -> Vec<Dependency> {
    let mut seen = HashSet::new();
    let mut deps = Vec::new();
    for packages in lock.dependencies.values() {
        for (name, entry) in packages {
            let kind = entry.kind.as_deref().unwrap_or("Transitive");
            if kind == "Project" {
                continue;
            }
            let Some(version) = entry.resolved.as_deref() else {
                continue;
            };
            if !seen.insert((name.as_str(), version)) {
                continue;
            }
            let package = nuget(name, version);
            deps.push(if kind == "Direct" {
                Dependency::direct(package)
            } else {
                Dependency::unattributed(package)
            });
        }
    }
    deps
}

#[async_trait]
impl ManifestParser for CSharpParser {
    fn name(&self) -> &'static str {
        "csharp"
    }

    fn package_managers(&self) -> &'static [PackageManager] {
        &[PackageManager::Nuget]
    }

    async fn read_manifest(&self, path: &Path) -> ParseResult<Vec<Dependency>> {
        let name = file_name(path);
        let is_project = [".csproj", ".fsproj", ".vbproj"]
            .iter()
            .any(|ext| name.ends_with(ext));
        if !is_project && name != "packages.config" && name != "Directory.Build.props" {
            return Err(ParseError::unsupported(self.name(), path));
        }

        let content = read_manifest(path).await?;
        let references = collect_references(&content).map_err(|e| ParseError::malformed(path, e))?;
        let central = match read_sibling(path, CENTRAL_VERSIONS_FILE).await {
            Some(props) => central_versions(&props),
            None => HashMap::new(),
        };
        Ok(to_dependencies(references, &central))
    }

    async fn read_lockfile(&self, path: &Path) -> ParseResult<Vec<Dependency>> {
        if file_name(path) != "packages.lock.json" {
            return Err(ParseError::unsupported(self.name(), path));
        }
        let content = read_manifest(path).await?;
        let lock: PackagesLock = from_json(path, &content)?;
        Ok(parse_packages_lock(&lock))
    }
}
