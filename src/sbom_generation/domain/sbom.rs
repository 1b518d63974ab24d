use super::{Dependency, Package};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::path::Path;

pub const SBOM_FORMAT_VERSION: &str = "1.0";

/// The dependency inventory of one project or image.
///
/// Packages are unique by PURL. Edges are unique by `(purl, parent)`, so a
/// manifest entry and the matching lockfile entry collapse into one edge.
/// The first edge added wins, except that a declared (depth 0) edge always
/// replaces an undeclared one with the same key. Counters are recomputed from scratch after
/// every mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sbom {
    pub serial_number: String,
    pub timestamp: DateTime<Utc>,
    pub format_version: String,
    pub tool_name: String,
    pub tool_version: String,
    pub project_name: String,
    pub project_path: String,
    packages: Vec<Package>,
    dependencies: Vec<Dependency>,
    total_packages: usize,
    direct_dependencies: usize,
    transitive_dependencies: usize,
    languages: Vec<String>,
    package_managers: Vec<String>,
    #[serde(skip)]
    purls: HashSet<String>,
    #[serde(skip)]
    edges: HashSet<(String, Option<String>)>,
}

impl Sbom {
    pub fn new(project_name: impl Into<String>, project_path: impl Into<String>) -> Self {
        Self {
            serial_number: format!("urn:uuid:{}", uuid::Uuid::new_v4()),
            timestamp: Utc::now(),
            format_version: SBOM_FORMAT_VERSION.to_string(),
            tool_name: env!("CARGO_PKG_NAME").to_string(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            project_name: project_name.into(),
            project_path: project_path.into(),
            packages: Vec::new(),
            dependencies: Vec::new(),
            total_packages: 0,
            direct_dependencies: 0,
            transitive_dependencies: 0,
            languages: Vec::new(),
            package_managers: Vec::new(),
            purls: HashSet::new(),
            edges: HashSet::new(),
        }
    }

    /// Names the SBOM after the directory it describes.
    pub fn for_directory(path: &Path) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self::new(name, path.display().to_string())
    }

    /// Adds a dependency edge, registering its package if the PURL is new.
    pub fn add(&mut self, dependency: Dependency) {
        self.ensure_indexes();

        let purl = dependency.purl().to_string();
        if self.purls.insert(purl.clone()) {
            self.packages.push(dependency.package.clone());
        }
        if self.edges.insert((purl.clone(), dependency.parent.clone())) {
            self.dependencies.push(dependency);
        } else if dependency.is_declared() {
            // A declared edge outranks a pinned one for the same key,
            // whichever file was merged first.
            if let Some(stored) = self.dependencies.iter_mut().find(|d| {
                !d.is_declared() && d.purl() == purl && d.parent == dependency.parent
            }) {
                *stored = dependency;
            }
        }
        self.refresh_counters();
    }

    pub fn extend(&mut self, dependencies: impl IntoIterator<Item = Dependency>) {
        for dependency in dependencies {
            self.add(dependency);
        }
    }

    pub fn contains(&self, purl: &str) -> bool {
        self.packages.iter().any(|p| p.purl() == purl)
    }

    pub fn packages(&self) -> &[Package] {
        &self.packages
    }

    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    pub fn total_packages(&self) -> usize {
        self.total_packages
    }

    pub fn direct_dependencies(&self) -> usize {
        self.direct_dependencies
    }

    pub fn transitive_dependencies(&self) -> usize {
        self.transitive_dependencies
    }

    pub fn languages(&self) -> &[String] {
        &self.languages
    }

    pub fn package_managers(&self) -> &[String] {
        &self.package_managers
    }

    fn refresh_counters(&mut self) {
        self.total_packages = self.packages.len();
        self.direct_dependencies = self.dependencies.iter().filter(|d| d.is_declared()).count();
        self.transitive_dependencies = self.dependencies.len() - self.direct_dependencies;

        let languages: BTreeSet<&str> = self.packages.iter().map(|p| p.language()).collect();
        self.languages = languages.into_iter().map(str::to_string).collect();

        let managers: BTreeSet<&str> = self.packages.iter().map(|p| p.package_manager()).collect();
        self.package_managers = managers.into_iter().map(str::to_string).collect();
    }

    // Indexes are not serialized; rebuild them for SBOMs that were deserialized.
    fn ensure_indexes(&mut self) {
        if self.purls.len() != self.packages.len() {
            self.purls = self.packages.iter().map(|p| p.purl().to_string()).collect();
        }
        if self.edges.len() != self.dependencies.len() {
            self.edges = self
                .dependencies
                .iter()
                .map(|d| (d.purl().to_string(), d.parent.clone()))
                .collect();
        }
    }
}
