use super::PackageManager;
use serde::{Deserialize, Serialize};

/// Version sentinel used when a dependency is pinned to a VCS ref, a URL,
/// or carries no usable version constraint.
pub const LATEST_VERSION: &str = "latest";

/// Maximum length kept for names and versions read from untrusted files
const MAX_FIELD_LENGTH: usize = 255;

/// A software package identified by its PURL.
///
/// `language` and `package_manager` are kept as strings because container
/// inventories report ecosystems (`deb`, `apk`, `java-archive`) that no
/// manifest parser produces. Packages coming from manifests are created
/// through [`Package::new`], which derives both from a [`PackageManager`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    purl: String,
    name: String,
    version: String,
    language: String,
    package_manager: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    homepage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    repository: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    license: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    checksum: Option<String>,
}

impl Package {
    pub fn new(name: impl Into<String>, version: impl Into<String>, manager: PackageManager) -> Self {
        Self::from_parts(
            name.into(),
            version.into(),
            manager.language().as_str().to_string(),
            manager.as_str().to_string(),
            None,
        )
    }

    /// Creates a package for an ecosystem outside the [`PackageManager`] table.
    pub fn from_raw(
        name: impl Into<String>,
        version: impl Into<String>,
        language: impl Into<String>,
        package_manager: impl Into<String>,
    ) -> Self {
        Self::from_parts(
            name.into(),
            version.into(),
            language.into(),
            package_manager.into(),
            None,
        )
    }

    /// Creates a package from the name a registry or lockfile uses, splitting
    /// npm scopes (`@scope/name`) and Maven coordinates (`group:artifact`)
    /// into namespace and name.
    pub fn from_coordinates(
        coordinates: &str,
        version: impl Into<String>,
        manager: PackageManager,
    ) -> Self {
        let split = if manager.is_javascript() && coordinates.starts_with('@') {
            coordinates.split_once('/')
        } else if manager.uses_colon_coordinates() {
            coordinates.split_once(':')
        } else {
            None
        };
        match split {
            Some((namespace, name)) if !name.is_empty() => {
                Self::new(name, version, manager).with_namespace(namespace)
            }
            _ => Self::new(coordinates, version, manager),
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        let namespace = clamp(namespace.into());
        self.namespace = Some(namespace).filter(|ns| !ns.is_empty());
        self.purl = build_purl(
            &self.package_manager,
            self.namespace.as_deref(),
            &self.name,
            &self.version,
        );
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_homepage(mut self, homepage: impl Into<String>) -> Self {
        self.homepage = Some(homepage.into());
        self
    }

    pub fn with_repository(mut self, repository: impl Into<String>) -> Self {
        self.repository = Some(repository.into());
        self
    }

    pub fn with_license(mut self, license: impl Into<String>) -> Self {
        self.license = Some(license.into());
        self
    }

    pub fn with_checksum(mut self, checksum: impl Into<String>) -> Self {
        self.checksum = Some(checksum.into());
        self
    }

    fn from_parts(
        name: String,
        version: String,
        language: String,
        package_manager: String,
        namespace: Option<String>,
    ) -> Self {
        let name = clamp(name.trim().to_string());
        let version = clamp(version.trim().to_string());
        let version = if version.is_empty() {
            LATEST_VERSION.to_string()
        } else {
            version
        };
        let purl = build_purl(&package_manager, namespace.as_deref(), &name, &version);
        Self {
            purl,
            name,
            version,
            language,
            package_manager,
            namespace,
            description: None,
            homepage: None,
            repository: None,
            license: None,
            author: None,
            checksum: None,
        }
    }

    /// Canonical identity: `pkg:<manager>/<namespace/>name@version`.
    pub fn purl(&self) -> &str {
        &self.purl
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn package_manager(&self) -> &str {
        &self.package_manager
    }

    /// The typed manager, when the package came from a manifest parser.
    pub fn manager(&self) -> Option<PackageManager> {
        self.package_manager.parse().ok()
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn homepage(&self) -> Option<&str> {
        self.homepage.as_deref()
    }

    pub fn repository(&self) -> Option<&str> {
        self.repository.as_deref()
    }

    pub fn license(&self) -> Option<&str> {
        self.license.as_deref()
    }

    pub fn author(&self) -> Option<&str> {
        self.author.as_deref()
    }

    pub fn checksum(&self) -> Option<&str> {
        self.checksum.as_deref()
    }

    /// Name as the upstream registry knows it: `@scope/name` for npm,
    /// `group:artifact` for Maven and Gradle, the bare name otherwise.
    pub fn registry_name(&self) -> String {
        match &self.namespace {
            Some(ns) if self.manager().is_some_and(|pm| pm.uses_colon_coordinates()) => {
                format!("{}:{}", ns, self.name)
            }
            Some(ns) => format!("{}/{}", ns, self.name),
            None => self.name.clone(),
        }
    }

    pub fn has_pinned_version(&self) -> bool {
        self.version != LATEST_VERSION
    }
}

fn build_purl(manager: &str, namespace: Option<&str>, name: &str, version: &str) -> String {
    match namespace {
        Some(ns) => format!("pkg:{}/{}/{}@{}", manager, ns, name, version),
        None => format!("pkg:{}/{}@{}", manager, name, version),
    }
}

fn clamp(mut value: String) -> String {
    if value.len() > MAX_FIELD_LENGTH {
        let mut cut = MAX_FIELD_LENGTH;
        while !value.is_char_boundary(cut) {
            cut -= 1;
        }
        value.truncate(cut);
    }
    value
}
