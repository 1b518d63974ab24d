use super::http::{package_path, version_path, HttpClient};
use crate::ports::outbound::{DeclaredDependency, IntelligenceSource, RegistryClient};
use crate::sbom_generation::domain::{Package, PackageIntelligence, LATEST_VERSION};
use crate::shared::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::BTreeMap;

const REGISTRY_URL: &str = "https://registry.npmjs.org";
const DOWNLOADS_URL: &str = "https://api.npmjs.org/downloads/point/last-week";

/// npm registry adapter: per-version dependency lists for the resolver and
/// packument plus download figures for supply-chain intelligence.
pub struct NpmRegistry {
    http: HttpClient,
}

#[derive(Debug, Deserialize)]
struct VersionManifest {
    #[serde(default)]
    dependencies: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct Packument {
    #[serde(default, rename = "dist-tags")]
    dist_tags: BTreeMap<String, String>,
    #[serde(default)]
    maintainers: Vec<Maintainer>,
    #[serde(default)]
    repository: Option<Repository>,
    #[serde(default)]
    homepage: Option<String>,
    #[serde(default)]
    time: BTreeMap<String, String>,
    #[serde(default)]
    versions: BTreeMap<String, VersionManifest>,
}

#[derive(Debug, Deserialize)]
struct Maintainer {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Repository {
    Url(String),
    Detailed { url: Option<String> },
}

#[derive(Debug, Deserialize)]
struct DownloadPoint {
    #[serde(default)]
    downloads: u64,
}

impl NpmRegistry {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    async fn weekly_downloads(&self, name: &str) -> Option<u64> {
        let url = format!("{}/{}", DOWNLOADS_URL, package_path(name).ok()?);
        match self.http.get_json::<DownloadPoint>(&url).await {
            Ok(point) => Some(point.downloads),
            Err(e) => {
                tracing::debug!(package = name, error = %e, "npm download count unavailable");
                None
            }
        }
    }
}

fn declared(manifest: VersionManifest) -> Vec<DeclaredDependency> {
    manifest
        .dependencies
        .into_iter()
        .map(|(name, constraint)| DeclaredDependency::new(name, constraint))
        .collect()
}

/// Folds a packument into the registry half of the intelligence record.
fn intelligence_from(packument: &Packument, package: &Package) -> PackageIntelligence {
    let mut intel = PackageIntelligence::new(
        package.registry_name(),
        package.package_manager(),
        package.version(),
    );

    let version = if package.version() == LATEST_VERSION {
        packument.dist_tags.get("latest").map(String::as_str)
    } else {
        Some(package.version())
    };

    intel.maintainers = packument
        .maintainers
        .iter()
        .filter_map(|m| m.name.clone())
        .collect();

    let repository = match &packument.repository {
        Some(Repository::Url(url)) => Some(url.clone()),
        Some(Repository::Detailed { url }) => url.clone(),
        None => None,
    };
    if let Some(url) = repository.filter(|u| !u.is_empty()) {
        intel.project_urls.insert("repository".to_string(), url);
    }
    if let Some(url) = packument.homepage.clone().filter(|u| !u.is_empty()) {
        intel.project_urls.insert("homepage".to_string(), url);
    }

    if let Some(version) = version {
        intel.upload_time = packument
            .time
            .get(version)
            .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
            .map(|t| t.with_timezone(&Utc));
        intel.dependencies_count = packument
            .versions
            .get(version)
            .map(|v| v.dependencies.len())
            .unwrap_or_default();
    }
    intel
}

#[async_trait]
impl RegistryClient for NpmRegistry {
    async fn fetch_dependencies(&self, package: &Package) -> Result<Vec<DeclaredDependency>> {
        let url = format!(
            "{}/{}/{}",
            REGISTRY_URL,
            package_path(&package.registry_name())?,
            version_path(package.version())?
        );
        let manifest: VersionManifest = self.http.get_json(&url).await?;
        Ok(declared(manifest))
    }
}

#[async_trait]
impl IntelligenceSource for NpmRegistry {
    fn supports(&self, package_manager: &str) -> bool {
        matches!(package_manager, "npm" | "yarn" | "pnpm")
    }

    async fn gather(&self, package: &Package) -> Result<PackageIntelligence> {
        let name = package.registry_name();
        let url = format!("{}/{}", REGISTRY_URL, package_path(&name)?);
        let packument: Packument = self.http.get_json(&url).await?;

        let mut intel = intelligence_from(&packument, package);
        intel.weekly_downloads = self.weekly_downloads(&name).await;
        Ok(intel)
    }
}
