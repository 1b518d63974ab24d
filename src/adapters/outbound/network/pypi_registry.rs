use super::http::{package_path, version_path, HttpClient};
use crate::ports::outbound::{DeclaredDependency, IntelligenceSource, RegistryClient};
use crate::sbom_generation::domain::{Package, PackageIntelligence, LATEST_VERSION};
use crate::sbom_generation::services::parse_requirement;
use crate::shared::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use std::collections::BTreeMap;

const PYPI_URL: &str = "https://pypi.org/pypi";
const PYPISTATS_URL: &str = "https://pypistats.org/api/packages";

/// PyPI JSON API adapter, with download figures from pypistats.
pub struct PyPiRegistry {
    http: HttpClient,
}

#[derive(Debug, Deserialize)]
struct ProjectInfo {
    info: Info,
    #[serde(default)]
    releases: BTreeMap<String, Vec<ReleaseFile>>,
}

#[derive(Debug, Deserialize)]
struct Info {
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    maintainer: Option<String>,
    #[serde(default)]
    home_page: Option<String>,
    #[serde(default)]
    project_urls: Option<BTreeMap<String, Option<String>>>,
    #[serde(default)]
    requires_dist: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct ReleaseFile {
    #[serde(default)]
    upload_time_iso_8601: Option<String>,
    #[serde(default)]
    upload_time: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RecentDownloads {
    data: DownloadData,
}

#[derive(Debug, Deserialize)]
struct DownloadData {
    #[serde(default)]
    last_week: Option<u64>,
}

impl PyPiRegistry {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    fn project_url(name: &str, version: &str) -> Result<String> {
        let name = package_path(name)?;
        if version == LATEST_VERSION {
            Ok(format!("{}/{}/json", PYPI_URL, name))
        } else {
            Ok(format!("{}/{}/{}/json", PYPI_URL, name, version_path(version)?))
        }
    }

    async fn weekly_downloads(&self, name: &str) -> Option<u64> {
        let url = format!("{}/{}/recent", PYPISTATS_URL, package_path(name).ok()?);
        match self.http.get_json::<RecentDownloads>(&url).await {
            Ok(recent) => recent.data.last_week,
            Err(e) => {
                tracing::debug!(package = name, error = %e, "pypistats download count unavailable");
                None
            }
        }
    }
}

/// Runtime requirements only; entries guarded by an `extra == ...` marker
/// belong to optional feature sets.
fn runtime_requirements(requires_dist: &[String]) -> Vec<DeclaredDependency> {
    requires_dist
        .iter()
        .filter(|spec| {
            spec.split_once(';')
                .map(|(_, marker)| !marker.contains("extra =="))
                .unwrap_or(true)
        })
        .filter_map(|spec| parse_requirement(spec))
        .map(|req| DeclaredDependency::new(req.name, req.version))
        .collect()
}

fn parse_upload_time(file: &ReleaseFile) -> Option<DateTime<Utc>> {
    if let Some(iso) = file.upload_time_iso_8601.as_deref() {
        if let Ok(time) = DateTime::parse_from_rfc3339(iso) {
            return Some(time.with_timezone(&Utc));
        }
    }
    let raw = file.upload_time.as_deref()?;
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|t| t.and_utc())
}

fn intelligence_from(project: &ProjectInfo, package: &Package) -> PackageIntelligence {
    let mut intel = PackageIntelligence::new(package.name(), package.package_manager(), package.version());
    let info = &project.info;

    intel.maintainers = [info.maintainer.as_deref(), info.author.as_deref()]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .collect();
    intel.maintainers.dedup();

    intel.project_urls = info
        .project_urls
        .iter()
        .flatten()
        .filter_map(|(label, url)| url.clone().map(|u| (label.clone(), u)))
        .collect();
    if let Some(home) = info.home_page.clone().filter(|h| !h.is_empty()) {
        intel.project_urls.entry("Homepage".to_string()).or_insert(home);
    }

    let version = if package.version() == LATEST_VERSION {
        info.version.as_deref()
    } else {
        Some(package.version())
    };
    intel.upload_time = version
        .and_then(|v| project.releases.get(v))
        .and_then(|files| files.first())
        .and_then(parse_upload_time);

    intel.dependencies_count = info
        .requires_dist
        .as_deref()
        .map(|deps| runtime_requirements(deps).len())
        .unwrap_or_default();
    intel
}

#[async_trait]
impl RegistryClient for PyPiRegistry {
    async fn fetch_dependencies(&self, package: &Package) -> Result<Vec<DeclaredDependency>> {
        let url = Self::project_url(package.name(), package.version())?;
        let project: ProjectInfo = self.http.get_json(&url).await?;
        Ok(project
            .info
            .requires_dist
            .as_deref()
            .map(runtime_requirements)
            .unwrap_or_default())
    }
}

#[async_trait]
impl IntelligenceSource for PyPiRegistry {
    fn supports(&self, package_manager: &str) -> bool {
        matches!(package_manager, "pip" | "poetry" | "pipenv")
    }

    async fn gather(&self, package: &Package) -> Result<PackageIntelligence> {
        let url = Self::project_url(package.name(), LATEST_VERSION)?;
        let project: ProjectInfo = self.http.get_json(&url).await?;

        let mut intel = intelligence_from(&project, package);
        intel.weekly_downloads = self.weekly_downloads(package.name()).await;
        Ok(intel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sbom_generation::domain::PackageManager;

    const PROJECT: &str = r#"{
        "info": {
            "name": "requests",
            "version": "2.31.0",
            "author": "Kenneth Reitz",
            "maintainer": "",
            "home_page": "https://requests.readthedocs.io",
            "project_urls": {"Source": "https://github.com/psf/requests", "Documentation": null},
            "requires_dist": [
                "charset-normalizer (<4,>=2)",
                "idna<4,>=2.5",
                "urllib3<3,>=1.21.1",
                "PySocks!=1.5.7,>=1.5.6 ; extra == 'socks'"
            ]
        },
        "releases": {
            "2.25.1": [{"upload_time": "2020-12-16T18:39:31", "upload_time_iso_8601": "2020-12-16T18:39:31.180213Z"}],
            "2.31.0": [{"upload_time": "2023-05-22T15:12:44"}]
        }
    }"#;

    #[test]
    fn test_project_url() {
        assert_eq!(
            PyPiRegistry::project_url("requests", "2.25.1").unwrap(),
            "https://pypi.org/pypi/requests/2.25.1/json"
        );
        assert_eq!(
            PyPiRegistry::project_url("requests", "latest").unwrap(),
            "https://pypi.org/pypi/requests/json"
        );
        assert!(PyPiRegistry::project_url("../admin", "1.0").is_err());
    }

    #[test]
    fn test_runtime_requirements_skip_extras() {
        let project: ProjectInfo = serde_json::from_str(PROJECT).unwrap();
        let deps = runtime_requirements(project.info.requires_dist.as_deref().unwrap());
        let names: Vec<&str> = deps.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["charset-normalizer", "idna", "urllib3"]);
        assert_eq!(deps[2].constraint, "1.21.1");
    }

    #[test]
    fn test_intelligence_for_pinned_version() {
        let project: ProjectInfo = serde_json::from_str(PROJECT).unwrap();
        let package = Package::new("requests", "2.25.1", PackageManager::Pip);
        let intel = intelligence_from(&project, &package);

        assert_eq!(intel.maintainers, vec!["Kenneth Reitz".to_string()]);
        assert_eq!(intel.project_urls.len(), 2);
        assert_eq!(intel.dependencies_count, 3);
        assert_eq!(
            intel.upload_time.map(|t| t.format("%Y-%m-%d").to_string()),
            Some("2020-12-16".to_string())
        );
    }

    #[test]
    fn test_intelligence_for_latest_uses_info_version() {
        let project: ProjectInfo = serde_json::from_str(PROJECT).unwrap();
        let package = Package::new("requests", "latest", PackageManager::Poetry);
        let intel = intelligence_from(&project, &package);
        assert_eq!(
            intel.upload_time.map(|t| t.format("%Y-%m-%dT%H:%M:%S").to_string()),
            Some("2023-05-22T15:12:44".to_string())
        );
    }
}
