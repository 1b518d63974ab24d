use super::http::HttpClient;
use crate::ports::outbound::VulnerabilityFeed;
use crate::sbom_generation::domain::{Package, Severity, VersionRange, Vulnerability, LATEST_VERSION};
use crate::sbom_generation::services::is_affected;
use crate::shared::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const QUERY_URL: &str = "https://api.osv.dev/v1/query";

/// Source tag stored on OSV advisories
pub const OSV_SOURCE: &str = "osv";

/// OSV.dev advisory feed
///
/// Queries one package per request and re-checks the returned affected
/// ranges against the package version before reporting an advisory.
pub struct OsvClient {
    http: HttpClient,
}

impl OsvClient {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }
}

/// OSV ecosystem name for a package manager; `None` when OSV has no
/// advisories for that ecosystem.
pub fn osv_ecosystem(package_manager: &str) -> Option<&'static str> {
    match package_manager {
        "npm" | "yarn" | "pnpm" => Some("npm"),
        "pip" | "poetry" | "pipenv" | "conda" => Some("PyPI"),
        "maven" | "gradle" => Some("Maven"),
        "go_modules" => Some("Go"),
        "cargo" => Some("crates.io"),
        "bundler" => Some("RubyGems"),
        "nuget" => Some("NuGet"),
        _ => None,
    }
}

#[async_trait]
impl VulnerabilityFeed for OsvClient {
    fn source(&self) -> &str {
        OSV_SOURCE
    }

    async fn query(&self, package: &Package) -> Result<Vec<Vulnerability>> {
        let Some(ecosystem) = osv_ecosystem(package.package_manager()) else {
            return Ok(Vec::new());
        };
        if package.version() == LATEST_VERSION {
            return Ok(Vec::new());
        }

        let query = OsvQuery {
            package: OsvPackage {
                name: package.registry_name(),
                ecosystem: ecosystem.to_string(),
            },
            version: package.version().to_string(),
        };
        let response: OsvResult = self.http.post_json(QUERY_URL, &query).await?;

        Ok(response
            .vulns
            .iter()
            .filter(|v| affects(v, package.version()))
            .map(|v| convert_to_vulnerability(v, package))
            .collect())
    }
}

// OSV API request/response structures

#[derive(Debug, Serialize)]
struct OsvQuery {
    package: OsvPackage,
    version: String,
}

#[derive(Debug, Serialize)]
struct OsvPackage {
    name: String,
    ecosystem: String,
}

#[derive(Debug, Deserialize)]
struct OsvResult {
    #[serde(default)]
    vulns: Vec<OsvVulnerability>,
}

#[derive(Debug, Deserialize)]
struct OsvVulnerability {
    id: String,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    details: Option<String>,
    #[serde(default)]
    severity: Vec<OsvSeverity>,
    #[serde(default)]
    database_specific: Option<DatabaseSpecific>,
    #[serde(default)]
    affected: Vec<OsvAffected>,
    #[serde(default)]
    references: Vec<OsvReference>,
    #[serde(default)]
    published: Option<DateTime<Utc>>,
    #[serde(default)]
    modified: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct OsvSeverity {
    #[serde(rename = "type")]
    severity_type: String,
    score: String,
}

#[derive(Debug, Deserialize)]
struct DatabaseSpecific {
    #[serde(default)]
    severity: Option<String>,
    #[serde(default)]
    cwe_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct OsvAffected {
    #[serde(default)]
    ranges: Vec<OsvRange>,
    #[serde(default)]
    versions: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct OsvRange {
    #[serde(rename = "type")]
    range_type: String,
    #[serde(default)]
    events: Vec<OsvEvent>,
}

#[derive(Debug, Deserialize)]
struct OsvEvent {
    #[serde(default)]
    introduced: Option<String>,
    #[serde(default)]
    fixed: Option<String>,
    #[serde(default)]
    last_affected: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OsvReference {
    url: String,
}

/// Flattens the event lists of every non-GIT range into closed intervals.
fn version_ranges(vuln: &OsvVulnerability) -> Vec<VersionRange> {
    let mut ranges = Vec::new();
    for range in vuln.affected.iter().flat_map(|a| &a.ranges) {
        if range.range_type == "GIT" {
            continue;
        }
        let mut current: Option<VersionRange> = None;
        for event in &range.events {
            if let Some(introduced) = &event.introduced {
                if let Some(open) = current.take() {
                    ranges.push(open);
                }
                current = Some(VersionRange {
                    introduced: Some(introduced.clone()),
                    ..VersionRange::default()
                });
            }
            if event.fixed.is_some() || event.last_affected.is_some() {
                let mut closed = current.take().unwrap_or_default();
                closed.fixed = event.fixed.clone();
                closed.last_affected = event.last_affected.clone();
                ranges.push(closed);
            }
        }
        if let Some(open) = current {
            ranges.push(open);
        }
    }
    ranges
}

/// Local confirmation of the server-side match: an explicit version list
/// hit, a range hit, or an advisory with no usable version data at all.
fn affects(vuln: &OsvVulnerability, version: &str) -> bool {
    if vuln
        .affected
        .iter()
        .any(|a| a.versions.iter().any(|v| v == version))
    {
        return true;
    }
    let ranges = version_ranges(vuln);
    if ranges.is_empty() {
        return vuln.affected.iter().all(|a| a.versions.is_empty());
    }
    is_affected(version, &ranges)
}

fn convert_to_vulnerability(osv: &OsvVulnerability, package: &Package) -> Vulnerability {
    let vector = osv
        .severity
        .iter()
        .find(|s| s.severity_type == "CVSS_V3")
        .or_else(|| osv.severity.iter().find(|s| s.severity_type == "CVSS_V4"))
        .map(|s| s.score.clone());
    let cvss_score = vector.as_deref().and_then(parse_cvss_score);

    // CVSS first, then the database label
    let severity = match cvss_score {
        Some(score) => Severity::from_cvss_score(score),
        None => osv
            .database_specific
            .as_ref()
            .and_then(|db| db.severity.as_deref())
            .map(Severity::from_label)
            .unwrap_or_default(),
    };

    let ranges = version_ranges(osv);
    let mut fixed_versions: Vec<String> = ranges.iter().filter_map(|r| r.fixed.clone()).collect();
    fixed_versions.dedup();

    let mut vuln = Vulnerability::new(osv.id.clone(), OSV_SOURCE, severity);
    if let Some(summary) = osv.summary.clone().filter(|s| !s.is_empty()) {
        vuln.title = summary;
    }
    vuln.description = osv.details.clone().unwrap_or_default();
    vuln.cvss_score = cvss_score;
    vuln.cvss_vector = vector;
    vuln.published_date = osv.published;
    vuln.modified_date = osv.modified;
    vuln.affected_packages = vec![package.purl().to_string()];
    vuln.fixed_versions = fixed_versions;
    vuln.vulnerable_versions = ranges;
    vuln.references = osv.references.iter().map(|r| r.url.clone()).collect();
    vuln.cwe_ids = osv
        .database_specific
        .as_ref()
        .map(|db| db.cwe_ids.clone())
        .unwrap_or_default();
    vuln
}

/// Computes the CVSS v3 base score from a vector string
///
/// Example: "CVSS:3.1/AV:N/AC:L/PR:N/UI:N/S:U/C:H/I:H/A:H" -> Some(9.8)
fn parse_cvss_score(cvss_vector: &str) -> Option<f32> {
    let metrics: std::collections::HashMap<&str, &str> = cvss_vector
        .split('/')
        .skip(1) // "CVSS:3.1"
        .filter_map(|part| part.split_once(':'))
        .collect();

    let av = metrics.get("AV")?;
    let ac = metrics.get("AC")?;
    let pr = metrics.get("PR")?;
    let ui = metrics.get("UI")?;
    let s = metrics.get("S")?;
    let c = metrics.get("C")?;
    let i = metrics.get("I")?;
    let a = metrics.get("A")?;

    let av_score = match *av {
        "N" => 0.85,
        "A" => 0.62,
        "L" => 0.55,
        "P" => 0.2,
        _ => return None,
    };

    let ac_score = match *ac {
        "L" => 0.77,
        "H" => 0.44,
        _ => return None,
    };

    let pr_score = match (*pr, *s) {
        ("N", _) => 0.85,
        ("L", "U") => 0.62,
        ("L", "C") => 0.68,
        ("H", "U") => 0.27,
        ("H", "C") => 0.5,
        _ => return None,
    };

    let ui_score = match *ui {
        "N" => 0.85,
        "R" => 0.62,
        _ => return None,
    };

    let cia = |value: &str| match value {
        "N" => Some(0.0),
        "L" => Some(0.22),
        "H" => Some(0.56),
        _ => None,
    };
    let c_score: f64 = cia(*c)?;
    let i_score: f64 = cia(*i)?;
    let a_score: f64 = cia(*a)?;

    let iss = 1.0_f64 - ((1.0 - c_score) * (1.0 - i_score) * (1.0 - a_score));

    let impact = if *s == "U" {
        6.42 * iss
    } else {
        7.52 * (iss - 0.029) - 3.25 * (iss - 0.02_f64).powi(15)
    };

    let exploitability = 8.22 * av_score * ac_score * pr_score * ui_score;

    let base_score = if impact <= 0.0 {
        0.0
    } else if *s == "U" {
        f64::min(impact + exploitability, 10.0)
    } else {
        f64::min(1.08 * (impact + exploitability), 10.0)
    };

    // round up to one decimal
    Some(((base_score * 10.0).ceil() / 10.0) as f32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sbom_generation::domain::PackageManager;

    const LODASH_ADVISORY: &str = r#"{
        "vulns": [
            {
                "id": "GHSA-jf85-cpcp-j695",
                "summary": "Prototype Pollution in lodash",
                "details": "Versions of lodash before 4.17.12 are vulnerable.",
                "aliases": ["CVE-2019-10744"],
                "published": "2019-07-10T19:45:23Z",
                "severity": [{"type": "CVSS_V3", "score": "CVSS:3.1/AV:N/AC:L/PR:N/UI:N/S:U/C:N/I:H/A:H"}],
                "database_specific": {"severity": "CRITICAL", "cwe_ids": ["CWE-1321"]},
                "affected": [{
                    "package": {"name": "lodash", "ecosystem": "npm"},
                    "ranges": [{"type": "SEMVER", "events": [{"introduced": "0"}, {"fixed": "4.17.12"}]}]
                }],
                "references": [{"type": "ADVISORY", "url": "https://nvd.nist.gov/vuln/detail/CVE-2019-10744"}]
            }
        ]
    }"#;

    #[test]
    fn test_parse_cvss_score_critical() {
        let score = parse_cvss_score("CVSS:3.1/AV:N/AC:L/PR:N/UI:N/S:U/C:H/I:H/A:H").unwrap();
        assert!((9.0..=10.0).contains(&score));
    }

    #[test]
    fn test_parse_cvss_score_high() {
        let score = parse_cvss_score("CVSS:3.1/AV:N/AC:L/PR:L/UI:N/S:U/C:H/I:H/A:H").unwrap();
        assert!((7.0..9.0).contains(&score));
    }

    #[test]
    fn test_parse_cvss_score_medium() {
        let score = parse_cvss_score("CVSS:3.1/AV:N/AC:L/PR:L/UI:R/S:U/C:L/I:L/A:L").unwrap();
        assert!((4.0..7.0).contains(&score));
    }

    #[test]
    fn test_parse_cvss_score_low() {
        let score = parse_cvss_score("CVSS:3.1/AV:L/AC:H/PR:H/UI:R/S:U/C:L/I:N/A:N").unwrap();
        assert!(score > 0.0 && score < 4.0);
    }

    #[test]
    fn test_parse_cvss_score_no_impact() {
        assert_eq!(
            parse_cvss_score("CVSS:3.1/AV:N/AC:L/PR:N/UI:N/S:U/C:N/I:N/A:N"),
            Some(0.0)
        );
    }

    #[test]
    fn test_parse_cvss_score_invalid() {
        assert!(parse_cvss_score("invalid vector").is_none());
    }

    #[test]
    fn test_ecosystem_mapping() {
        assert_eq!(osv_ecosystem("pnpm"), Some("npm"));
        assert_eq!(osv_ecosystem("poetry"), Some("PyPI"));
        assert_eq!(osv_ecosystem("gradle"), Some("Maven"));
        assert_eq!(osv_ecosystem("cargo"), Some("crates.io"));
        assert_eq!(osv_ecosystem("conan"), None);
        assert_eq!(osv_ecosystem("deb"), None);
    }

    #[test]
    fn test_query_serializes_registry_name() {
        let package = Package::new("jackson-databind", "2.9.8", PackageManager::Maven)
            .with_namespace("com.fasterxml.jackson.core");
        let query = OsvQuery {
            package: OsvPackage {
                name: package.registry_name(),
                ecosystem: "Maven".to_string(),
            },
            version: package.version().to_string(),
        };
        let json = serde_json::to_value(&query).unwrap();
        assert_eq!(
            json["package"]["name"],
            "com.fasterxml.jackson.core:jackson-databind"
        );
        assert_eq!(json["version"], "2.9.8");
    }

    #[test]
    fn test_convert_advisory() {
        let result: OsvResult = serde_json::from_str(LODASH_ADVISORY).unwrap();
        let package = Package::new("lodash", "4.17.11", PackageManager::Npm);
        let vuln = convert_to_vulnerability(&result.vulns[0], &package);

        assert_eq!(vuln.id, "GHSA-jf85-cpcp-j695");
        assert_eq!(vuln.source, "osv");
        assert_eq!(vuln.title, "Prototype Pollution in lodash");
        assert_eq!(vuln.severity, Severity::Critical);
        assert!(vuln.cvss_score.is_some());
        assert_eq!(vuln.fixed_versions, vec!["4.17.12".to_string()]);
        assert_eq!(vuln.cwe_ids, vec!["CWE-1321".to_string()]);
        assert_eq!(vuln.affected_packages, vec!["pkg:npm/lodash@4.17.11".to_string()]);
        assert_eq!(vuln.references.len(), 1);
        assert!(vuln.published_date.is_some());
    }

    #[test]
    fn test_local_range_recheck() {
        let result: OsvResult = serde_json::from_str(LODASH_ADVISORY).unwrap();
        assert!(affects(&result.vulns[0], "4.17.11"));
        assert!(!affects(&result.vulns[0], "4.17.21"));
    }

    #[test]
    fn test_database_severity_fallback() {
        let json = r#"{"vulns": [{"id": "PYSEC-2021-1", "database_specific": {"severity": "MODERATE"},
            "affected": [{"versions": ["1.0.0"]}]}]}"#;
        let result: OsvResult = serde_json::from_str(json).unwrap();
        let package = Package::new("demo", "1.0.0", PackageManager::Pip);
        assert!(affects(&result.vulns[0], "1.0.0"));
        let vuln = convert_to_vulnerability(&result.vulns[0], &package);
        assert_eq!(vuln.severity, Severity::Medium);
        assert_eq!(vuln.cvss_score, None);
        assert_eq!(vuln.title, "PYSEC-2021-1");
    }

    #[test]
    fn test_last_affected_and_git_ranges() {
        let json = r#"{"vulns": [{"id": "RUSTSEC-2020-1", "affected": [{"ranges": [
            {"type": "GIT", "events": [{"introduced": "abc"}, {"fixed": "def"}]},
            {"type": "SEMVER", "events": [{"introduced": "1.0.0"}, {"last_affected": "1.2.0"}]}
        ]}]}]}"#;
        let result: OsvResult = serde_json::from_str(json).unwrap();
        let ranges = version_ranges(&result.vulns[0]);
        assert_eq!(ranges.len(), 1);
        assert_eq!(ranges[0].last_affected.as_deref(), Some("1.2.0"));
        assert!(affects(&result.vulns[0], "1.2.0"));
        assert!(!affects(&result.vulns[0], "1.2.1"));
    }
}
