use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Advisory severity, ordered from least to most severe.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Unknown,
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Maps a CVSS base score onto the qualitative scale.
    pub fn from_cvss_score(score: f32) -> Self {
        match score {
            s if s >= 9.0 => Severity::Critical,
            s if s >= 7.0 => Severity::High,
            s if s >= 4.0 => Severity::Medium,
            s if s > 0.0 => Severity::Low,
            _ => Severity::Info,
        }
    }

    /// Case-insensitive parse of advisory-database labels.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_uppercase().as_str() {
            "CRITICAL" => Severity::Critical,
            "HIGH" => Severity::High,
            "MODERATE" | "MEDIUM" => Severity::Medium,
            "LOW" => Severity::Low,
            "INFO" | "NONE" => Severity::Info,
            _ => Severity::Unknown,
        }
    }

    /// Score assumed when an advisory carries no CVSS vector.
    pub fn nominal_score(&self) -> f32 {
        match self {
            Severity::Critical => 9.0,
            Severity::High => 7.0,
            Severity::Medium => 5.0,
            Severity::Low => 2.0,
            Severity::Info | Severity::Unknown => 0.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
            Severity::Info => "info",
            Severity::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One affected interval: `introduced <= v < fixed` (or `<= last_affected`).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VersionRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub introduced: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_affected: Option<String>,
}

/// A known vulnerability as reported by one advisory source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vulnerability {
    pub id: String,
    pub source: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cvss_score: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cvss_vector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub affected_packages: Vec<String>,
    #[serde(default)]
    pub fixed_versions: Vec<String>,
    #[serde(default)]
    pub vulnerable_versions: Vec<VersionRange>,
    #[serde(default)]
    pub references: Vec<String>,
    #[serde(default)]
    pub cwe_ids: Vec<String>,
    #[serde(default)]
    pub exploit_available: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exploit_maturity: Option<String>,
}

impl Vulnerability {
    pub fn new(id: impl Into<String>, source: impl Into<String>, severity: Severity) -> Self {
        let id = id.into();
        Self {
            title: id.clone(),
            id,
            source: source.into(),
            description: String::new(),
            severity,
            cvss_score: None,
            cvss_vector: None,
            published_date: None,
            modified_date: None,
            affected_packages: Vec::new(),
            fixed_versions: Vec::new(),
            vulnerable_versions: Vec::new(),
            references: Vec::new(),
            cwe_ids: Vec::new(),
            exploit_available: false,
            exploit_maturity: None,
        }
    }

    /// CVSS score when present, otherwise the severity's nominal score.
    pub fn effective_score(&self) -> f32 {
        self.cvss_score
            .unwrap_or_else(|| self.severity.nominal_score())
            .clamp(0.0, 10.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Critical > Severity::High);
        assert!(Severity::Low > Severity::Info);
        assert!(Severity::Info > Severity::Unknown);
    }

    #[test]
    fn test_from_cvss_score_boundaries() {
        assert_eq!(Severity::from_cvss_score(9.0), Severity::Critical);
        assert_eq!(Severity::from_cvss_score(8.9), Severity::High);
        assert_eq!(Severity::from_cvss_score(4.0), Severity::Medium);
        assert_eq!(Severity::from_cvss_score(0.1), Severity::Low);
        assert_eq!(Severity::from_cvss_score(0.0), Severity::Info);
    }

    #[test]
    fn test_from_label() {
        assert_eq!(Severity::from_label("moderate"), Severity::Medium);
        assert_eq!(Severity::from_label("HIGH"), Severity::High);
        assert_eq!(Severity::from_label("whatever"), Severity::Unknown);
    }

    #[test]
    fn test_effective_score_prefers_cvss() {
        let mut vuln = Vulnerability::new("GHSA-xxxx", "osv", Severity::High);
        assert_eq!(vuln.effective_score(), 7.0);
        vuln.cvss_score = Some(8.1);
        assert_eq!(vuln.effective_score(), 8.1);
    }
}
