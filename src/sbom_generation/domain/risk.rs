use super::{Severity, Vulnerability};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Overall risk attached to a package, ordered from least to most severe.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    #[default]
    Negligible,
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Negligible => "negligible",
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }

    /// Supply-chain thresholds: >= 6 critical, >= 4 high, >= 2 medium.
    pub fn from_supply_chain_score(score: f32) -> Self {
        if score >= 6.0 {
            RiskLevel::Critical
        } else if score >= 4.0 {
            RiskLevel::High
        } else if score >= 2.0 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

impl From<Severity> for RiskLevel {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Critical => RiskLevel::Critical,
            Severity::High => RiskLevel::High,
            Severity::Medium => RiskLevel::Medium,
            Severity::Low => RiskLevel::Low,
            Severity::Info | Severity::Unknown => RiskLevel::Negligible,
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "negligible" => Ok(RiskLevel::Negligible),
            "low" => Ok(RiskLevel::Low),
            "medium" => Ok(RiskLevel::Medium),
            "high" => Ok(RiskLevel::High),
            "critical" => Ok(RiskLevel::Critical),
            other => Err(format!(
                "invalid risk level '{}' (expected negligible, low, medium, high or critical)",
                other
            )),
        }
    }
}

/// A single reason a package is considered risky.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFactor {
    #[serde(rename = "type")]
    pub factor_type: String,
    pub severity: RiskLevel,
    pub description: String,
    #[serde(default)]
    pub evidence: Vec<String>,
    pub confidence: f32,
}

/// Vulnerability-derived risk for one package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageRisk {
    pub package_purl: String,
    pub overall_risk: RiskLevel,
    pub risk_score: f32,
    pub vulnerabilities: Vec<Vulnerability>,
    #[serde(default)]
    pub risk_factors: Vec<RiskFactor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_days: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update_days: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maintainer_count: Option<usize>,
}

impl PackageRisk {
    /// Aggregates matched advisories; `None` when there are none.
    ///
    /// The level is the highest advisory severity and the score the highest
    /// effective CVSS score, both clamped to the 0-10 scale.
    pub fn from_vulnerabilities(
        package_purl: impl Into<String>,
        vulnerabilities: Vec<Vulnerability>,
    ) -> Option<Self> {
        if vulnerabilities.is_empty() {
            return None;
        }

        let worst = vulnerabilities
            .iter()
            .map(|v| v.severity)
            .max()
            .unwrap_or_default();
        let score = vulnerabilities
            .iter()
            .map(Vulnerability::effective_score)
            .fold(0.0_f32, f32::max)
            .clamp(0.0, 10.0);

        let mut risk_factors = vec![RiskFactor {
            factor_type: "vulnerability".to_string(),
            severity: worst.into(),
            description: format!("{} known vulnerabilities", vulnerabilities.len()),
            evidence: vulnerabilities.iter().map(|v| v.id.clone()).collect(),
            confidence: 1.0,
        }];

        let exploited: Vec<String> = vulnerabilities
            .iter()
            .filter(|v| v.exploit_available)
            .map(|v| v.id.clone())
            .collect();
        if !exploited.is_empty() {
            risk_factors.push(RiskFactor {
                factor_type: "exploit".to_string(),
                severity: RiskLevel::Critical,
                description: "Public exploit available".to_string(),
                evidence: exploited,
                confidence: 0.9,
            });
        }

        Some(Self {
            package_purl: package_purl.into(),
            overall_risk: worst.into(),
            risk_score: score,
            vulnerabilities,
            risk_factors,
            age_days: None,
            last_update_days: None,
            download_count: None,
            maintainer_count: None,
        })
    }

    pub fn highest_severity(&self) -> Severity {
        self.vulnerabilities
            .iter()
            .map(|v| v.severity)
            .max()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supply_chain_thresholds() {
        assert_eq!(RiskLevel::from_supply_chain_score(9.5), RiskLevel::Critical);
        assert_eq!(RiskLevel::from_supply_chain_score(6.0), RiskLevel::Critical);
        assert_eq!(RiskLevel::from_supply_chain_score(4.0), RiskLevel::High);
        assert_eq!(RiskLevel::from_supply_chain_score(2.0), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_supply_chain_score(1.5), RiskLevel::Low);
    }

    #[test]
    fn test_package_risk_none_without_vulns() {
        assert!(PackageRisk::from_vulnerabilities("pkg:npm/a@1.0.0", vec![]).is_none());
    }

    #[test]
    fn test_package_risk_takes_worst() {
        let mut high = Vulnerability::new("CVE-1", "osv", Severity::High);
        high.cvss_score = Some(7.5);
        let low = Vulnerability::new("CVE-2", "osv", Severity::Low);

        let risk = PackageRisk::from_vulnerabilities("pkg:npm/a@1.0.0", vec![low, high]).unwrap();
        assert_eq!(risk.overall_risk, RiskLevel::High);
        assert_eq!(risk.risk_score, 7.5);
        assert_eq!(risk.risk_factors.len(), 1);
        assert_eq!(risk.risk_factors[0].evidence, vec!["CVE-2", "CVE-1"]);
    }

    #[test]
    fn test_exploit_adds_factor() {
        let mut vuln = Vulnerability::new("CVE-3", "osv", Severity::Medium);
        vuln.exploit_available = true;
        let risk = PackageRisk::from_vulnerabilities("pkg:pip/x@1", vec![vuln]).unwrap();
        assert_eq!(risk.risk_factors.len(), 2);
        assert_eq!(risk.risk_factors[1].factor_type, "exploit");
    }

    #[test]
    fn test_risk_level_from_str() {
        assert_eq!("HIGH".parse::<RiskLevel>(), Ok(RiskLevel::High));
        assert!("severe".parse::<RiskLevel>().is_err());
    }
}
