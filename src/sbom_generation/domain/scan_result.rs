use super::{PackageRisk, RiskLevel, Sbom, Severity, SupplyChainReport};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Everything one scan produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    pub sbom: Sbom,
    pub risks: Vec<PackageRisk>,
    pub total_vulnerabilities: usize,
    pub critical_vulnerabilities: usize,
    pub high_vulnerabilities: usize,
    pub medium_vulnerabilities: usize,
    pub low_vulnerabilities: usize,
    pub critical_risk_packages: usize,
    pub high_risk_packages: usize,
    pub medium_risk_packages: usize,
    pub low_risk_packages: usize,
    pub scan_duration_seconds: f64,
    pub scan_timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supply_chain_intelligence: Option<Vec<SupplyChainReport>>,
    /// Notes about stages that were skipped or degraded.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<String>,
}

impl ScanResult {
    pub fn new(sbom: Sbom, risks: Vec<PackageRisk>) -> Self {
        let mut result = Self {
            sbom,
            risks,
            total_vulnerabilities: 0,
            critical_vulnerabilities: 0,
            high_vulnerabilities: 0,
            medium_vulnerabilities: 0,
            low_vulnerabilities: 0,
            critical_risk_packages: 0,
            high_risk_packages: 0,
            medium_risk_packages: 0,
            low_risk_packages: 0,
            scan_duration_seconds: 0.0,
            scan_timestamp: Utc::now(),
            supply_chain_intelligence: None,
            annotations: Vec::new(),
        };
        result.recount();
        result
    }

    pub fn with_annotation(mut self, note: impl Into<String>) -> Self {
        self.annotations.push(note.into());
        self
    }

    pub fn with_supply_chain(mut self, reports: Vec<SupplyChainReport>) -> Self {
        self.supply_chain_intelligence = Some(reports);
        self
    }

    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.scan_duration_seconds = seconds;
        self
    }

    /// Worst level across vulnerability risks and supply-chain verdicts.
    pub fn highest_risk(&self) -> Option<RiskLevel> {
        let from_vulns = self.risks.iter().map(|r| r.overall_risk);
        let from_supply_chain = self
            .supply_chain_intelligence
            .iter()
            .flatten()
            .map(|r| r.supply_chain_risk.risk_level);
        from_vulns.chain(from_supply_chain).max()
    }

    fn recount(&mut self) {
        let severities = self
            .risks
            .iter()
            .flat_map(|r| r.vulnerabilities.iter().map(|v| v.severity));
        for severity in severities {
            self.total_vulnerabilities += 1;
            match severity {
                Severity::Critical => self.critical_vulnerabilities += 1,
                Severity::High => self.high_vulnerabilities += 1,
                Severity::Medium => self.medium_vulnerabilities += 1,
                Severity::Low => self.low_vulnerabilities += 1,
                Severity::Info | Severity::Unknown => {}
            }
        }
        for risk in &self.risks {
            match risk.overall_risk {
                RiskLevel::Critical => self.critical_risk_packages += 1,
                RiskLevel::High => self.high_risk_packages += 1,
                RiskLevel::Medium => self.medium_risk_packages += 1,
                RiskLevel::Low => self.low_risk_packages += 1,
                RiskLevel::Negligible => {}
            }
        }
    }
}
