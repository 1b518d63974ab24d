use super::RiskLevel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Registry facts and heuristic signals gathered for one package.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PackageIntelligence {
    pub package_name: String,
    pub package_manager: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weekly_downloads: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_downloads: Option<u64>,
    #[serde(default)]
    pub maintainers: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub project_urls: BTreeMap<String, String>,
    #[serde(default)]
    pub dependencies_count: usize,
    pub is_very_new: bool,
    pub low_download_count: bool,
    pub suspicious_name: bool,
    pub potential_typosquat: bool,
}

impl PackageIntelligence {
    pub fn new(
        package_name: impl Into<String>,
        package_manager: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            package_name: package_name.into(),
            package_manager: package_manager.into(),
            version: version.into(),
            ..Self::default()
        }
    }

    /// Days since the analysed version was published, when known.
    pub fn age_days(&self, now: DateTime<Utc>) -> Option<i64> {
        self.upload_time.map(|t| (now - t).num_days())
    }
}

/// Weighted supply-chain verdict for one package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplyChainRisk {
    pub package_name: String,
    pub risk_level: RiskLevel,
    pub risk_score: f32,
    pub risk_factors: Vec<String>,
    pub recommendations: Vec<String>,
}

/// One entry of the supply-chain section of a scan result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplyChainReport {
    pub package_name: String,
    pub package_manager: String,
    pub version: String,
    pub intelligence: PackageIntelligence,
    pub supply_chain_risk: SupplyChainRisk,
}

impl SupplyChainReport {
    pub fn new(intelligence: PackageIntelligence, supply_chain_risk: SupplyChainRisk) -> Self {
        Self {
            package_name: intelligence.package_name.clone(),
            package_manager: intelligence.package_manager.clone(),
            version: intelligence.version.clone(),
            intelligence,
            supply_chain_risk,
        }
    }
}
