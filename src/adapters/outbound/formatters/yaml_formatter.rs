use crate::ports::outbound::ReportFormatter;
use crate::sbom_generation::domain::ScanResult;
use crate::shared::Result;

/// YamlFormatter renders the same documents as [`super::JsonFormatter`] in YAML.
pub struct YamlFormatter;

impl YamlFormatter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for YamlFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportFormatter for YamlFormatter {
    fn format(&self, results: &[ScanResult]) -> Result<String> {
        let rendered = match results {
            [single] => serde_yaml_ng::to_string(single)?,
            many => serde_yaml_ng::to_string(many)?,
        };
        Ok(rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sbom_generation::domain::{
        Dependency, Package, PackageManager, PackageRisk, Sbom, Severity, Vulnerability,
    };

    #[test]
    fn test_yaml_output() {
        let mut sbom = Sbom::new("shop", "/work/shop");
        sbom.add(Dependency::direct(Package::new("lodash", "4.17.11", PackageManager::Npm)));
        let risk = PackageRisk::from_vulnerabilities(
            "pkg:npm/lodash@4.17.11",
            vec![Vulnerability::new("GHSA-jf85-cpcp-j695", "osv", Severity::Critical)],
        )
        .unwrap();

        let output = YamlFormatter::new()
            .format(&[ScanResult::new(sbom, vec![risk])])
            .unwrap();
        let value: serde_yaml_ng::Value = serde_yaml_ng::from_str(&output).unwrap();
        assert_eq!(value["critical_vulnerabilities"].as_u64(), Some(1));
        assert_eq!(value["risks"][0]["overall_risk"].as_str(), Some("critical"));
        assert!(output.contains("project_name: shop"));
    }
}
