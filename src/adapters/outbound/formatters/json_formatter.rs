use crate::ports::outbound::ReportFormatter;
use crate::sbom_generation::domain::ScanResult;
use crate::shared::Result;

/// JsonFormatter renders full ScanResult documents as pretty-printed JSON.
///
/// A single target renders as one object; several targets render as an
/// array in scan order.
pub struct JsonFormatter;

impl JsonFormatter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for JsonFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportFormatter for JsonFormatter {
    fn format(&self, results: &[ScanResult]) -> Result<String> {
        let rendered = match results {
            [single] => serde_json::to_string_pretty(single)?,
            many => serde_json::to_string_pretty(many)?,
        };
        Ok(rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sbom_generation::domain::{Dependency, Package, PackageManager, Sbom};

    fn result(name: &str) -> ScanResult {
        let mut sbom = Sbom::new(name, format!("/work/{}", name));
        sbom.add(Dependency::direct(Package::new(
            "requests",
            "2.25.1",
            PackageManager::Pip,
        )));
        ScanResult::new(sbom, vec![])
    }

    #[test]
    fn test_single_result_is_an_object() {
        let output = JsonFormatter::new().format(&[result("api")]).unwrap();
        let json: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(json["sbom"]["project_name"], "api");
        assert_eq!(json["sbom"]["packages"][0]["purl"], "pkg:pip/requests@2.25.1");
        assert_eq!(json["sbom"]["dependencies"][0]["dependency_type"], "direct");
    }

    #[test]
    fn test_multiple_results_are_an_array() {
        let output = JsonFormatter::new()
            .format(&[result("api"), result("web")])
            .unwrap();
        let json: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(json.as_array().map(Vec::len), Some(2));
        assert_eq!(json[1]["sbom"]["project_name"], "web");
    }
}
