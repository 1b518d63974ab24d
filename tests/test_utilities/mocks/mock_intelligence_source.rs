use async_trait::async_trait;
use dependency_canary::ports::outbound::IntelligenceSource;
use dependency_canary::prelude::*;
use dependency_canary::sbom_generation::domain::PackageIntelligence;
use std::collections::HashMap;

/// Mock IntelligenceSource for one package manager
///
/// Packages without a canned record get a well-established profile: many
/// downloads, a maintainer, a repository URL and a publish date years ago.
pub struct MockIntelligenceSource {
    package_manager: String,
    records: HashMap<String, PackageIntelligence>,
}

impl MockIntelligenceSource {
    pub fn new(package_manager: &str) -> Self {
        Self {
            package_manager: package_manager.to_string(),
            records: HashMap::new(),
        }
    }

    pub fn with_record(mut self, intelligence: PackageIntelligence) -> Self {
        self.records
            .insert(intelligence.package_name.clone(), intelligence);
        self
    }
}

#[async_trait]
impl IntelligenceSource for MockIntelligenceSource {
    fn supports(&self, package_manager: &str) -> bool {
        self.package_manager == package_manager
    }

    async fn gather(&self, package: &Package) -> Result<PackageIntelligence> {
        if let Some(record) = self.records.get(package.name()) {
            return Ok(record.clone());
        }
        let mut intel = PackageIntelligence::new(
            package.name(),
            package.package_manager(),
            package.version(),
        );
        intel.weekly_downloads = Some(5_000_000);
        intel.maintainers = vec!["maintainer".to_string()];
        intel.upload_time = Some(chrono::Utc::now() - chrono::Duration::days(2000));
        intel.project_urls.insert(
            "repository".to_string(),
            format!("https://github.com/example/{}", package.name()),
        );
        Ok(intel)
    }
}
