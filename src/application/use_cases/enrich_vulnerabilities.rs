use crate::ports::outbound::{ProgressReporter, VulnerabilityFeed};
use crate::sbom_generation::domain::{Package, PackageRisk, Sbom, Vulnerability};
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::sync::Arc;

/// Annotation attached to results whose enrichment was skipped
pub const SKIPPED_ENRICHMENT_NOTE: &str = "Vulnerability scanning skipped for large project";

/// Upper bound on packages queried concurrently
const MAX_CONCURRENT_QUERIES: usize = 10;

/// Result of one enrichment pass.
#[derive(Debug, Clone, PartialEq)]
pub enum EnrichmentOutcome {
    /// One PackageRisk per package with at least one advisory
    Enriched(Vec<PackageRisk>),
    /// The project exceeded the package threshold and was not queried
    Skipped { package_count: usize },
}

impl EnrichmentOutcome {
    pub fn risks(&self) -> &[PackageRisk] {
        match self {
            EnrichmentOutcome::Enriched(risks) => risks,
            EnrichmentOutcome::Skipped { .. } => &[],
        }
    }
}

/// EnrichVulnerabilitiesUseCase - matches SBOM packages against advisory feeds
///
/// Every feed is queried for every package; advisories are merged by id,
/// first feed wins. A failing feed counts as "no advisories" for that
/// package.
pub struct EnrichVulnerabilitiesUseCase<PR> {
    feeds: Vec<Arc<dyn VulnerabilityFeed>>,
    progress_reporter: PR,
    threshold: usize,
}

impl<PR: ProgressReporter> EnrichVulnerabilitiesUseCase<PR> {
    pub fn new(
        feeds: Vec<Arc<dyn VulnerabilityFeed>>,
        progress_reporter: PR,
        threshold: usize,
    ) -> Self {
        Self {
            feeds,
            progress_reporter,
            threshold,
        }
    }

    pub async fn execute(&self, sbom: &Sbom) -> EnrichmentOutcome {
        let package_count = sbom.total_packages();
        if package_count > self.threshold {
            tracing::warn!(
                packages = package_count,
                threshold = self.threshold,
                "large project; skipping vulnerability enrichment"
            );
            self.progress_reporter.report_error(&format!(
                "⚠️  Large project ({} packages); vulnerability scanning skipped",
                package_count
            ));
            return EnrichmentOutcome::Skipped { package_count };
        }
        if self.feeds.is_empty() || package_count == 0 {
            return EnrichmentOutcome::Enriched(Vec::new());
        }

        self.progress_reporter.report(&format!(
            "🔍 Checking {} package(s) for known vulnerabilities...",
            package_count
        ));

        let mut done = 0;
        let mut risks = Vec::new();
        let mut results = stream::iter(sbom.packages())
            .map(|package| async move { (package, self.advisories_for(package).await) })
            .buffered(MAX_CONCURRENT_QUERIES);

        while let Some((package, vulnerabilities)) = results.next().await {
            done += 1;
            self.progress_reporter
                .report_progress(done, package_count, Some("vulnerabilities"));
            if let Some(risk) = PackageRisk::from_vulnerabilities(package.purl(), vulnerabilities) {
                risks.push(risk);
            }
        }

        let total: usize = risks.iter().map(|r| r.vulnerabilities.len()).sum();
        self.progress_reporter.report_completion(&format!(
            "🛡️  Found {} vulnerabilit{} in {} package(s)",
            total,
            if total == 1 { "y" } else { "ies" },
            risks.len()
        ));
        EnrichmentOutcome::Enriched(risks)
    }

    async fn advisories_for(&self, package: &Package) -> Vec<Vulnerability> {
        let mut seen = HashSet::new();
        let mut merged = Vec::new();
        for feed in &self.feeds {
            match feed.query(package).await {
                Ok(vulnerabilities) => {
                    for vulnerability in vulnerabilities {
                        if seen.insert(vulnerability.id.clone()) {
                            merged.push(vulnerability);
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        feed = feed.source(),
                        package = package.purl(),
                        error = %e,
                        "vulnerability feed query failed"
                    );
                }
            }
        }
        merged
    }
}
