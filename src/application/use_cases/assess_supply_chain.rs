use crate::ports::outbound::{IntelligenceSource, ProgressReporter};
use crate::sbom_generation::domain::{Package, PackageIntelligence, Sbom, SupplyChainReport};
use crate::sbom_generation::services::supply_chain_scorer;
use chrono::Utc;
use futures::future::join_all;
use std::sync::Arc;

/// AssessSupplyChainUseCase - gathers registry intelligence and scores it
///
/// Packages are processed in fixed-size batches; batches run one after
/// another and the packages of a batch run concurrently. A package whose
/// registry is not covered, or whose lookup fails, still gets a report from
/// the name heuristics alone.
pub struct AssessSupplyChainUseCase<PR> {
    sources: Vec<Arc<dyn IntelligenceSource>>,
    progress_reporter: PR,
    batch_size: usize,
}

impl<PR: ProgressReporter> AssessSupplyChainUseCase<PR> {
    pub fn new(
        sources: Vec<Arc<dyn IntelligenceSource>>,
        progress_reporter: PR,
        batch_size: usize,
    ) -> Self {
        Self {
            sources,
            progress_reporter,
            batch_size: batch_size.max(1),
        }
    }

    /// Returns one report per SBOM package, in package order.
    ///
    /// With `offline` set no registry is contacted and every report rests
    /// on the name heuristics.
    pub async fn execute(&self, sbom: &Sbom, offline: bool) -> Vec<SupplyChainReport> {
        let packages = sbom.packages();
        if packages.is_empty() {
            return Vec::new();
        }
        self.progress_reporter.report(&format!(
            "🕵️  Gathering supply-chain intelligence for {} package(s)...",
            packages.len()
        ));

        let mut reports = Vec::with_capacity(packages.len());
        for batch in packages.chunks(self.batch_size) {
            let gathered = join_all(batch.iter().map(|package| self.gather(package, offline))).await;
            let now = Utc::now();
            for mut intelligence in gathered {
                supply_chain_scorer::derive_signals(&mut intelligence, now);
                let risk = supply_chain_scorer::score(&intelligence);
                reports.push(SupplyChainReport::new(intelligence, risk));
            }
            self.progress_reporter.report_progress(
                reports.len(),
                packages.len(),
                Some("supply chain"),
            );
        }

        let flagged = reports
            .iter()
            .filter(|r| !r.supply_chain_risk.risk_factors.is_empty())
            .count();
        self.progress_reporter.report_completion(&format!(
            "✅ Supply-chain assessment complete: {} package(s) with risk factors",
            flagged
        ));
        reports
    }

    async fn gather(&self, package: &Package, offline: bool) -> PackageIntelligence {
        let source = self
            .sources
            .iter()
            .filter(|_| !offline)
            .find(|s| s.supports(package.package_manager()));

        if let Some(source) = source {
            match source.gather(package).await {
                Ok(intelligence) => return intelligence,
                Err(e) => {
                    tracing::warn!(
                        package = package.purl(),
                        error = %e,
                        "intelligence lookup failed; using name heuristics only"
                    );
                }
            }
        }
        PackageIntelligence::new(
            package.registry_name(),
            package.package_manager(),
            package.version(),
        )
    }
}
