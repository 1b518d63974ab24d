use super::{
    AssessSupplyChainUseCase, EnrichVulnerabilitiesUseCase, EnrichmentOutcome,
    GenerateSbomUseCase, SKIPPED_ENRICHMENT_NOTE,
};
use crate::application::dto::{ScanRequest, ScanTarget};
use crate::ports::outbound::{
    ContainerInventory, ManifestDetector, ParserProvider, ProgressReporter, RemoteScanExecutor,
};
use crate::sbom_generation::domain::{Sbom, ScanResult};
use crate::shared::Result;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;

/// Default bound on projects scanned at the same time
pub const DEFAULT_MAX_WORKERS: usize = 10;

/// ScanProjectUseCase - the full pipeline for one or more targets
///
/// Assembly, enrichment and supply-chain assessment in sequence. When a
/// remote executor is configured it is tried first and any failure falls
/// back to the local pipeline. Several targets share a fixed-size worker
/// pool; one target's failure never aborts the others.
pub struct ScanProjectUseCase<D, P, PR> {
    generate_sbom: GenerateSbomUseCase<D, P, PR>,
    enrich_vulnerabilities: EnrichVulnerabilitiesUseCase<PR>,
    assess_supply_chain: AssessSupplyChainUseCase<PR>,
    container_inventory: Option<Arc<dyn ContainerInventory>>,
    remote_executor: Option<Arc<dyn RemoteScanExecutor>>,
    progress_reporter: PR,
    max_workers: usize,
}

impl<D, P, PR> ScanProjectUseCase<D, P, PR>
where
    D: ManifestDetector,
    P: ParserProvider,
    PR: ProgressReporter,
{
    pub fn new(
        generate_sbom: GenerateSbomUseCase<D, P, PR>,
        enrich_vulnerabilities: EnrichVulnerabilitiesUseCase<PR>,
        assess_supply_chain: AssessSupplyChainUseCase<PR>,
        progress_reporter: PR,
    ) -> Self {
        Self {
            generate_sbom,
            enrich_vulnerabilities,
            assess_supply_chain,
            container_inventory: None,
            remote_executor: None,
            progress_reporter,
            max_workers: DEFAULT_MAX_WORKERS,
        }
    }

    pub fn with_container_inventory(mut self, inventory: Arc<dyn ContainerInventory>) -> Self {
        self.container_inventory = Some(inventory);
        self
    }

    pub fn with_remote_executor(mut self, executor: Arc<dyn RemoteScanExecutor>) -> Self {
        self.remote_executor = Some(executor);
        self
    }

    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers.max(1);
        self
    }

    /// Scans one target.
    ///
    /// # Errors
    /// Returns an error only when a project directory cannot be read.
    pub async fn execute(&self, request: &ScanRequest) -> Result<ScanResult> {
        let started = Instant::now();

        if let Some(remote) = self.remote_executor.as_ref().filter(|_| !request.options.offline) {
            match remote.execute(request).await {
                Ok(result) => {
                    self.progress_reporter.report_completion(&format!(
                        "☁️  Remote scan of {} complete",
                        request.target.display_name()
                    ));
                    return Ok(result);
                }
                Err(e) => {
                    tracing::warn!(
                        target = %request.target.display_name(),
                        error = %e,
                        "remote execution failed; scanning locally"
                    );
                    self.progress_reporter
                        .report_error("⚠️  Remote execution unavailable, scanning locally");
                }
            }
        }

        let sbom = match &request.target {
            ScanTarget::Directory(path) => {
                self.generate_sbom.execute(path, &request.options).await?
            }
            ScanTarget::Image(reference) => self.inventory_image(reference).await,
        };

        let outcome = if request.options.offline {
            EnrichmentOutcome::Enriched(Vec::new())
        } else {
            self.enrich_vulnerabilities.execute(&sbom).await
        };

        let supply_chain = if request.options.supply_chain {
            Some(
                self.assess_supply_chain
                    .execute(&sbom, request.options.offline)
                    .await,
            )
        } else {
            None
        };

        let mut result = match outcome {
            EnrichmentOutcome::Enriched(risks) => ScanResult::new(sbom, risks),
            EnrichmentOutcome::Skipped { .. } => {
                ScanResult::new(sbom, Vec::new()).with_annotation(SKIPPED_ENRICHMENT_NOTE)
            }
        };
        if let Some(reports) = supply_chain {
            result = result.with_supply_chain(reports);
        }
        Ok(result.with_duration(started.elapsed().as_secs_f64()))
    }

    /// Scans every target, at most `max_workers` at a time, returning the
    /// results in request order.
    ///
    /// A target that fails yields an empty result carrying the failure as
    /// an annotation.
    pub async fn execute_all(&self, requests: &[ScanRequest]) -> Vec<ScanResult> {
        let workers = Arc::new(Semaphore::new(self.max_workers));

        join_all(requests.iter().map(|request| {
            let workers = workers.clone();
            async move {
                // The semaphore is never closed, so acquisition cannot fail.
                let _permit = workers.acquire_owned().await.ok();
                match self.execute(request).await {
                    Ok(result) => result,
                    Err(e) => {
                        let name = request.target.display_name();
                        tracing::error!(target = %name, error = %e, "scan failed");
                        self.progress_reporter
                            .report_error(&format!("❌ Scan of {} failed: {}", name, e));
                        ScanResult::new(empty_sbom(&request.target), Vec::new())
                            .with_annotation(format!("Scan failed: {}", e))
                    }
                }
            }
        }))
        .await
    }

    async fn inventory_image(&self, reference: &str) -> Sbom {
        let mut sbom = Sbom::new(reference, reference);
        let Some(inventory) = &self.container_inventory else {
            self.progress_reporter
                .report_error("⚠️  No container inventory tool configured");
            return sbom;
        };

        self.progress_reporter
            .report(&format!("🐳 Inventorying container image: {}", reference));
        match inventory.inventory(reference).await {
            Ok(dependencies) => sbom.extend(dependencies),
            Err(e) => {
                tracing::error!(image = reference, error = %e, "container inventory failed");
                self.progress_reporter
                    .report_error(&format!("⚠️  Container inventory failed: {}", e));
            }
        }
        sbom
    }
}

fn empty_sbom(target: &ScanTarget) -> Sbom {
    match target {
        ScanTarget::Directory(path) => Sbom::for_directory(path),
        ScanTarget::Image(reference) => Sbom::new(reference.as_str(), reference.as_str()),
    }
}
