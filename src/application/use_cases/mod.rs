/// Use cases module containing application business logic orchestration
mod assess_supply_chain;
mod enrich_vulnerabilities;
mod generate_sbom;
mod scan_project;

pub use assess_supply_chain::AssessSupplyChainUseCase;
pub use enrich_vulnerabilities::{
    EnrichVulnerabilitiesUseCase, EnrichmentOutcome, SKIPPED_ENRICHMENT_NOTE,
};
pub use generate_sbom::GenerateSbomUseCase;
pub use scan_project::{ScanProjectUseCase, DEFAULT_MAX_WORKERS};
