//! dependency-canary - multi-ecosystem SBOM assembly and dependency risk scoring
//!
//! This library walks a project tree, classifies every manifest, lockfile and
//! package-manager config it finds, merges the parsed dependencies into one
//! deduplicated SBOM, and scores the result against vulnerability advisories
//! and supply-chain heuristics. It follows hexagonal architecture and
//! Domain-Driven Design principles.
//!
//! # Architecture
//!
//! The library is organized into the following layers:
//!
//! - **Domain Layer** (`sbom_generation`): Pure business logic and domain models
//! - **Application Layer** (`application`): Use cases and request DTOs
//! - **Ports** (`ports`): Interface definitions for infrastructure
//! - **Adapters** (`adapters`): Concrete implementations of ports
//! - **Shared** (`shared`): Common utilities and error types
//!
//! # Example
//!
//! ```no_run
//! use dependency_canary::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<()> {
//! let reporter = Arc::new(StderrProgressReporter::new());
//!
//! // Offline wiring: no registry, advisory or intelligence access
//! let scanner = ScanProjectUseCase::new(
//!     GenerateSbomUseCase::new(
//!         FileSystemManifestDetector::new(),
//!         ParserRegistry::new(&ResolverSettings::offline()),
//!         reporter.clone(),
//!     ),
//!     EnrichVulnerabilitiesUseCase::new(vec![], reporter.clone(), 50),
//!     AssessSupplyChainUseCase::new(vec![], reporter.clone(), 50),
//!     reporter,
//! );
//!
//! let options = ScanOptions {
//!     offline: true,
//!     ..ScanOptions::default()
//! };
//! let result = scanner.execute(&ScanRequest::directory(".", options)).await?;
//!
//! let output = JsonFormatter::new().format(&[result])?;
//! println!("{}", output);
//! # Ok(())
//! # }
//! ```

pub mod adapters;
pub mod application;
pub mod ports;
pub mod sbom_generation;
pub mod shared;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::adapters::outbound::console::StderrProgressReporter;
    pub use crate::adapters::outbound::filesystem::{
        FileSystemManifestDetector, FileSystemWriter, StdoutPresenter,
    };
    pub use crate::adapters::outbound::formatters::{
        JsonFormatter, SummaryFormatter, YamlFormatter,
    };
    pub use crate::adapters::outbound::parsers::{ParserRegistry, ResolverSettings};
    pub use crate::application::dto::{OutputFormat, ScanOptions, ScanRequest, ScanTarget};
    pub use crate::application::use_cases::{
        AssessSupplyChainUseCase, EnrichVulnerabilitiesUseCase, GenerateSbomUseCase,
        ScanProjectUseCase,
    };
    pub use crate::ports::outbound::{
        ManifestDetector, ManifestParser, OutputPresenter, ProgressReporter, ReportFormatter,
    };
    pub use crate::sbom_generation::domain::{
        Dependency, DetectedManifest, Package, PackageManager, PackageRisk, RiskLevel, Sbom,
        ScanResult, SupplyChainReport, Vulnerability,
    };
    pub use crate::shared::Result;
}
