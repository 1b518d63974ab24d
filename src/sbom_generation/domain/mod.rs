mod dependency;
mod ecosystem;
mod intelligence;
mod manifest;
mod package;
mod risk;
mod sbom;
mod scan_result;
mod vulnerability;

pub use dependency::{Dependency, DependencyType, Scope};
pub use ecosystem::{Language, PackageManager};
pub use intelligence::{PackageIntelligence, SupplyChainReport, SupplyChainRisk};
pub use manifest::{DetectedManifest, ManifestRole};
pub use package::{Package, LATEST_VERSION};
pub use risk::{PackageRisk, RiskFactor, RiskLevel};
pub use sbom::{Sbom, SBOM_FORMAT_VERSION};
pub use scan_result::ScanResult;
pub use vulnerability::{Severity, VersionRange, Vulnerability};
