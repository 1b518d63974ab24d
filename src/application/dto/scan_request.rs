use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default bound on classifier directory depth
pub const DEFAULT_MAX_DEPTH: usize = 10;

/// Projects larger than this skip vulnerability enrichment
pub const DEFAULT_ENRICHMENT_THRESHOLD: usize = 50;

/// Packages per supply-chain intelligence batch
pub const DEFAULT_INTELLIGENCE_BATCH_SIZE: usize = 50;

/// What one scan looks at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum ScanTarget {
    /// A project directory walked for manifests
    Directory(PathBuf),
    /// A container image reference inventoried by syft
    Image(String),
}

impl ScanTarget {
    /// Label used for the SBOM project name and in progress messages
    pub fn display_name(&self) -> String {
        match self {
            ScanTarget::Directory(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
            ScanTarget::Image(reference) => reference.clone(),
        }
    }
}

/// Pipeline switches shared by every target of an invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanOptions {
    /// Append lockfile entries and registry-resolved dependencies
    pub include_transitive: bool,
    /// Gather registry intelligence and score supply-chain risk
    pub supply_chain: bool,
    /// Never touch the network: no resolution, enrichment or intelligence
    pub offline: bool,
    /// Deepest directory level the classifier enters
    pub max_depth: usize,
    pub enrichment_threshold: usize,
    pub intelligence_batch_size: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            include_transitive: true,
            supply_chain: false,
            offline: false,
            max_depth: DEFAULT_MAX_DEPTH,
            enrichment_threshold: DEFAULT_ENRICHMENT_THRESHOLD,
            intelligence_batch_size: DEFAULT_INTELLIGENCE_BATCH_SIZE,
        }
    }
}

/// ScanRequest - the input of one local or remote pipeline run
///
/// Serializable so the remote executor can ship it unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRequest {
    pub target: ScanTarget,
    pub options: ScanOptions,
}

impl ScanRequest {
    pub fn new(target: ScanTarget, options: ScanOptions) -> Self {
        Self { target, options }
    }

    pub fn directory(path: impl Into<PathBuf>, options: ScanOptions) -> Self {
        Self::new(ScanTarget::Directory(path.into()), options)
    }

    pub fn image(reference: impl Into<String>, options: ScanOptions) -> Self {
        Self::new(ScanTarget::Image(reference.into()), options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = ScanOptions::default();
        assert!(options.include_transitive);
        assert!(!options.supply_chain);
        assert_eq!(options.max_depth, 10);
        assert_eq!(options.enrichment_threshold, 50);
    }

    #[test]
    fn test_request_wire_shape() {
        let request = ScanRequest::image("alpine:3.19", ScanOptions::default());
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["target"]["kind"], "image");
        assert_eq!(json["target"]["value"], "alpine:3.19");
        assert_eq!(json["options"]["include_transitive"], true);

        let back: ScanRequest = serde_json::from_value(json).unwrap();
        assert_eq!(back, request);
    }

    #[test]
    fn test_display_name() {
        let dir = ScanTarget::Directory(PathBuf::from("/work/shop-api"));
        assert_eq!(dir.display_name(), "shop-api");
        assert_eq!(ScanTarget::Image("nginx:1.25".into()).display_name(), "nginx:1.25");
    }
}
