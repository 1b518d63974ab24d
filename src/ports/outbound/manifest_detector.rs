use crate::sbom_generation::domain::DetectedManifest;
use crate::shared::Result;
use std::path::Path;

/// ManifestDetector port for locating dependency files in a project tree
pub trait ManifestDetector: Send + Sync {
    /// Walks `root` and classifies every recognised manifest, lockfile and
    /// package-manager config file.
    ///
    /// # Arguments
    /// * `root` - Project directory (depth 0)
    /// * `max_depth` - Deepest directory level that is still entered
    ///
    /// # Returns
    /// Descriptors sorted by descending priority, then by path
    ///
    /// # Errors
    /// Returns an error only when `root` itself cannot be read; unreadable
    /// subdirectories are skipped.
    fn detect(&self, root: &Path, max_depth: usize) -> Result<Vec<DetectedManifest>>;
}
