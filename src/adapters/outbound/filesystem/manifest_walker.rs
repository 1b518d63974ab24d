use crate::ports::outbound::ManifestDetector;
use crate::sbom_generation::domain::DetectedManifest;
use crate::sbom_generation::services::manifest_rules::{classify, is_skipped_directory};
use crate::shared::Result;
use anyhow::Context;
use std::fs;
use std::path::Path;

/// Classifies dependency files by walking the project directory.
///
/// Skip-listed and hidden directories are pruned before descending, symlinks
/// are never followed, and unreadable subdirectories are ignored.
pub struct FileSystemManifestDetector;

impl FileSystemManifestDetector {
    pub fn new() -> Self {
        Self
    }

    fn walk(&self, dir: &Path, depth: usize, max_depth: usize, found: &mut Vec<DetectedManifest>) {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::debug!(path = %dir.display(), error = %e, "skipping unreadable directory");
                return;
            }
        };

        for entry in entries.flatten() {
            let Ok(file_type) = entry.file_type() else {
                continue;
            };
            let name = entry.file_name();
            let name = name.to_string_lossy();

            if file_type.is_dir() {
                if depth < max_depth && !is_skipped_directory(&name) {
                    self.walk(&entry.path(), depth + 1, max_depth, found);
                }
            } else if file_type.is_file() {
                if let Some(rule) = classify(&name) {
                    found.push(DetectedManifest::new(
                        entry.path(),
                        rule.package_manager,
                        rule.role,
                        rule.priority,
                    ));
                }
            }
        }
    }
}

impl Default for FileSystemManifestDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl ManifestDetector for FileSystemManifestDetector {
    fn detect(&self, root: &Path, max_depth: usize) -> Result<Vec<DetectedManifest>> {
        fs::read_dir(root)
            .with_context(|| format!("cannot read project directory {}", root.display()))?;

        let mut found = Vec::new();
        self.walk(root, 0, max_depth, &mut found);
        found.sort_by(|a, b| b.priority.cmp(&a.priority).then_with(|| a.path.cmp(&b.path)));
        Ok(found)
    }
}
