use super::{Language, PackageManager};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// What a detected file declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ManifestRole {
    /// Human-maintained list of direct dependencies
    Manifest,
    /// Tool-generated pin of the full dependency set
    Lockfile,
    /// Package-manager configuration; classified but never parsed
    Config,
}

impl ManifestRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ManifestRole::Manifest => "manifest",
            ManifestRole::Lockfile => "lockfile",
            ManifestRole::Config => "config",
        }
    }
}

/// A file found by the classifier, tagged with its ecosystem and role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectedManifest {
    pub path: PathBuf,
    pub language: Language,
    pub package_manager: PackageManager,
    pub role: ManifestRole,
    pub priority: u8,
}

impl DetectedManifest {
    pub fn new(
        path: PathBuf,
        package_manager: PackageManager,
        role: ManifestRole,
        priority: u8,
    ) -> Self {
        Self {
            path,
            language: package_manager.language(),
            package_manager,
            role,
            priority,
        }
    }

    pub fn file_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
    }

    /// Directory holding the file; lockfile lookup happens here.
    pub fn directory(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detected_manifest_derives_language() {
        let m = DetectedManifest::new(
            PathBuf::from("/repo/web/package.json"),
            PackageManager::Npm,
            ManifestRole::Manifest,
            10,
        );
        assert_eq!(m.language, Language::Javascript);
        assert_eq!(m.file_name(), "package.json");
        assert_eq!(m.directory(), Path::new("/repo/web"));
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&ManifestRole::Lockfile).unwrap();
        assert_eq!(json, "\"lockfile\"");
    }
}
