use crate::application::dto::ScanOptions;
use crate::ports::outbound::{ManifestDetector, ParserProvider, ProgressReporter};
use crate::sbom_generation::domain::{Dependency, DetectedManifest, ManifestRole, Sbom};
use crate::shared::Result;
use futures::future::join_all;
use std::path::{Path, PathBuf};

/// GenerateSbomUseCase - assembles one project's dependency graph
///
/// Classifies the project's dependency files, parses every manifest and
/// lockfile concurrently, and merges the results into a single [`Sbom`].
///
/// # Type Parameters
/// * `D` - ManifestDetector implementation
/// * `P` - ParserProvider implementation
/// * `PR` - ProgressReporter implementation
pub struct GenerateSbomUseCase<D, P, PR> {
    detector: D,
    parsers: P,
    progress_reporter: PR,
}

impl<D, P, PR> GenerateSbomUseCase<D, P, PR>
where
    D: ManifestDetector,
    P: ParserProvider,
    PR: ProgressReporter,
{
    /// Creates a new GenerateSbomUseCase with injected dependencies
    pub fn new(detector: D, parsers: P, progress_reporter: PR) -> Self {
        Self {
            detector,
            parsers,
            progress_reporter,
        }
    }

    /// Executes the assembly for the project rooted at `root`
    ///
    /// # Returns
    /// The SBOM; empty when no dependency file is found
    ///
    /// # Errors
    /// Returns an error only when `root` cannot be read. A manifest that
    /// fails to parse is logged and left out of the result.
    pub async fn execute(&self, root: &Path, options: &ScanOptions) -> Result<Sbom> {
        self.progress_reporter
            .report(&format!("📖 Detecting dependency files in: {}", root.display()));

        let manifests = self.detector.detect(root, options.max_depth)?;
        let parseable: Vec<&DetectedManifest> = manifests
            .iter()
            .filter(|m| m.role != ManifestRole::Config)
            .collect();

        let mut sbom = Sbom::for_directory(root);
        if parseable.is_empty() {
            self.progress_reporter
                .report_error("⚠️  No supported dependency files found");
            return Ok(sbom);
        }
        self.progress_reporter.report(&format!(
            "✅ Detected {} dependency file(s)",
            parseable.len()
        ));

        let outcomes = join_all(
            parseable
                .iter()
                .map(|manifest| self.parse_detected(manifest, options)),
        )
        .await;

        for (manifest, outcome) in parseable.iter().zip(outcomes) {
            match outcome {
                Ok(dependencies) => {
                    tracing::info!(
                        path = %manifest.path.display(),
                        count = dependencies.len(),
                        "parsed dependency file"
                    );
                    sbom.extend(dependencies);
                }
                Err(e) => {
                    tracing::error!(path = %manifest.path.display(), error = %e, "failed to parse dependency file");
                    self.progress_reporter.report_error(&format!(
                        "⚠️  Skipped {}: {}",
                        manifest.path.display(),
                        e
                    ));
                }
            }
        }

        self.progress_reporter.report_completion(&format!(
            "📦 Assembled {} package(s) ({} direct, {} transitive)",
            sbom.total_packages(),
            sbom.direct_dependencies(),
            sbom.transitive_dependencies()
        ));
        Ok(sbom)
    }

    /// Produces the dependencies contributed by one detected file.
    async fn parse_detected(
        &self,
        manifest: &DetectedManifest,
        options: &ScanOptions,
    ) -> Result<Vec<Dependency>> {
        let parser = self
            .parsers
            .parser_for(manifest.package_manager)
            .ok_or_else(|| anyhow::anyhow!("no parser for {}", manifest.package_manager))?;

        if manifest.role == ManifestRole::Lockfile {
            return Ok(parser.parse_lockfile(&manifest.path).await?);
        }

        let mut dependencies = parser.parse_manifest(&manifest.path).await;
        if !options.include_transitive {
            return Ok(dependencies);
        }

        if let Some(lockfile) = adjacent_lockfile(manifest) {
            match parser.parse_lockfile(&lockfile).await {
                Ok(pinned) => {
                    dependencies.extend(pinned);
                    return Ok(dependencies);
                }
                Err(e) => {
                    tracing::warn!(
                        lockfile = %lockfile.display(),
                        error = %e,
                        "adjacent lockfile unusable; falling back to registry resolution"
                    );
                }
            }
        }

        if options.offline {
            return Ok(dependencies);
        }
        Ok(parser.resolve_transitive(dependencies).await)
    }
}

/// First lockfile of the manifest's package manager sitting next to it.
fn adjacent_lockfile(manifest: &DetectedManifest) -> Option<PathBuf> {
    manifest
        .package_manager
        .lockfile_names()
        .iter()
        .map(|name| manifest.directory().join(name))
        .find(|path| path.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::outbound::ManifestParser;
    use crate::sbom_generation::domain::{DependencyType, Package, PackageManager};
    use crate::shared::{ParseError, ParseResult};
    use async_trait::async_trait;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    struct FixedDetector(Vec<DetectedManifest>);

    impl ManifestDetector for FixedDetector {
        fn detect(&self, _root: &Path, _max_depth: usize) -> Result<Vec<DetectedManifest>> {
            Ok(self.0.clone())
        }
    }

    /// Parser that reads nothing from disk: manifests yield `app-dep`,
    /// lockfiles yield `app-dep` again plus `pinned-dep`, and a lockfile
    /// named `maven.lock` is unsupported.
    #[derive(Default)]
    struct StubParser {
        resolve_calls: AtomicUsize,
    }

    #[async_trait]
    impl ManifestParser for StubParser {
        fn name(&self) -> &'static str {
            "stub"
        }

        fn package_managers(&self) -> &'static [PackageManager] {
            &[PackageManager::Npm, PackageManager::Maven, PackageManager::Cargo]
        }

        async fn read_manifest(&self, path: &Path) -> ParseResult<Vec<Dependency>> {
            if path.ends_with("broken/package.json") {
                return Err(ParseError::malformed(path, "unexpected end of input"));
            }
            Ok(vec![Dependency::direct(Package::new(
                "app-dep",
                "1.0.0",
                PackageManager::Npm,
            ))])
        }

        async fn read_lockfile(&self, path: &Path) -> ParseResult<Vec<Dependency>> {
            if path.ends_with("maven.lock") {
                return Err(ParseError::unsupported("stub", path));
            }
            Ok(vec![
                Dependency::direct(Package::new("app-dep", "1.0.0", PackageManager::Npm)),
                Dependency::unattributed(Package::new("pinned-dep", "2.0.0", PackageManager::Npm)),
            ])
        }

        async fn resolve_transitive(&self, mut dependencies: Vec<Dependency>) -> Vec<Dependency> {
            self.resolve_calls.fetch_add(1, Ordering::SeqCst);
            let parent = dependencies[0].purl().to_string();
            dependencies.push(Dependency::transitive(
                Package::new("resolved-dep", "3.0.0", PackageManager::Npm),
                Some(parent),
                1,
            ));
            dependencies
        }
    }

    struct StubProvider(Arc<StubParser>);

    impl ParserProvider for StubProvider {
        fn parser_for(&self, manager: PackageManager) -> Option<Arc<dyn ManifestParser>> {
            match manager {
                PackageManager::Npm | PackageManager::Maven => Some(self.0.clone()),
                _ => None,
            }
        }
    }

    #[derive(Default)]
    struct RecordingReporter {
        errors: Mutex<Vec<String>>,
    }

    impl ProgressReporter for RecordingReporter {
        fn report(&self, _message: &str) {}
        fn report_progress(&self, _current: usize, _total: usize, _message: Option<&str>) {}
        fn report_error(&self, message: &str) {
            self.errors.lock().unwrap().push(message.to_string());
        }
        fn report_completion(&self, _message: &str) {}
    }

    fn use_case(
        manifests: Vec<DetectedManifest>,
    ) -> (
        GenerateSbomUseCase<FixedDetector, StubProvider, Arc<RecordingReporter>>,
        Arc<StubParser>,
        Arc<RecordingReporter>,
    ) {
        let parser = Arc::new(StubParser::default());
        let reporter = Arc::new(RecordingReporter::default());
        let use_case = GenerateSbomUseCase::new(
            FixedDetector(manifests),
            StubProvider(parser.clone()),
            reporter.clone(),
        );
        (use_case, parser, reporter)
    }

    fn manifest(path: PathBuf, manager: PackageManager, role: ManifestRole) -> DetectedManifest {
        DetectedManifest::new(path, manager, role, 10)
    }

    #[tokio::test]
    async fn test_empty_project_yields_empty_sbom() {
        let temp = TempDir::new().unwrap();
        let (use_case, _, reporter) = use_case(vec![]);

        let sbom = use_case
            .execute(temp.path(), &ScanOptions::default())
            .await
            .unwrap();
        assert_eq!(sbom.total_packages(), 0);
        assert!(sbom.dependencies().is_empty());
        assert_eq!(reporter.errors.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_adjacent_lockfile_preferred_over_registry() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("package-lock.json"), "{}").unwrap();
        let (use_case, parser, _) = use_case(vec![manifest(
            temp.path().join("package.json"),
            PackageManager::Npm,
            ManifestRole::Manifest,
        )]);

        let sbom = use_case
            .execute(temp.path(), &ScanOptions::default())
            .await
            .unwrap();
        assert_eq!(sbom.total_packages(), 2);
        assert_eq!(sbom.direct_dependencies(), 1);
        assert_eq!(parser.resolve_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_registry_resolution_without_lockfile() {
        let temp = TempDir::new().unwrap();
        let (use_case, parser, _) = use_case(vec![manifest(
            temp.path().join("package.json"),
            PackageManager::Npm,
            ManifestRole::Manifest,
        )]);

        let sbom = use_case
            .execute(temp.path(), &ScanOptions::default())
            .await
            .unwrap();
        assert_eq!(parser.resolve_calls.load(Ordering::SeqCst), 1);
        let resolved = sbom
            .dependencies()
            .iter()
            .find(|d| d.package.name() == "resolved-dep")
            .unwrap();
        assert_eq!(resolved.dependency_type, DependencyType::Transitive);
        assert_eq!(resolved.parent.as_deref(), Some("pkg:npm/app-dep@1.0.0"));
    }

    #[tokio::test]
    async fn test_offline_and_no_transitive_skip_resolution() {
        let temp = TempDir::new().unwrap();
        let manifests = vec![manifest(
            temp.path().join("package.json"),
            PackageManager::Npm,
            ManifestRole::Manifest,
        )];

        let (offline, parser, _) = use_case(manifests.clone());
        let options = ScanOptions {
            offline: true,
            ..ScanOptions::default()
        };
        let sbom = offline.execute(temp.path(), &options).await.unwrap();
        assert_eq!(sbom.total_packages(), 1);
        assert_eq!(parser.resolve_calls.load(Ordering::SeqCst), 0);

        let (direct_only, parser, _) = use_case(manifests);
        let options = ScanOptions {
            include_transitive: false,
            ..ScanOptions::default()
        };
        let sbom = direct_only.execute(temp.path(), &options).await.unwrap();
        assert_eq!(sbom.total_packages(), 1);
        assert_eq!(parser.resolve_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unsupported_adjacent_lockfile_falls_back_to_resolution() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("maven.lock"), "").unwrap();
        let (use_case, parser, _) = use_case(vec![manifest(
            temp.path().join("pom.xml"),
            PackageManager::Maven,
            ManifestRole::Manifest,
        )]);

        let sbom = use_case
            .execute(temp.path(), &ScanOptions::default())
            .await
            .unwrap();
        assert_eq!(parser.resolve_calls.load(Ordering::SeqCst), 1);
        assert_eq!(sbom.total_packages(), 2);
    }

    #[tokio::test]
    async fn test_failed_file_does_not_abort_others() {
        let temp = TempDir::new().unwrap();
        let (use_case, _, reporter) = use_case(vec![
            manifest(
                temp.path().join("maven.lock"),
                PackageManager::Maven,
                ManifestRole::Lockfile,
            ),
            manifest(
                temp.path().join("Cargo.toml"),
                PackageManager::Cargo,
                ManifestRole::Manifest,
            ),
            manifest(
                temp.path().join("package-lock.json"),
                PackageManager::Npm,
                ManifestRole::Lockfile,
            ),
        ]);

        let sbom = use_case
            .execute(temp.path(), &ScanOptions::default())
            .await
            .unwrap();
        assert_eq!(sbom.total_packages(), 2);
        assert_eq!(reporter.errors.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_malformed_manifest_contributes_nothing() {
        let temp = TempDir::new().unwrap();
        let (use_case, _, _) = use_case(vec![manifest(
            temp.path().join("broken/package.json"),
            PackageManager::Npm,
            ManifestRole::Manifest,
        )]);
        let options = ScanOptions {
            offline: true,
            ..ScanOptions::default()
        };

        let sbom = use_case.execute(temp.path(), &options).await.unwrap();
        assert_eq!(sbom.total_packages(), 0);
    }

    #[tokio::test]
    async fn test_config_files_are_not_parsed() {
        let temp = TempDir::new().unwrap();
        let (use_case, _, reporter) = use_case(vec![manifest(
            temp.path().join(".npmrc"),
            PackageManager::Npm,
            ManifestRole::Config,
        )]);

        let sbom = use_case
            .execute(temp.path(), &ScanOptions::default())
            .await
            .unwrap();
        assert_eq!(sbom.total_packages(), 0);
        assert_eq!(reporter.errors.lock().unwrap().len(), 1);
    }
}
