mod cli;
mod config;

use cli::Args;
use config::{discover_config, load_config_from_path, ConfigFile, CONFIG_FILENAME};
use dependency_canary::adapters::outbound::console::StderrProgressReporter;
use dependency_canary::adapters::outbound::container::SyftInventory;
use dependency_canary::adapters::outbound::filesystem::{
    FileSystemManifestDetector, FileSystemWriter, StdoutPresenter,
};
use dependency_canary::adapters::outbound::network::{
    CachingRegistryClient, CachingVulnerabilityFeed, HttpClient, HttpRemoteExecutor, NpmRegistry,
    OsvClient, PyPiRegistry, DEFAULT_REMOTE_TIMEOUT, DEFAULT_TIMEOUT,
};
use dependency_canary::adapters::outbound::parsers::{
    ParserRegistry, ResolverSettings, DEFAULT_NPM_MAX_DEPTH, DEFAULT_PYPI_MAX_DEPTH,
};
use dependency_canary::application::dto::{ScanOptions, ScanRequest};
use dependency_canary::application::factories::FormatterFactory;
use dependency_canary::application::use_cases::{
    AssessSupplyChainUseCase, EnrichVulnerabilitiesUseCase, GenerateSbomUseCase,
    ScanProjectUseCase, DEFAULT_MAX_WORKERS,
};
use dependency_canary::ports::outbound::{
    IntelligenceSource, ManifestDetector, OutputPresenter, VulnerabilityFeed,
};
use dependency_canary::sbom_generation::domain::ScanResult;
use dependency_canary::shared::logging::{init_tracing, DEFAULT_LOG_LEVEL};
use dependency_canary::shared::{ExitCode, Result, ScanError};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() {
    match run().await {
        Ok(code) => process::exit(code.as_i32()),
        Err(e) => {
            eprintln!("\n❌ An error occurred:\n");
            eprintln!("{}", e);

            // Display error chain
            let mut source = e.source();
            while let Some(err) = source {
                eprintln!("\nCaused by: {}", err);
                source = err.source();
            }

            eprintln!();
            process::exit(ExitCode::ApplicationError.as_i32());
        }
    }
}

async fn run() -> Result<ExitCode> {
    let args = Args::parse_args();

    let mut paths = args.path.clone();
    if paths.is_empty() && args.image.is_empty() {
        paths.push(PathBuf::from("."));
    }
    for path in &paths {
        validate_project_path(path)?;
    }

    let config = match (&args.config, paths.first()) {
        (Some(explicit), _) => load_config_from_path(explicit)?,
        (None, Some(first)) => discover_config(first)?.unwrap_or_default(),
        (None, None) => ConfigFile::default(),
    };

    let log_level = if args.verbose {
        "debug".to_string()
    } else {
        config
            .log_level
            .clone()
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string())
    };
    init_tracing(
        &log_level,
        args.log_format.or(config.log_format).unwrap_or_default(),
    )?;

    let presenter: Box<dyn OutputPresenter> = match &args.output {
        Some(output_path) => Box::new(FileSystemWriter::new(output_path.clone())),
        None => Box::new(StdoutPresenter::new()),
    };

    let options = scan_options(&args, &config);

    if args.detect {
        let table = detect_table(&paths, options.max_depth)?;
        presenter.present(&table)?;
        return Ok(ExitCode::Success);
    }

    let requests: Vec<ScanRequest> = paths
        .iter()
        .map(|p| ScanRequest::directory(p.clone(), options))
        .chain(
            args.image
                .iter()
                .map(|image| ScanRequest::image(image.clone(), options)),
        )
        .collect();
    if requests.is_empty() {
        return Err(ScanError::NoTargets.into());
    }

    let scanner = build_scanner(&args, &config, &options)?;
    let results = scanner.execute_all(&requests).await;

    let format = args
        .format
        .or_else(|| config.output_format())
        .unwrap_or_default();
    eprintln!("{}", FormatterFactory::progress_message(format));
    let rendered = FormatterFactory::create(format).format(&results)?;
    presenter.present(&rendered)?;

    Ok(exit_code(&results, &args))
}

/// Merges flags over config values over built-in defaults.
fn scan_options(args: &Args, config: &ConfigFile) -> ScanOptions {
    let defaults = ScanOptions::default();
    ScanOptions {
        include_transitive: !args.no_transitive
            && config.include_transitive.unwrap_or(defaults.include_transitive),
        supply_chain: args.supply_chain || config.supply_chain.unwrap_or(defaults.supply_chain),
        offline: args.offline || config.offline.unwrap_or(defaults.offline),
        max_depth: config.max_depth.unwrap_or(defaults.max_depth),
        enrichment_threshold: config
            .enrichment_threshold
            .unwrap_or(defaults.enrichment_threshold),
        intelligence_batch_size: config
            .intelligence_batch_size
            .unwrap_or(defaults.intelligence_batch_size),
    }
}

type Scanner = ScanProjectUseCase<
    FileSystemManifestDetector,
    ParserRegistry,
    Arc<StderrProgressReporter>,
>;

/// Wires adapters into the scan pipeline (Dependency Injection).
fn build_scanner(args: &Args, config: &ConfigFile, options: &ScanOptions) -> Result<Scanner> {
    let timeout = config
        .request_timeout_secs
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_TIMEOUT);

    let mut settings = ResolverSettings::offline();
    settings.npm_max_depth = config.npm_max_depth.unwrap_or(DEFAULT_NPM_MAX_DEPTH);
    settings.pypi_max_depth = config.pypi_max_depth.unwrap_or(DEFAULT_PYPI_MAX_DEPTH);
    settings.timeout = timeout;

    let mut feeds: Vec<Arc<dyn VulnerabilityFeed>> = Vec::new();
    let mut sources: Vec<Arc<dyn IntelligenceSource>> = Vec::new();
    if !options.offline {
        let http = HttpClient::new(timeout)?;
        settings.npm = Some(Arc::new(CachingRegistryClient::new(NpmRegistry::new(
            http.clone(),
        ))));
        settings.pypi = Some(Arc::new(CachingRegistryClient::new(PyPiRegistry::new(
            http.clone(),
        ))));
        feeds.push(Arc::new(CachingVulnerabilityFeed::new(OsvClient::new(
            http.clone(),
        ))));
        sources.push(Arc::new(NpmRegistry::new(http.clone())));
        sources.push(Arc::new(PyPiRegistry::new(http)));
    }

    let reporter = Arc::new(StderrProgressReporter::new());
    let max_workers = args
        .max_workers
        .or(config.max_workers)
        .unwrap_or(DEFAULT_MAX_WORKERS);

    let mut scanner = ScanProjectUseCase::new(
        GenerateSbomUseCase::new(
            FileSystemManifestDetector::new(),
            ParserRegistry::new(&settings),
            reporter.clone(),
        ),
        EnrichVulnerabilitiesUseCase::new(feeds, reporter.clone(), options.enrichment_threshold),
        AssessSupplyChainUseCase::new(sources, reporter.clone(), options.intelligence_batch_size),
        reporter,
    )
    .with_max_workers(max_workers)
    .with_container_inventory(Arc::new(SyftInventory::new()));

    if args.remote {
        let endpoint = args
            .remote_endpoint
            .clone()
            .or_else(|| config.remote_endpoint.clone())
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "--remote requires a worker endpoint\n\n💡 Hint: Pass --remote-endpoint or set remote_endpoint in {}",
                    CONFIG_FILENAME
                )
            })?;
        let remote_timeout = config
            .remote_timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_REMOTE_TIMEOUT);
        scanner = scanner.with_remote_executor(Arc::new(HttpRemoteExecutor::new(
            endpoint,
            remote_timeout,
        )?));
    }

    Ok(scanner)
}

/// Renders the classifier's view of every project as a plain table.
fn detect_table(paths: &[PathBuf], max_depth: usize) -> Result<String> {
    let detector = FileSystemManifestDetector::new();
    let mut output = String::new();
    for root in paths {
        let manifests = detector.detect(root, max_depth)?;
        output.push_str(&format!(
            "{} ({} file(s))\n",
            root.display(),
            manifests.len()
        ));
        for manifest in manifests {
            output.push_str(&format!(
                "  {:<9} {:<11} {:<8} {:>3}  {}\n",
                manifest.role.as_str(),
                manifest.package_manager.as_str(),
                manifest.language.as_str(),
                manifest.priority,
                manifest.path.display()
            ));
        }
    }
    Ok(output)
}

fn exit_code(results: &[ScanResult], args: &Args) -> ExitCode {
    let Some(threshold) = args.fail_on else {
        return ExitCode::Success;
    };
    let exceeded = results
        .iter()
        .filter_map(ScanResult::highest_risk)
        .any(|level| level >= threshold);
    if exceeded {
        eprintln!("⚠️  Risk threshold '{}' reached", threshold);
        ExitCode::RiskThresholdExceeded
    } else {
        ExitCode::Success
    }
}

fn validate_project_path(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(ScanError::InvalidProjectPath {
            path: path.to_path_buf(),
            reason: "Directory does not exist".to_string(),
        }
        .into());
    }

    // Security check: Reject symbolic links for project paths
    let metadata = std::fs::symlink_metadata(path).map_err(|e| ScanError::InvalidProjectPath {
        path: path.to_path_buf(),
        reason: format!("Failed to read path metadata: {}", e),
    })?;

    if metadata.is_symlink() {
        return Err(ScanError::InvalidProjectPath {
            path: path.to_path_buf(),
            reason: "Security: Project path is a symbolic link. For security reasons, symbolic links are not allowed.".to_string(),
        }
        .into());
    }

    if !path.is_dir() {
        return Err(ScanError::InvalidProjectPath {
            path: path.to_path_buf(),
            reason: "Not a directory".to_string(),
        }
        .into());
    }

    let canonical_path = path
        .canonicalize()
        .map_err(|e| ScanError::InvalidProjectPath {
            path: path.to_path_buf(),
            reason: format!("Failed to canonicalize path: {}", e),
        })?;

    if !canonical_path.is_dir() {
        return Err(ScanError::InvalidProjectPath {
            path: path.to_path_buf(),
            reason: "Resolved path is not a directory".to_string(),
        }
        .into());
    }

    Ok(())
}
