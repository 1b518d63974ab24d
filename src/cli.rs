use clap::Parser;
use dependency_canary::application::dto::OutputFormat;
use dependency_canary::sbom_generation::domain::RiskLevel;
use dependency_canary::shared::logging::LogFormat;
use std::path::PathBuf;

/// Build a multi-ecosystem SBOM and score vulnerability and supply-chain risk
#[derive(Parser, Debug)]
#[command(name = "dependency-canary")]
#[command(version)]
#[command(
    about = "Build a multi-ecosystem SBOM and score vulnerability and supply-chain risk",
    long_about = None
)]
pub struct Args {
    /// Project directory to scan (repeatable; defaults to the current directory)
    #[arg(short, long, value_name = "DIR")]
    pub path: Vec<PathBuf>,

    /// Container image to inventory with syft instead of a directory (repeatable)
    #[arg(long, value_name = "REF")]
    pub image: Vec<String>,

    /// Output format: json, yaml or summary
    #[arg(short, long)]
    pub format: Option<OutputFormat>,

    /// Output file path (if not specified, outputs to stdout)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// List direct dependencies only; no lockfile merge or registry resolution
    #[arg(long)]
    pub no_transitive: bool,

    /// Gather registry intelligence and score supply-chain risk
    #[arg(long)]
    pub supply_chain: bool,

    /// Never touch the network (no resolution, advisories or intelligence)
    #[arg(long)]
    pub offline: bool,

    /// Offload scans to the configured remote worker, falling back to local
    #[arg(long)]
    pub remote: bool,

    /// Remote worker endpoint (overrides `remote_endpoint` from the config)
    #[arg(long, value_name = "URL")]
    pub remote_endpoint: Option<String>,

    /// Maximum number of projects scanned concurrently
    #[arg(long, value_name = "N")]
    pub max_workers: Option<usize>,

    /// Exit with code 1 when any package reaches this risk level
    /// (negligible, low, medium, high, critical)
    #[arg(long, value_name = "LEVEL")]
    pub fail_on: Option<RiskLevel>,

    /// Configuration file (defaults to dependency-canary.config.yml in the first project)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print the detected dependency files and exit without parsing them
    #[arg(long)]
    pub detect: bool,

    /// Log output format
    #[arg(long, value_enum)]
    pub log_format: Option<LogFormat>,

    /// Verbose logging (debug level)
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
