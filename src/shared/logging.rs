use crate::shared::Result;
use clap::ValueEnum;
use serde::Deserialize;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Default filter when neither RUST_LOG nor the config sets one.
pub const DEFAULT_LOG_LEVEL: &str = "warn";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Pretty,
    Json,
}

/// Installs the global tracing subscriber. Logs go to stderr so that
/// reports written to stdout stay machine-readable.
///
/// RUST_LOG takes precedence over `level`.
pub fn init_tracing(level: &str, format: LogFormat) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let registry = tracing_subscriber::registry().with(env_filter);
    let fmt = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let result = match format {
        LogFormat::Json => registry.with(fmt.json()).try_init(),
        LogFormat::Pretty => registry.with(fmt.pretty()).try_init(),
        LogFormat::Compact => registry.with(fmt.compact()).try_init(),
    };

    result.map_err(|e| anyhow::anyhow!("failed to initialize tracing subscriber: {}", e))
}
