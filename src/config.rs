//! Configuration file support for dependency-canary.
//!
//! Provides YAML-based configuration through `dependency-canary.config.yml`
//! files, including data structures, file loading, and validation.

use anyhow::Context;
use dependency_canary::application::dto::OutputFormat;
use dependency_canary::shared::logging::LogFormat;
use dependency_canary::shared::security::validate_endpoint;
use dependency_canary::shared::{Result, ScanError};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

pub const CONFIG_FILENAME: &str = "dependency-canary.config.yml";

/// Top-level configuration file schema.
///
/// Every key is optional; command-line flags override whatever is set here.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    pub format: Option<String>,
    pub include_transitive: Option<bool>,
    pub supply_chain: Option<bool>,
    pub offline: Option<bool>,
    pub max_depth: Option<usize>,
    pub npm_max_depth: Option<u32>,
    pub pypi_max_depth: Option<u32>,
    pub enrichment_threshold: Option<usize>,
    pub intelligence_batch_size: Option<usize>,
    pub max_workers: Option<usize>,
    pub request_timeout_secs: Option<u64>,
    pub remote_endpoint: Option<String>,
    pub remote_timeout_secs: Option<u64>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
    /// Captures unknown fields for warnings.
    #[serde(flatten)]
    pub unknown_fields: HashMap<String, serde_yaml_ng::Value>,
}

impl ConfigFile {
    /// Parsed `format` key; validated on load.
    pub fn output_format(&self) -> Option<OutputFormat> {
        self.format
            .as_deref()
            .and_then(|f| OutputFormat::from_str(f).ok())
    }
}

/// Load config from an explicit path. Returns an error if the file is not found.
pub fn load_config_from_path(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path).with_context(|| {
        format!(
            "Failed to read config file: {}\n\n💡 Hint: Check that the file exists and is readable.",
            path.display()
        )
    })?;

    let config: ConfigFile = serde_yaml_ng::from_str(&content).with_context(|| {
        format!(
            "Failed to parse config file: {}\n\n💡 Hint: Ensure the file contains valid YAML syntax.",
            path.display()
        )
    })?;

    validate_config(&config).map_err(|details| ScanError::InvalidConfig {
        path: path.to_path_buf(),
        details,
    })?;
    warn_unknown_fields(&config);

    Ok(config)
}

/// Auto-discover config in a directory. Returns `None` silently if not found.
pub fn discover_config(dir: &Path) -> Result<Option<ConfigFile>> {
    let config_path = dir.join(CONFIG_FILENAME);

    if !config_path.exists() {
        return Ok(None);
    }

    let config = load_config_from_path(&config_path)?;
    Ok(Some(config))
}

/// Validate the loaded configuration.
fn validate_config(config: &ConfigFile) -> std::result::Result<(), String> {
    if let Some(format) = &config.format {
        OutputFormat::from_str(format)?;
    }

    let limits = [
        ("max_depth", config.max_depth.map(|v| v as u64)),
        ("npm_max_depth", config.npm_max_depth.map(u64::from)),
        ("pypi_max_depth", config.pypi_max_depth.map(u64::from)),
        ("enrichment_threshold", config.enrichment_threshold.map(|v| v as u64)),
        ("intelligence_batch_size", config.intelligence_batch_size.map(|v| v as u64)),
        ("max_workers", config.max_workers.map(|v| v as u64)),
        ("request_timeout_secs", config.request_timeout_secs),
        ("remote_timeout_secs", config.remote_timeout_secs),
    ];
    for (key, value) in limits {
        if value == Some(0) {
            return Err(format!("'{}' must be a positive number", key));
        }
    }

    if let Some(endpoint) = &config.remote_endpoint {
        validate_endpoint(endpoint).map_err(|e| e.to_string())?;
    }
    if let Some(level) = &config.log_level {
        if level.trim().is_empty() {
            return Err("'log_level' must not be empty".to_string());
        }
    }
    Ok(())
}

/// Warn about unknown fields in the config file.
fn warn_unknown_fields(config: &ConfigFile) {
    let mut keys: Vec<&String> = config.unknown_fields.keys().collect();
    keys.sort();
    for key in keys {
        eprintln!(
            "⚠️  Warning: Unknown config field '{}' will be ignored.",
            key
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_valid_config() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("config.yml");
        fs::write(
            &config_path,
            r#"
format: summary
include_transitive: false
supply_chain: true
max_depth: 4
npm_max_depth: 2
enrichment_threshold: 200
max_workers: 4
remote_endpoint: https://workers.example.com/scan
remote_timeout_secs: 120
log_level: info
log_format: json
"#,
        )
        .unwrap();

        let config = load_config_from_path(&config_path).unwrap();
        assert_eq!(config.output_format(), Some(OutputFormat::Summary));
        assert_eq!(config.include_transitive, Some(false));
        assert_eq!(config.supply_chain, Some(true));
        assert_eq!(config.max_depth, Some(4));
        assert_eq!(config.npm_max_depth, Some(2));
        assert_eq!(config.pypi_max_depth, None);
        assert_eq!(config.enrichment_threshold, Some(200));
        assert_eq!(config.max_workers, Some(4));
        assert_eq!(
            config.remote_endpoint.as_deref(),
            Some("https://workers.example.com/scan")
        );
        assert_eq!(config.remote_timeout_secs, Some(120));
        assert_eq!(config.log_level.as_deref(), Some("info"));
        assert_eq!(config.log_format, Some(LogFormat::Json));
    }

    #[test]
    fn test_discover_config_found() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILENAME), "format: yaml\noffline: true\n").unwrap();

        let config = discover_config(dir.path()).unwrap().unwrap();
        assert_eq!(config.output_format(), Some(OutputFormat::Yaml));
        assert_eq!(config.offline, Some(true));
    }

    #[test]
    fn test_discover_config_not_found() {
        let dir = TempDir::new().unwrap();
        let config = discover_config(dir.path()).unwrap();
        assert!(config.is_none());
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config_from_path(Path::new("/nonexistent/config.yml"));
        let err = format!("{}", result.unwrap_err());
        assert!(err.contains("Failed to read config file"));
    }

    #[test]
    fn test_load_config_parse_error() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("bad.yml");
        fs::write(&config_path, "invalid: yaml: [[[broken").unwrap();

        let err = format!("{}", load_config_from_path(&config_path).unwrap_err());
        assert!(err.contains("Failed to parse config file"));
    }

    #[test]
    fn test_zero_limit_rejected() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("config.yml");
        fs::write(&config_path, "max_workers: 0\n").unwrap();

        let err = format!("{}", load_config_from_path(&config_path).unwrap_err());
        assert!(err.contains("'max_workers' must be a positive number"));
        assert!(err.contains("Hint"));
    }

    #[test]
    fn test_unknown_format_rejected() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("config.yml");
        fs::write(&config_path, "format: cyclonedx\n").unwrap();

        let err = format!("{}", load_config_from_path(&config_path).unwrap_err());
        assert!(err.contains("Invalid format: cyclonedx"));
    }

    #[test]
    fn test_non_http_endpoint_rejected() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("config.yml");
        fs::write(&config_path, "remote_endpoint: ftp://workers.internal\n").unwrap();

        let err = format!("{}", load_config_from_path(&config_path).unwrap_err());
        assert!(err.contains("must be an http(s) URL"));
    }

    #[test]
    fn test_unknown_log_format_is_a_parse_error() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("config.yml");
        fs::write(&config_path, "log_format: xml\n").unwrap();

        assert!(load_config_from_path(&config_path).is_err());
    }

    #[test]
    fn test_unknown_fields_warning() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("config.yml");
        fs::write(
            &config_path,
            r#"
format: json
check_cve: true
another_unknown: value
"#,
        )
        .unwrap();

        let config = load_config_from_path(&config_path).unwrap();
        assert_eq!(config.unknown_fields.len(), 2);
        assert!(config.unknown_fields.contains_key("check_cve"));
        assert!(config.unknown_fields.contains_key("another_unknown"));
    }

    #[test]
    fn test_default_config() {
        let config = ConfigFile::default();
        assert!(config.format.is_none());
        assert!(config.output_format().is_none());
        assert!(config.remote_endpoint.is_none());
        assert!(config.unknown_fields.is_empty());
    }
}
