use crate::ports::outbound::ContainerInventory;
use crate::sbom_generation::domain::{Dependency, Package};
use crate::shared::Result;
use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;

const SYFT_BINARY: &str = "syft";

/// SyftInventory lists the packages of a container image by running
/// `syft <image> -o json`.
///
/// Every artifact becomes a direct, depth-0 runtime dependency; syft
/// reports no graph between them.
pub struct SyftInventory {
    binary: String,
}

#[derive(Debug, Deserialize)]
struct SyftDocument {
    #[serde(default)]
    artifacts: Vec<Artifact>,
}

#[derive(Debug, Deserialize)]
struct Artifact {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    language: Option<String>,
    #[serde(default, rename = "type")]
    artifact_type: Option<String>,
}

impl SyftInventory {
    pub fn new() -> Self {
        Self {
            binary: SYFT_BINARY.to_string(),
        }
    }

    #[cfg(test)]
    fn with_binary(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for SyftInventory {
    fn default() -> Self {
        Self::new()
    }
}

fn label(value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_lowercase(),
        _ => "unknown".to_string(),
    }
}

/// Maps syft's JSON document to dependencies, keeping only artifacts that
/// carry both a name and a version.
fn parse_syft_output(json: &str) -> Result<Vec<Dependency>> {
    let trimmed = json.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    let document: SyftDocument =
        serde_json::from_str(trimmed).context("syft produced invalid JSON")?;

    Ok(document
        .artifacts
        .into_iter()
        .filter_map(|artifact| {
            let name = artifact.name.as_deref().map(str::trim).unwrap_or_default();
            let version = artifact.version.as_deref().map(str::trim).unwrap_or_default();
            if name.is_empty() || version.is_empty() {
                return None;
            }
            let package = Package::from_raw(
                name,
                version,
                label(artifact.language.as_deref()),
                label(artifact.artifact_type.as_deref()),
            );
            Some(Dependency::direct(package))
        })
        .collect())
}

#[async_trait]
impl ContainerInventory for SyftInventory {
    async fn inventory(&self, image: &str) -> Result<Vec<Dependency>> {
        let output = Command::new(&self.binary)
            .args([image, "-o", "json"])
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    anyhow::anyhow!(
                        "syft not found on PATH. Install from https://github.com/anchore/syft"
                    )
                } else {
                    anyhow::anyhow!("failed to run syft: {}", e)
                }
            })?;

        if !output.status.success() {
            anyhow::bail!(
                "syft failed for {}: {}",
                image,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        let dependencies = parse_syft_output(&String::from_utf8_lossy(&output.stdout))?;
        tracing::info!(image, packages = dependencies.len(), "container inventory complete");
        Ok(dependencies)
    }
}
