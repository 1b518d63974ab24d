use crate::shared::Result;
use std::fs;
use std::path::Path;

/// Largest manifest or lockfile that will be read (50 MB).
pub const MAX_MANIFEST_SIZE: u64 = 50 * 1024 * 1024;

/// Fails when `path` is a symbolic link; `symlink_metadata` inspects the
/// link itself rather than its target.
pub fn validate_not_symlink(path: &Path, operation: &str) -> Result<()> {
    let metadata = fs::symlink_metadata(path).map_err(|e| {
        anyhow::anyhow!(
            "Failed to read metadata for {} operation on {}: {}",
            operation,
            path.display(),
            e
        )
    })?;

    if metadata.is_symlink() {
        anyhow::bail!(
            "Security: {} is a symbolic link; {} operations on symbolic links are refused.",
            path.display(),
            operation
        );
    }

    Ok(())
}

/// Checks that a manifest is a regular, non-symlinked file of bounded size.
pub fn validate_manifest_file(path: &Path) -> Result<()> {
    let metadata = fs::symlink_metadata(path)
        .map_err(|e| anyhow::anyhow!("Failed to read metadata of {}: {}", path.display(), e))?;

    if metadata.is_symlink() {
        anyhow::bail!("Security: {} is a symbolic link", path.display());
    }
    if !metadata.is_file() {
        anyhow::bail!("{} is not a regular file", path.display());
    }
    if metadata.len() > MAX_MANIFEST_SIZE {
        anyhow::bail!(
            "Security: {} is too large ({} bytes, limit {} bytes)",
            path.display(),
            metadata.len(),
            MAX_MANIFEST_SIZE
        );
    }

    Ok(())
}

/// Rejects registry path components that could change the request target.
///
/// npm scopes keep their leading `@`; callers split `@scope/name` before
/// validating, since `/` is never accepted here.
pub fn validate_url_component(component: &str, component_type: &str) -> Result<()> {
    if component.is_empty() {
        anyhow::bail!("{} is empty", component_type);
    }
    if component.contains('/') || component.contains('\\') {
        anyhow::bail!(
            "Security: {} '{}' contains path separators",
            component_type,
            component
        );
    }
    if component.contains("..") {
        anyhow::bail!("Security: {} '{}' contains '..'", component_type, component);
    }
    if component
        .chars()
        .any(|c| c == '#' || c == '?' || c == '%' || c.is_whitespace() || c.is_control())
    {
        anyhow::bail!(
            "Security: {} '{}' contains URL-unsafe characters",
            component_type,
            component
        );
    }
    Ok(())
}

/// Accepts only absolute http(s) endpoints.
pub fn validate_endpoint(endpoint: &str) -> Result<()> {
    let rest = endpoint
        .strip_prefix("https://")
        .or_else(|| endpoint.strip_prefix("http://"));
    match rest {
        Some(host) if !host.is_empty() && !host.starts_with('/') => Ok(()),
        _ => anyhow::bail!("endpoint '{}' must be an http(s) URL", endpoint),
    }
}
