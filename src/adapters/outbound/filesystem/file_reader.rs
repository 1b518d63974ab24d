use crate::shared::security::validate_manifest_file;
use crate::shared::{ParseError, ParseResult};
use std::path::Path;

/// Reads a manifest or lockfile as UTF-8 text.
///
/// The file must be a regular, non-symlinked file below the size limit;
/// violations are reported as malformed input so the scan carries on.
pub async fn read_manifest(path: &Path) -> ParseResult<String> {
    validate_manifest_file(path).map_err(|e| ParseError::malformed(path, e))?;
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ParseError::Io {
            path: path.to_path_buf(),
            source,
        })
}

/// Reads a sibling file when it exists, e.g. the manifest next to a lockfile.
pub async fn read_sibling(path: &Path, sibling: &str) -> Option<String> {
    let sibling_path = path.parent()?.join(sibling);
    if !sibling_path.is_file() {
        return None;
    }
    read_manifest(&sibling_path).await.ok()
}
