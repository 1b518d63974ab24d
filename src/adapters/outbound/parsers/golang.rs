use super::file_name;
use crate::adapters::outbound::filesystem::read_manifest;
use crate::ports::outbound::ManifestParser;
use crate::sbom_generation::domain::{Dependency, Package, PackageManager};
use crate::shared::{ParseError, ParseResult};
use async_trait::async_trait;
use std::collections::HashSet;
use std::path::Path;

/// Parser for Go modules.
///
/// `go.sum` lists every module the build may touch without saying which
/// ones `go.mod` requires, so its entries are all reported as transitive.
pub struct GoParser;

fn strip_comment(line: &str) -> &str {
    line.split("//").next().unwrap_or(line).trim()
}

fn module(path: &str, version: &str) -> Package {
    Package::new(path, version, PackageManager::GoModules)
}

/// Collects `require` directives, both single-line and parenthesised
/// blocks. Versions are kept verbatim, `v` prefix included.
fn parse_go_mod(content: &str) -> Vec<Dependency> {
    let mut deps = Vec::new();
    let mut in_require_block = false;

    for raw in content.lines() {
        let line = strip_comment(raw);
        if line.is_empty() {
            continue;
        }

        if in_require_block {
            if line == ")" {
                in_require_block = false;
                continue;
            }
            if let [path, version, ..] = line.split_whitespace().collect::<Vec<_>>()[..] {
                deps.push(Dependency::direct(module(path, version)));
            }
            continue;
        }

        let Some(rest) = line.strip_prefix("require") else {
            continue;
        };
        let rest = rest.trim();
        if rest == "(" {
            in_require_block = true;
        } else if let [path, version] = rest.split_whitespace().collect::<Vec<_>>()[..] {
            deps.push(Dependency::direct(module(path, version)));
        }
    }
    deps
}

/// `module version[/go.mod] hash`; both hash lines of a module@version
/// collapse into one entry.
fn parse_go_sum(content: &str) -> Vec<Dependency> {
    let mut seen = HashSet::new();
    let mut deps = Vec::new();
    for line in content.lines() {
        let mut fields = line.split_whitespace();
        let (Some(path), Some(version), Some(_hash)) = (fields.next(), fields.next(), fields.next())
        else {
            continue;
        };
        let version = version.trim_end_matches("/go.mod");
        if seen.insert((path, version)) {
            deps.push(Dependency::unattributed(module(path, version)));
        }
    }
    deps
}

#[async_trait]
impl ManifestParser for GoParser {
    fn name(&self) -> &'static str {
        "go"
    }

    fn package_managers(&self) -> &'static [PackageManager] {
        &[PackageManager::GoModules]
    }

    async fn read_manifest(&self, path: &Path) -> ParseResult<Vec<Dependency>> {
        if file_name(path) != "go.mod" {
            return Err(ParseError::unsupported(self.name(), path));
        }
        let content = read_manifest(path).await?;
        Ok(parse_go_mod(&content))
    }

    async fn read_lockfile(&self, path: &Path) -> ParseResult<Vec<Dependency>> {
        if file_name(path) != "go.sum" {
            return Err(ParseError::unsupported(self.name(), path));
        }
        let content = read_manifest(path).await?;
        Ok(parse_go_sum(&content))
    }
}
