use super::file_name;
use crate::adapters::outbound::filesystem::read_manifest;
use crate::ports::outbound::ManifestParser;
use crate::sbom_generation::domain::{Dependency, Package, PackageManager, LATEST_VERSION};
use crate::sbom_generation::services::normalize_constraint;
use crate::shared::{ParseError, ParseResult};
use async_trait::async_trait;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

static GEM_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^gem\s*\(?\s*["']([^"']+)["']((?:\s*,\s*["'][^"']*["'])*)(.*)$"#)
        .expect("static regex")
});

static QUOTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"["']([^"']*)["']"#).expect("static regex"));

static GROUP_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^group\s*\(?\s*(.+?)\)?\s+do\b").expect("static regex"));

static INLINE_GROUP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:groups?:|:groups?\s*=>)\s*(\[[^\]]*\]|:\w+|["']\w+["'])"#).expect("static regex")
});

static SYMBOL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#":?["']?(\w+)["']?"#).expect("static regex"));

/// Bundler groups whose gems are not needed at runtime
const DEV_GROUPS: &[&str] = &["development", "test"];

/// Parser for Bundler projects (`Gemfile`, `gems.rb` and their lockfiles).
pub struct RubyParser;

fn group_names(list: &str) -> Vec<String> {
    SYMBOL
        .captures_iter(list)
        .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
        .collect()
}

fn is_dev_group(groups: &[String]) -> bool {
    groups.iter().any(|g| DEV_GROUPS.contains(&g.as_str()))
}

/// Reads `gem` declarations, tracking the enclosing `group ... do` blocks.
///
/// Any other `do` block (`platforms`, `source`, `git`) is tracked too so
/// its `end` does not close a group.
fn parse_gemfile(content: &str) -> Vec<Dependency> {
    let mut deps = Vec::new();
    let mut blocks: Vec<Vec<String>> = Vec::new();

    for raw in content.lines() {
        let line = raw.split(" #").next().unwrap_or(raw).trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if line == "end" {
            blocks.pop();
            continue;
        }
        if let Some(caps) = GROUP_BLOCK.captures(line) {
            let groups = caps.get(1).map(|m| group_names(m.as_str())).unwrap_or_default();
            blocks.push(groups);
            continue;
        }

        if let Some(caps) = GEM_LINE.captures(line) {
            let Some(name) = caps.get(1).map(|m| m.as_str()) else {
                continue;
            };
            let version = caps
                .get(2)
                .and_then(|m| QUOTED.captures(m.as_str()))
                .and_then(|c| c.get(1))
                .map(|m| normalize_constraint(m.as_str()))
                .unwrap_or_else(|| LATEST_VERSION.to_string());

            let inline: Vec<String> = caps
                .get(3)
                .and_then(|m| INLINE_GROUP.captures(m.as_str()))
                .and_then(|c| c.get(1))
                .map(|m| group_names(m.as_str()))
                .unwrap_or_default();

            let dev = is_dev_group(&inline) || blocks.iter().any(|groups| is_dev_group(groups));
            let package = Package::new(name, version, PackageManager::Bundler);
            deps.push(if dev {
                Dependency::dev(package)
            } else {
                Dependency::direct(package)
            });
            continue;
        }

        if line.ends_with(" do") || line.contains(" do |") {
            blocks.push(Vec::new());
        }
    }
    deps
}

/// Reads the `specs:` of the GEM and GIT sections. Platform suffixes such
/// as `-x86_64-linux` are dropped from versions.
fn parse_gemfile_lock(content: &str) -> Vec<Dependency> {
    let mut deps = Vec::new();
    let mut section = "";
    let mut in_specs = false;

    for line in content.lines() {
        if !line.starts_with(' ') {
            section = line.trim();
            in_specs = false;
            continue;
        }
        if line.trim() == "specs:" {
            in_specs = true;
            continue;
        }
        if !in_specs || !matches!(section, "GEM" | "GIT") {
            continue;
        }
        // exactly four spaces: a locked gem; six: one of its requirements
        let Some(spec) = line.strip_prefix("    ").filter(|s| !s.starts_with(' ')) else {
            continue;
        };
        let Some((name, rest)) = spec.split_once(" (") else {
            continue;
        };
        let version = rest.trim_end_matches(')');
        let version = version.split('-').next().unwrap_or(version);
        deps.push(Dependency::unattributed(Package::new(
            name,
            version,
            PackageManager::Bundler,
        )));
    }
    deps
}

#[async_trait]
impl ManifestParser for RubyParser {
    fn name(&self) -> &'static str {
        "ruby"
    }

    fn package_managers(&self) -> &'static [PackageManager] {
        &[PackageManager::Bundler]
    }

    async fn read_manifest(&self, path: &Path) -> ParseResult<Vec<Dependency>> {
        match file_name(path) {
            "Gemfile" | "gems.rb" => Ok(parse_gemfile(&read_manifest(path).await?)),
            _ => Err(ParseError::unsupported(self.name(), path)),
        }
    }

    async fn read_lockfile(&self, path: &Path) -> ParseResult<Vec<Dependency>> {
        match file_name(path) {
            "Gemfile.lock" | "gems.locked" => Ok(parse_gemfile_lock(&read_manifest(path).await?)),
            _ => Err(ParseError::unsupported(self.name(), path)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sbom_generation::domain::DependencyType;
    use std::fs;
    use tempfile::TempDir;

    const GEMFILE: &str = r#"source "https://rubygems.org"

ruby "3.2.2"

gem "rails", "~> 7.1.0"
gem 'pg', '>= 1.1', '< 2.0'
gem "bootsnap", require: false
gem "rubocop", group: :development

platforms :jruby do
  gem "jruby-openssl"
end

group :development, :test do
  gem "rspec-rails", "6.0.3" # specs
  gem "debug"
end

gem "puma", "~> 6.4"
"#;

    #[tokio::test]
    async fn test_gemfile_groups() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Gemfile");
        fs::write(&path, GEMFILE).unwrap();

        let deps = RubyParser.parse_manifest(&path).await;
        let summary: Vec<(&str, &str, DependencyType)> = deps
            .iter()
            .map(|d| (d.package.name(), d.package.version(), d.dependency_type))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("rails", "7.1.0", DependencyType::Direct),
                ("pg", "1.1", DependencyType::Direct),
                ("bootsnap", "latest", DependencyType::Direct),
                ("rubocop", "latest", DependencyType::Dev),
                ("jruby-openssl", "latest", DependencyType::Direct),
                ("rspec-rails", "6.0.3", DependencyType::Dev),
                ("debug", "latest", DependencyType::Dev),
                ("puma", "6.4", DependencyType::Direct),
            ]
        );
    }

    #[tokio::test]
    async fn test_gemfile_lock_specs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Gemfile.lock");
        fs::write(
            &path,
            r#"GIT
  remote: https://github.com/org/internal.git
  revision: abc123
  specs:
    internal (0.3.0)

PATH
  remote: engines/admin
  specs:
    admin (0.1.0)

GEM
  remote: https://rubygems.org/
  specs:
    actionpack (7.1.1)
      rack (>= 2.2.4)
    nokogiri (1.15.4-x86_64-linux)
    rack (3.0.8)

PLATFORMS
  x86_64-linux

DEPENDENCIES
  actionpack
  nokogiri

BUNDLED WITH
   2.4.10
"#,
        )
        .unwrap();

        let deps = RubyParser.parse_lockfile(&path).await.unwrap();
        let purls: Vec<&str> = deps.iter().map(|d| d.purl()).collect();
        assert_eq!(
            purls,
            vec![
                "pkg:bundler/internal@0.3.0",
                "pkg:bundler/actionpack@7.1.1",
                "pkg:bundler/nokogiri@1.15.4",
                "pkg:bundler/rack@3.0.8",
            ]
        );
        assert!(deps.iter().all(|d| d.dependency_type == DependencyType::Transitive));
    }
}
