use crate::sbom_generation::domain::{ManifestRole, PackageManager};

/// Classification attached to a recognised file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManifestRule {
    pub package_manager: PackageManager,
    pub role: ManifestRole,
    pub priority: u8,
}

const fn rule(package_manager: PackageManager, role: ManifestRole, priority: u8) -> ManifestRule {
    ManifestRule {
        package_manager,
        role,
        priority,
    }
}

use ManifestRole::{Config, Lockfile, Manifest};
use PackageManager::*;

/// Exact file names, checked before any pattern.
const EXACT_RULES: &[(&str, ManifestRule)] = &[
    // JavaScript / TypeScript
    ("package.json", rule(Npm, Manifest, 10)),
    ("package-lock.json", rule(Npm, Lockfile, 9)),
    ("yarn.lock", rule(Yarn, Lockfile, 9)),
    ("pnpm-lock.yaml", rule(Pnpm, Lockfile, 9)),
    (".yarnrc.yml", rule(Yarn, Config, 5)),
    (".npmrc", rule(Npm, Config, 5)),
    // Python
    ("requirements.txt", rule(Pip, Manifest, 8)),
    ("requirements-dev.txt", rule(Pip, Manifest, 7)),
    ("requirements.in", rule(Pip, Manifest, 7)),
    ("pyproject.toml", rule(Poetry, Manifest, 10)),
    ("poetry.lock", rule(Poetry, Lockfile, 9)),
    ("Pipfile", rule(Pipenv, Manifest, 8)),
    ("Pipfile.lock", rule(Pipenv, Lockfile, 9)),
    ("environment.yml", rule(Conda, Manifest, 8)),
    ("environment.yaml", rule(Conda, Manifest, 8)),
    ("conda-lock.yml", rule(Conda, Lockfile, 9)),
    ("setup.py", rule(Pip, Manifest, 6)),
    ("setup.cfg", rule(Pip, Config, 5)),
    // Java
    ("pom.xml", rule(Maven, Manifest, 10)),
    ("build.gradle", rule(Gradle, Manifest, 10)),
    ("build.gradle.kts", rule(Gradle, Manifest, 10)),
    ("gradle.lockfile", rule(Gradle, Lockfile, 9)),
    ("settings.gradle", rule(Gradle, Config, 5)),
    // Go
    ("go.mod", rule(GoModules, Manifest, 10)),
    ("go.sum", rule(GoModules, Lockfile, 9)),
    // Rust
    ("Cargo.toml", rule(Cargo, Manifest, 10)),
    ("Cargo.lock", rule(Cargo, Lockfile, 9)),
    // Ruby
    ("Gemfile", rule(Bundler, Manifest, 10)),
    ("Gemfile.lock", rule(Bundler, Lockfile, 9)),
    ("gems.rb", rule(Bundler, Manifest, 8)),
    ("gems.locked", rule(Bundler, Lockfile, 8)),
    // C / C++
    ("vcpkg.json", rule(Vcpkg, Manifest, 10)),
    ("conanfile.txt", rule(Conan, Manifest, 9)),
    ("conanfile.py", rule(Conan, Manifest, 10)),
    ("conan.lock", rule(Conan, Lockfile, 9)),
    // C#
    ("packages.config", rule(Nuget, Manifest, 8)),
    ("packages.lock.json", rule(Nuget, Lockfile, 9)),
    ("Directory.Build.props", rule(Nuget, Manifest, 8)),
];

/// Wildcard rules, tried in order when no exact name matches.
const PATTERN_RULES: &[(&str, ManifestRule)] = &[
    ("requirements*.txt", rule(Pip, Manifest, 7)),
    ("*.csproj", rule(Nuget, Manifest, 9)),
    ("*.fsproj", rule(Nuget, Manifest, 9)),
    ("*.vbproj", rule(Nuget, Manifest, 9)),
];

/// Looks up a file name in the rule table; the first match wins.
pub fn classify(file_name: &str) -> Option<ManifestRule> {
    EXACT_RULES
        .iter()
        .find(|(name, _)| *name == file_name)
        .or_else(|| {
            PATTERN_RULES
                .iter()
                .find(|(pattern, _)| matches_pattern(pattern, file_name))
        })
        .map(|(_, rule)| *rule)
}

/// Matches `*` wildcards by checking that the literal parts appear in order,
/// anchored at both ends of the name.
fn matches_pattern(pattern: &str, file_name: &str) -> bool {
    let parts: Vec<&str> = pattern.split('*').collect();
    if parts.len() == 1 {
        return pattern == file_name;
    }

    let (first, rest) = match parts.split_first() {
        Some(split) => split,
        None => return false,
    };
    let last = rest.last().copied().unwrap_or_default();

    if !file_name.starts_with(first) || file_name.len() < first.len() + last.len() {
        return false;
    }
    if !file_name.ends_with(last) {
        return false;
    }

    let mut cursor = first.len();
    let end = file_name.len() - last.len();
    for middle in &rest[..rest.len() - 1] {
        match file_name[cursor..end].find(middle) {
            Some(pos) => cursor += pos + middle.len(),
            None => return false,
        }
    }
    true
}

/// Directory names never descended into.
pub const SKIP_DIRECTORIES: &[&str] = &[
    ".git",
    ".svn",
    ".hg",
    "node_modules",
    "__pycache__",
    ".pytest_cache",
    "target",
    "build",
    "dist",
    "out",
    ".idea",
    ".vscode",
    ".vs",
    "venv",
    ".venv",
    "env",
    ".env",
];

pub fn is_skipped_directory(name: &str) -> bool {
    name.starts_with('.') || SKIP_DIRECTORIES.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_rules() {
        let r = classify("package.json").unwrap();
        assert_eq!(r.package_manager, PackageManager::Npm);
        assert_eq!(r.role, ManifestRole::Manifest);
        assert_eq!(r.priority, 10);

        let r = classify("go.sum").unwrap();
        assert_eq!(r.role, ManifestRole::Lockfile);
    }

    #[test]
    fn test_exact_rule_wins_over_pattern() {
        // requirements-dev.txt also matches requirements*.txt
        let r = classify("requirements-dev.txt").unwrap();
        assert_eq!(r.priority, 7);
        let r = classify("requirements.txt").unwrap();
        assert_eq!(r.priority, 8);
    }

    #[test]
    fn test_pattern_rules() {
        let r = classify("requirements-test.txt").unwrap();
        assert_eq!(r.package_manager, PackageManager::Pip);
        let r = classify("Api.Server.csproj").unwrap();
        assert_eq!(r.package_manager, PackageManager::Nuget);
        assert_eq!(r.priority, 9);
        assert!(classify("notes.txt").is_none());
        assert!(classify("csproj").is_none());
    }

    #[test]
    fn test_config_role() {
        assert_eq!(classify(".npmrc").unwrap().role, ManifestRole::Config);
        assert_eq!(classify("setup.cfg").unwrap().role, ManifestRole::Config);
    }

    #[test]
    fn test_unknown_names() {
        assert!(classify("README.md").is_none());
        assert!(classify("Package.json").is_none());
    }

    #[test]
    fn test_matches_pattern() {
        assert!(matches_pattern("*.csproj", "a.csproj"));
        assert!(!matches_pattern("*.csproj", "a.csproj.bak"));
        assert!(matches_pattern("requirements*.txt", "requirements.txt"));
        assert!(matches_pattern("a*b*c", "axxbyyc"));
        assert!(!matches_pattern("a*b*c", "acb"));
    }

    #[test]
    fn test_skipped_directories() {
        assert!(is_skipped_directory("node_modules"));
        assert!(is_skipped_directory(".github"));
        assert!(is_skipped_directory("venv"));
        assert!(!is_skipped_directory("src"));
    }
}
