use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Programming language a manifest belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Javascript,
    Typescript,
    Python,
    Java,
    Go,
    Rust,
    Ruby,
    Cpp,
    Csharp,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Javascript => "javascript",
            Language::Typescript => "typescript",
            Language::Python => "python",
            Language::Java => "java",
            Language::Go => "go",
            Language::Rust => "rust",
            Language::Ruby => "ruby",
            Language::Cpp => "cpp",
            Language::Csharp => "csharp",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Package manager that owns a manifest or lockfile.
///
/// The string form doubles as the PURL type of every package the manager
/// produces (`pkg:<manager>/...`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackageManager {
    Npm,
    Yarn,
    Pnpm,
    Pip,
    Poetry,
    Pipenv,
    Conda,
    Maven,
    Gradle,
    GoModules,
    Cargo,
    Bundler,
    Vcpkg,
    Conan,
    Nuget,
}

impl PackageManager {
    pub const ALL: [PackageManager; 15] = [
        PackageManager::Npm,
        PackageManager::Yarn,
        PackageManager::Pnpm,
        PackageManager::Pip,
        PackageManager::Poetry,
        PackageManager::Pipenv,
        PackageManager::Conda,
        PackageManager::Maven,
        PackageManager::Gradle,
        PackageManager::GoModules,
        PackageManager::Cargo,
        PackageManager::Bundler,
        PackageManager::Vcpkg,
        PackageManager::Conan,
        PackageManager::Nuget,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PackageManager::Npm => "npm",
            PackageManager::Yarn => "yarn",
            PackageManager::Pnpm => "pnpm",
            PackageManager::Pip => "pip",
            PackageManager::Poetry => "poetry",
            PackageManager::Pipenv => "pipenv",
            PackageManager::Conda => "conda",
            PackageManager::Maven => "maven",
            PackageManager::Gradle => "gradle",
            PackageManager::GoModules => "go_modules",
            PackageManager::Cargo => "cargo",
            PackageManager::Bundler => "bundler",
            PackageManager::Vcpkg => "vcpkg",
            PackageManager::Conan => "conan",
            PackageManager::Nuget => "nuget",
        }
    }

    pub fn language(&self) -> Language {
        match self {
            PackageManager::Npm | PackageManager::Yarn | PackageManager::Pnpm => {
                Language::Javascript
            }
            PackageManager::Pip
            | PackageManager::Poetry
            | PackageManager::Pipenv
            | PackageManager::Conda => Language::Python,
            PackageManager::Maven | PackageManager::Gradle => Language::Java,
            PackageManager::GoModules => Language::Go,
            PackageManager::Cargo => Language::Rust,
            PackageManager::Bundler => Language::Ruby,
            PackageManager::Vcpkg | PackageManager::Conan => Language::Cpp,
            PackageManager::Nuget => Language::Csharp,
        }
    }

    /// Lockfile names looked up next to a manifest, in preference order.
    pub fn lockfile_names(&self) -> &'static [&'static str] {
        match self {
            PackageManager::Npm => &["package-lock.json"],
            PackageManager::Yarn => &["yarn.lock"],
            PackageManager::Pnpm => &["pnpm-lock.yaml"],
            PackageManager::Pip => &["requirements.lock", "pip.lock"],
            PackageManager::Poetry => &["poetry.lock"],
            PackageManager::Pipenv => &["Pipfile.lock"],
            PackageManager::Conda => &["conda-lock.yml", "conda-lock.yaml"],
            PackageManager::Maven => &["maven.lock"],
            PackageManager::Gradle => &["gradle.lockfile"],
            PackageManager::GoModules => &["go.sum"],
            PackageManager::Cargo => &["Cargo.lock"],
            PackageManager::Bundler => &["Gemfile.lock"],
            PackageManager::Vcpkg | PackageManager::Conan | PackageManager::Nuget => &[],
        }
    }

    pub fn is_javascript(&self) -> bool {
        self.language() == Language::Javascript
    }

    /// Managers whose packages are published on PyPI.
    pub fn is_pypi(&self) -> bool {
        matches!(
            self,
            PackageManager::Pip | PackageManager::Poetry | PackageManager::Pipenv
        )
    }

    /// Maven coordinates join group and artifact with ':' instead of '/'.
    pub fn uses_colon_coordinates(&self) -> bool {
        matches!(self, PackageManager::Maven | PackageManager::Gradle)
    }
}

impl fmt::Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PackageManager {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PackageManager::ALL
            .into_iter()
            .find(|pm| pm.as_str() == s)
            .ok_or_else(|| format!("unknown package manager: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manager_round_trips_through_str() {
        for pm in PackageManager::ALL {
            assert_eq!(pm.as_str().parse::<PackageManager>(), Ok(pm));
        }
        assert!("apk".parse::<PackageManager>().is_err());
    }

    #[test]
    fn test_manager_serializes_snake_case() {
        let json = serde_json::to_string(&PackageManager::GoModules).unwrap();
        assert_eq!(json, "\"go_modules\"");
        let json = serde_json::to_string(&Language::Csharp).unwrap();
        assert_eq!(json, "\"csharp\"");
    }

    #[test]
    fn test_lockfile_table() {
        assert_eq!(PackageManager::Npm.lockfile_names(), &["package-lock.json"]);
        assert_eq!(
            PackageManager::Pip.lockfile_names(),
            &["requirements.lock", "pip.lock"]
        );
        assert!(PackageManager::Conan.lockfile_names().is_empty());
    }

    #[test]
    fn test_language_mapping() {
        assert_eq!(PackageManager::Pnpm.language(), Language::Javascript);
        assert_eq!(PackageManager::Conda.language(), Language::Python);
        assert_eq!(PackageManager::Nuget.language(), Language::Csharp);
        assert!(PackageManager::Pipenv.is_pypi());
        assert!(!PackageManager::Conda.is_pypi());
    }
}
