//! Ecosystem parsers and the package-manager lookup table that selects them.
mod cpp;
mod csharp;
mod golang;
mod java;
mod javascript;
mod python;
mod ruby;
mod rust;

pub use cpp::CppParser;
pub use csharp::CSharpParser;
pub use golang::GoParser;
pub use java::JavaParser;
pub use javascript::JavaScriptParser;
pub use python::PythonParser;
pub use ruby::RubyParser;
pub use rust::RustParser;

use crate::ports::outbound::{ManifestParser, ParserProvider, RegistryClient};
use crate::sbom_generation::domain::PackageManager;
use crate::shared::{ParseError, ParseResult};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Default recursion bound for npm registry resolution
pub const DEFAULT_NPM_MAX_DEPTH: u32 = 3;

/// Default recursion bound for PyPI resolution
pub const DEFAULT_PYPI_MAX_DEPTH: u32 = 2;

/// Registry clients and limits handed to the parsers that resolve online.
#[derive(Clone)]
pub struct ResolverSettings {
    pub npm: Option<Arc<dyn RegistryClient>>,
    pub pypi: Option<Arc<dyn RegistryClient>>,
    pub npm_max_depth: u32,
    pub pypi_max_depth: u32,
    pub timeout: Duration,
}

impl ResolverSettings {
    /// Settings without any registry access; manifests resolve to their
    /// declared dependencies only.
    pub fn offline() -> Self {
        Self {
            npm: None,
            pypi: None,
            npm_max_depth: DEFAULT_NPM_MAX_DEPTH,
            pypi_max_depth: DEFAULT_PYPI_MAX_DEPTH,
            timeout: Duration::from_secs(10),
        }
    }
}

/// Fixed table from package manager to the parser that reads its files.
///
/// Built once per scan invocation; every manager in
/// [`PackageManager::ALL`] has an entry.
pub struct ParserRegistry {
    parsers: HashMap<PackageManager, Arc<dyn ManifestParser>>,
}

impl ParserRegistry {
    pub fn new(settings: &ResolverSettings) -> Self {
        let mut parsers: HashMap<PackageManager, Arc<dyn ManifestParser>> = HashMap::new();

        for manager in [PackageManager::Npm, PackageManager::Yarn, PackageManager::Pnpm] {
            parsers.insert(
                manager,
                Arc::new(JavaScriptParser::new(
                    manager,
                    settings.npm.clone(),
                    settings.npm_max_depth,
                    settings.timeout,
                )),
            );
        }
        for manager in [
            PackageManager::Pip,
            PackageManager::Poetry,
            PackageManager::Pipenv,
            PackageManager::Conda,
        ] {
            parsers.insert(
                manager,
                Arc::new(PythonParser::new(
                    manager,
                    settings.pypi.clone(),
                    settings.pypi_max_depth,
                    settings.timeout,
                )),
            );
        }
        for manager in [PackageManager::Maven, PackageManager::Gradle] {
            parsers.insert(manager, Arc::new(JavaParser::new(manager)));
        }
        for manager in [PackageManager::Vcpkg, PackageManager::Conan] {
            parsers.insert(manager, Arc::new(CppParser::new(manager)));
        }
        parsers.insert(PackageManager::GoModules, Arc::new(GoParser));
        parsers.insert(PackageManager::Cargo, Arc::new(RustParser));
        parsers.insert(PackageManager::Bundler, Arc::new(RubyParser));
        parsers.insert(PackageManager::Nuget, Arc::new(CSharpParser));

        Self { parsers }
    }

    pub fn get(&self, manager: PackageManager) -> Option<Arc<dyn ManifestParser>> {
        self.parsers.get(&manager).cloned()
    }
}

impl ParserProvider for ParserRegistry {
    fn parser_for(&self, manager: PackageManager) -> Option<Arc<dyn ManifestParser>> {
        self.get(manager)
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::new(&ResolverSettings::offline())
    }
}

fn file_name(path: &Path) -> &str {
    path.file_name().and_then(|n| n.to_str()).unwrap_or_default()
}

fn from_json<T: DeserializeOwned>(path: &Path, content: &str) -> ParseResult<T> {
    serde_json::from_str(content).map_err(|e| ParseError::malformed(path, e))
}

fn from_toml<T: DeserializeOwned>(path: &Path, content: &str) -> ParseResult<T> {
    toml::from_str(content).map_err(|e| ParseError::malformed(path, e))
}

fn from_yaml<T: DeserializeOwned>(path: &Path, content: &str) -> ParseResult<T> {
    serde_yaml_ng::from_str(content).map_err(|e| ParseError::malformed(path, e))
}
