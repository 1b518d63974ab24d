use super::Package;
use serde::{Deserialize, Serialize};

/// How a dependency entered the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyType {
    Direct,
    Transitive,
    Dev,
    Optional,
}

/// Phase in which a dependency is needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    #[default]
    Runtime,
    Development,
    Optional,
}

/// An edge of the dependency graph.
///
/// Depth 0 always means the project declares the package itself; the
/// constructors keep `dependency_type` consistent with that.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub package: Package,
    pub dependency_type: DependencyType,
    pub scope: Scope,
    pub is_optional: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    pub depth: u32,
}

impl Dependency {
    pub fn direct(package: Package) -> Self {
        Self {
            package,
            dependency_type: DependencyType::Direct,
            scope: Scope::Runtime,
            is_optional: false,
            parent: None,
            depth: 0,
        }
    }

    pub fn dev(package: Package) -> Self {
        Self {
            package,
            dependency_type: DependencyType::Dev,
            scope: Scope::Development,
            is_optional: false,
            parent: None,
            depth: 0,
        }
    }

    pub fn optional(package: Package) -> Self {
        Self {
            package,
            dependency_type: DependencyType::Optional,
            scope: Scope::Optional,
            is_optional: true,
            parent: None,
            depth: 0,
        }
    }

    /// A pinned entry whose position in the tree is not recorded.
    pub fn unattributed(package: Package) -> Self {
        Self::transitive(package, None, 1)
    }

    pub fn transitive(package: Package, parent: Option<String>, depth: u32) -> Self {
        Self {
            package,
            dependency_type: DependencyType::Transitive,
            scope: Scope::Runtime,
            is_optional: false,
            parent,
            depth: depth.max(1),
        }
    }

    /// Builds a lockfile entry at a known tree depth.
    pub fn at_depth(package: Package, depth: u32, is_dev: bool) -> Self {
        match (depth, is_dev) {
            (0, true) => Self::dev(package),
            (0, false) => Self::direct(package),
            (d, dev) => {
                let mut dep = Self::transitive(package, None, d);
                if dev {
                    dep.scope = Scope::Development;
                }
                dep
            }
        }
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn purl(&self) -> &str {
        self.package.purl()
    }

    /// Direct, dev and optional entries are all declared by the project.
    pub fn is_declared(&self) -> bool {
        self.depth == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sbom_generation::domain::PackageManager;

    fn pkg() -> Package {
        Package::new("left-pad", "1.3.0", PackageManager::Npm)
    }

    #[test]
    fn test_direct_is_depth_zero() {
        let dep = Dependency::direct(pkg());
        assert_eq!(dep.depth, 0);
        assert_eq!(dep.dependency_type, DependencyType::Direct);
        assert!(dep.is_declared());
    }

    #[test]
    fn test_transitive_never_has_depth_zero() {
        let dep = Dependency::transitive(pkg(), None, 0);
        assert_eq!(dep.depth, 1);
        assert_eq!(Dependency::unattributed(pkg()).depth, 1);
    }

    #[test]
    fn test_at_depth_maps_dev_flag() {
        let dep = Dependency::at_depth(pkg(), 0, true);
        assert_eq!(dep.dependency_type, DependencyType::Dev);
        assert_eq!(dep.scope, Scope::Development);

        let nested = Dependency::at_depth(pkg(), 2, true);
        assert_eq!(nested.dependency_type, DependencyType::Transitive);
        assert_eq!(nested.scope, Scope::Development);
        assert_eq!(nested.depth, 2);
    }

    #[test]
    fn test_optional_sets_flag() {
        let dep = Dependency::optional(pkg());
        assert!(dep.is_optional);
        assert_eq!(dep.scope, Scope::Optional);
    }
}
