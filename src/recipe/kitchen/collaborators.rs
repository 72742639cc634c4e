// src/recipe/kitchen/collaborators.rs

//! External collaborators of the Kitchen
//!
//! The Kitchen never fetches, resolves or acquires anything itself; it asks
//! these traits. Real implementations live next to them, tests supply mocks.

use crate::error::{Error, Result};
use crate::hash::Checksum;
use crate::resolver::DependencySpec;
use std::path::{Path, PathBuf};

/// Retrieves and unpacks source archives
pub trait SourceFetcher: Send + Sync {
    /// Fetch `location` (URL or local path), verify it and extract into `dest`
    ///
    /// Returns the source root inside `dest`.
    fn fetch(&self, location: &str, checksum: Option<&Checksum>, dest: &Path) -> Result<PathBuf>;
}

/// A dependency the resolver located
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDependency {
    pub spec: DependencySpec,
    /// Install prefix of the dependency, `None` when the system provides it
    pub prefix: Option<PathBuf>,
}

impl ResolvedDependency {
    /// Directory holding the dependency's `.pc` files
    pub fn pkg_config_dir(&self) -> Option<PathBuf> {
        self.prefix.as_ref().map(|p| p.join("lib").join("pkgconfig"))
    }
}

/// Resolves the planned dependency requests
///
/// Implementations must keep the order of `deps`.
pub trait DependencyResolver: Send + Sync {
    fn resolve(&self, deps: &[DependencySpec]) -> Result<Vec<ResolvedDependency>>;
}

/// A resolver that assumes every dependency is provided by the environment
///
/// Use this when the build host already has the libraries installed
/// (e.g., in a pre-configured build container).
pub struct NoopResolver;

impl DependencyResolver for NoopResolver {
    fn resolve(&self, deps: &[DependencySpec]) -> Result<Vec<ResolvedDependency>> {
        Ok(deps
            .iter()
            .map(|spec| ResolvedDependency {
                spec: spec.clone(),
                prefix: None,
            })
            .collect())
    }
}

/// Acquires a missing build tool
pub trait ToolProvider: Send + Sync {
    /// Make the tool named by `requirement` (e.g. `meson/0.53.2`) available
    fn acquire(&self, requirement: &str) -> Result<()>;
}

/// A provider that cannot acquire anything
pub struct NoToolProvider;

impl ToolProvider for NoToolProvider {
    fn acquire(&self, requirement: &str) -> Result<()> {
        let tool = requirement
            .split_once('/')
            .map(|(name, _)| name)
            .unwrap_or(requirement);
        Err(Error::ToolNotFoundError {
            tool: tool.to_string(),
            requirement: requirement.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::PlatformCondition;

    fn spec(name: &str) -> DependencySpec {
        DependencySpec {
            name: name.to_string(),
            version: "1.0".to_string(),
            variant: None,
            condition: PlatformCondition::Any,
        }
    }

    #[test]
    fn test_noop_resolver_keeps_order() {
        let resolved = NoopResolver
            .resolve(&[spec("zlib"), spec("libffi"), spec("pcre")])
            .unwrap();
        let names: Vec<&str> = resolved.iter().map(|r| r.spec.name.as_str()).collect();
        assert_eq!(names, vec!["zlib", "libffi", "pcre"]);
        assert!(resolved.iter().all(|r| r.pkg_config_dir().is_none()));
    }

    #[test]
    fn test_pkg_config_dir() {
        let dep = ResolvedDependency {
            spec: spec("zlib"),
            prefix: Some(PathBuf::from("/deps/zlib")),
        };
        assert_eq!(
            dep.pkg_config_dir(),
            Some(PathBuf::from("/deps/zlib/lib/pkgconfig"))
        );
    }

    #[test]
    fn test_no_tool_provider_fails() {
        let err = NoToolProvider.acquire("meson/0.53.2").unwrap_err();
        assert!(matches!(err, Error::ToolNotFoundError { ref tool, .. } if tool == "meson"));
    }
}
