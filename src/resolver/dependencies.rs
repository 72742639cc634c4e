// src/resolver/dependencies.rs

//! Dependency planning
//!
//! Produces the ordered list of library requests handed to the dependency
//! resolver. Order matters to some consumers (it becomes link order), so the
//! sequence is a pure function of the platform, the options and the config:
//! base libraries first, then option-driven ones, then platform-specific ones.

use crate::error::{Error, Result};
use crate::platform::PlatformDescriptor;
use crate::resolver::config::{IconvMode, ResolverConfig};
use crate::resolver::options::{OptionKey, OptionSet};
use semver::VersionReq;
use serde::Serialize;
use std::fmt;

/// Default pins, one per dependency the planner can emit
pub const DEFAULT_PINS: &[(&str, &str)] = &[
    ("zlib", "1.2.11"),
    ("libffi", "3.2.1"),
    ("pcre", "8.41"),
    ("libelf", "0.8.13"),
    ("libmount", "2.33.1"),
    ("libselinux", "2.9"),
    ("gettext", "0.20.1"),
    ("libiconv", "1.15"),
];

/// Which build of a dependency is wanted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyVariant {
    External,
    Native,
}

impl DependencyVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::External => "external",
            Self::Native => "native",
        }
    }
}

impl From<IconvMode> for DependencyVariant {
    fn from(mode: IconvMode) -> Self {
        match mode {
            IconvMode::Native => Self::Native,
            IconvMode::External => Self::External,
        }
    }
}

/// Platforms on which a dependency is requested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlatformCondition {
    Any,
    Linux,
    NotLinux,
    Macos,
}

/// A single dependency request
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DependencySpec {
    pub name: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant: Option<DependencyVariant>,
    pub condition: PlatformCondition,
}

impl DependencySpec {
    /// `name/version` reference as understood by the dependency resolver
    pub fn reference(&self) -> String {
        format!("{}/{}", self.name, self.version)
    }

    /// The version constraint as a semver requirement
    pub fn requirement(&self) -> Result<VersionReq> {
        VersionReq::parse(&self.version).map_err(|e| {
            Error::UnresolvedDependencyError(format!(
                "{}: invalid version constraint '{}': {}",
                self.name, self.version, e
            ))
        })
    }
}

impl fmt::Display for DependencySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.reference())?;
        if let Some(variant) = self.variant {
            write!(f, " ({})", variant.as_str())?;
        }
        Ok(())
    }
}

fn pinned(config: &ResolverConfig, name: &str) -> Result<String> {
    if let Some(version) = config.pins.get(name) {
        return Ok(version.clone());
    }
    DEFAULT_PINS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, v)| v.to_string())
        .ok_or_else(|| Error::UnresolvedDependencyError(format!("no version pinned for {}", name)))
}

/// Plan the ordered dependency requests
pub fn plan(
    descriptor: &PlatformDescriptor,
    options: &OptionSet,
    config: &ResolverConfig,
) -> Result<Vec<DependencySpec>> {
    if let Some(unknown) = config
        .pins
        .keys()
        .find(|name| !DEFAULT_PINS.iter().any(|(n, _)| n == name))
    {
        return Err(Error::UnresolvedDependencyError(format!(
            "version override for {} which this recipe never requests",
            unknown
        )));
    }

    let mut deps = Vec::new();
    let mut request = |name: &str,
                       variant: Option<DependencyVariant>,
                       condition: PlatformCondition|
     -> Result<()> {
        let spec = DependencySpec {
            name: name.to_string(),
            version: pinned(config, name)?,
            variant,
            condition,
        };
        spec.requirement()?;
        deps.push(spec);
        Ok(())
    };

    request("zlib", None, PlatformCondition::Any)?;
    request("libffi", None, PlatformCondition::Any)?;

    if options.enabled(OptionKey::UseExternalRegexEngine) {
        request("pcre", None, PlatformCondition::Any)?;
    }
    if options.enabled(OptionKey::UseElfSupport) {
        request("libelf", None, PlatformCondition::Any)?;
    }

    if descriptor.is_linux() {
        if options.get(OptionKey::UseMountSupport)? {
            request(
                "libmount",
                Some(mount_variant()),
                PlatformCondition::Linux,
            )?;
        }
        if options.get(OptionKey::UseSELinux)? {
            request("libselinux", None, PlatformCondition::Linux)?;
        }
    } else {
        request("gettext", None, PlatformCondition::NotLinux)?;
    }

    if descriptor.is_apple() {
        let mode = config.require_iconv()?;
        request("libiconv", Some(mode.into()), PlatformCondition::Macos)?;
    }

    Ok(deps)
}

/// libmount is always linked from its own package when enabled; the
/// `libmount` build definition switches the same dependency on
pub fn mount_variant() -> DependencyVariant {
    DependencyVariant::External
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{Architecture, CompilerFamily, OperatingSystem};
    use crate::resolver::options::{normalize, OptionValue, RequestedOptions};
    use semver::Version;

    fn config() -> ResolverConfig {
        ResolverConfig::for_meson(&Version::new(0, 53, 2)).with_iconv(IconvMode::Native)
    }

    fn names(deps: &[DependencySpec]) -> Vec<&str> {
        deps.iter().map(|d| d.name.as_str()).collect()
    }

    fn resolve(os: OperatingSystem, pairs: &[(&str, bool)]) -> Vec<DependencySpec> {
        let desc = PlatformDescriptor::new(os, Architecture::X86_64, CompilerFamily::Gcc);
        let requested: RequestedOptions = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), OptionValue::Bool(*v)))
            .collect();
        let options = normalize(&desc, &requested).unwrap();
        plan(&desc, &options, &config()).unwrap()
    }

    #[test]
    fn test_linux_full_feature_order() {
        let deps = resolve(OperatingSystem::Linux, &[]);
        assert_eq!(
            names(&deps),
            vec!["zlib", "libffi", "pcre", "libelf", "libmount", "libselinux"]
        );
        assert_eq!(deps[4].variant, Some(DependencyVariant::External));
    }

    #[test]
    fn test_linux_minimal() {
        let deps = resolve(
            OperatingSystem::Linux,
            &[
                ("with_pcre", false),
                ("with_elf", false),
                ("with_mount", false),
                ("with_selinux", false),
            ],
        );
        assert_eq!(names(&deps), vec!["zlib", "libffi"]);
    }

    #[test]
    fn test_windows_requests_gettext_not_iconv() {
        let deps = resolve(OperatingSystem::Windows, &[("useElfSupport", false)]);
        assert_eq!(names(&deps), vec!["zlib", "libffi", "pcre", "gettext"]);
    }

    #[test]
    fn test_macos_iconv_variant_follows_config() {
        let desc = PlatformDescriptor::new(
            OperatingSystem::Macos,
            Architecture::X86_64,
            CompilerFamily::Clang,
        );
        let options = normalize(&desc, &RequestedOptions::new()).unwrap();

        let external = ResolverConfig::for_meson(&Version::new(0, 53, 2))
            .with_iconv(IconvMode::External);
        let deps = plan(&desc, &options, &external).unwrap();
        let iconv = deps.last().unwrap();
        assert_eq!(iconv.name, "libiconv");
        assert_eq!(iconv.variant, Some(DependencyVariant::External));

        let unset = ResolverConfig::for_meson(&Version::new(0, 53, 2));
        assert!(matches!(
            plan(&desc, &options, &unset),
            Err(Error::ConfigurationError(_))
        ));
    }

    #[test]
    fn test_pin_override() {
        let desc = PlatformDescriptor::new(
            OperatingSystem::Linux,
            Architecture::X86_64,
            CompilerFamily::Gcc,
        );
        let options = normalize(&desc, &RequestedOptions::new()).unwrap();
        let deps = plan(&desc, &options, &config().with_pin("zlib", ">=1.2.11, <1.3")).unwrap();
        assert_eq!(deps[0].reference(), "zlib/>=1.2.11, <1.3");
    }

    #[test]
    fn test_invalid_pin_is_unresolved() {
        let desc = PlatformDescriptor::new(
            OperatingSystem::Linux,
            Architecture::X86_64,
            CompilerFamily::Gcc,
        );
        let options = normalize(&desc, &RequestedOptions::new()).unwrap();

        let bad = config().with_pin("zlib", "not a version");
        assert!(matches!(
            plan(&desc, &options, &bad),
            Err(Error::UnresolvedDependencyError(_))
        ));

        let unknown = config().with_pin("openssl", "1.1.1");
        assert!(matches!(
            plan(&desc, &options, &unknown),
            Err(Error::UnresolvedDependencyError(_))
        ));
    }

    #[test]
    fn test_default_pins_parse() {
        for (name, version) in DEFAULT_PINS {
            assert!(VersionReq::parse(version).is_ok(), "{} pin {}", name, version);
        }
    }

    #[test]
    fn test_display() {
        let deps = resolve(OperatingSystem::Linux, &[]);
        assert_eq!(deps[0].to_string(), "zlib/1.2.11");
        assert_eq!(deps[4].to_string(), "libmount/2.33.1 (external)");
    }
}
