// src/recipe/format.rs

//! Recipe file format definitions
//!
//! Recipes are TOML files describing where the sources come from, which build
//! generator drives the build, and the default option values and dependency
//! pins the resolver starts from.

use crate::error::{Error, Result};
use crate::resolver::options::canonicalize;
use crate::resolver::{
    BuildSystem, FlagEncoding, IconvMode, OptionValue, RequestedOptions, Resolver, ResolverConfig,
};
use semver::Version;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// A complete recipe for building a package
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    /// Package metadata
    pub package: PackageSection,

    /// Source archive
    pub source: SourceSection,

    /// Build generator and resolver settings
    #[serde(default)]
    pub build: BuildSection,

    /// Default option values, overridable per invocation
    #[serde(default)]
    pub options: BTreeMap<String, OptionValue>,

    /// Dependency version pin overrides, keyed by dependency name
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,

    /// Variables for substitution (optional)
    #[serde(default)]
    pub variables: HashMap<String, String>,
}

impl Recipe {
    /// Substitute variables in a string
    ///
    /// Replaces `%(name)s` patterns with their values from:
    /// 1. Built-in variables (version, name)
    /// 2. Custom variables from the [variables] section
    pub fn substitute(&self, template: &str) -> String {
        let mut result = template.to_string();

        result = result.replace("%(version)s", &self.package.version);
        result = result.replace("%(name)s", &self.package.name);

        for (key, value) in &self.variables {
            result = result.replace(&format!("%({})s", key), value);
        }

        result
    }

    /// Get the archive URL with variables substituted
    pub fn archive_url(&self) -> String {
        self.substitute(&self.source.archive)
    }

    /// Build-tool version the recipe targets
    ///
    /// Falls back to the version of the tool requirement acquired when the
    /// tool is missing.
    pub fn tool_version(&self) -> Result<Version> {
        let raw = match &self.build.tool_version {
            Some(v) => v.as_str(),
            None => self
                .build
                .system
                .tool_requirement()
                .split_once('/')
                .map(|(_, v)| v)
                .unwrap_or_default(),
        };
        parse_tool_version(raw)
    }

    /// Resolver configuration described by the `[build]` and `[dependencies]` tables
    pub fn resolver_config(&self) -> Result<ResolverConfig> {
        let mut config = match self.build.system {
            BuildSystem::Meson => ResolverConfig::for_meson(&self.tool_version()?),
            BuildSystem::Autotools => ResolverConfig::for_autotools(),
        };

        if let Some(encoding) = self.build.flag_encoding {
            config = config.with_flag_encoding(encoding);
        }
        if let Some(mode) = self.build.iconv {
            config = config.with_iconv(mode);
        }
        for (name, constraint) in &self.dependencies {
            config = config.with_pin(name.clone(), constraint.clone());
        }

        Ok(config)
    }

    /// Resolver for this recipe
    pub fn resolver(&self) -> Result<Resolver> {
        Ok(Resolver::new(self.resolver_config()?))
    }

    /// Recipe defaults with `overrides` layered on top
    ///
    /// Both layers are keyed by canonical option name first, so an override
    /// replaces the recipe default however either side spells the option.
    pub fn requested_options(&self, overrides: &RequestedOptions) -> Result<RequestedOptions> {
        let mut requested = canonicalize(&self.options)?;
        requested.extend(canonicalize(overrides)?);
        Ok(requested)
    }
}

/// Parse a build-tool version, accepting the short `major.minor` form
pub fn parse_tool_version(raw: &str) -> Result<Version> {
    let raw = raw.trim();
    let padded = match raw.matches('.').count() {
        0 => format!("{}.0.0", raw),
        1 => format!("{}.0", raw),
        _ => raw.to_string(),
    };
    Version::parse(&padded)
        .map_err(|e| Error::ParseError(format!("Invalid tool version '{}': {}", raw, e)))
}

/// Package metadata section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageSection {
    /// Package name
    pub name: String,

    /// Package version
    pub version: String,

    /// Short description
    #[serde(default)]
    pub summary: Option<String>,

    /// License identifier (SPDX)
    #[serde(default)]
    pub license: Option<String>,

    /// Homepage URL
    #[serde(default)]
    pub homepage: Option<String>,
}

/// Source archive section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSection {
    /// Source archive URL or local path
    ///
    /// Supports `%(version)s` substitution.
    /// Example: `https://download.gnome.org/sources/glib/2.56/glib-%(version)s.tar.xz`
    pub archive: String,

    /// Checksum for the archive (sha256:... or xxh128:...)
    #[serde(default)]
    pub checksum: Option<String>,

    /// Directory name after extraction (if different from archive name)
    #[serde(default)]
    pub extract_dir: Option<String>,

    /// License file copied into the package, relative to the source root
    #[serde(default = "default_license_file")]
    pub license_file: String,
}

fn default_license_file() -> String {
    "COPYING".to_string()
}

/// Build section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildSection {
    /// Build generator
    #[serde(default)]
    pub system: BuildSystem,

    /// Version of the build generator (defaults to the acquired tool version)
    #[serde(default)]
    pub tool_version: Option<String>,

    /// Overrides the flag vocabulary picked from `tool_version`
    #[serde(default)]
    pub flag_encoding: Option<FlagEncoding>,

    /// iconv resolution on macOS; required when resolving for macOS
    #[serde(default)]
    pub iconv: Option<IconvMode>,

    /// Number of parallel jobs (default: auto)
    #[serde(default)]
    pub jobs: Option<u32>,

    /// Directory of extra patch files, relative to the recipe file
    #[serde(default)]
    pub patch_dir: Option<String>,

    /// Environment variables to set during build
    #[serde(default)]
    pub environment: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::parser::parse_recipe;

    const GLIB: &str = r#"
[package]
name = "glib"
version = "2.64.0"
summary = "GLib core application building blocks"
license = "LGPL-2.1"

[source]
archive = "https://download.gnome.org/sources/glib/2.64/glib-%(version)s.tar.xz"
checksum = "sha256:9a2f21ed8f13b9303399de13a0252b7cbcede593d26971378ec6cb90e87f2277"

[build]
system = "meson"
tool_version = "0.53.2"
iconv = "native"
patch_dir = "patches"

[options]
shared = false
with_pcre = true

[dependencies]
zlib = "1.2.11"
"#;

    #[test]
    fn test_parse_recipe() {
        let recipe = parse_recipe(GLIB).unwrap();
        assert_eq!(recipe.package.name, "glib");
        assert_eq!(recipe.build.system, BuildSystem::Meson);
        assert_eq!(recipe.build.iconv, Some(IconvMode::Native));
        assert_eq!(recipe.options.len(), 2);
        assert_eq!(recipe.source.license_file, "COPYING");
    }

    #[test]
    fn test_variable_substitution() {
        let mut recipe = parse_recipe(GLIB).unwrap();
        recipe
            .variables
            .insert("series".to_string(), "2.64".to_string());

        assert_eq!(
            recipe.archive_url(),
            "https://download.gnome.org/sources/glib/2.64/glib-2.64.0.tar.xz"
        );
        assert_eq!(recipe.substitute("%(name)s-%(series)s"), "glib-2.64");
    }

    #[test]
    fn test_minimal_recipe_defaults() {
        let content = r#"
[package]
name = "glib"
version = "2.56.1"

[source]
archive = "glib-2.56.1.tar.gz"
"#;
        let recipe = parse_recipe(content).unwrap();
        assert_eq!(recipe.build.system, BuildSystem::Meson);
        assert!(recipe.source.checksum.is_none());
        assert_eq!(recipe.tool_version().unwrap(), Version::new(0, 53, 2));

        let config = recipe.resolver_config().unwrap();
        assert_eq!(config.flag_encoding, FlagEncoding::Feature);
        assert!(config.iconv.is_none());
    }

    #[test]
    fn test_old_meson_uses_boolean_flags() {
        let content = r#"
[package]
name = "glib"
version = "2.56.1"

[source]
archive = "glib-2.56.1.tar.gz"

[build]
tool_version = "0.46"
"#;
        let recipe = parse_recipe(content).unwrap();
        let config = recipe.resolver_config().unwrap();
        assert_eq!(config.flag_encoding, FlagEncoding::Boolean);
    }

    #[test]
    fn test_explicit_encoding_wins() {
        let content = r#"
[package]
name = "glib"
version = "2.56.1"

[source]
archive = "glib-2.56.1.tar.gz"

[build]
tool_version = "0.53.2"
flag_encoding = "boolean"
"#;
        let recipe = parse_recipe(content).unwrap();
        assert_eq!(
            recipe.resolver_config().unwrap().flag_encoding,
            FlagEncoding::Boolean
        );
    }

    #[test]
    fn test_autotools_config() {
        let content = r#"
[package]
name = "glib"
version = "2.56.1"

[source]
archive = "glib-2.56.1.tar.gz"

[build]
system = "autotools"
"#;
        let recipe = parse_recipe(content).unwrap();
        let config = recipe.resolver_config().unwrap();
        assert_eq!(config.build_system, BuildSystem::Autotools);
        assert_eq!(config.flag_encoding, FlagEncoding::Boolean);
    }

    #[test]
    fn test_pins_carried_into_config() {
        let recipe = parse_recipe(GLIB).unwrap();
        let config = recipe.resolver_config().unwrap();
        assert_eq!(config.pins.get("zlib").map(String::as_str), Some("1.2.11"));
    }

    #[test]
    fn test_requested_options_layering() {
        let recipe = parse_recipe(GLIB).unwrap();
        let mut overrides = RequestedOptions::new();
        overrides.insert("shared".to_string(), OptionValue::Bool(true));

        overrides.insert("useSELinux".to_string(), OptionValue::Bool(false));

        let requested = recipe.requested_options(&overrides).unwrap();
        assert_eq!(requested.get("shared"), Some(&OptionValue::Bool(true)));
        assert_eq!(requested.get("useSELinux"), Some(&OptionValue::Bool(false)));
        assert_eq!(
            requested.get("useExternalRegexEngine"),
            Some(&OptionValue::Bool(true))
        );
        assert!(requested.get("with_pcre").is_none());
    }

    #[test]
    fn test_parse_tool_version() {
        assert_eq!(parse_tool_version("0.47").unwrap(), Version::new(0, 47, 0));
        assert_eq!(parse_tool_version("1").unwrap(), Version::new(1, 0, 0));
        assert!(parse_tool_version("latest").is_err());
    }
}
