// src/recipe/parser.rs

//! Recipe file parsing

use crate::error::{Error, Result};
use crate::hash::Checksum;
use crate::recipe::format::Recipe;
use crate::resolver::options::canonicalize;
use crate::resolver::{BuildSystem, FlagEncoding, OptionKey, DEFAULT_PINS};
use semver::VersionReq;
use std::path::Path;
use std::str::FromStr;

/// Parse a recipe from a TOML string
pub fn parse_recipe(content: &str) -> Result<Recipe> {
    toml::from_str(content).map_err(|e| Error::ParseError(format!("Invalid recipe: {}", e)))
}

/// Parse a recipe from a file
pub fn parse_recipe_file(path: &Path) -> Result<Recipe> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::IoError(format!("Failed to read recipe file: {}", e)))?;

    parse_recipe(&content)
}

/// Validate a recipe for completeness and correctness
///
/// Hard errors are returned as `Err`; softer problems come back as warnings.
pub fn validate_recipe(recipe: &Recipe) -> Result<Vec<String>> {
    let mut warnings = Vec::new();

    if recipe.package.name.is_empty() {
        return Err(Error::ParseError("Recipe package name cannot be empty".to_string()));
    }
    if recipe.package.version.is_empty() {
        return Err(Error::ParseError("Recipe package version cannot be empty".to_string()));
    }

    let remote = recipe.source.archive.starts_with("http://")
        || recipe.source.archive.starts_with("https://");
    match &recipe.source.checksum {
        Some(checksum) => {
            Checksum::parse(checksum)?;
        }
        None if remote => {
            return Err(Error::ParseError(format!(
                "Remote archive {} must have a checksum",
                recipe.source.archive
            )));
        }
        None => warnings.push("Local archive has no checksum".to_string()),
    }

    for name in recipe.options.keys() {
        OptionKey::from_str(name).map_err(|_| Error::UnknownOptionError(name.clone()))?;
    }
    canonicalize(&recipe.options)?;

    for (name, constraint) in &recipe.dependencies {
        if !DEFAULT_PINS.iter().any(|(n, _)| n == name) {
            return Err(Error::UnresolvedDependencyError(format!(
                "version override for {} which this recipe never requests",
                name
            )));
        }
        VersionReq::parse(constraint).map_err(|e| {
            Error::UnresolvedDependencyError(format!(
                "{}: invalid version constraint '{}': {}",
                name, constraint, e
            ))
        })?;
    }

    // Surfaces an unparsable tool version
    recipe.resolver_config()?;

    if recipe.package.summary.is_none() {
        warnings.push("Missing package summary".to_string());
    }
    if recipe.package.license.is_none() {
        warnings.push("Missing package license".to_string());
    }
    if recipe.build.iconv.is_none() {
        warnings.push("No iconv mode set; resolving for macOS will fail".to_string());
    }
    if recipe.build.system == BuildSystem::Autotools {
        if recipe.build.tool_version.is_some() {
            warnings.push("tool_version is ignored for autotools builds".to_string());
        }
        if recipe.build.flag_encoding == Some(FlagEncoding::Feature) {
            warnings.push("configure does not understand feature-typed flags".to_string());
        }
    }

    Ok(warnings)
}
