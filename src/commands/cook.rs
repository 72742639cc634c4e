// src/commands/cook.rs

//! Cook command - build packages from recipes

use super::{load_recipe, requested_options, target_platform};
use crate::cli::{OptionArgs, PlatformArgs};
use anyhow::{Context, Result};
use glib_recipe::recipe::{validate_recipe, Kitchen, KitchenConfig, Recipe};
use std::path::{Path, PathBuf};
use tracing::info;

/// Kitchen configuration shared by cook and fetch
fn kitchen_config(source_cache: Option<&str>) -> KitchenConfig {
    let config = KitchenConfig::default();
    match source_cache {
        Some(dir) => config.with_source_cache(dir),
        None => config,
    }
}

/// Patch directory from the command line, else the recipe's, relative to the recipe file
fn patch_dir(recipe_path: &Path, recipe: &Recipe, cli_dir: Option<&str>) -> Option<PathBuf> {
    if let Some(dir) = cli_dir {
        return Some(PathBuf::from(dir));
    }
    let dir = recipe.build.patch_dir.as_deref()?;
    let base = recipe_path.parent().unwrap_or_else(|| Path::new("."));
    Some(base.join(dir))
}

/// Cook a package from a recipe
///
/// # Arguments
/// * `recipe_path` - Path to the recipe file
/// * `output_dir` - Directory the package root is created in
/// * `platform` - Target platform overrides
/// * `options` - `name=value` option overrides
/// * `source_cache` - Directory for caching downloaded sources
/// * `jobs` - Number of parallel build jobs (None = auto)
/// * `keep_builddir` - Keep build directory after completion
/// * `patch_dir` - Directory of extra patch files
#[allow(clippy::too_many_arguments)]
pub fn cmd_cook(
    recipe_path: &str,
    output_dir: &str,
    platform: &PlatformArgs,
    options: &OptionArgs,
    source_cache: Option<&str>,
    jobs: Option<u32>,
    keep_builddir: bool,
    patch_dir_arg: Option<&str>,
) -> Result<()> {
    let recipe_path = Path::new(recipe_path);
    let output_dir = Path::new(output_dir);

    println!("Reading recipe: {}", recipe_path.display());
    let recipe = load_recipe(recipe_path)?;
    println!("Recipe: {} version {}", recipe.package.name, recipe.package.version);

    let warnings = validate_recipe(&recipe).with_context(|| "Recipe validation failed")?;
    for warning in &warnings {
        println!("Warning: {}", warning);
    }

    let descriptor = target_platform(platform);
    let requested = requested_options(options)?;

    let mut config = kitchen_config(source_cache);
    if let Some(j) = jobs {
        config.jobs = j;
    }
    config.keep_builddir = keep_builddir;
    if let Some(dir) = patch_dir(recipe_path, &recipe, patch_dir_arg) {
        config = config.with_patch_dir(dir);
    }

    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory: {}", output_dir.display()))?;

    println!("Cooking for {}...", descriptor);
    let kitchen = Kitchen::new(config);
    let result = kitchen
        .cook(&recipe, &descriptor, &requested, output_dir)
        .with_context(|| format!("Failed to cook {}", recipe.package.name))?;

    println!("\n[COMPLETE] Cooked: {}", result.package_dir.display());
    println!("Metadata: {}", result.metadata_path.display());

    if !result.patches.is_empty() {
        println!("\nPatches applied:");
        for patch in &result.patches {
            println!("  - {}", patch);
        }
    }

    if let Some(dir) = &result.build_dir {
        println!("Build directory kept at {}", dir.display());
    }

    if !result.warnings.is_empty() {
        println!("\nBuild warnings:");
        for warning in &result.warnings {
            println!("  - {}", warning);
        }
    }

    info!(
        "Successfully cooked {} to {}",
        recipe.package.name,
        result.package_dir.display()
    );

    Ok(())
}

/// Fetch and unpack a recipe's sources without building
pub fn cmd_fetch(recipe_path: &str, dest: &str, source_cache: Option<&str>) -> Result<()> {
    let recipe = load_recipe(Path::new(recipe_path))?;
    let dest = Path::new(dest);

    std::fs::create_dir_all(dest)
        .with_context(|| format!("Failed to create directory: {}", dest.display()))?;

    let kitchen = Kitchen::new(kitchen_config(source_cache));
    let root = kitchen
        .fetch(&recipe, dest)
        .with_context(|| format!("Failed to fetch sources for {}", recipe.package.name))?;

    println!("Sources ready: {}", root.display());
    Ok(())
}
