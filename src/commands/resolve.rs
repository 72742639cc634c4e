// src/commands/resolve.rs

//! Resolve and validate commands - inspect a recipe without building

use super::{load_recipe, requested_options, target_platform};
use crate::cli::{OptionArgs, OutputFormat, PlatformArgs};
use anyhow::{Context, Result};
use glib_recipe::recipe::validate_recipe;
use glib_recipe::resolver::{BuildSystem, Resolution};
use std::path::Path;
use tracing::info;

/// Resolve a recipe for a platform and print the outcome
pub fn cmd_resolve(
    recipe_path: &str,
    platform: &PlatformArgs,
    options: &OptionArgs,
    format: OutputFormat,
) -> Result<()> {
    let recipe = load_recipe(Path::new(recipe_path))?;
    let descriptor = target_platform(platform);
    let requested = recipe
        .requested_options(&requested_options(options)?)
        .with_context(|| format!("Invalid options for {}", recipe_path))?;

    let resolver = recipe
        .resolver()
        .with_context(|| format!("Invalid build settings in {}", recipe_path))?;
    let resolution = resolver
        .resolve(&descriptor, &requested)
        .with_context(|| format!("Failed to resolve {} for {}", recipe.package.name, descriptor))?;

    info!("Resolved {} for {}", recipe.package.name, descriptor);

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&resolution)
                .context("Failed to serialize resolution")?;
            println!("{}", json);
        }
        OutputFormat::Text => print_resolution(&resolution),
    }

    Ok(())
}

fn print_resolution(resolution: &Resolution) {
    println!("Platform: {}", resolution.platform);

    println!("\nOptions:");
    for (name, value) in resolution.options.to_map() {
        println!("  {} = {}", name, value);
    }

    println!("\nDependencies ({}):", resolution.dependencies.len());
    for dep in &resolution.dependencies {
        println!("  {}", dep);
    }

    let plan = &resolution.plan;
    println!("\nBuild ({}):", plan.build_system);
    for command in &plan.pre_configure {
        println!("  $ {}", command.join(" "));
    }
    match plan.build_system {
        BuildSystem::Meson => {
            for arg in plan.meson_args() {
                println!("  {}", arg);
            }
        }
        BuildSystem::Autotools => {
            for (name, value) in plan.configure_env() {
                println!("  {}={}", name, value);
            }
            for arg in plan.configure_args() {
                println!("  {}", arg);
            }
        }
    }

    let edits: Vec<_> = plan.source_edits().collect();
    if !edits.is_empty() {
        println!("\nSource edits ({}):", edits.len());
        for edit in edits {
            println!("  {}", edit.file());
        }
    }
    for rename in &plan.output_renames {
        println!("\nRename: {}", rename.pattern());
    }

    let metadata = &resolution.metadata;
    println!("\nLibraries: {}", metadata.library_names.join(", "));
    println!("Include directories: {}", metadata.include_directories.join(", "));
    if !metadata.system_libraries.is_empty() {
        println!("System libraries: {}", metadata.system_libraries.join(", "));
    }
    if !metadata.frameworks.is_empty() {
        println!("Frameworks: {}", metadata.frameworks.join(", "));
    }
    if !metadata.exe_link_flags.is_empty() {
        println!("Executable link flags: {}", metadata.exe_link_flags.join(" "));
    }
    if !metadata.shared_link_flags.is_empty() {
        println!("Shared link flags: {}", metadata.shared_link_flags.join(" "));
    }
}

/// Validate a recipe and report warnings
pub fn cmd_validate(recipe_path: &str) -> Result<()> {
    let recipe = load_recipe(Path::new(recipe_path))?;
    println!("Recipe: {} version {}", recipe.package.name, recipe.package.version);

    let warnings = validate_recipe(&recipe).with_context(|| "Recipe validation failed")?;
    for warning in &warnings {
        println!("Warning: {}", warning);
    }

    if warnings.is_empty() {
        println!("[OK] No issues found");
    } else {
        println!("[OK] {} warning(s)", warnings.len());
    }
    Ok(())
}
