// src/commands/mod.rs
//! Command implementations for the glib-recipe CLI

mod cook;
mod resolve;

pub use cook::{cmd_cook, cmd_fetch};
pub use resolve::{cmd_resolve, cmd_validate};

use crate::cli::{OptionArgs, PlatformArgs};
use anyhow::{Context, Result};
use glib_recipe::platform::{Architecture, CompilerFamily, OperatingSystem, PlatformDescriptor};
use glib_recipe::recipe::{parse_recipe_file, Recipe};
use glib_recipe::resolver::options::parse_assignment;
use glib_recipe::resolver::RequestedOptions;
use std::path::Path;
use tracing::debug;

/// Read and parse a recipe file
pub(crate) fn load_recipe(path: &Path) -> Result<Recipe> {
    let recipe = parse_recipe_file(path)
        .with_context(|| format!("Failed to parse recipe: {}", path.display()))?;
    debug!("Loaded recipe {} {}", recipe.package.name, recipe.package.version);
    Ok(recipe)
}

/// Build the target platform from the command line, detecting what was not given
pub(crate) fn target_platform(args: &PlatformArgs) -> PlatformDescriptor {
    let mut descriptor = PlatformDescriptor::detect();

    if let Some(os) = &args.os {
        descriptor.os = OperatingSystem::from_name(os);
    }
    if let Some(arch) = &args.arch {
        descriptor.arch = Architecture::from_name(arch);
    }
    if let Some(compiler) = &args.compiler {
        descriptor.compiler = CompilerFamily::from_name(compiler);
        // A detected version belongs to the detected compiler
        descriptor.compiler_version = None;
    }
    if let Some(version) = &args.compiler_version {
        descriptor.compiler_version = Some(version.clone());
    }

    descriptor
}

/// Collect `-D name=value` overrides
pub(crate) fn requested_options(args: &OptionArgs) -> Result<RequestedOptions> {
    let mut requested = RequestedOptions::new();
    for raw in &args.options {
        let (name, value) =
            parse_assignment(raw).with_context(|| format!("Invalid option: {}", raw))?;
        requested.insert(name, value);
    }
    Ok(requested)
}
