// src/main.rs

mod cli;
mod commands;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over -v
    let default_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Resolve {
            recipe,
            platform,
            options,
            format,
        } => commands::cmd_resolve(&recipe, &platform, &options, format),

        Commands::Validate { recipe } => commands::cmd_validate(&recipe),

        Commands::Fetch {
            recipe,
            dest,
            source_cache,
        } => commands::cmd_fetch(&recipe, &dest, source_cache.as_deref()),

        Commands::Cook {
            recipe,
            output,
            platform,
            options,
            source_cache,
            jobs,
            keep_builddir,
            patch_dir,
        } => commands::cmd_cook(
            &recipe,
            &output,
            &platform,
            &options,
            source_cache.as_deref(),
            jobs,
            keep_builddir,
            patch_dir.as_deref(),
        ),

        Commands::Completions { shell } => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "glib-recipe",
                &mut std::io::stdout(),
            );
            Ok(())
        }
    }
}
