// src/cli.rs
//! CLI definitions for glib-recipe
//!
//! Command-line interface definitions using clap. The command
//! implementations are in the `commands` module.

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

#[derive(Parser)]
#[command(name = "glib-recipe")]
#[command(version)]
#[command(about = "Resolve and cook the GLib package recipe", long_about = None)]
pub struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Target platform selection; anything left out is detected from the host
#[derive(Args, Debug, Clone, Default)]
pub struct PlatformArgs {
    /// Target operating system (linux, windows, macos)
    #[arg(long)]
    pub os: Option<String>,

    /// Target architecture (x86, x86_64)
    #[arg(long)]
    pub arch: Option<String>,

    /// Compiler family (gcc, clang, msvc)
    #[arg(long)]
    pub compiler: Option<String>,

    /// Compiler version
    #[arg(long)]
    pub compiler_version: Option<String>,
}

/// Option overrides shared by resolve and cook
#[derive(Args, Debug, Clone, Default)]
pub struct OptionArgs {
    /// Set an option, e.g. `-D shared=true` (repeatable)
    #[arg(short = 'D', long = "option", value_name = "NAME=VALUE")]
    pub options: Vec<String>,
}

/// Output format for `resolve`
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable summary
    #[default]
    Text,
    /// The full resolution as JSON
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show what a recipe resolves to for a platform
    Resolve {
        /// Path to the recipe file
        recipe: String,

        #[command(flatten)]
        platform: PlatformArgs,

        #[command(flatten)]
        options: OptionArgs,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Check a recipe for errors and warnings
    Validate {
        /// Path to the recipe file
        recipe: String,
    },

    /// Download and unpack the recipe's sources without building
    Fetch {
        /// Path to the recipe file
        recipe: String,

        /// Directory to unpack into
        #[arg(short, long, default_value = "./sources")]
        dest: String,

        /// Source cache directory (default: user cache directory)
        #[arg(long)]
        source_cache: Option<String>,
    },

    /// Build and install a package from a recipe
    Cook {
        /// Path to the recipe file
        recipe: String,

        /// Output directory for the installed package
        #[arg(short, long, default_value = ".")]
        output: String,

        #[command(flatten)]
        platform: PlatformArgs,

        #[command(flatten)]
        options: OptionArgs,

        /// Source cache directory (default: user cache directory)
        #[arg(long)]
        source_cache: Option<String>,

        /// Number of parallel build jobs (default: auto)
        #[arg(short, long)]
        jobs: Option<u32>,

        /// Keep build directory after completion (for debugging)
        #[arg(long)]
        keep_builddir: bool,

        /// Directory of patch files (default: the recipe's `patch_dir`)
        #[arg(long)]
        patch_dir: Option<String>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}
