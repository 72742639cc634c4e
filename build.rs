// build.rs

use clap::{Arg, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

/// Common argument: recipe file
fn recipe_arg() -> Arg {
    Arg::new("recipe").required(true).help("Path to the recipe file")
}

/// Common argument: `-D name=value` option override
fn option_arg() -> Arg {
    Arg::new("option")
        .short('D')
        .long("option")
        .value_name("NAME=VALUE")
        .action(clap::ArgAction::Append)
        .help("Set an option, e.g. `-D shared=true` (repeatable)")
}

/// Common arguments: target platform
fn platform_args() -> [Arg; 4] {
    [
        Arg::new("os").long("os").help("Target operating system (linux, windows, macos)"),
        Arg::new("arch").long("arch").help("Target architecture (x86, x86_64)"),
        Arg::new("compiler").long("compiler").help("Compiler family (gcc, clang, msvc)"),
        Arg::new("compiler_version")
            .long("compiler-version")
            .help("Compiler version"),
    ]
}

fn source_cache_arg() -> Arg {
    Arg::new("source_cache")
        .long("source-cache")
        .help("Source cache directory (default: user cache directory)")
}

fn build_cli() -> Command {
    Command::new("glib-recipe")
        .version(env!("CARGO_PKG_VERSION"))
        .author("glib-recipe Contributors")
        .about("Resolve and cook the GLib package recipe")
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(clap::ArgAction::Count)
                .help("Increase log verbosity (-v debug, -vv trace)"),
        )
        .subcommand(
            Command::new("resolve")
                .about("Show what a recipe resolves to for a platform")
                .arg(recipe_arg())
                .args(platform_args())
                .arg(option_arg())
                .arg(
                    Arg::new("format")
                        .long("format")
                        .value_parser(["text", "json"])
                        .default_value("text")
                        .help("Output format"),
                ),
        )
        .subcommand(
            Command::new("validate")
                .about("Check a recipe for errors and warnings")
                .arg(recipe_arg()),
        )
        .subcommand(
            Command::new("fetch")
                .about("Download and unpack the recipe's sources without building")
                .arg(recipe_arg())
                .arg(
                    Arg::new("dest")
                        .short('d')
                        .long("dest")
                        .default_value("./sources")
                        .help("Directory to unpack into"),
                )
                .arg(source_cache_arg()),
        )
        .subcommand(
            Command::new("cook")
                .about("Build and install a package from a recipe")
                .arg(recipe_arg())
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .default_value(".")
                        .help("Output directory for the installed package"),
                )
                .args(platform_args())
                .arg(option_arg())
                .arg(source_cache_arg())
                .arg(
                    Arg::new("jobs")
                        .short('j')
                        .long("jobs")
                        .help("Number of parallel build jobs (default: auto)"),
                )
                .arg(
                    Arg::new("keep_builddir")
                        .long("keep-builddir")
                        .action(clap::ArgAction::SetTrue)
                        .help("Keep build directory after completion (for debugging)"),
                )
                .arg(
                    Arg::new("patch_dir")
                        .long("patch-dir")
                        .help("Directory of patch files (default: the recipe's `patch_dir`)"),
                ),
        )
        .subcommand(
            Command::new("completions")
                .about("Generate shell completion scripts")
                .arg(
                    Arg::new("shell")
                        .required(true)
                        .value_parser(["bash", "elvish", "fish", "powershell", "zsh"])
                        .help("Shell type"),
                ),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let manifest_dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(e) => {
            println!("cargo:warning=CARGO_MANIFEST_DIR not set: {}", e);
            return;
        }
    };
    let man_dir = manifest_dir.join("man");

    if let Err(e) = fs::create_dir_all(&man_dir) {
        println!("cargo:warning=Failed to create man directory: {}", e);
        return;
    }

    let man = Man::new(build_cli());
    let mut buffer = Vec::new();

    if let Err(e) = man.render(&mut buffer) {
        println!("cargo:warning=Failed to render man page: {}", e);
        return;
    }

    let man_path = man_dir.join("glib-recipe.1");
    if let Err(e) = fs::write(&man_path, buffer) {
        println!("cargo:warning=Failed to write man page: {}", e);
    }
}
