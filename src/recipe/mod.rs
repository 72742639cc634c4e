// src/recipe/mod.rs

//! Recipe system for building GLib from source
//!
//! A recipe defines:
//! - The source archive and its checksum
//! - The build generator (meson, or autotools for old releases)
//! - Default option values and dependency pin overrides
//!
//! # Culinary Terminology
//!
//! - **Recipe**: The build specification (like a recipe card)
//! - **Cook**: Build a package from a recipe
//! - **Kitchen**: Drives the fetch, patch and build steps
//! - **Prep**: Fetch and unpack sources
//! - **Simmer**: The actual build process
//! - **Plate**: Finalize the installed package
//!
//! # Example Recipe
//!
//! ```toml
//! [package]
//! name = "glib"
//! version = "2.64.0"
//!
//! [source]
//! archive = "https://download.gnome.org/sources/glib/2.64/glib-%(version)s.tar.xz"
//! checksum = "sha256:9a2f21ed8f13b9303399de13a0252b7cbcede593d26971378ec6cb90e87f2277"
//!
//! [build]
//! system = "meson"
//! tool_version = "0.53.2"
//! iconv = "native"
//!
//! [options]
//! shared = false
//! ```

mod format;
pub mod kitchen;
pub mod parser;

pub use format::{parse_tool_version, BuildSection, PackageSection, Recipe, SourceSection};
pub use kitchen::{Cook, CookResult, Kitchen, KitchenConfig};
pub use parser::{parse_recipe, parse_recipe_file, validate_recipe};
