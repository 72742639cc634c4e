// src/recipe/kitchen/config.rs

//! Configuration types for the Kitchen

use crate::resolver::Resolution;
use std::path::PathBuf;

use super::collaborators::ResolvedDependency;

/// File name of the metadata record written into every package
pub const PACKAGE_INFO_FILE: &str = "package-info.json";

/// Configuration for the Kitchen
#[derive(Debug, Clone)]
pub struct KitchenConfig {
    /// Directory for downloaded sources
    pub source_cache: PathBuf,
    /// Number of parallel jobs
    pub jobs: u32,
    /// Keep build directory after completion (for debugging)
    pub keep_builddir: bool,
    /// Directory of extra patch files, applied after the planned edits
    pub patch_dir: Option<PathBuf>,
    /// Leading path components stripped from patch file paths
    pub patch_strip: usize,
}

impl Default for KitchenConfig {
    fn default() -> Self {
        let jobs = std::thread::available_parallelism()
            .map(|p| p.get() as u32)
            .unwrap_or(4);

        let source_cache = dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("glib-recipe")
            .join("sources");

        Self {
            source_cache,
            jobs,
            keep_builddir: false,
            patch_dir: None,
            patch_strip: 1,
        }
    }
}

impl KitchenConfig {
    pub fn with_patch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.patch_dir = Some(dir.into());
        self
    }

    pub fn with_source_cache(mut self, dir: impl Into<PathBuf>) -> Self {
        self.source_cache = dir.into();
        self
    }
}

/// Result of cooking a recipe
#[derive(Debug)]
pub struct CookResult {
    /// Installed package root
    pub package_dir: PathBuf,
    /// Metadata record inside `package_dir`
    pub metadata_path: PathBuf,
    /// What the resolver decided for this cook
    pub resolution: Resolution,
    /// Dependencies as located by the dependency resolver, in plan order
    pub dependencies: Vec<ResolvedDependency>,
    /// Patch files applied, in order
    pub patches: Vec<String>,
    /// Build log
    pub log: String,
    /// Warnings generated during build
    pub warnings: Vec<String>,
    /// Build directory, when kept
    pub build_dir: Option<PathBuf>,
}
