// src/recipe/kitchen/cook.rs

//! Cook: the actual build execution for a single recipe

use crate::error::{Error, Result};
use crate::hash::Checksum;
use crate::recipe::format::Recipe;
use crate::resolver::{OutputRename, Resolution};
use glob::Pattern;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info, warn};

use super::collaborators::ResolvedDependency;
use super::config::PACKAGE_INFO_FILE;
use super::driver::{BuildContext, BuildPhase};
use super::edits::SourceEdits;
use super::Kitchen;

/// A single cook operation
pub struct Cook<'a> {
    pub(super) kitchen: &'a Kitchen,
    pub(super) recipe: &'a Recipe,
    pub(super) resolution: &'a Resolution,
    /// Temporary build directory
    pub(super) build_dir: TempDir,
    /// Source directory within build_dir
    pub(super) source_dir: PathBuf,
    /// Install prefix, the package root
    pub(super) package_dir: PathBuf,
    /// Patch files applied
    pub(super) patches: Vec<String>,
    /// Build log accumulator
    pub(super) log: String,
    /// Warnings
    pub(super) warnings: Vec<String>,
}

impl<'a> Cook<'a> {
    pub(super) fn new(
        kitchen: &'a Kitchen,
        recipe: &'a Recipe,
        resolution: &'a Resolution,
        output_dir: &Path,
    ) -> Result<Self> {
        let build_dir = TempDir::new()
            .map_err(|e| Error::IoError(format!("Failed to create build directory: {}", e)))?;

        let source_dir = build_dir.path().join("source");
        let package_dir = output_dir.join(format!(
            "{}-{}-{}",
            recipe.package.name, recipe.package.version, resolution.platform
        ));

        fs::create_dir_all(&source_dir)?;

        Ok(Self {
            kitchen,
            recipe,
            resolution,
            build_dir,
            source_dir,
            package_dir,
            patches: Vec::new(),
            log: String::new(),
            warnings: Vec::new(),
        })
    }

    /// Phase 1: Prep - fetch and unpack the source archive
    pub(super) fn prep(&mut self) -> Result<()> {
        let archive_url = self.recipe.archive_url();
        let checksum = self
            .recipe
            .source
            .checksum
            .as_deref()
            .map(Checksum::parse)
            .transpose()?;

        let extract_to = self.build_dir.path().join("source");
        let root = self
            .kitchen
            .fetcher
            .fetch(&archive_url, checksum.as_ref(), &extract_to)?;

        self.source_dir = match &self.recipe.source.extract_dir {
            Some(dir) => extract_to.join(dir),
            None => root,
        };
        if !self.source_dir.is_dir() {
            return Err(Error::FetchError(format!(
                "Source directory {} missing after extraction",
                self.source_dir.display()
            )));
        }

        self.log_line(&format!("Fetched source: {}", archive_url));
        debug!("Source directory: {}", self.source_dir.display());
        Ok(())
    }

    /// Phase 2: Apply planned edits, then patch files
    ///
    /// Everything is staged first; the tree is written only if all of it applies.
    pub(super) fn patch(&mut self) -> Result<()> {
        let mut edits = SourceEdits::new(&self.source_dir);

        for edit in self.resolution.plan.source_edits() {
            edits.apply_edit(edit)?;
        }

        let mut applied = Vec::new();
        if let Some(dir) = &self.kitchen.config.patch_dir {
            applied = edits.apply_patch_dir(dir, self.kitchen.config.patch_strip)?;
        }

        let written = edits.commit()?;
        self.log_line(&format!(
            "Applied {} source edit(s) and {} patch(es), {} file(s) changed",
            self.resolution.plan.source_edits().count(),
            applied.len(),
            written
        ));
        self.patches = applied;
        Ok(())
    }

    /// Phase 3: Simmer - configure, build and install
    pub(super) fn simmer(&mut self, tool: &Path, dependencies: &[ResolvedDependency]) -> Result<()> {
        let mut env: Vec<(String, String)> = self
            .recipe
            .build
            .environment
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let pkg_config_dirs: Vec<String> = dependencies
            .iter()
            .filter_map(|d| d.pkg_config_dir())
            .map(|p| p.display().to_string())
            .collect();
        if !pkg_config_dirs.is_empty() {
            env.push(("PKG_CONFIG_PATH".to_string(), pkg_config_dirs.join(":")));
        }

        // The install prefix only appears once the sources are final
        fs::create_dir_all(&self.package_dir)?;

        let meson_build_dir = self.build_dir.path().join("build");
        let ctx = BuildContext {
            plan: &self.resolution.plan,
            tool,
            source_dir: &self.source_dir,
            build_dir: &meson_build_dir,
            prefix: &self.package_dir,
            env: &env,
            jobs: self.recipe.build.jobs.unwrap_or(self.kitchen.config.jobs),
        };

        for phase in BuildPhase::ALL {
            let output = self.kitchen.driver.run(phase, &ctx)?;
            self.log.push_str(&format!("=== {} ===\n", phase));
            if !output.is_empty() {
                self.log.push_str(&output);
                self.log.push('\n');
            }
        }

        Ok(())
    }

    /// Phase 4: Plate - finalize the installed tree
    pub(super) fn plate(&mut self) -> Result<PathBuf> {
        let resolution = self.resolution;
        for rename in &resolution.plan.output_renames {
            let renamed = rename_outputs(&self.package_dir, rename)?;
            self.log_line(&format!("Renamed {} file(s) in {}", renamed, rename.directory));
        }

        let license = self.source_dir.join(&self.recipe.source.license_file);
        if license.is_file() {
            let licenses = self.package_dir.join("licenses");
            fs::create_dir_all(&licenses)?;
            let name = license.file_name().unwrap_or_default();
            fs::copy(&license, licenses.join(name))?;
        } else {
            let warning = format!("License file {} not found", self.recipe.source.license_file);
            warn!("{}", warning);
            self.warnings.push(warning);
        }

        let metadata_path = self.package_dir.join(PACKAGE_INFO_FILE);
        let json = serde_json::to_string_pretty(&resolution.metadata)
            .map_err(|e| Error::IoError(format!("Failed to serialize package metadata: {}", e)))?;
        fs::write(&metadata_path, json)?;

        info!("Cooked: {}", self.package_dir.display());
        Ok(metadata_path)
    }

    pub(super) fn log_line(&mut self, line: &str) {
        self.log.push_str(line);
        self.log.push('\n');
    }
}

/// Rename files in `root/rename.directory` matching the old naming convention
pub(super) fn rename_outputs(root: &Path, rename: &OutputRename) -> Result<usize> {
    let dir = root.join(&rename.directory);
    if !dir.is_dir() {
        return Ok(0);
    }

    let pattern = Pattern::new(&format!("{}*{}", rename.strip_prefix, rename.from_extension))
        .map_err(|e| Error::ConfigurationError(format!("Invalid rename pattern: {}", e)))?;

    let mut count = 0;
    for entry in fs::read_dir(&dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if !pattern.matches(&name) {
            continue;
        }
        if let Some(target) = rename.target_name(&name) {
            debug!("Renaming {} -> {}", name, target);
            fs::rename(entry.path(), dir.join(target))?;
            count += 1;
        }
    }
    Ok(count)
}
