// src/recipe/kitchen/mod.rs

//! Kitchen: where recipes are cooked
//!
//! The Kitchen turns a recipe and a platform into an installed package. It
//! asks the resolver what to do and then drives its collaborators in a fixed
//! order:
//! - Resolve options, dependencies, invocation plan and metadata
//! - Locate the build tool, acquiring it once if missing
//! - Fetch and unpack the source archive
//! - Apply source edits and patch files (all or nothing)
//! - Configure, build and install
//! - Rename outputs, copy the license and write the metadata record

mod archive;
mod collaborators;
mod config;
mod cook;
mod driver;
mod edits;

pub use archive::{download_file, extract_archive, ArchiveFetcher};
pub use collaborators::{
    DependencyResolver, NoToolProvider, NoopResolver, ResolvedDependency, SourceFetcher,
    ToolProvider,
};
pub use config::{CookResult, KitchenConfig, PACKAGE_INFO_FILE};
pub use cook::Cook;
pub use driver::{BuildContext, BuildDriver, BuildPhase, CommandDriver, PhaseCommand};
pub use edits::SourceEdits;

use crate::error::Result;
use crate::hash::Checksum;
use crate::platform::PlatformDescriptor;
use crate::recipe::format::Recipe;
use crate::resolver::{BuildSystem, RequestedOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// The Kitchen: where recipes are cooked
pub struct Kitchen {
    pub(crate) config: KitchenConfig,
    fetcher: Arc<dyn SourceFetcher>,
    driver: Arc<dyn BuildDriver>,
    resolver: Arc<dyn DependencyResolver>,
    tools: Arc<dyn ToolProvider>,
}

impl Kitchen {
    /// Create a new Kitchen with the given configuration
    ///
    /// Uses the archive fetcher, the command driver, and assumes the
    /// environment provides dependencies and tools.
    pub fn new(config: KitchenConfig) -> Self {
        let fetcher = Arc::new(ArchiveFetcher::new(config.source_cache.clone()));
        Self {
            config,
            fetcher,
            driver: Arc::new(CommandDriver),
            resolver: Arc::new(NoopResolver),
            tools: Arc::new(NoToolProvider),
        }
    }

    /// Create a Kitchen with default configuration
    pub fn with_defaults() -> Self {
        Self::new(KitchenConfig::default())
    }

    pub fn with_fetcher(mut self, fetcher: Arc<dyn SourceFetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    pub fn with_driver(mut self, driver: Arc<dyn BuildDriver>) -> Self {
        self.driver = driver;
        self
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn DependencyResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_tool_provider(mut self, tools: Arc<dyn ToolProvider>) -> Self {
        self.tools = tools;
        self
    }

    pub fn config(&self) -> &KitchenConfig {
        &self.config
    }

    /// Locate the build tool, acquiring it at most once
    pub fn locate_tool(&self, system: BuildSystem) -> Result<PathBuf> {
        match self.driver.locate(system) {
            Ok(path) => Ok(path),
            Err(e) if e.is_recoverable() => {
                warn!("{}; acquiring {}", e, system.tool_requirement());
                self.tools.acquire(system.tool_requirement())?;
                self.driver.locate(system)
            }
            Err(e) => Err(e),
        }
    }

    /// Cook a recipe for a platform
    ///
    /// `requested` overrides the recipe's `[options]` defaults. The package
    /// is installed under `output_dir/<name>-<version>-<platform>`.
    pub fn cook(
        &self,
        recipe: &Recipe,
        descriptor: &PlatformDescriptor,
        requested: &RequestedOptions,
        output_dir: &Path,
    ) -> Result<CookResult> {
        info!(
            "Cooking {} version {} for {}",
            recipe.package.name, recipe.package.version, descriptor
        );

        let resolver = recipe.resolver()?;
        let resolution = resolver.resolve(descriptor, &recipe.requested_options(requested)?)?;

        info!(
            "Resolving dependencies: {}",
            resolution
                .dependencies
                .iter()
                .map(|d| d.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );
        let dependencies = self.resolver.resolve(&resolution.dependencies)?;

        let tool = self.locate_tool(resolution.plan.build_system)?;
        debug!("Using {}", tool.display());

        let mut cook = Cook::new(self, recipe, &resolution, output_dir)?;

        info!("Prep: fetching ingredients...");
        cook.prep()?;

        info!("Applying source edits and patches...");
        cook.patch()?;

        info!("Simmering: running build...");
        cook.simmer(&tool, &dependencies)?;

        info!("Plating: finalizing package...");
        let metadata_path = cook.plate()?;

        let build_dir = if self.config.keep_builddir {
            let kept = cook.build_dir.keep();
            info!("Keeping build directory: {}", kept.display());
            Some(kept)
        } else {
            None
        };

        Ok(CookResult {
            package_dir: cook.package_dir,
            metadata_path,
            resolution: resolution.clone(),
            dependencies,
            patches: cook.patches,
            log: cook.log,
            warnings: cook.warnings,
            build_dir,
        })
    }

    /// Fetch and unpack sources for a recipe without building
    ///
    /// Useful for pre-fetching sources into the cache or inspecting the tree
    /// the build would see. Returns the source root inside `dest`.
    pub fn fetch(&self, recipe: &Recipe, dest: &Path) -> Result<PathBuf> {
        let archive_url = recipe.archive_url();
        info!(
            "Fetching sources for {} version {}: {}",
            recipe.package.name, recipe.package.version, archive_url
        );

        let checksum = recipe
            .source
            .checksum
            .as_deref()
            .map(Checksum::parse)
            .transpose()?;
        let root = self.fetcher.fetch(&archive_url, checksum.as_ref(), dest)?;

        Ok(match &recipe.source.extract_dir {
            Some(dir) => dest.join(dir),
            None => root,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::sync::Mutex;

    struct FlakyDriver {
        locates: Mutex<u32>,
        found_after: u32,
    }

    impl BuildDriver for FlakyDriver {
        fn locate(&self, system: BuildSystem) -> Result<PathBuf> {
            let mut locates = self.locates.lock().unwrap();
            *locates += 1;
            if *locates > self.found_after {
                Ok(PathBuf::from("/usr/bin/meson"))
            } else {
                Err(Error::ToolNotFoundError {
                    tool: system.tool().to_string(),
                    requirement: system.tool_requirement().to_string(),
                })
            }
        }

        fn run(&self, _phase: BuildPhase, _ctx: &BuildContext<'_>) -> Result<String> {
            Ok(String::new())
        }
    }

    struct RecordingTools(Mutex<Vec<String>>);

    impl ToolProvider for RecordingTools {
        fn acquire(&self, requirement: &str) -> Result<()> {
            self.0.lock().unwrap().push(requirement.to_string());
            Ok(())
        }
    }

    fn kitchen(found_after: u32, tools: Arc<RecordingTools>) -> (Kitchen, Arc<FlakyDriver>) {
        let driver = Arc::new(FlakyDriver {
            locates: Mutex::new(0),
            found_after,
        });
        let kitchen = Kitchen::with_defaults()
            .with_driver(driver.clone())
            .with_tool_provider(tools);
        (kitchen, driver)
    }

    #[test]
    fn test_locate_tool_present() {
        let tools = Arc::new(RecordingTools(Mutex::new(Vec::new())));
        let (kitchen, driver) = kitchen(0, tools.clone());
        assert!(kitchen.locate_tool(BuildSystem::Meson).is_ok());
        assert_eq!(*driver.locates.lock().unwrap(), 1);
        assert!(tools.0.lock().unwrap().is_empty());
    }

    #[test]
    fn test_locate_tool_acquires_once() {
        let tools = Arc::new(RecordingTools(Mutex::new(Vec::new())));
        let (kitchen, driver) = kitchen(1, tools.clone());
        assert!(kitchen.locate_tool(BuildSystem::Meson).is_ok());
        assert_eq!(*driver.locates.lock().unwrap(), 2);
        assert_eq!(*tools.0.lock().unwrap(), vec!["meson/0.53.2"]);
    }

    #[test]
    fn test_locate_tool_gives_up_after_one_retry() {
        let tools = Arc::new(RecordingTools(Mutex::new(Vec::new())));
        let (kitchen, driver) = kitchen(5, tools.clone());
        let err = kitchen.locate_tool(BuildSystem::Autotools).unwrap_err();
        assert!(matches!(err, Error::ToolNotFoundError { .. }));
        assert_eq!(*driver.locates.lock().unwrap(), 2);
        assert_eq!(*tools.0.lock().unwrap(), vec!["autoconf/2.69"]);
    }

    #[test]
    fn test_failed_acquisition_propagates() {
        let driver = Arc::new(FlakyDriver {
            locates: Mutex::new(0),
            found_after: 1,
        });
        let kitchen = Kitchen::with_defaults().with_driver(driver.clone());
        let err = kitchen.locate_tool(BuildSystem::Meson).unwrap_err();
        assert!(matches!(err, Error::ToolNotFoundError { .. }));
        assert_eq!(*driver.locates.lock().unwrap(), 1);
    }
}
