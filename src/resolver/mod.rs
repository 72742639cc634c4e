// src/resolver/mod.rs

//! Recipe resolution
//!
//! Given a platform and a set of requested options, the resolver derives the
//! three things a build needs: the dependency list, the build-tool invocation
//! and the package metadata. Resolution is a chain of pure functions:
//!
//! ```text
//! requested options ──normalize──> OptionSet ──plan──────────> dependencies
//!                                      │      ──build─────────> invocation plan
//!                                      │      ──derive_metadata> package metadata
//! ```
//!
//! Nothing in this module touches the filesystem, the network or the host
//! environment. The same inputs always serialize to the same bytes.

pub mod config;
pub mod dependencies;
pub mod invocation;
pub mod metadata;
pub mod options;

use crate::error::Result;
use crate::platform::PlatformDescriptor;
use serde::Serialize;
use tracing::debug;

pub use config::{BuildSystem, FlagEncoding, IconvMode, ResolverConfig};
pub use dependencies::{DependencySpec, DependencyVariant, PlatformCondition, DEFAULT_PINS};
pub use invocation::{DefinitionValue, InvocationPlan, OutputRename, SourceEdit};
pub use metadata::PackageMetadata;
pub use options::{OptionKey, OptionSet, OptionValue, PlatformOption, RequestedOptions};

/// Full result of resolving a recipe for one platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub platform: PlatformDescriptor,
    pub options: OptionSet,
    pub dependencies: Vec<DependencySpec>,
    pub plan: InvocationPlan,
    pub metadata: PackageMetadata,
}

/// Resolves recipes against a fixed configuration
#[derive(Debug, Clone)]
pub struct Resolver {
    config: ResolverConfig,
}

impl Resolver {
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Fill defaults and drop options that do not apply to the platform
    pub fn normalize(
        &self,
        descriptor: &PlatformDescriptor,
        requested: &RequestedOptions,
    ) -> Result<OptionSet> {
        options::normalize(descriptor, requested)
    }

    /// Ordered dependency requests
    pub fn plan(
        &self,
        descriptor: &PlatformDescriptor,
        options: &OptionSet,
    ) -> Result<Vec<DependencySpec>> {
        dependencies::plan(descriptor, options, &self.config)
    }

    /// Build-tool invocation plan
    pub fn build(&self, descriptor: &PlatformDescriptor, options: &OptionSet) -> Result<InvocationPlan> {
        invocation::build(descriptor, options, &self.config)
    }

    pub fn derive_metadata(
        &self,
        descriptor: &PlatformDescriptor,
        options: &OptionSet,
    ) -> Result<PackageMetadata> {
        metadata::derive_metadata(descriptor, options)
    }

    /// Run every stage for one platform
    pub fn resolve(
        &self,
        descriptor: &PlatformDescriptor,
        requested: &RequestedOptions,
    ) -> Result<Resolution> {
        let options = self.normalize(descriptor, requested)?;
        let dependencies = self.plan(descriptor, &options)?;
        let plan = self.build(descriptor, &options)?;
        let metadata = self.derive_metadata(descriptor, &options)?;

        debug!(
            "Resolved {} for {}: {} dependencies, {} definitions, {} source edits",
            self.config.build_system,
            descriptor,
            dependencies.len(),
            plan.definitions.len(),
            plan.source_edits().count()
        );

        Ok(Resolution {
            platform: descriptor.clone(),
            options,
            dependencies,
            plan,
            metadata,
        })
    }
}
