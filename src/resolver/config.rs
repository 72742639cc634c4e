// src/resolver/config.rs

//! Resolver configuration
//!
//! Settings that are not options of the package itself but select how the
//! resolver talks to the external build tool: which generator is used, which
//! value vocabulary its feature flags accept, and how iconv is resolved on
//! Apple targets.

use crate::error::{Error, Result};
use semver::Version;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// External build generator driven by the recipe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BuildSystem {
    #[default]
    Meson,
    /// Legacy `configure && make` revisions of the recipe
    Autotools,
}

impl BuildSystem {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Meson => "meson",
            Self::Autotools => "autotools",
        }
    }

    /// Executable that must be present to drive this build system
    pub fn tool(&self) -> &'static str {
        match self {
            Self::Meson => "meson",
            Self::Autotools => "autoreconf",
        }
    }

    /// Build-tool dependency to acquire when the tool is missing
    pub fn tool_requirement(&self) -> &'static str {
        match self {
            Self::Meson => "meson/0.53.2",
            Self::Autotools => "autoconf/2.69",
        }
    }
}

impl fmt::Display for BuildSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value vocabulary for on/off build-tool options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlagEncoding {
    /// `true` / `false`
    Boolean,
    /// `enabled` / `disabled`
    Feature,
}

impl FlagEncoding {
    /// First meson release with `feature` typed options
    pub const FEATURE_OPTIONS_SINCE: Version = Version::new(0, 47, 0);

    /// Pick the encoding understood by a given build-tool version
    pub fn for_tool_version(version: &Version) -> Self {
        if *version >= Self::FEATURE_OPTIONS_SINCE {
            Self::Feature
        } else {
            Self::Boolean
        }
    }

    /// Encode a switch in this vocabulary
    pub fn encode(&self, on: bool) -> &'static str {
        match (self, on) {
            (Self::Boolean, true) => "true",
            (Self::Boolean, false) => "false",
            (Self::Feature, true) => "enabled",
            (Self::Feature, false) => "disabled",
        }
    }
}

/// How iconv is resolved on Apple targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IconvMode {
    /// The iconv shipped with the OS
    Native,
    /// A separately packaged libiconv
    External,
}

impl IconvMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Native => "native",
            Self::External => "external",
        }
    }
}

impl fmt::Display for IconvMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration shared by the planner and the invocation builder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    pub build_system: BuildSystem,
    pub flag_encoding: FlagEncoding,
    /// Required when resolving for Apple targets
    pub iconv: Option<IconvMode>,
    /// Version constraint overrides keyed by dependency name
    pub pins: BTreeMap<String, String>,
}

impl ResolverConfig {
    /// Configuration targeting a meson of the given version
    pub fn for_meson(tool_version: &Version) -> Self {
        Self {
            build_system: BuildSystem::Meson,
            flag_encoding: FlagEncoding::for_tool_version(tool_version),
            iconv: None,
            pins: BTreeMap::new(),
        }
    }

    /// Configuration for legacy autotools builds
    pub fn for_autotools() -> Self {
        Self {
            build_system: BuildSystem::Autotools,
            flag_encoding: FlagEncoding::Boolean,
            iconv: None,
            pins: BTreeMap::new(),
        }
    }

    pub fn with_iconv(mut self, mode: IconvMode) -> Self {
        self.iconv = Some(mode);
        self
    }

    pub fn with_flag_encoding(mut self, encoding: FlagEncoding) -> Self {
        self.flag_encoding = encoding;
        self
    }

    pub fn with_pin(mut self, name: impl Into<String>, constraint: impl Into<String>) -> Self {
        self.pins.insert(name.into(), constraint.into());
        self
    }

    /// The configured iconv mode, which must be explicit for Apple targets
    pub fn require_iconv(&self) -> Result<IconvMode> {
        self.iconv.ok_or_else(|| {
            Error::ConfigurationError(
                "iconv resolution mode must be set explicitly (native or external) for macOS targets"
                    .to_string(),
            )
        })
    }
}
