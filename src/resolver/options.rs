// src/resolver/options.rs

//! Option normalization
//!
//! Requested options arrive as loosely typed name/value pairs (from a recipe
//! file or the command line). `normalize` checks the names, fills defaults,
//! and marks options that make no sense on the target platform as
//! `Inapplicable`. Reading an inapplicable option is a `ConfigurationError`.

use crate::error::{Error, Result};
use crate::platform::PlatformDescriptor;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use strum::IntoEnumIterator;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

/// Recognized option names
///
/// The second spelling of each key is the name used by older recipe files.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumString, EnumIter, AsRefStr,
)]
pub enum OptionKey {
    #[strum(to_string = "shared")]
    Shared,
    #[strum(to_string = "positionIndependentCode", serialize = "fPIC")]
    PositionIndependentCode,
    #[strum(to_string = "useExternalRegexEngine", serialize = "with_pcre")]
    UseExternalRegexEngine,
    #[strum(to_string = "useElfSupport", serialize = "with_elf")]
    UseElfSupport,
    #[strum(to_string = "useSELinux", serialize = "with_selinux")]
    UseSELinux,
    #[strum(to_string = "useMountSupport", serialize = "with_mount")]
    UseMountSupport,
}

impl OptionKey {
    /// Value used when the option is not requested
    pub fn default_value(&self) -> bool {
        match self {
            Self::Shared => false,
            Self::PositionIndependentCode
            | Self::UseExternalRegexEngine
            | Self::UseElfSupport
            | Self::UseSELinux
            | Self::UseMountSupport => true,
        }
    }
}

/// A requested option value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Text(String),
}

impl OptionValue {
    fn as_bool(&self, key: OptionKey) -> Result<bool> {
        match self {
            Self::Bool(b) => Ok(*b),
            Self::Text(s) => match s.trim().to_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => Ok(true),
                "false" | "0" | "no" | "off" => Ok(false),
                _ => Err(Error::ParseError(format!(
                    "Invalid value '{}' for option {} (expected true or false)",
                    s, key
                ))),
            },
        }
    }
}

impl From<bool> for OptionValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// Options as requested by the user, keyed by name
pub type RequestedOptions = BTreeMap<String, OptionValue>;

/// Parse a `name=value` pair as given on the command line
pub fn parse_assignment(s: &str) -> Result<(String, OptionValue)> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| Error::ParseError(format!("Expected name=value, got '{}'", s)))?;
    Ok((
        name.trim().to_string(),
        OptionValue::Text(value.trim().to_string()),
    ))
}

/// Rewrite option names to their canonical spelling
///
/// Aliases such as `fPIC` become `positionIndependentCode`. Unknown names
/// pass through untouched so `normalize` can report them. Two spellings of
/// the same option in one request are a `ConfigurationError`.
pub fn canonicalize(requested: &RequestedOptions) -> Result<RequestedOptions> {
    let mut spelled: BTreeMap<String, &str> = BTreeMap::new();
    let mut canonical = RequestedOptions::new();

    for (name, value) in requested {
        let key = OptionKey::from_str(name)
            .map(|k| k.to_string())
            .unwrap_or_else(|_| name.clone());
        if let Some(previous) = spelled.insert(key.clone(), name) {
            return Err(Error::ConfigurationError(format!(
                "option {} given twice (as '{}' and '{}')",
                key, previous, name
            )));
        }
        canonical.insert(key, value.clone());
    }

    Ok(canonical)
}

/// An option that may not exist on the target platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PlatformOption<T> {
    Applicable(T),
    Inapplicable,
}

impl<T: Copy> PlatformOption<T> {
    pub fn is_applicable(&self) -> bool {
        matches!(self, Self::Applicable(_))
    }

    pub fn value(&self) -> Option<T> {
        match self {
            Self::Applicable(v) => Some(*v),
            Self::Inapplicable => None,
        }
    }
}

/// Normalized options for one platform
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OptionSet {
    shared: bool,
    position_independent_code: PlatformOption<bool>,
    use_external_regex_engine: bool,
    use_elf_support: bool,
    use_selinux: PlatformOption<bool>,
    use_mount_support: PlatformOption<bool>,
}

impl OptionSet {
    fn slot(&self, key: OptionKey) -> PlatformOption<bool> {
        match key {
            OptionKey::Shared => PlatformOption::Applicable(self.shared),
            OptionKey::PositionIndependentCode => self.position_independent_code,
            OptionKey::UseExternalRegexEngine => {
                PlatformOption::Applicable(self.use_external_regex_engine)
            }
            OptionKey::UseElfSupport => PlatformOption::Applicable(self.use_elf_support),
            OptionKey::UseSELinux => self.use_selinux,
            OptionKey::UseMountSupport => self.use_mount_support,
        }
    }

    /// Whether the option exists for this platform
    pub fn contains(&self, key: OptionKey) -> bool {
        self.slot(key).is_applicable()
    }

    /// Read an option; reading one removed for the platform is a bug
    pub fn get(&self, key: OptionKey) -> Result<bool> {
        self.slot(key).value().ok_or_else(|| {
            Error::ConfigurationError(format!(
                "option {} was removed for this platform and must not be read",
                key
            ))
        })
    }

    /// True only when the option exists and is set
    pub fn enabled(&self, key: OptionKey) -> bool {
        self.slot(key).value().unwrap_or(false)
    }

    /// Present keys in declaration order
    pub fn keys(&self) -> Vec<OptionKey> {
        OptionKey::iter().filter(|k| self.contains(*k)).collect()
    }

    /// Present options as a name/value map
    pub fn to_map(&self) -> BTreeMap<String, bool> {
        OptionKey::iter()
            .filter_map(|k| self.slot(k).value().map(|v| (k.to_string(), v)))
            .collect()
    }
}

impl Serialize for OptionSet {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_map().serialize(serializer)
    }
}

/// Fill defaults and drop options that do not apply to the platform
pub fn normalize(descriptor: &PlatformDescriptor, requested: &RequestedOptions) -> Result<OptionSet> {
    let mut values: BTreeMap<OptionKey, bool> =
        OptionKey::iter().map(|k| (k, k.default_value())).collect();

    for (name, value) in &canonicalize(requested)? {
        let key = OptionKey::from_str(name).map_err(|_| Error::UnknownOptionError(name.clone()))?;
        values.insert(key, value.as_bool(key)?);
    }

    let value = |key: OptionKey| values.get(&key).copied().unwrap_or(key.default_value());
    let only_if = |applies: bool, key: OptionKey| {
        if applies {
            PlatformOption::Applicable(value(key))
        } else {
            PlatformOption::Inapplicable
        }
    };

    Ok(OptionSet {
        shared: value(OptionKey::Shared),
        position_independent_code: only_if(
            !descriptor.is_windows(),
            OptionKey::PositionIndependentCode,
        ),
        use_external_regex_engine: value(OptionKey::UseExternalRegexEngine),
        use_elf_support: value(OptionKey::UseElfSupport),
        use_selinux: only_if(descriptor.is_linux(), OptionKey::UseSELinux),
        use_mount_support: only_if(descriptor.is_linux(), OptionKey::UseMountSupport),
    })
}
