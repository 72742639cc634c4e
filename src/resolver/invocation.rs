// src/resolver/invocation.rs

//! Invocation planning
//!
//! Turns normalized options into everything the external build tool needs:
//! option definitions, edits to make to the source tree before configuring,
//! commands to run before configure, and renames to perform on the installed
//! output. The plan is data only; the kitchen carries it out.

use crate::error::Result;
use crate::platform::{Architecture, PlatformDescriptor};
use crate::resolver::config::{BuildSystem, IconvMode, ResolverConfig};
use crate::resolver::options::{OptionKey, OptionSet};
use serde::Serialize;
use std::collections::BTreeMap;

/// Flag categories that receive compiler architecture flags
pub const ARCH_FLAG_CATEGORIES: [&str; 4] = ["c_args", "cpp_args", "c_link_args", "cpp_link_args"];

/// Flag categories that receive MSVC machine flags
pub const LINK_FLAG_CATEGORIES: [&str; 2] = ["c_link_args", "cpp_link_args"];

/// Build files whose `subdir('tests')` is switched off
pub const TEST_DIRECTIVE_FILES: [&str; 4] = [
    "meson.build",
    "glib/meson.build",
    "gobject/meson.build",
    "gio/meson.build",
];

const TEST_DIRECTIVE: &str = "subdir('tests')";
const INTL_LOOKUP: &str = "cc.find_library('intl', required : false)";
const INTL_SHIM_LOOKUP: &str = "cc.find_library('gnuintl', required : false)";

/// A value passed to the build tool for one option
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum DefinitionValue {
    Bool(bool),
    Text(String),
    List(Vec<String>),
}

impl DefinitionValue {
    /// Render as the right-hand side of `-Dname=value`
    pub fn render(&self) -> String {
        match self {
            Self::Bool(b) => b.to_string(),
            Self::Text(s) => s.clone(),
            Self::List(items) => items.join(","),
        }
    }
}

/// An edit made to the extracted source tree before configuring
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceEdit {
    /// Replace every occurrence of `search`; the pattern must be present
    Replace {
        file: String,
        search: String,
        replacement: String,
    },
    /// Write a file, replacing any existing content
    Create { file: String, contents: String },
}

impl SourceEdit {
    pub fn replace(file: &str, search: &str, replacement: &str) -> Self {
        Self::Replace {
            file: file.to_string(),
            search: search.to_string(),
            replacement: replacement.to_string(),
        }
    }

    pub fn create(file: &str, contents: &str) -> Self {
        Self::Create {
            file: file.to_string(),
            contents: contents.to_string(),
        }
    }

    /// Source-relative path this edit touches
    pub fn file(&self) -> &str {
        match self {
            Self::Replace { file, .. } | Self::Create { file, .. } => file,
        }
    }
}

/// Renames installed files from one naming convention to another
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct OutputRename {
    /// Directory relative to the package root
    pub directory: String,
    pub strip_prefix: String,
    pub from_extension: String,
    pub to_extension: String,
}

impl OutputRename {
    /// Glob pattern matching the files to rename, relative to the package root
    pub fn pattern(&self) -> String {
        format!(
            "{}/{}*{}",
            self.directory, self.strip_prefix, self.from_extension
        )
    }

    /// New file name for `file_name`, if it follows the old convention
    pub fn target_name(&self, file_name: &str) -> Option<String> {
        let stem = file_name
            .strip_prefix(&self.strip_prefix)?
            .strip_suffix(&self.from_extension)?;
        if stem.is_empty() {
            return None;
        }
        Some(format!("{}{}", stem, self.to_extension))
    }
}

/// Everything needed to drive the external build tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvocationPlan {
    pub build_system: BuildSystem,
    pub definitions: BTreeMap<String, DefinitionValue>,
    pub patch_operations: Vec<SourceEdit>,
    pub source_rewrites: Vec<SourceEdit>,
    pub output_renames: Vec<OutputRename>,
    /// Commands run in the source tree before configure
    pub pre_configure: Vec<Vec<String>>,
}

impl InvocationPlan {
    /// Source edits in application order
    pub fn source_edits(&self) -> impl Iterator<Item = &SourceEdit> {
        self.patch_operations.iter().chain(self.source_rewrites.iter())
    }

    fn definition(&self, name: &str) -> Option<&DefinitionValue> {
        self.definitions.get(name)
    }

    /// Arguments for `meson setup`
    pub fn meson_args(&self) -> Vec<String> {
        let mut args = vec!["--wrap-mode=nofallback".to_string()];
        args.extend(
            self.definitions
                .iter()
                .map(|(name, value)| format!("-D{}={}", name, value.render())),
        );
        args
    }

    /// Arguments for `./configure`
    pub fn configure_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        match self.definition("default_library") {
            Some(DefinitionValue::Text(kind)) if kind == "shared" => {
                args.push("--enable-shared".to_string());
                args.push("--disable-static".to_string());
            }
            _ => {
                args.push("--enable-static".to_string());
                args.push("--disable-shared".to_string());
            }
        }

        if let Some(DefinitionValue::Bool(pic)) = self.definition("b_staticpic") {
            args.push(if *pic { "--with-pic" } else { "--without-pic" }.to_string());
        }

        if let Some(DefinitionValue::Bool(internal)) = self.definition("internal_pcre") {
            let source = if *internal { "internal" } else { "system" };
            args.push(format!("--with-pcre={}", source));
        }

        for feature in ["selinux", "libmount"] {
            if let Some(value) = self.definition(feature) {
                let on = matches!(value.render().as_str(), "true" | "enabled");
                let verb = if on { "enable" } else { "disable" };
                args.push(format!("--{}-{}", verb, feature));
            }
        }

        if matches!(self.definition("man"), Some(DefinitionValue::Bool(false))) {
            args.push("--disable-man".to_string());
        }
        if matches!(self.definition("gtk_doc"), Some(DefinitionValue::Bool(false))) {
            args.push("--disable-gtk-doc".to_string());
        }

        if let Some(DefinitionValue::Text(mode)) = self.definition("iconv") {
            let lib = if mode == IconvMode::Native.as_str() {
                "native"
            } else {
                "gnu"
            };
            args.push(format!("--with-libiconv={}", lib));
        }

        args
    }

    /// Compiler and linker flag environment for `./configure`
    pub fn configure_env(&self) -> Vec<(String, String)> {
        let joined = |names: &[&str]| -> Option<String> {
            let mut flags: Vec<String> = Vec::new();
            for name in names {
                if let Some(DefinitionValue::List(items)) = self.definition(name) {
                    for item in items {
                        if !flags.contains(item) {
                            flags.push(item.clone());
                        }
                    }
                }
            }
            (!flags.is_empty()).then(|| flags.join(" "))
        };

        [
            ("CFLAGS", joined(&["c_args"])),
            ("CXXFLAGS", joined(&["cpp_args"])),
            ("LDFLAGS", joined(&["c_link_args", "cpp_link_args"])),
        ]
        .into_iter()
        .filter_map(|(var, value)| value.map(|v| (var.to_string(), v)))
        .collect()
    }
}

/// Architecture flags for the compiler: (flag, categories)
fn arch_flags(descriptor: &PlatformDescriptor) -> Option<(&'static str, &'static [&'static str])> {
    if descriptor.compiler.is_gcc_like() {
        match descriptor.arch {
            Architecture::X86 => Some(("-m32", &ARCH_FLAG_CATEGORIES[..])),
            Architecture::X86_64 => Some(("-m64", &ARCH_FLAG_CATEGORIES[..])),
            Architecture::Other => None,
        }
    } else if descriptor.is_msvc() {
        match descriptor.arch {
            Architecture::X86 => Some(("/MACHINE:X86", &LINK_FLAG_CATEGORIES[..])),
            Architecture::X86_64 => Some(("/MACHINE:X64", &LINK_FLAG_CATEGORIES[..])),
            Architecture::Other => None,
        }
    } else {
        None
    }
}

/// Build the invocation plan for a platform and option set
pub fn build(
    descriptor: &PlatformDescriptor,
    options: &OptionSet,
    config: &ResolverConfig,
) -> Result<InvocationPlan> {
    let mut definitions = BTreeMap::new();
    let mut define = |name: &str, value: DefinitionValue| {
        definitions.insert(name.to_string(), value);
    };

    let shared = options.get(OptionKey::Shared)?;
    define(
        "default_library",
        DefinitionValue::Text(if shared { "shared" } else { "static" }.to_string()),
    );

    if options.contains(OptionKey::PositionIndependentCode) {
        define(
            "b_staticpic",
            DefinitionValue::Bool(options.get(OptionKey::PositionIndependentCode)?),
        );
    }

    define("man", DefinitionValue::Bool(false));
    define("gtk_doc", DefinitionValue::Bool(false));

    // Bundled pcre is used exactly when the external engine is not
    define(
        "internal_pcre",
        DefinitionValue::Bool(!options.get(OptionKey::UseExternalRegexEngine)?),
    );

    if descriptor.is_linux() {
        let encoding = config.flag_encoding;
        define(
            "selinux",
            DefinitionValue::Text(encoding.encode(options.get(OptionKey::UseSELinux)?).to_string()),
        );
        define(
            "libmount",
            DefinitionValue::Text(
                encoding
                    .encode(options.get(OptionKey::UseMountSupport)?)
                    .to_string(),
            ),
        );
    }

    if descriptor.is_apple() {
        define(
            "iconv",
            DefinitionValue::Text(config.require_iconv()?.as_str().to_string()),
        );
    }

    if let Some((flag, categories)) = arch_flags(descriptor) {
        for category in categories {
            define(*category, DefinitionValue::List(vec![flag.to_string()]));
        }
    }

    let (patch_operations, source_rewrites, pre_configure) = match config.build_system {
        BuildSystem::Meson => (
            TEST_DIRECTIVE_FILES
                .iter()
                .map(|file| SourceEdit::replace(file, TEST_DIRECTIVE, &format!("#{}", TEST_DIRECTIVE)))
                .collect(),
            vec![SourceEdit::replace("meson.build", INTL_LOOKUP, INTL_SHIM_LOOKUP)],
            Vec::new(),
        ),
        BuildSystem::Autotools => (
            vec![
                SourceEdit::create("gtk-doc.make", "EXTRA_DIST =\nCLEANFILES =\n"),
                SourceEdit::create("README", ""),
                SourceEdit::create("INSTALL", ""),
            ],
            Vec::new(),
            vec![
                ["autoreconf", "--force", "--install", "--verbose"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            ],
        ),
    };

    let mut output_renames = Vec::new();
    if descriptor.is_msvc() && !shared {
        output_renames.push(OutputRename {
            directory: "lib".to_string(),
            strip_prefix: "lib".to_string(),
            from_extension: ".a".to_string(),
            to_extension: ".lib".to_string(),
        });
    }

    Ok(InvocationPlan {
        build_system: config.build_system,
        definitions,
        patch_operations,
        source_rewrites,
        output_renames,
        pre_configure,
    })
}
