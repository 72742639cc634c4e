// src/platform/mod.rs
//! Target platform descriptors
//!
//! A `PlatformDescriptor` names the operating system, architecture and
//! compiler a recipe is resolved for. It is built once per invocation and
//! passed explicitly to every resolver stage; nothing in the resolver reads
//! the host environment. Only `PlatformDescriptor::detect` looks at the host,
//! and only the CLI calls it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::process::Command;
use tracing::debug;

/// Target operating system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperatingSystem {
    Linux,
    Windows,
    Macos,
    Other,
}

impl OperatingSystem {
    /// Map an OS name to a variant; unknown names become `Other`
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "linux" => Self::Linux,
            "windows" | "win32" | "win64" => Self::Windows,
            "macos" | "darwin" | "osx" | "macosx" => Self::Macos,
            _ => Self::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Linux => "linux",
            Self::Windows => "windows",
            Self::Macos => "macos",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for OperatingSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Target CPU architecture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Architecture {
    X86,
    X86_64,
    Other,
}

impl Architecture {
    /// Map an architecture name to a variant; unknown names become `Other`
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "x86" | "i386" | "i486" | "i586" | "i686" => Self::X86,
            "x86_64" | "amd64" | "x64" => Self::X86_64,
            _ => Self::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::X86 => "x86",
            Self::X86_64 => "x86_64",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compiler family used for the build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompilerFamily {
    Gcc,
    Clang,
    Msvc,
    Other,
}

impl CompilerFamily {
    /// Map a compiler name to a family; unknown names become `Other`
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "gcc" | "cc" | "g++" => Self::Gcc,
            "clang" | "apple-clang" | "clang++" => Self::Clang,
            "msvc" | "cl" | "visual studio" => Self::Msvc,
            _ => Self::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gcc => "gcc",
            Self::Clang => "clang",
            Self::Msvc => "msvc",
            Self::Other => "other",
        }
    }

    /// gcc and clang share the same flag vocabulary
    pub fn is_gcc_like(&self) -> bool {
        matches!(self, Self::Gcc | Self::Clang)
    }
}

impl fmt::Display for CompilerFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable description of the platform a recipe is resolved for
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlatformDescriptor {
    pub os: OperatingSystem,
    pub arch: Architecture,
    pub compiler: CompilerFamily,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compiler_version: Option<String>,
}

impl PlatformDescriptor {
    pub fn new(os: OperatingSystem, arch: Architecture, compiler: CompilerFamily) -> Self {
        Self {
            os,
            arch,
            compiler,
            compiler_version: None,
        }
    }

    /// Attach a compiler version
    pub fn with_compiler_version(mut self, version: impl Into<String>) -> Self {
        self.compiler_version = Some(version.into());
        self
    }

    pub fn is_linux(&self) -> bool {
        self.os == OperatingSystem::Linux
    }

    pub fn is_windows(&self) -> bool {
        self.os == OperatingSystem::Windows
    }

    pub fn is_apple(&self) -> bool {
        self.os == OperatingSystem::Macos
    }

    pub fn is_msvc(&self) -> bool {
        self.compiler == CompilerFamily::Msvc
    }

    /// Detect the host platform
    ///
    /// The compiler comes from `$CC` when set, otherwise from the first of
    /// `cl`, `clang`, `gcc` found on `PATH`.
    pub fn detect() -> Self {
        let os = OperatingSystem::from_name(std::env::consts::OS);
        let arch = Architecture::from_name(std::env::consts::ARCH);

        let compiler_cmd = std::env::var("CC").ok().or_else(|| {
            ["cl", "clang", "gcc"]
                .iter()
                .find(|tool| which::which(tool).is_ok())
                .map(|tool| tool.to_string())
        });

        let Some(cmd) = compiler_cmd else {
            debug!("No C compiler found on PATH");
            return Self::new(os, arch, CompilerFamily::Other);
        };

        let name = std::path::Path::new(&cmd)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&cmd)
            .to_string();
        let compiler = CompilerFamily::from_name(&name);

        let version = if compiler.is_gcc_like() {
            Command::new(&cmd)
                .arg("-dumpversion")
                .output()
                .ok()
                .filter(|o| o.status.success())
                .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
                .filter(|v| !v.is_empty())
        } else {
            None
        };

        debug!("Detected platform: {} {} {} {:?}", os, arch, compiler, version);

        Self {
            os,
            arch,
            compiler,
            compiler_version: version,
        }
    }
}

impl fmt::Display for PlatformDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.os, self.arch, self.compiler)?;
        if let Some(version) = &self.compiler_version {
            write!(f, "-{}", version)?;
        }
        Ok(())
    }
}
