// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.

#![allow(dead_code)]

use flate2::write::GzEncoder;
use flate2::Compression;
use glib_recipe::hash::{hash_bytes, HashAlgorithm};
use glib_recipe::platform::{Architecture, CompilerFamily, OperatingSystem, PlatformDescriptor};
use glib_recipe::recipe::kitchen::{BuildContext, BuildDriver, BuildPhase};
use glib_recipe::resolver::{BuildSystem, OptionValue, RequestedOptions};
use glib_recipe::Result;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Files of a minimal glib source tree that the meson plan edits
pub const SOURCE_FILES: &[(&str, &str)] = &[
    (
        "meson.build",
        "project('glib', 'c')\nlibintl = cc.find_library('intl', required : false)\nsubdir('tests')\n",
    ),
    ("glib/meson.build", "glib_sources = []\nsubdir('tests')\n"),
    ("gobject/meson.build", "gobject_sources = []\nsubdir('tests')\n"),
    ("gio/meson.build", "gio_sources = []\nsubdir('tests')\n"),
    ("glib/glib.h", "#define GLIB_PATCHED 0\n"),
    ("COPYING", "GNU LESSER GENERAL PUBLIC LICENSE\n"),
];

pub fn platform(os: OperatingSystem, arch: Architecture, compiler: CompilerFamily) -> PlatformDescriptor {
    PlatformDescriptor::new(os, arch, compiler)
}

pub fn linux() -> PlatformDescriptor {
    platform(OperatingSystem::Linux, Architecture::X86_64, CompilerFamily::Gcc)
}

/// Every platform combination the resolver knows about
pub fn all_platforms() -> Vec<PlatformDescriptor> {
    let mut platforms = Vec::new();
    for os in [
        OperatingSystem::Linux,
        OperatingSystem::Windows,
        OperatingSystem::Macos,
        OperatingSystem::Other,
    ] {
        for arch in [Architecture::X86, Architecture::X86_64, Architecture::Other] {
            for compiler in [
                CompilerFamily::Gcc,
                CompilerFamily::Clang,
                CompilerFamily::Msvc,
                CompilerFamily::Other,
            ] {
                platforms.push(platform(os, arch, compiler));
            }
        }
    }
    platforms
}

pub fn request(pairs: &[(&str, bool)]) -> RequestedOptions {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), OptionValue::Bool(*v)))
        .collect()
}

/// Write `glib-2.64.0.tar.gz` holding `SOURCE_FILES` and return its path
/// and `sha256:` checksum
pub fn glib_tarball(dir: &Path) -> (PathBuf, String) {
    let path = dir.join("glib-2.64.0.tar.gz");
    let file = fs::File::create(&path).unwrap();
    let encoder = GzEncoder::new(file, Compression::default());
    let mut builder = tar::Builder::new(encoder);

    for (name, contents) in SOURCE_FILES {
        let mut header = tar::Header::new_gnu();
        header.set_size(contents.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, format!("glib-2.64.0/{}", name), contents.as_bytes())
            .unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap();

    let bytes = fs::read(&path).unwrap();
    let checksum = format!("sha256:{}", hash_bytes(HashAlgorithm::Sha256, &bytes));
    (path, checksum)
}

/// A meson recipe pointing at a local archive
pub fn local_recipe(archive: &Path, checksum: &str) -> String {
    format!(
        r#"
[package]
name = "glib"
version = "2.64.0"
summary = "GLib core application building blocks"
license = "LGPL-2.1"

[source]
archive = '{}'
checksum = "{}"

[build]
system = "meson"
tool_version = "0.53.2"
iconv = "native"
jobs = 2
"#,
        archive.display(),
        checksum
    )
}

/// Driver that records phases instead of running tools
///
/// The first phase snapshots `SOURCE_FILES` as the build sees them. The
/// install phase drops a static library into the prefix so output renames
/// have something to act on.
#[derive(Default)]
pub struct RecordingDriver {
    pub phases: Mutex<Vec<BuildPhase>>,
    pub sources: Mutex<BTreeMap<String, String>>,
}

impl RecordingDriver {
    pub fn phases(&self) -> Vec<BuildPhase> {
        self.phases.lock().unwrap().clone()
    }

    /// Content of a source file when the build started
    pub fn source(&self, name: &str) -> String {
        self.sources.lock().unwrap()[name].clone()
    }
}

impl BuildDriver for RecordingDriver {
    fn locate(&self, system: BuildSystem) -> Result<PathBuf> {
        Ok(PathBuf::from("/usr/bin").join(system.tool()))
    }

    fn run(&self, phase: BuildPhase, ctx: &BuildContext<'_>) -> Result<String> {
        let mut phases = self.phases.lock().unwrap();
        if phases.is_empty() {
            let mut sources = self.sources.lock().unwrap();
            for (name, _) in SOURCE_FILES {
                if let Ok(content) = fs::read_to_string(ctx.source_dir.join(name)) {
                    sources.insert(name.to_string(), content);
                }
            }
        }
        phases.push(phase);

        if phase == BuildPhase::Install {
            let lib = ctx.prefix.join("lib");
            fs::create_dir_all(&lib)?;
            fs::write(lib.join("libglib-2.0.a"), b"!<arch>\n")?;
        }
        Ok(format!("{} ok", phase))
    }
}
