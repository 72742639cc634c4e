// src/resolver/metadata.rs

//! Consumer-facing package metadata
//!
//! Everything here follows from the platform and options alone; the
//! installed files are never inspected.

use crate::error::Result;
use crate::platform::{OperatingSystem, PlatformDescriptor};
use crate::resolver::options::OptionSet;
use serde::{Deserialize, Serialize};

/// Libraries in link order
pub const LIBRARY_NAMES: [&str; 5] = [
    "gio-2.0",
    "gmodule-2.0",
    "gobject-2.0",
    "gthread-2.0",
    "glib-2.0",
];

/// Header search paths relative to the package root
pub const INCLUDE_DIRECTORIES: [&str; 3] = ["include", "include/glib-2.0", "lib/glib-2.0/include"];

const WINDOWS_SYSTEM_LIBS: [&str; 5] = ["ws2_32", "ole32", "shell32", "user32", "advapi32"];
const APPLE_FRAMEWORKS: [&str; 3] = ["Foundation", "CoreServices", "CoreFoundation"];

/// What a consumer needs to compile and link against the package
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PackageMetadata {
    pub library_names: Vec<String>,
    pub include_directories: Vec<String>,
    pub system_libraries: Vec<String>,
    pub frameworks: Vec<String>,
    pub exe_link_flags: Vec<String>,
    pub shared_link_flags: Vec<String>,
    pub bin_directories: Vec<String>,
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Derive package metadata for a platform
pub fn derive_metadata(descriptor: &PlatformDescriptor, _options: &OptionSet) -> Result<PackageMetadata> {
    let system_libraries = match descriptor.os {
        OperatingSystem::Linux => owned(&["pthread"]),
        OperatingSystem::Windows => owned(&WINDOWS_SYSTEM_LIBS),
        OperatingSystem::Macos => owned(&["iconv"]),
        OperatingSystem::Other => Vec::new(),
    };

    let frameworks = if descriptor.is_apple() {
        owned(&APPLE_FRAMEWORKS)
    } else {
        Vec::new()
    };

    let link_flags: Vec<String> = frameworks
        .iter()
        .flat_map(|name| ["-framework".to_string(), name.clone()])
        .collect();

    Ok(PackageMetadata {
        library_names: owned(&LIBRARY_NAMES),
        include_directories: owned(&INCLUDE_DIRECTORIES),
        system_libraries,
        frameworks,
        exe_link_flags: link_flags.clone(),
        shared_link_flags: link_flags,
        bin_directories: owned(&["bin"]),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{Architecture, CompilerFamily};
    use crate::resolver::options::{normalize, RequestedOptions};

    fn metadata(os: OperatingSystem, compiler: CompilerFamily) -> PackageMetadata {
        let desc = PlatformDescriptor::new(os, Architecture::X86_64, compiler);
        let options = normalize(&desc, &RequestedOptions::new()).unwrap();
        derive_metadata(&desc, &options).unwrap()
    }

    #[test]
    fn test_common_fields() {
        let meta = metadata(OperatingSystem::Linux, CompilerFamily::Gcc);
        assert_eq!(meta.library_names, LIBRARY_NAMES.to_vec());
        assert_eq!(meta.include_directories, INCLUDE_DIRECTORIES.to_vec());
        assert_eq!(meta.bin_directories, vec!["bin"]);
        assert_eq!(meta.system_libraries, vec!["pthread"]);
        assert!(meta.frameworks.is_empty());
        assert!(meta.exe_link_flags.is_empty());
    }

    #[test]
    fn test_windows_system_libraries() {
        let meta = metadata(OperatingSystem::Windows, CompilerFamily::Msvc);
        assert_eq!(
            meta.system_libraries,
            vec!["ws2_32", "ole32", "shell32", "user32", "advapi32"]
        );
    }

    #[test]
    fn test_apple_frameworks() {
        let meta = metadata(OperatingSystem::Macos, CompilerFamily::Clang);
        assert_eq!(meta.system_libraries, vec!["iconv"]);
        assert_eq!(
            meta.frameworks,
            vec!["Foundation", "CoreServices", "CoreFoundation"]
        );
        assert_eq!(
            meta.exe_link_flags,
            vec![
                "-framework",
                "Foundation",
                "-framework",
                "CoreServices",
                "-framework",
                "CoreFoundation"
            ]
        );
        assert_eq!(meta.exe_link_flags, meta.shared_link_flags);
    }

    #[test]
    fn test_other_os_has_no_system_libs() {
        let meta = metadata(OperatingSystem::Other, CompilerFamily::Other);
        assert!(meta.system_libraries.is_empty());
        assert_eq!(meta.library_names.len(), 5);
    }
}
