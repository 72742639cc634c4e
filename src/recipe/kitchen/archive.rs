// src/recipe/kitchen/archive.rs

//! Source archive retrieval and extraction for the Kitchen

use crate::error::{Error, Result};
use crate::hash::Checksum;
use flate2::read::GzDecoder;
use reqwest::blocking::Client;
use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tar::Archive;
use tracing::{debug, info, warn};
use xz2::read::XzDecoder;

use super::collaborators::SourceFetcher;

/// Timeout for a single source download
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(300);

/// Download a file from a URL
///
/// Not retried; a failed download is reported as-is.
pub fn download_file(url: &str, dest: &Path) -> Result<()> {
    let client = Client::builder()
        .timeout(DOWNLOAD_TIMEOUT)
        .user_agent(concat!("glib-recipe/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| Error::FetchError(format!("Failed to create HTTP client: {}", e)))?;

    let mut response = client
        .get(url)
        .send()
        .map_err(|e| Error::FetchError(format!("Failed to fetch {}: {}", url, e)))?;

    if !response.status().is_success() {
        return Err(Error::FetchError(format!(
            "HTTP {} from {}",
            response.status(),
            url
        )));
    }

    let mut file = File::create(dest)
        .map_err(|e| Error::IoError(format!("Failed to create file {}: {}", dest.display(), e)))?;
    io::copy(&mut response, &mut file)
        .map_err(|e| Error::FetchError(format!("Failed to write downloaded data: {}", e)))?;

    Ok(())
}

fn is_remote(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

fn file_name(location: &str) -> &str {
    location
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or("source.tar.gz")
}

/// Extract an archive to a destination directory
///
/// Supports: .tar.gz, .tgz, .tar.xz, .txz, .tar
pub fn extract_archive(archive: &Path, dest: &Path) -> Result<()> {
    let filename = archive
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");

    let file = File::open(archive)
        .map_err(|e| Error::FetchError(format!("Failed to open {}: {}", archive.display(), e)))?;
    let file = BufReader::new(file);

    let reader: Box<dyn Read> = if filename.ends_with(".tar.gz") || filename.ends_with(".tgz") {
        Box::new(GzDecoder::new(file))
    } else if filename.ends_with(".tar.xz") || filename.ends_with(".txz") {
        Box::new(XzDecoder::new(file))
    } else if filename.ends_with(".tar") {
        Box::new(file)
    } else {
        return Err(Error::FetchError(format!(
            "Unknown archive format: {}",
            filename
        )));
    };

    fs::create_dir_all(dest)?;
    Archive::new(reader).unpack(dest).map_err(|e| {
        Error::FetchError(format!("Failed to extract {}: {}", archive.display(), e))
    })?;

    Ok(())
}

/// The source root inside an extraction directory
///
/// Release tarballs wrap everything in a single `name-version/` directory;
/// that directory is the root. Otherwise the extraction directory is.
pub fn source_root(extracted: &Path) -> Result<PathBuf> {
    let entries: Vec<_> = fs::read_dir(extracted)?.filter_map(|e| e.ok()).collect();

    if entries.len() == 1 && entries[0].file_type().map(|t| t.is_dir()).unwrap_or(false) {
        return Ok(entries[0].path());
    }
    Ok(extracted.to_path_buf())
}

/// Fetches archives over HTTP(S) or from the local filesystem
///
/// Remote archives with a checksum are cached under `source_cache` by
/// checksum, so a second fetch of the same source is offline.
#[derive(Debug, Clone)]
pub struct ArchiveFetcher {
    source_cache: PathBuf,
}

impl ArchiveFetcher {
    pub fn new(source_cache: impl Into<PathBuf>) -> Self {
        Self {
            source_cache: source_cache.into(),
        }
    }

    /// Where a remote archive with this checksum is cached
    pub fn cached_path(&self, url: &str, checksum: &Checksum) -> PathBuf {
        self.source_cache
            .join(format!("{}-{}", checksum.cache_key(), file_name(url)))
    }

    /// Download (or reuse) a remote archive
    fn download(&self, url: &str, checksum: Option<&Checksum>) -> Result<PathBuf> {
        fs::create_dir_all(&self.source_cache)?;

        let Some(checksum) = checksum else {
            warn!("No checksum for {}, downloading without verification", url);
            let path = self.source_cache.join(file_name(url));
            download_file(url, &path)?;
            return Ok(path);
        };

        let cached_path = self.cached_path(url, checksum);
        if cached_path.exists() {
            debug!("Using cached source: {}", cached_path.display());
            match checksum.verify_file(&cached_path) {
                Ok(()) => return Ok(cached_path),
                Err(e) => {
                    warn!("Cached source is stale ({}), re-downloading", e);
                    fs::remove_file(&cached_path)?;
                }
            }
        }

        info!("Downloading: {}", url);
        let temp_path = cached_path.with_extension("tmp");
        download_file(url, &temp_path)?;

        if let Err(e) = checksum.verify_file(&temp_path) {
            fs::remove_file(&temp_path)?;
            return Err(e);
        }

        fs::rename(&temp_path, &cached_path)?;
        Ok(cached_path)
    }
}

impl SourceFetcher for ArchiveFetcher {
    fn fetch(&self, location: &str, checksum: Option<&Checksum>, dest: &Path) -> Result<PathBuf> {
        let archive = if is_remote(location) {
            self.download(location, checksum)?
        } else {
            let path = PathBuf::from(location);
            if !path.is_file() {
                return Err(Error::FetchError(format!(
                    "Source archive not found: {}",
                    path.display()
                )));
            }
            if let Some(checksum) = checksum {
                checksum.verify_file(&path)?;
            }
            path
        };

        extract_archive(&archive, dest)?;
        let root = source_root(dest)?;
        debug!("Source directory: {}", root.display());
        Ok(root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::{hash_bytes, HashAlgorithm};
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use tempfile::TempDir;

    fn write_tarball(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        let file = File::create(&path).unwrap();
        let encoder = GzEncoder::new(file, Compression::default());
        let mut builder = tar::Builder::new(encoder);

        let data = b"project('glib', 'c')\nsubdir('tests')\n";
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, "glib-2.64.0/meson.build", &data[..])
            .unwrap();
        builder.into_inner().unwrap().finish().unwrap();
        path
    }

    #[test]
    fn test_extract_archive_unknown_format() {
        let dir = TempDir::new().unwrap();
        let bogus = dir.path().join("file.unknown");
        fs::write(&bogus, b"nope").unwrap();
        assert!(matches!(
            extract_archive(&bogus, dir.path()),
            Err(Error::FetchError(_))
        ));
    }

    #[test]
    fn test_fetch_local_strips_top_directory() {
        let dir = TempDir::new().unwrap();
        let tarball = write_tarball(dir.path(), "glib-2.64.0.tar.gz");
        let checksum = Checksum::parse(&format!(
            "sha256:{}",
            hash_bytes(HashAlgorithm::Sha256, &fs::read(&tarball).unwrap())
        ))
        .unwrap();

        let fetcher = ArchiveFetcher::new(dir.path().join("cache"));
        let dest = dir.path().join("src");
        let root = fetcher
            .fetch(tarball.to_str().unwrap(), Some(&checksum), &dest)
            .unwrap();

        assert_eq!(root, dest.join("glib-2.64.0"));
        assert!(root.join("meson.build").exists());
    }

    #[test]
    fn test_fetch_local_checksum_mismatch() {
        let dir = TempDir::new().unwrap();
        let tarball = write_tarball(dir.path(), "glib.tar.gz");
        let wrong = Checksum::parse(&format!("sha256:{}", "0".repeat(64))).unwrap();

        let fetcher = ArchiveFetcher::new(dir.path().join("cache"));
        let result = fetcher.fetch(tarball.to_str().unwrap(), Some(&wrong), &dir.path().join("src"));
        assert!(matches!(result, Err(Error::ChecksumMismatch { .. })));
    }

    #[test]
    fn test_fetch_missing_local_archive() {
        let dir = TempDir::new().unwrap();
        let fetcher = ArchiveFetcher::new(dir.path().join("cache"));
        let result = fetcher.fetch("/nonexistent/glib.tar.xz", None, &dir.path().join("src"));
        assert!(matches!(result, Err(Error::FetchError(_))));
    }

    #[test]
    fn test_cached_path_uses_checksum() {
        let fetcher = ArchiveFetcher::new("/var/cache/sources");
        let checksum = Checksum::parse(&format!("xxh128:{}", "a".repeat(32))).unwrap();
        let path = fetcher.cached_path("https://example.com/glib-2.64.0.tar.xz", &checksum);
        assert_eq!(
            path,
            PathBuf::from(format!(
                "/var/cache/sources/xxh128_{}-glib-2.64.0.tar.xz",
                "a".repeat(32)
            ))
        );
    }
}
