// src/hash.rs

//! Source checksums
//!
//! Recipes pin their source archive with a prefixed checksum string such as
//! `sha256:0f0b...`. Two algorithms are accepted:
//! - **SHA-256**: what upstream release announcements publish
//! - **XXH128**: fast, for locally produced tarballs and patch caches

use crate::error::{Error, Result};
use sha2::{Digest, Sha256};
use std::fmt;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;
use xxhash_rust::xxh3::Xxh3;

/// Hash algorithm selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HashAlgorithm {
    #[default]
    Sha256,
    Xxh128,
}

impl HashAlgorithm {
    /// Get the hash output length as a hex string
    #[inline]
    pub const fn hex_len(&self) -> usize {
        match self {
            Self::Sha256 => 64,
            Self::Xxh128 => 32,
        }
    }

    /// Get the algorithm name as used in checksum prefixes
    #[inline]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
            Self::Xxh128 => "xxh128",
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for HashAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "sha256" | "sha-256" => Ok(Self::Sha256),
            "xxh128" | "xxh3" => Ok(Self::Xxh128),
            _ => Err(Error::ParseError(format!(
                "Unsupported checksum algorithm: {} (supported: sha256, xxh128)",
                s
            ))),
        }
    }
}

/// A parsed `algorithm:hex` checksum
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Checksum {
    pub algorithm: HashAlgorithm,
    pub value: String,
}

impl Checksum {
    /// Parse a prefixed checksum string
    pub fn parse(s: &str) -> Result<Self> {
        let (algo, value) = s
            .split_once(':')
            .ok_or_else(|| Error::ParseError(format!("Invalid checksum format: {}", s)))?;
        let algorithm: HashAlgorithm = algo.parse()?;

        if value.len() != algorithm.hex_len() || !value.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Error::ParseError(format!(
                "Invalid {} checksum: expected {} hex characters",
                algorithm,
                algorithm.hex_len()
            )));
        }

        Ok(Self {
            algorithm,
            value: value.to_lowercase(),
        })
    }

    /// Cache-friendly file name for content with this checksum
    pub fn cache_key(&self) -> String {
        format!("{}_{}", self.algorithm, self.value)
    }

    /// Verify a file against this checksum
    pub fn verify_file(&self, path: &Path) -> Result<()> {
        let mut file = std::fs::File::open(path)
            .map_err(|e| Error::IoError(format!("Failed to open {}: {}", path.display(), e)))?;
        let actual = hash_reader(self.algorithm, &mut file)?;

        if actual == self.value {
            Ok(())
        } else {
            Err(Error::ChecksumMismatch {
                expected: self.to_string(),
                actual: format!("{}:{}", self.algorithm, actual),
            })
        }
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.value)
    }
}

/// Hasher that can compute hashes using any supported algorithm
pub struct Hasher {
    state: HasherState,
}

enum HasherState {
    Sha256(Sha256),
    Xxh128(Box<Xxh3>),
}

impl Hasher {
    pub fn new(algorithm: HashAlgorithm) -> Self {
        let state = match algorithm {
            HashAlgorithm::Sha256 => HasherState::Sha256(Sha256::new()),
            HashAlgorithm::Xxh128 => HasherState::Xxh128(Box::new(Xxh3::new())),
        };
        Self { state }
    }

    pub fn update(&mut self, data: &[u8]) {
        match &mut self.state {
            HasherState::Sha256(hasher) => hasher.update(data),
            HasherState::Xxh128(hasher) => hasher.update(data),
        }
    }

    /// Finalize and return the lowercase hex digest
    pub fn finalize(self) -> String {
        match self.state {
            HasherState::Sha256(hasher) => format!("{:x}", hasher.finalize()),
            HasherState::Xxh128(hasher) => format!("{:032x}", hasher.digest128()),
        }
    }
}

/// Compute the hex digest of a byte slice
pub fn hash_bytes(algorithm: HashAlgorithm, data: &[u8]) -> String {
    let mut hasher = Hasher::new(algorithm);
    hasher.update(data);
    hasher.finalize()
}

/// Compute the hex digest of data from a reader
pub fn hash_reader<R: Read>(algorithm: HashAlgorithm, reader: &mut R) -> Result<String> {
    let mut hasher = Hasher::new(algorithm);
    let mut buffer = [0u8; 8192];

    loop {
        let n = reader.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const HELLO_SHA256: &str = "dffd6021bb2bd5b0af676290809ec3a53191dd81c7f70a4b28688a362182986f";

    #[test]
    fn test_sha256_hash() {
        assert_eq!(hash_bytes(HashAlgorithm::Sha256, b"Hello, World!"), HELLO_SHA256);
    }

    #[test]
    fn test_xxh128_length() {
        assert_eq!(hash_bytes(HashAlgorithm::Xxh128, b"Hello, World!").len(), 32);
    }

    #[test]
    fn test_xxh128_streams_across_chunks() {
        let data: Vec<u8> = (0..100_000u32).map(|i| (i % 251) as u8).collect();
        let expected = format!("{:032x}", xxhash_rust::xxh3::xxh3_128(&data));

        let mut hasher = Hasher::new(HashAlgorithm::Xxh128);
        for chunk in data.chunks(8192) {
            hasher.update(chunk);
        }
        assert_eq!(hasher.finalize(), expected);
        assert_eq!(
            hash_reader(HashAlgorithm::Xxh128, &mut data.as_slice()).unwrap(),
            expected
        );
    }

    #[test]
    fn test_parse_checksum() {
        let checksum = Checksum::parse(&format!("sha256:{}", HELLO_SHA256.to_uppercase())).unwrap();
        assert_eq!(checksum.algorithm, HashAlgorithm::Sha256);
        assert_eq!(checksum.value, HELLO_SHA256);
        assert_eq!(checksum.cache_key(), format!("sha256_{}", HELLO_SHA256));
    }

    #[test]
    fn test_parse_checksum_rejects_bad_input() {
        assert!(Checksum::parse("nocolon").is_err());
        assert!(Checksum::parse("md5:abc").is_err());
        assert!(Checksum::parse("sha256:abc").is_err());
        assert!(Checksum::parse(&format!("sha256:{}", "z".repeat(64))).is_err());
    }

    #[test]
    fn test_verify_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"Hello, World!").unwrap();

        let good = Checksum::parse(&format!("sha256:{}", HELLO_SHA256)).unwrap();
        assert!(good.verify_file(file.path()).is_ok());

        let bad = Checksum::parse(&format!("sha256:{}", "0".repeat(64))).unwrap();
        match bad.verify_file(file.path()) {
            Err(Error::ChecksumMismatch { actual, .. }) => {
                assert_eq!(actual, format!("sha256:{}", HELLO_SHA256));
            }
            other => panic!("expected checksum mismatch, got {:?}", other),
        }
    }
}
