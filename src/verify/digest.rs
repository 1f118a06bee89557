//! Pluggable one-way digests.
//!
//! Signature and integrity checks both hash their input first. The algorithm is a
//! configuration parameter so it can be upgraded without changing the shape of
//! either verification contract.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha512};
use std::fmt;
use std::io::Read;
use std::str::FromStr;

/// Supported digest algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestAlgorithm {
    /// SHA-256 (32 byte digest)
    #[default]
    Sha256,
    /// SHA-512 (64 byte digest)
    Sha512,
}

impl DigestAlgorithm {
    /// Canonical lowercase name, also used as the optional `"<name>:"` hash prefix.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
            Self::Sha512 => "sha512",
        }
    }

    /// Digest a complete buffer.
    pub fn digest(self, data: &[u8]) -> Vec<u8> {
        match self {
            Self::Sha256 => Sha256::digest(data).to_vec(),
            Self::Sha512 => Sha512::digest(data).to_vec(),
        }
    }

    /// Digest everything a reader yields, in 64 KiB chunks.
    pub fn digest_reader<R: Read>(self, reader: R) -> std::io::Result<Vec<u8>> {
        match self {
            Self::Sha256 => stream(Sha256::new(), reader),
            Self::Sha512 => stream(Sha512::new(), reader),
        }
    }

    /// Lowercase hex digest of a buffer.
    pub fn hex_digest(self, data: &[u8]) -> String {
        hex::encode(self.digest(data))
    }
}

fn stream<D: Digest, R: Read>(mut hasher: D, mut reader: R) -> std::io::Result<Vec<u8>> {
    let mut buffer = vec![0u8; 64 * 1024];
    loop {
        let read = reader.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }
    Ok(hasher.finalize().to_vec())
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DigestAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sha256" | "sha-256" => Ok(Self::Sha256),
            "sha512" | "sha-512" => Ok(Self::Sha512),
            other => Err(format!("unsupported digest algorithm '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_sha256() {
        assert_eq!(
            DigestAlgorithm::Sha256.hex_digest(b"hello world"),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn test_reader_matches_buffer() {
        let data = vec![0x5au8; 200_000];
        for algo in [DigestAlgorithm::Sha256, DigestAlgorithm::Sha512] {
            let streamed = algo.digest_reader(&data[..]).unwrap();
            assert_eq!(streamed, algo.digest(&data));
        }
    }

    #[test]
    fn test_digest_lengths() {
        assert_eq!(DigestAlgorithm::Sha256.digest(b"x").len(), 32);
        assert_eq!(DigestAlgorithm::Sha512.digest(b"x").len(), 64);
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("SHA-512".parse::<DigestAlgorithm>().unwrap(), DigestAlgorithm::Sha512);
        assert_eq!("sha256".parse::<DigestAlgorithm>().unwrap(), DigestAlgorithm::Sha256);
        assert!("md5".parse::<DigestAlgorithm>().is_err());
    }
}
