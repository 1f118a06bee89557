//! Content integrity of downloaded packages.
//!
//! The manifest announces the expected package hash as hex text, optionally prefixed with
//! the algorithm name (`sha256:ab12...`). [`IntegrityChecker::verify`] recomputes the
//! digest of the file on disk and compares case-insensitively.

use super::digest::DigestAlgorithm;
use crate::core::UpkeepError;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::debug;

/// Recomputes and compares file digests.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntegrityChecker {
    algorithm: DigestAlgorithm,
}

impl IntegrityChecker {
    pub const fn new(algorithm: DigestAlgorithm) -> Self {
        Self {
            algorithm,
        }
    }

    pub const fn algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }

    /// Lowercase hex digest of the file at `path`.
    pub fn compute(&self, path: &Path) -> Result<String> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open {} for hashing", path.display()))?;
        let digest = self
            .algorithm
            .digest_reader(BufReader::new(file))
            .with_context(|| format!("Failed to read {} for hashing", path.display()))?;
        Ok(hex::encode(digest))
    }

    /// Whether the file's digest equals `expected`.
    ///
    /// An empty expectation or a prefix naming another algorithm is a mismatch; only an
    /// unreadable file is an error.
    pub fn verify(&self, path: &Path, expected: &str) -> Result<bool> {
        let Some(expected_hex) = self.strip_prefix(expected.trim()) else {
            return Ok(false);
        };
        if expected_hex.is_empty() {
            return Ok(false);
        }
        Ok(self.compute(path)?.eq_ignore_ascii_case(expected_hex))
    }

    /// Like [`verify`](Self::verify) but reports the mismatch as a typed error.
    pub fn check(&self, path: &Path, expected: &str) -> Result<(), UpkeepError> {
        let expected_hex = match self.strip_prefix(expected.trim()) {
            Some(hex) if !hex.is_empty() => hex.to_ascii_lowercase(),
            _ => {
                return Err(UpkeepError::IntegrityMismatch {
                    path: path.display().to_string(),
                    expected: expected.to_string(),
                    actual: String::new(),
                });
            }
        };

        let actual = self.compute(path).map_err(|e| {
            debug!("Hashing {} failed: {:#}", path.display(), e);
            UpkeepError::IntegrityMismatch {
                path: path.display().to_string(),
                expected: expected_hex.clone(),
                actual: String::new(),
            }
        })?;

        if actual == expected_hex {
            Ok(())
        } else {
            Err(UpkeepError::IntegrityMismatch {
                path: path.display().to_string(),
                expected: expected_hex,
                actual,
            })
        }
    }

    fn strip_prefix<'a>(&self, expected: &'a str) -> Option<&'a str> {
        match expected.split_once(':') {
            Some((algo, hex)) => {
                let named = algo.parse::<DigestAlgorithm>().ok()?;
                (named == self.algorithm).then_some(hex)
            }
            None => Some(expected),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const HELLO_SHA256: &str = "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9";

    fn fixture() -> (TempDir, std::path::PathBuf) {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("package.zip");
        std::fs::write(&path, b"hello world").unwrap();
        (temp, path)
    }

    #[test]
    fn test_compute_is_lowercase_hex() {
        let (_temp, path) = fixture();
        assert_eq!(IntegrityChecker::default().compute(&path).unwrap(), HELLO_SHA256);
    }

    #[test]
    fn test_verify_is_case_insensitive() {
        let (_temp, path) = fixture();
        let checker = IntegrityChecker::default();
        assert!(checker.verify(&path, HELLO_SHA256).unwrap());
        assert!(checker.verify(&path, &HELLO_SHA256.to_uppercase()).unwrap());
        assert!(checker.verify(&path, &format!("sha256:{HELLO_SHA256}")).unwrap());
    }

    #[test]
    fn test_verify_mismatches() {
        let (_temp, path) = fixture();
        let checker = IntegrityChecker::default();

        assert!(!checker.verify(&path, "").unwrap());
        assert!(!checker.verify(&path, &HELLO_SHA256[..60]).unwrap());
        assert!(!checker.verify(&path, &format!("sha512:{HELLO_SHA256}")).unwrap());
        assert!(checker.verify(&path.with_extension("missing"), HELLO_SHA256).is_err());
        assert!(checker.check(&path.with_extension("missing"), HELLO_SHA256).is_err());

        match checker.check(&path, "00") {
            Err(UpkeepError::IntegrityMismatch {
                actual,
                ..
            }) => assert_eq!(actual, HELLO_SHA256),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_sha512_checker() {
        let (_temp, path) = fixture();
        let checker = IntegrityChecker::new(DigestAlgorithm::Sha512);
        let expected = DigestAlgorithm::Sha512.hex_digest(b"hello world");
        assert_eq!(expected.len(), 128);
        assert!(checker.verify(&path, &expected).unwrap());
        assert!(!checker.verify(&path, HELLO_SHA256).unwrap());
    }
}
