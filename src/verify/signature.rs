//! Detached manifest signatures.
//!
//! The client side only ever verifies: [`SignatureVerifier::verify`] hashes the data with
//! the configured [`DigestAlgorithm`] and checks an Ed25519 signature over that digest
//! against the compiled-in [`TRUSTED_PUBLIC_KEY`]. A `false` result is an expected
//! outcome, not an error, and callers must then drop the data unread.
//!
//! The publisher side uses [`sign_file`] (exposed as `upkeep sign`) to produce the
//! `<manifest>.sign` file distributed next to each manifest.

use super::digest::DigestAlgorithm;
use super::pubkey::TRUSTED_PUBLIC_KEY;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Length in bytes of a detached signature.
pub const SIGNATURE_LENGTH: usize = ed25519_dalek::SIGNATURE_LENGTH;

/// Verifies detached signatures against a trusted public key.
#[derive(Debug, Clone)]
pub struct SignatureVerifier {
    key: [u8; 32],
    algorithm: DigestAlgorithm,
}

impl Default for SignatureVerifier {
    fn default() -> Self {
        Self::new(DigestAlgorithm::default())
    }
}

impl SignatureVerifier {
    /// Verifier bound to the compiled-in trusted key.
    pub const fn new(algorithm: DigestAlgorithm) -> Self {
        Self {
            key: TRUSTED_PUBLIC_KEY,
            algorithm,
        }
    }

    /// Verifier bound to an explicit key, for tests and embedders shipping their own key.
    pub const fn with_key(key: [u8; 32], algorithm: DigestAlgorithm) -> Self {
        Self {
            key,
            algorithm,
        }
    }

    /// Digest algorithm applied before verification.
    pub const fn algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }

    /// Check `signature` over `digest(data)`.
    ///
    /// Never fails: malformed signatures, an undecodable key and mismatches all return
    /// `false`.
    pub fn verify(&self, data: &[u8], signature: &[u8]) -> bool {
        let Ok(key) = VerifyingKey::from_bytes(&self.key) else {
            warn!("Trusted update key could not be decoded");
            return false;
        };

        let Ok(signature) = Signature::from_slice(signature) else {
            debug!("Signature has invalid length {}", signature.len());
            return false;
        };

        let digest = self.algorithm.digest(data);
        key.verify_strict(&digest, &signature).is_ok()
    }
}

/// Sign `digest(data)` with `key`.
pub fn sign_bytes(data: &[u8], key: &SigningKey, algorithm: DigestAlgorithm) -> Vec<u8> {
    let digest = algorithm.digest(data);
    key.sign(&digest).to_bytes().to_vec()
}

/// Path of the detached signature belonging to `file` (`<file>.sign`).
pub fn signature_path(file: &Path) -> PathBuf {
    let mut name = file.as_os_str().to_os_string();
    name.push(crate::constants::SIGNATURE_SUFFIX);
    PathBuf::from(name)
}

/// Sign a manifest file with a private key read from disk.
///
/// The key file holds the hex encoded 32 byte Ed25519 seed. The signature is written to
/// `<file>.sign` and returned. With `emit_public_key` a `pubkey.rs` holding the matching
/// [`TRUSTED_PUBLIC_KEY`] constant is written next to the manifest, ready to be compiled
/// into the client.
///
/// This is a maintainer tool: any failure is logged and yields `None`.
pub fn sign_file(
    file: &Path,
    private_key: &Path,
    algorithm: DigestAlgorithm,
    emit_public_key: bool,
) -> Option<Vec<u8>> {
    let data = match fs::read(file) {
        Ok(data) => data,
        Err(e) => {
            warn!("Could not read {}: {}", file.display(), e);
            return None;
        }
    };

    let key = match load_signing_key(private_key) {
        Ok(key) => key,
        Err(reason) => {
            warn!("Could not load signing key {}: {}", private_key.display(), reason);
            return None;
        }
    };

    let signature = sign_bytes(&data, &key, algorithm);

    let sig_path = signature_path(file);
    if let Err(e) = fs::write(&sig_path, &signature) {
        warn!("Could not write {}: {}", sig_path.display(), e);
        return None;
    }
    info!("Wrote signature {}", sig_path.display());

    if emit_public_key {
        let dir = file.parent().unwrap_or_else(|| Path::new("."));
        let header = dir.join("pubkey.rs");
        if let Err(e) = fs::write(&header, render_public_key(&key.verifying_key())) {
            warn!("Could not write {}: {}", header.display(), e);
        } else {
            info!("Wrote public key {}", header.display());
        }
    }

    Some(signature)
}

fn load_signing_key(path: &Path) -> Result<SigningKey, String> {
    let text = fs::read_to_string(path).map_err(|e| e.to_string())?;
    let bytes = hex::decode(text.trim()).map_err(|e| e.to_string())?;
    let seed: [u8; 32] = bytes
        .try_into()
        .map_err(|v: Vec<u8>| format!("expected 32 key bytes, found {}", v.len()))?;
    Ok(SigningKey::from_bytes(&seed))
}

fn render_public_key(key: &VerifyingKey) -> String {
    let mut out = String::from(
        "// Automatically generated by `upkeep sign --emit-public-key`, DO NOT EDIT!\n\n",
    );
    out.push_str("/// Ed25519 public key every manifest signature is checked against.\n");
    out.push_str("pub const TRUSTED_PUBLIC_KEY: [u8; 32] = [\n");
    for row in key.as_bytes().chunks(15) {
        let cells: Vec<String> = row.iter().map(|b| format!("0x{b:02x}")).collect();
        out.push_str(&format!("    {},\n", cells.join(", ")));
    }
    out.push_str("];\n");
    out
}
