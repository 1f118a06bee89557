//! Publisher tool: sign a version manifest.
//!
//! ```bash
//! upkeep sign version.xml --key publisher.key
//! upkeep sign version.xml --key publisher.key --emit-public-key
//! ```
//!
//! The key file holds the hex encoded 32 byte Ed25519 seed. The signature is written
//! to `version.xml.sign`.

use anyhow::{Result, bail};
use clap::Args;
use std::path::PathBuf;

use crate::verify::{DigestAlgorithm, sign_file, signature_path};

#[derive(Args)]
pub struct SignCommand {
    /// Manifest to sign
    file: PathBuf,

    /// File holding the hex encoded Ed25519 seed
    #[arg(long)]
    key: PathBuf,

    /// Also write `pubkey.rs` with the matching public key next to the manifest
    #[arg(long)]
    emit_public_key: bool,

    /// Digest signed over (sha256, sha512)
    #[arg(long, default_value = "sha256")]
    algorithm: DigestAlgorithm,
}

impl SignCommand {
    pub fn execute(self) -> Result<()> {
        if sign_file(&self.file, &self.key, self.algorithm, self.emit_public_key).is_none() {
            bail!("Failed to sign {}", self.file.display());
        }
        println!("✅ Signed {} -> {}", self.file.display(), signature_path(&self.file).display());
        Ok(())
    }
}
