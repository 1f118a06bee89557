//! Check a detached manifest signature.
//!
//! ```bash
//! upkeep verify version.xml                          # compiled-in key, version.xml.sign
//! upkeep verify version.xml --signature other.sign
//! upkeep verify version.xml --public-key 3b6a27bc...  # another publisher key
//! ```

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use crate::core::UpkeepError;
use crate::verify::{DigestAlgorithm, SignatureVerifier, signature_path};

#[derive(Args)]
pub struct VerifyCommand {
    /// Signed file
    file: PathBuf,

    /// Detached signature [default: `<file>.sign`]
    #[arg(long)]
    signature: Option<PathBuf>,

    /// Hex encoded Ed25519 public key used instead of the compiled-in key
    #[arg(long)]
    public_key: Option<String>,

    /// Digest the signature covers (sha256, sha512)
    #[arg(long, default_value = "sha256")]
    algorithm: DigestAlgorithm,
}

impl VerifyCommand {
    pub async fn execute(self) -> Result<()> {
        let signature_file = self.signature.unwrap_or_else(|| signature_path(&self.file));

        let data = tokio::fs::read(&self.file)
            .await
            .with_context(|| format!("Failed to read {}", self.file.display()))?;
        let signature = tokio::fs::read(&signature_file)
            .await
            .with_context(|| format!("Failed to read {}", signature_file.display()))?;

        let verifier = match &self.public_key {
            Some(hex_key) => SignatureVerifier::with_key(parse_public_key(hex_key)?, self.algorithm),
            None => SignatureVerifier::new(self.algorithm),
        };

        if !verifier.verify(&data, &signature) {
            return Err(UpkeepError::SignatureInvalid {
                subject: self.file.display().to_string(),
            }
            .into());
        }

        println!("✅ Valid signature for {}", self.file.display());
        Ok(())
    }
}

fn parse_public_key(hex_key: &str) -> Result<[u8; 32]> {
    let bytes = hex::decode(hex_key.trim()).context("Public key is not valid hex")?;
    bytes.try_into().map_err(|v: Vec<u8>| {
        UpkeepError::ConfigError {
            message: format!("expected a 32 byte public key, found {} bytes", v.len()),
        }
        .into()
    })
}
