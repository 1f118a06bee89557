//! Trust checks for everything fetched from the update server.
//!
//! - [`SignatureVerifier`] authenticates the manifest against the compiled-in key
//! - [`IntegrityChecker`] binds the downloaded package to the hash the signed manifest
//!   announced
//!
//! Both hash their input with a configurable [`DigestAlgorithm`] first.

mod digest;
mod integrity;
mod pubkey;
mod signature;

pub use digest::DigestAlgorithm;
pub use integrity::IntegrityChecker;
pub use pubkey::TRUSTED_PUBLIC_KEY;
pub use signature::{SIGNATURE_LENGTH, SignatureVerifier, sign_bytes, sign_file, signature_path};
