//! Test utilities for Upkeep
//!
//! Available to unit tests and, through the `test-utils` feature, to integration tests:
//!
//! - [`MockTransport`]: a scripted [`crate::download::Transport`] that can hold fetches
//!   until a [`Gate`] opens
//! - [`fixtures`]: a deterministic signing key, manifest builders and zip archives
//! - [`init_test_logging`]: opt-in tracing output for a test run

pub mod fixtures;
mod transport;

pub use fixtures::{
    ManifestFixture, build_zip, publish_manifest, sign_with_test_key, test_public_key,
    test_signing_key, test_verifier, zip_bytes,
};
pub use transport::{Gate, MockTransport};

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Only the first call has an effect. Uses `level` when given, else `RUST_LOG` if set,
/// else stays silent.
///
/// ```rust,no_run
/// use tracing::Level;
///
/// upkeep_cli::test_utils::init_test_logging(Some(Level::DEBUG));
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .with_ansi(true)
            .try_init();
    });
}
