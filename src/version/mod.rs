//! Build identifiers and their ordering.
//!
//! See [`BuildId`] for the token format. The orchestrator compares the manifest's
//! build against the running build with it, and the language sub-cycle reuses it for
//! bundle versions.

mod build_id;

pub use build_id::BuildId;
