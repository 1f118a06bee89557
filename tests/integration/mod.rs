//! Integration test suite for Upkeep
//!
//! End-to-end tests that drive the public API and the `upkeep` binary.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **pipeline**: Full check, download and staging cycles over a scripted transport
//! - **install**: Staged package merged over an installation directory
//! - **cli**: The `upkeep` binary via `assert_cmd`

mod cli;
mod install;
mod pipeline;
