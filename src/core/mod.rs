//! Core types shared by every Upkeep module.
//!
//! At the moment this is the error system: [`UpkeepError`] for typed failures inside the
//! pipeline and [`ErrorContext`] / [`user_friendly_error`] for presenting them on the
//! command line.

pub mod error;

pub use error::{ErrorContext, UpkeepError, user_friendly_error};
