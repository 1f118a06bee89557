//! Error handling for Upkeep
//!
//! The error system follows two principles:
//! 1. **Strongly-typed errors** ([`UpkeepError`]) so pipeline code can tell a trust
//!    failure from a transport or filesystem failure
//! 2. **User-friendly messages** ([`ErrorContext`]) with actionable suggestions for CLI users
//!
//! # Error Categories
//!
//! The update pipeline distinguishes four kinds of failure:
//! - **Transport**: [`UpkeepError::NetworkError`], a fetch that produced no usable bytes
//! - **Trust**: [`UpkeepError::SignatureInvalid`], [`UpkeepError::IntegrityMismatch`]
//! - **Parse**: [`UpkeepError::ManifestParse`], [`UpkeepError::InvalidBuildId`]
//! - **Filesystem**: [`UpkeepError::FileSystemError`], [`UpkeepError::Archive`],
//!   [`UpkeepError::IoError`]
//!
//! None of them is fatal to the host process. The orchestrator logs them and returns
//! to idle; only the CLI converts them into an exit status via [`user_friendly_error`].
//!
//! # Examples
//!
//! ```rust,no_run
//! use upkeep_cli::core::{UpkeepError, user_friendly_error};
//!
//! fn stage() -> Result<(), UpkeepError> {
//!     Err(UpkeepError::NoPendingUpdate)
//! }
//!
//! if let Err(e) = stage() {
//!     let ctx = user_friendly_error(anyhow::Error::from(e));
//!     ctx.display();
//! }
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// The main error type for Upkeep operations.
#[derive(Error, Debug)]
pub enum UpkeepError {
    /// The manifest buffer is not a well-formed document.
    ///
    /// Raised only for structural failures; missing optional fields are not errors.
    #[error("Could not parse update manifest: {reason}")]
    ManifestParse {
        /// Parser message
        reason: String,
    },

    /// A detached signature did not validate against the trusted key.
    #[error("Signature verification failed for {subject}")]
    SignatureInvalid {
        /// What was being verified (usually a URL or a file path)
        subject: String,
    },

    /// Downloaded content does not hash to the value carried by the verified manifest.
    #[error("File integrity check failed for {path}: expected {expected}, got {actual}")]
    IntegrityMismatch {
        /// The checked file
        path: String,
        /// Hash announced by the manifest
        expected: String,
        /// Hash of the bytes on disk
        actual: String,
    },

    /// The update archive could not be decoded.
    #[error("Could not extract update package: {reason}")]
    Archive {
        /// Decoder message
        reason: String,
    },

    /// The update archive contains no entry for the running executable.
    #[error("Update package contains no '{extension}' executable")]
    ExecutableNotFound {
        /// Extension that was searched for
        extension: String,
    },

    /// A fetch failed or returned no content.
    #[error("Network error while fetching {url}: {reason}")]
    NetworkError {
        /// Requested URL
        url: String,
        /// Transport status text
        reason: String,
    },

    /// A filesystem operation failed.
    #[error("File system error: {operation} ({path})")]
    FileSystemError {
        /// Operation that was attempted
        operation: String,
        /// Affected path
        path: String,
    },

    /// Configuration could not be loaded or is invalid.
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Description of the problem
        message: String,
    },

    /// `download_update` was called before any verified manifest announced a package.
    #[error("No verified update package is known yet")]
    NoPendingUpdate,

    /// A package download or installation is already running.
    #[error("An update is already in progress")]
    UpdateInProgress,

    /// A build token is not a dotted numeric value.
    #[error("Invalid build identifier: '{token}'")]
    InvalidBuildId {
        /// The rejected token
        token: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    TomlSerError(#[from] toml::ser::Error),

    /// Other error
    #[error("{message}")]
    Other {
        /// Generic error message
        message: String,
    },
}

impl From<zip::result::ZipError> for UpkeepError {
    fn from(e: zip::result::ZipError) -> Self {
        Self::Archive {
            reason: e.to_string(),
        }
    }
}

/// Error wrapper that carries a suggestion and details for display in the terminal.
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: UpkeepError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context without suggestion or details.
    #[must_use]
    pub const fn new(error: UpkeepError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add additional details explaining the error.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error to stderr: error in red, details in yellow, suggestion in green.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error into an [`ErrorContext`] with suggestions where we know one.
///
/// [`UpkeepError`]s are mapped to tailored suggestions, a few common [`std::io::Error`]
/// kinds get generic advice, and everything else is reported with its full cause chain.
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    let error = match error.downcast::<UpkeepError>() {
        Ok(upkeep_error) => return create_error_context(upkeep_error),
        Err(other) => other,
    };

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        match io_error.kind() {
            std::io::ErrorKind::PermissionDenied => {
                return ErrorContext::new(UpkeepError::FileSystemError {
                    operation: "file access".to_string(),
                    path: "unknown".to_string(),
                })
                .with_suggestion(
                    "Check that the install directory is writable by the current user",
                )
                .with_details("The updater could not read or write one of its files");
            }
            std::io::ErrorKind::NotFound => {
                return ErrorContext::new(UpkeepError::FileSystemError {
                    operation: "file access".to_string(),
                    path: "unknown".to_string(),
                })
                .with_suggestion("Check that the file or directory exists and the path is correct");
            }
            _ => {}
        }
    }

    if let Some(toml_error) = error.downcast_ref::<toml::de::Error>() {
        return ErrorContext::new(UpkeepError::ConfigError {
            message: toml_error.to_string(),
        })
        .with_suggestion("Check the TOML syntax of your config.toml (run `upkeep config path`)");
    }

    let mut message = error.to_string();
    let chain: Vec<String> = error.chain().skip(1).map(ToString::to_string).collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    ErrorContext::new(UpkeepError::Other {
        message,
    })
}

fn create_error_context(error: UpkeepError) -> ErrorContext {
    match error {
        e @ UpkeepError::SignatureInvalid { .. } => ErrorContext::new(e)
            .with_details(
                "The downloaded data was not signed by the trusted update key and was discarded",
            )
            .with_suggestion("Retry later; if this persists the update channel may be compromised"),
        e @ UpkeepError::IntegrityMismatch { .. } => ErrorContext::new(e)
            .with_details("The package does not match the hash published in the signed manifest")
            .with_suggestion("Run `upkeep check` again to fetch a fresh package"),
        e @ UpkeepError::ManifestParse { .. } => ErrorContext::new(e)
            .with_details("The signature was valid but the manifest structure is broken")
            .with_suggestion("Report this to the publisher; previous links are kept"),
        e @ UpkeepError::NetworkError { .. } => ErrorContext::new(e)
            .with_suggestion("Check your internet connection and the configured manifest URL"),
        e @ UpkeepError::NoPendingUpdate => ErrorContext::new(e)
            .with_suggestion("Run `upkeep check` first so a signed manifest announces a package"),
        e @ UpkeepError::UpdateInProgress => ErrorContext::new(e)
            .with_suggestion("Wait for the running update to finish"),
        e @ UpkeepError::ExecutableNotFound { .. } => ErrorContext::new(e)
            .with_details("The package must contain exactly one file with the executable's extension"),
        e @ UpkeepError::ConfigError { .. } => ErrorContext::new(e)
            .with_suggestion("Run `upkeep config show` to inspect the effective configuration"),
        e @ UpkeepError::InvalidBuildId { .. } => ErrorContext::new(e)
            .with_suggestion("Build identifiers are dotted numbers such as 4012 or 2.31"),
        e => ErrorContext::new(e),
    }
}
