//! Error types for packaging operations.
//!
//! Four of these kinds abort the whole run (`aborts_run`); the rest end only the
//! current platform's steps or are logged and skipped during best-effort copies.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for packager operations
pub type Result<T> = std::result::Result<T, PackagerError>;

/// Main error type for all packager operations
#[derive(Error, Debug)]
pub enum PackagerError {
    /// The descriptor file does not exist at the project root
    #[error("descriptor not found: {path}")]
    MetadataMissing {
        /// Expected descriptor location
        path: PathBuf,
    },

    /// The descriptor file exists but cannot be used
    #[error("descriptor {path} is malformed: {reason}")]
    MetadataMalformed {
        /// Descriptor location
        path: PathBuf,
        /// What the parser rejected
        reason: String,
    },

    /// The project root contains no packageable scripts
    #[error("no packageable scripts found in {root}")]
    NoScriptsFound {
        /// Scanned project root
        root: PathBuf,
    },

    /// The compiler toolchain is missing and could not be provisioned
    #[error("compiler toolchain unavailable: {reason}")]
    ToolchainUnavailable {
        /// What failed, with remediation where known
        reason: String,
    },

    /// The compiler exited non-zero for a script
    #[error("compilation of '{script}' failed: {stderr}")]
    CompileFailed {
        /// Logical script name
        script: String,
        /// Captured compiler diagnostics
        stderr: String,
    },

    /// Writing the distribution archive failed
    #[error("failed to write archive {path}: {reason}")]
    ArchiveWriteFailed {
        /// Destination archive path
        path: PathBuf,
        /// Underlying I/O failure
        reason: String,
    },

    /// The declared distribution targets do not include this host
    #[error("no applicable platform: the declared distribution targets cannot be built on this host")]
    NoApplicablePlatform,

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors from anyhow
    #[error("{0}")]
    Anyhow(#[from] anyhow::Error),
}

impl PackagerError {
    /// Whether this error aborts the whole run, as opposed to one platform's steps.
    pub fn aborts_run(&self) -> bool {
        matches!(
            self,
            Self::MetadataMissing { .. }
                | Self::MetadataMalformed { .. }
                | Self::NoScriptsFound { .. }
                | Self::NoApplicablePlatform
        )
    }
}
