//! Error types for beaver-pkg

use beaver_exec::ExecError;
use thiserror::Error;

/// Errors that can occur during package and repository operations
#[derive(Error, Debug, Clone)]
pub enum PackageError {
    /// Package not found in repositories
    #[error("package not found: {0}")]
    PackageNotFound(String),

    /// Repository is unavailable
    #[error("repository unavailable: {0}")]
    RepositoryUnavailable(String),

    /// Lock file conflict (another process running)
    #[error("lock file conflict: {0}")]
    LockConflict(String),

    /// Insufficient permissions (need sudo)
    #[error("insufficient permissions: {0}")]
    PermissionDenied(String),

    /// Command execution failed
    #[error("command failed: {status} - {message}")]
    CommandFailed {
        /// Exit status
        status: i32,
        /// Error message
        message: String,
    },

    /// Execution error from the command executor
    #[error("execution error: {0}")]
    ExecutionError(String),

    /// Signing key could not be downloaded
    #[error("failed to fetch signing key from {url}: {message}")]
    KeyFetch {
        /// Keyserver URL
        url: String,
        /// Transport or HTTP error
        message: String,
    },

    /// Sources file could not be read or written
    #[error("sources file {path}: {message}")]
    SourcesFile {
        /// Path of the sources file
        path: String,
        /// Underlying I/O error
        message: String,
    },
}

impl PackageError {
    /// Check if error is retryable
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PackageError::LockConflict(_)
                | PackageError::RepositoryUnavailable(_)
                | PackageError::KeyFetch { .. }
        )
    }
}

impl From<ExecError> for PackageError {
    fn from(e: ExecError) -> Self {
        PackageError::ExecutionError(e.to_string())
    }
}
