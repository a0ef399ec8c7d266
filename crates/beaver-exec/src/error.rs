//! Error types for beaver-exec

use thiserror::Error;

/// Errors that can occur while running a command
#[derive(Error, Debug, Clone)]
pub enum ExecError {
    /// Process spawn error
    #[error("failed to spawn {program}: {message}")]
    SpawnError {
        /// Program that could not be started
        program: String,
        /// Underlying OS error
        message: String,
    },

    /// I/O error while feeding stdin or collecting output
    #[error("I/O error: {0}")]
    IoError(String),

    /// Process was terminated by a signal
    #[error("{0} terminated by signal")]
    Signaled(String),
}
