//! Core error types for beaver-core

use beaver_exec::ExecError;
use beaver_pkg::PackageError;
use thiserror::Error;

/// Errors that fail a hook
#[derive(Error, Debug, Clone)]
pub enum CharmError {
    /// Event name with no registered handler
    #[error("unknown hook: {0}")]
    UnknownHook(String),

    /// A relation event arrived before the peer published its data
    #[error("relation {relation} has no usable data")]
    MissingRelationData {
        /// Relation name
        relation: String,
    },

    /// Package manager operation failed
    #[error("package manager error: {0}")]
    Package(#[from] PackageError),

    /// Command could not be run
    #[error("command execution failed: {0}")]
    Exec(#[from] ExecError),

    /// A juju hook tool exited non-zero
    #[error("hook tool {tool} failed: {status} - {stderr}")]
    HookTool {
        /// Tool name
        tool: String,
        /// Exit status
        status: i32,
        /// Stderr output
        stderr: String,
    },

    /// Output of a hook tool or a persisted file could not be decoded
    #[error("invalid {what}: {message}")]
    Decode {
        /// What was being decoded
        what: String,
        /// Parser message
        message: String,
    },

    /// Reading or writing a file owned by the charm failed
    #[error("{path}: {message}")]
    File {
        /// File path
        path: String,
        /// Underlying I/O or parse error
        message: String,
    },
}

impl CharmError {
    pub(crate) fn file(path: &std::path::Path, err: impl std::fmt::Display) -> Self {
        CharmError::File {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }

    pub(crate) fn decode(what: impl Into<String>, err: impl std::fmt::Display) -> Self {
        CharmError::Decode {
            what: what.into(),
            message: err.to_string(),
        }
    }
}
