//! Local command execution using `tokio::process`

use std::process::Stdio;
use std::time::Instant;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, error, instrument};

use crate::command::CommandLine;
use crate::error::ExecError;
use crate::result::CommandResult;
use crate::traits::CommandExecutor;

/// Local command executor
///
/// Executes commands on the unit using `tokio::process::Command`.
#[derive(Debug, Clone)]
pub struct LocalExecutor;

impl LocalExecutor {
    /// Create a new local executor
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Internal method to execute command
    async fn execute(&self, cmd: &CommandLine) -> Result<CommandResult, ExecError> {
        let start = Instant::now();

        debug!(command = %cmd, "executing local command");

        let mut command = Command::new(cmd.program());
        command
            .args(cmd.get_args())
            .envs(cmd.get_env().iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .stdin(if cmd.get_stdin().is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            });

        let mut child = command.spawn().map_err(|e| ExecError::SpawnError {
            program: cmd.program().to_string(),
            message: e.to_string(),
        })?;

        if let Some(input) = cmd.get_stdin()
            && let Some(mut stdin) = child.stdin.take()
        {
            stdin
                .write_all(input)
                .await
                .map_err(|e| ExecError::IoError(e.to_string()))?;
            // Dropping closes the pipe so the child sees EOF
            drop(stdin);
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| ExecError::IoError(e.to_string()))?;

        let duration = start.elapsed();

        let Some(status) = output.status.code() else {
            return Err(ExecError::Signaled(cmd.to_string()));
        };
        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        debug!(
            command = %cmd,
            status = status,
            duration = ?duration,
            "command completed"
        );

        if !output.status.success() {
            error!(
                command = %cmd,
                status = status,
                stderr = %stderr,
                "command failed"
            );
        }

        Ok(CommandResult {
            status,
            stdout,
            stderr,
            duration,
        })
    }
}

impl Default for LocalExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandExecutor for LocalExecutor {
    #[instrument(skip_all, fields(command = %cmd), level = "debug")]
    async fn run(&self, cmd: &CommandLine) -> Result<CommandResult, ExecError> {
        self.execute(cmd).await
    }

    fn executor_type(&self) -> &'static str {
        "local"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_success() {
        let executor = LocalExecutor::new();
        let result = executor
            .run(&CommandLine::new("echo").arg("hello"))
            .await
            .unwrap();

        assert!(result.success());
        assert_eq!(result.stdout.trim(), "hello");
    }

    #[tokio::test]
    async fn test_run_failure() {
        let executor = LocalExecutor::new();
        let result = executor
            .run(&CommandLine::new("sh").args(["-c", "exit 42"]))
            .await
            .unwrap();

        assert!(!result.success());
        assert_eq!(result.status, 42);
    }

    #[tokio::test]
    async fn test_run_with_stderr() {
        let executor = LocalExecutor::new();
        let result = executor
            .run(&CommandLine::new("sh").args(["-c", "echo error >&2"]))
            .await
            .unwrap();

        assert!(result.success());
        assert_eq!(result.stderr.trim(), "error");
    }

    #[tokio::test]
    async fn test_run_pipes_stdin() {
        let executor = LocalExecutor::new();
        let result = executor
            .run(&CommandLine::new("cat").stdin("key material"))
            .await
            .unwrap();

        assert_eq!(result.stdout, "key material");
    }

    #[tokio::test]
    async fn test_run_passes_env() {
        let executor = LocalExecutor::new();
        let result = executor
            .run(
                &CommandLine::new("sh")
                    .args(["-c", "echo $DEBIAN_FRONTEND"])
                    .env("DEBIAN_FRONTEND", "noninteractive"),
            )
            .await
            .unwrap();

        assert_eq!(result.stdout.trim(), "noninteractive");
    }

    #[tokio::test]
    async fn test_missing_program() {
        let executor = LocalExecutor::new();
        let result = executor
            .run(&CommandLine::new("definitely-not-a-real-program-xyz"))
            .await;

        assert!(matches!(result, Err(ExecError::SpawnError { .. })));
    }
}
