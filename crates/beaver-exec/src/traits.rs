//! Command executor trait

use async_trait::async_trait;

use crate::command::CommandLine;
use crate::error::ExecError;
use crate::result::CommandResult;

/// Runs a [`CommandLine`] to completion and captures its output
///
/// A non-zero exit status is reported through [`CommandResult::status`], not as an error;
/// `Err` is reserved for failing to run the program at all.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    async fn run(&self, cmd: &CommandLine) -> Result<CommandResult, ExecError>;

    /// Short name of the executor, used in logs
    fn executor_type(&self) -> &'static str;
}
