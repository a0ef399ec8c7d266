//! Service process control delegated to the host's service manager

use std::sync::Arc;

use async_trait::async_trait;
use beaver_exec::{CommandExecutor, CommandLine};
use tracing::{info, instrument, warn};

use crate::error::CharmError;

/// What a restart request found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartOutcome {
    /// The service was running and has been restarted
    Restarted,
    /// The restart did not take, usually because the service was not running
    NotRunning,
}

/// Start/stop/restart of one named service
///
/// `Err` means the service manager could not be invoked; a refused action is a `false`
/// (or [`RestartOutcome::NotRunning`]) result.
#[async_trait]
pub trait ServiceManager: Send + Sync {
    async fn restart(&self) -> Result<RestartOutcome, CharmError>;
    async fn start(&self) -> Result<bool, CharmError>;
    async fn stop(&self) -> Result<bool, CharmError>;

    fn service_name(&self) -> &str;
}

/// `service <name> <action>`
pub struct SysvService {
    executor: Arc<dyn CommandExecutor>,
    name: String,
    use_sudo: bool,
}

impl SysvService {
    pub fn new(
        executor: Arc<dyn CommandExecutor>,
        name: impl Into<String>,
        use_sudo: bool,
    ) -> Self {
        Self {
            executor,
            name: name.into(),
            use_sudo,
        }
    }

    async fn action(&self, action: &str) -> Result<bool, CharmError> {
        let cmd = CommandLine::new("service")
            .args([self.name.as_str(), action])
            .with_sudo(self.use_sudo);
        let result = self.executor.run(&cmd).await?;
        Ok(result.success())
    }
}

#[async_trait]
impl ServiceManager for SysvService {
    async fn restart(&self) -> Result<RestartOutcome, CharmError> {
        Ok(if self.action("restart").await? {
            RestartOutcome::Restarted
        } else {
            RestartOutcome::NotRunning
        })
    }

    async fn start(&self) -> Result<bool, CharmError> {
        self.action("start").await
    }

    async fn stop(&self) -> Result<bool, CharmError> {
        self.action("stop").await
    }

    fn service_name(&self) -> &str {
        &self.name
    }
}

/// Restart-or-start semantics on top of a [`ServiceManager`]
#[derive(Clone)]
pub struct ServiceController {
    manager: Arc<dyn ServiceManager>,
}

impl ServiceController {
    pub fn new(manager: Arc<dyn ServiceManager>) -> Self {
        Self { manager }
    }

    /// Restart the service, starting it when it was not running
    #[instrument(skip(self), fields(service = self.manager.service_name()))]
    pub async fn restart_or_start(&self) -> Result<RestartOutcome, CharmError> {
        info!("(re)starting service");

        let outcome = self.manager.restart().await?;
        if outcome == RestartOutcome::NotRunning && !self.manager.start().await? {
            warn!("service did not start");
        }

        Ok(outcome)
    }

    #[instrument(skip(self), fields(service = self.manager.service_name()))]
    pub async fn stop(&self) -> Result<(), CharmError> {
        if !self.manager.stop().await? {
            warn!("service stop reported failure");
        }
        Ok(())
    }
}
