//! `BeaverCharm`: the hook handlers

use std::sync::Arc;

use beaver_pkg::{PackageManager, PackageRepository};
use tracing::{info, instrument};

use crate::beaver_config::BeaverConfigFile;
use crate::error::CharmError;
use crate::hooks::HookAction;
use crate::relation::{self, RelationKind, RelationSource};
use crate::service::{ServiceController, ServiceManager};
use crate::settings::{SettingsStore, SettingsUpdate};

/// Collaborators for building a `BeaverCharm`
pub struct BeaverCharmArgs {
    /// Package manager installing the dependency set
    pub packages: Arc<dyn PackageManager>,
    /// Repository providing the beaver package
    pub repository: Arc<dyn PackageRepository>,
    /// Service manager for the beaver daemon
    pub service: Arc<dyn ServiceManager>,
    /// Relation data of related units
    pub relations: Arc<dyn RelationSource>,
    /// Charm settings with their previous snapshot
    pub settings: Arc<dyn SettingsStore>,
    /// Beaver configuration file
    pub config_file: BeaverConfigFile,
    /// Packages required for the service to run
    pub dependencies: Vec<String>,
}

/// Hook handlers for the beaver charm
pub struct BeaverCharm {
    packages: Arc<dyn PackageManager>,
    repository: Arc<dyn PackageRepository>,
    service: ServiceController,
    relations: Arc<dyn RelationSource>,
    settings: Arc<dyn SettingsStore>,
    config_file: BeaverConfigFile,
    dependencies: Vec<String>,
}

impl BeaverCharm {
    #[must_use]
    pub fn new(args: BeaverCharmArgs) -> Self {
        Self {
            packages: args.packages,
            repository: args.repository,
            service: ServiceController::new(args.service),
            relations: args.relations,
            settings: args.settings,
            config_file: args.config_file,
            dependencies: args.dependencies,
        }
    }

    #[must_use]
    pub fn config_file(&self) -> &BeaverConfigFile {
        &self.config_file
    }

    /// Run one handler sequence to completion
    pub async fn run(&self, action: HookAction) -> Result<(), CharmError> {
        match action {
            HookAction::Install => self.install().await,
            HookAction::Start => self.start().await,
            HookAction::Stop => self.stop().await,
            HookAction::Upgrade => self.upgrade().await,
            HookAction::ConfigChanged => self.config_changed().await,
            HookAction::LogsChanged => self.logs_relation_changed().await,
            HookAction::InputTcpChanged => self.input_tcp_relation_changed().await,
        }
    }

    #[instrument(skip(self))]
    pub async fn install(&self) -> Result<(), CharmError> {
        info!("installing beaver");
        self.repository.ensure_repository().await?;
        self.packages.refresh_index().await;
        self.packages.ensure_installed(&self.dependencies).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn start(&self) -> Result<(), CharmError> {
        self.service.restart_or_start().await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn stop(&self) -> Result<(), CharmError> {
        self.service.stop().await
    }

    #[instrument(skip(self))]
    pub async fn upgrade(&self) -> Result<(), CharmError> {
        info!("upgrading beaver");
        self.packages.refresh_index().await;
        self.packages.ensure_installed(&self.dependencies).await?;
        self.service.restart_or_start().await?;
        Ok(())
    }

    /// Log every changed setting, persist the new snapshot, restart
    #[instrument(skip(self))]
    pub async fn config_changed(&self) -> Result<(), CharmError> {
        let previous = self.settings.previous().await?;
        let current = self.settings.current().await?;
        let update = SettingsUpdate::compute(&previous, current);

        for change in &update.changes {
            info!(key = %change.key, "{change}");
        }

        self.settings.save(&update.snapshot).await?;
        self.service.restart_or_start().await?;
        Ok(())
    }

    /// Merge published log sources into the config; nothing happens until the peer is ready
    #[instrument(skip(self))]
    pub async fn logs_relation_changed(&self) -> Result<(), CharmError> {
        info!("logs changed");
        let Some(sources) = relation::logs_relation(self.relations.as_ref()).await? else {
            info!("logs relation not ready, skipping");
            return Ok(());
        };

        self.config_file.write_logs_config(&sources)?;
        self.service.restart_or_start().await?;
        Ok(())
    }

    /// Point beaver at the published TCP input
    ///
    /// Fails the hook when the peer has not published its address yet, so the
    /// event is retried.
    #[instrument(skip(self))]
    pub async fn input_tcp_relation_changed(&self) -> Result<(), CharmError> {
        info!("input tcp changed");
        let input = relation::input_tcp_relation(self.relations.as_ref())
            .await?
            .ok_or_else(|| CharmError::MissingRelationData {
                relation: RelationKind::InputTcp.name().to_string(),
            })?;

        self.config_file.write_tcp_config(&input)?;
        self.service.restart_or_start().await?;
        Ok(())
    }
}
