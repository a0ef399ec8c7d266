//! Wires the host-backed collaborators into a `BeaverCharm`

use std::path::Path;
use std::sync::Arc;

use beaver_core::{
    BeaverCharm, BeaverCharmArgs, BeaverConfigFile, CharmConfig, JujuRelations, JujuSettings,
    SysvService,
};
use beaver_exec::{CommandExecutor, LocalExecutor};
use beaver_pkg::{AptManager, AptRepository, AptSource, HttpKeyFetcher};

/// Build a charm that drives the local host through `executor`
pub fn build_charm(
    config: &CharmConfig,
    snapshot_path: &Path,
    executor: Arc<dyn CommandExecutor>,
) -> BeaverCharm {
    tracing::debug!(executor = executor.executor_type(), "building charm");

    let source = AptSource {
        path: config.sources_path.clone(),
        line: config.source_line.clone(),
        key_url: config.key_url.clone(),
    };

    BeaverCharm::new(BeaverCharmArgs {
        packages: Arc::new(AptManager::new(executor.clone(), config.use_sudo)),
        repository: Arc::new(AptRepository::new(
            executor.clone(),
            Arc::new(HttpKeyFetcher::new()),
            source,
            config.use_sudo,
        )),
        service: Arc::new(SysvService::new(
            executor.clone(),
            config.service.clone(),
            config.use_sudo,
        )),
        relations: Arc::new(JujuRelations::new(executor.clone())),
        settings: Arc::new(JujuSettings::new(executor, snapshot_path)),
        config_file: BeaverConfigFile::new(config.config_path.clone()),
        dependencies: config.dependencies.clone(),
    })
}

/// [`build_charm`] on a [`LocalExecutor`]
pub fn build_local_charm(config: &CharmConfig, snapshot_path: &Path) -> BeaverCharm {
    build_charm(config, snapshot_path, Arc::new(LocalExecutor::new()))
}
