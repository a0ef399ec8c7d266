//! Relation and settings backends built on the juju hook tools

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use beaver_exec::{CommandExecutor, CommandLine};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::error::CharmError;
use crate::relation::{RelationRecord, RelationSource};
use crate::settings::{SettingsSnapshot, SettingsStore};

/// Run a hook tool with `--format=json` and decode its stdout
///
/// Tools print `null` for empty results, which decodes to `None`.
async fn hook_tool<T: DeserializeOwned>(
    executor: &dyn CommandExecutor,
    tool: &str,
    args: &[&str],
) -> Result<Option<T>, CharmError> {
    let cmd = CommandLine::new(tool).arg("--format=json").args(args.iter().copied());
    let result = executor.run(&cmd).await?;

    if !result.success() {
        return Err(CharmError::HookTool {
            tool: tool.to_string(),
            status: result.status,
            stderr: result.stderr,
        });
    }

    let stdout = result.stdout.trim();
    if stdout.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(stdout).map_err(|e| CharmError::decode(format!("{tool} output"), e))
}

/// Relation data via `relation-ids`, `relation-list` and `relation-get`
pub struct JujuRelations {
    executor: Arc<dyn CommandExecutor>,
}

impl JujuRelations {
    pub fn new(executor: Arc<dyn CommandExecutor>) -> Self {
        Self { executor }
    }

    /// Relation values are strings; anything else is kept in its JSON form
    fn to_record(settings: BTreeMap<String, Value>) -> RelationRecord {
        settings
            .into_iter()
            .filter_map(|(key, value)| match value {
                Value::Null => None,
                Value::String(s) => Some((key, s)),
                other => Some((key, other.to_string())),
            })
            .collect()
    }
}

#[async_trait]
impl RelationSource for JujuRelations {
    #[instrument(skip(self))]
    async fn records(&self, relation: &str) -> Result<Vec<RelationRecord>, CharmError> {
        let executor = self.executor.as_ref();
        let mut records = Vec::new();

        let mut ids: Vec<String> = hook_tool(executor, "relation-ids", &[relation])
            .await?
            .unwrap_or_default();
        ids.sort();

        for id in &ids {
            let mut units: Vec<String> =
                hook_tool(executor, "relation-list", &["-r", id.as_str()])
                    .await?
                    .unwrap_or_default();
            units.sort();

            for unit in &units {
                let args = ["-r", id.as_str(), "-", unit.as_str()];
                let settings: BTreeMap<String, Value> = hook_tool(executor, "relation-get", &args)
                    .await?
                    .unwrap_or_default();
                debug!(
                    relation_id = %id,
                    unit = %unit,
                    keys = settings.len(),
                    "relation settings"
                );
                records.push(Self::to_record(settings));
            }
        }

        Ok(records)
    }
}

/// Charm settings from `config-get`, previous snapshot kept as a JSON file
pub struct JujuSettings {
    executor: Arc<dyn CommandExecutor>,
    snapshot_path: PathBuf,
}

impl JujuSettings {
    pub fn new(executor: Arc<dyn CommandExecutor>, snapshot_path: impl Into<PathBuf>) -> Self {
        Self {
            executor,
            snapshot_path: snapshot_path.into(),
        }
    }
}

#[async_trait]
impl SettingsStore for JujuSettings {
    async fn current(&self) -> Result<SettingsSnapshot, CharmError> {
        Ok(hook_tool(self.executor.as_ref(), "config-get", &[])
            .await?
            .unwrap_or_default())
    }

    async fn previous(&self) -> Result<SettingsSnapshot, CharmError> {
        let path = &self.snapshot_path;
        match tokio::fs::read_to_string(path).await {
            Ok(text) => serde_json::from_str(&text).map_err(|e| CharmError::file(path, e)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(SettingsSnapshot::new()),
            Err(e) => Err(CharmError::file(path, e)),
        }
    }

    async fn save(&self, snapshot: &SettingsSnapshot) -> Result<(), CharmError> {
        let path = &self.snapshot_path;
        let text = serde_json::to_string(snapshot).map_err(|e| CharmError::file(path, e))?;
        tokio::fs::write(path, text)
            .await
            .map_err(|e| CharmError::file(path, e))?;

        debug!(path = %path.display(), "saved settings snapshot");
        Ok(())
    }
}
