//! Charm settings snapshots and the changes between them

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::CharmError;

/// Charm settings by key, as returned by `config-get`
pub type SettingsSnapshot = BTreeMap<String, Value>;

/// Current settings and the snapshot saved by the previous `config-changed`
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn current(&self) -> Result<SettingsSnapshot, CharmError>;

    /// Empty when nothing was saved yet
    async fn previous(&self) -> Result<SettingsSnapshot, CharmError>;

    async fn save(&self, snapshot: &SettingsSnapshot) -> Result<(), CharmError>;
}

/// One setting whose value differs between two snapshots
#[derive(Debug, Clone, PartialEq)]
pub struct SettingChange {
    pub key: String,
    pub previous: Option<Value>,
    pub current: Option<Value>,
}

impl fmt::Display for SettingChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |v: &Option<Value>| v.as_ref().map_or("unset".to_string(), Value::to_string);
        write!(
            f,
            "config['{}'] changed from {} to {}",
            self.key,
            show(&self.previous),
            show(&self.current)
        )
    }
}

/// Settings that changed, sorted by key, over the keys of both snapshots
#[must_use]
pub fn diff(previous: &SettingsSnapshot, current: &SettingsSnapshot) -> Vec<SettingChange> {
    let mut keys: Vec<&String> = previous.keys().chain(current.keys()).collect();
    keys.sort();
    keys.dedup();

    keys.into_iter()
        .filter_map(|key| {
            let (old, new) = (previous.get(key), current.get(key));
            (old != new).then(|| SettingChange {
                key: key.clone(),
                previous: old.cloned(),
                current: new.cloned(),
            })
        })
        .collect()
}

/// The changes to report and the snapshot to persist for a settings transition
#[derive(Debug, Clone)]
pub struct SettingsUpdate {
    pub changes: Vec<SettingChange>,
    pub snapshot: SettingsSnapshot,
}

impl SettingsUpdate {
    #[must_use]
    pub fn compute(previous: &SettingsSnapshot, current: SettingsSnapshot) -> Self {
        Self {
            changes: diff(previous, &current),
            snapshot: current,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn snapshot(value: Value) -> SettingsSnapshot {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_diff_reports_changed_added_and_removed() {
        let previous = snapshot(json!({"tcp_port": 5000, "tags": "web", "debug": false}));
        let current = snapshot(json!({"tcp_port": 5001, "debug": false, "format": "json"}));

        let changes = diff(&previous, &current);

        let keys: Vec<&str> = changes.iter().map(|c| c.key.as_str()).collect();
        assert_eq!(keys, vec!["format", "tags", "tcp_port"]);
        assert_eq!(changes[0].previous, None);
        assert_eq!(changes[1].current, None);
        assert_eq!(changes[2].previous, Some(json!(5000)));
        assert_eq!(changes[2].current, Some(json!(5001)));
    }

    #[test]
    fn test_identical_snapshots_have_no_changes() {
        let current = snapshot(json!({"tcp_port": 5000}));
        let update = SettingsUpdate::compute(&current.clone(), current.clone());

        assert!(update.changes.is_empty());
        assert_eq!(update.snapshot, current);
    }

    #[test]
    fn test_change_display() {
        let change = SettingChange {
            key: "tcp_port".to_string(),
            previous: None,
            current: Some(json!(5000)),
        };

        assert_eq!(
            change.to_string(),
            "config['tcp_port'] changed from unset to 5000"
        );
    }
}
