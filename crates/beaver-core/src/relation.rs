//! Typed access to relation data published by related units

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use tracing::debug;

use crate::error::CharmError;

/// Key/value settings one related unit published on a relation
pub type RelationRecord = BTreeMap<String, String>;

/// Where relation records come from
#[async_trait]
pub trait RelationSource: Send + Sync {
    /// Records of every related unit across all ids of `relation`
    async fn records(&self, relation: &str) -> Result<Vec<RelationRecord>, CharmError>;
}

/// Relations the charm consumes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    /// Log sources to ship (`types`, `files`)
    Logs,
    /// Logstash TCP input to ship to (`port`, `private-address`)
    InputTcp,
}

impl RelationKind {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            RelationKind::Logs => "logs",
            RelationKind::InputTcp => "input-tcp",
        }
    }

    #[must_use]
    pub fn required_keys(self) -> &'static [&'static str] {
        match self {
            RelationKind::Logs => &["types", "files"],
            RelationKind::InputTcp => &["port", "private-address"],
        }
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Records of `name` that carry every key in `required_keys`
///
/// Returns `None` when no such record exists yet; that is the normal state of a
/// relation whose peer has not published its data.
pub async fn get_relation(
    source: &dyn RelationSource,
    name: &str,
    required_keys: &[&str],
) -> Result<Option<Vec<RelationRecord>>, CharmError> {
    let records = source.records(name).await?;
    debug!(relation = name, ?records, "read relation data");

    let usable: Vec<RelationRecord> = records
        .into_iter()
        .filter(|record| required_keys.iter().all(|key| record.contains_key(*key)))
        .collect();

    if usable.is_empty() {
        debug!(relation = name, ?required_keys, "relation not ready");
        return Ok(None);
    }

    Ok(Some(usable))
}

/// One log file to ship and the type label attached to its events
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSource {
    pub label: String,
    pub file: String,
}

impl LogSource {
    pub fn new(label: impl Into<String>, file: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            file: file.into(),
        }
    }
}

/// Pair up the space-separated `types` and `files` lists of a logs record
///
/// Surplus entries of the longer list are dropped.
#[must_use]
pub fn parse_log_sources(record: &RelationRecord) -> Vec<LogSource> {
    let types = record.get("types").map_or("", String::as_str);
    let files = record.get("files").map_or("", String::as_str);

    types
        .split_whitespace()
        .zip(files.split_whitespace())
        .map(|(label, file)| LogSource::new(label, file))
        .collect()
}

/// Log sources published on the `logs` relation, from the first usable record
pub async fn logs_relation(
    source: &dyn RelationSource,
) -> Result<Option<Vec<LogSource>>, CharmError> {
    let kind = RelationKind::Logs;
    let Some(records) = get_relation(source, kind.name(), kind.required_keys()).await? else {
        return Ok(None);
    };

    Ok(records.first().map(parse_log_sources))
}

/// Address of the logstash TCP input published on `input-tcp`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TcpInput {
    pub address: String,
    /// Kept as published; beaver reads it back as text
    pub port: String,
}

/// TCP input published on the `input-tcp` relation, from the first usable record
pub async fn input_tcp_relation(
    source: &dyn RelationSource,
) -> Result<Option<TcpInput>, CharmError> {
    let kind = RelationKind::InputTcp;
    let Some(records) = get_relation(source, kind.name(), kind.required_keys()).await? else {
        return Ok(None);
    };

    Ok(records.first().and_then(|record| {
        Some(TcpInput {
            address: record.get("private-address")?.clone(),
            port: record.get("port")?.clone(),
        })
    }))
}
