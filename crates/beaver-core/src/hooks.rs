//! Lifecycle events and the table routing them to handlers

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use tracing::{info, instrument};

use crate::charm::BeaverCharm;
use crate::error::CharmError;

/// Lifecycle events the charm answers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookEvent {
    Install,
    Start,
    Stop,
    UpgradeCharm,
    ConfigChanged,
    LogsRelationJoined,
    LogsRelationChanged,
    InputTcpRelationJoined,
    InputTcpRelationChanged,
}

impl HookEvent {
    pub const ALL: [HookEvent; 9] = [
        HookEvent::Install,
        HookEvent::Start,
        HookEvent::Stop,
        HookEvent::UpgradeCharm,
        HookEvent::ConfigChanged,
        HookEvent::LogsRelationJoined,
        HookEvent::LogsRelationChanged,
        HookEvent::InputTcpRelationJoined,
        HookEvent::InputTcpRelationChanged,
    ];

    /// Hook name as used by the hook runner
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            HookEvent::Install => "install",
            HookEvent::Start => "start",
            HookEvent::Stop => "stop",
            HookEvent::UpgradeCharm => "upgrade-charm",
            HookEvent::ConfigChanged => "config-changed",
            HookEvent::LogsRelationJoined => "logs-relation-joined",
            HookEvent::LogsRelationChanged => "logs-relation-changed",
            HookEvent::InputTcpRelationJoined => "input-tcp-relation-joined",
            HookEvent::InputTcpRelationChanged => "input-tcp-relation-changed",
        }
    }

    /// Event named by the basename of the path the executable was invoked as
    ///
    /// # Errors
    /// Returns `UnknownHook` when the basename is not an event name
    pub fn from_invocation(path: &Path) -> Result<Self, CharmError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        name.parse()
    }
}

impl fmt::Display for HookEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HookEvent {
    type Err = CharmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HookEvent::ALL
            .into_iter()
            .find(|event| event.name() == s)
            .ok_or_else(|| CharmError::UnknownHook(s.to_string()))
    }
}

/// Handler sequences; several events can share one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookAction {
    Install,
    Start,
    Stop,
    Upgrade,
    ConfigChanged,
    LogsChanged,
    InputTcpChanged,
}

/// Event → handler table, built once at startup
#[derive(Debug, Clone)]
pub struct HookRegistry {
    table: HashMap<HookEvent, HookAction>,
}

impl HookRegistry {
    /// Empty registry
    #[must_use]
    pub fn empty() -> Self {
        Self {
            table: HashMap::new(),
        }
    }

    /// Registry with every event the charm handles
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry
            .register(HookEvent::Install, HookAction::Install)
            .register(HookEvent::Start, HookAction::Start)
            .register(HookEvent::Stop, HookAction::Stop)
            .register(HookEvent::UpgradeCharm, HookAction::Upgrade)
            .register(HookEvent::ConfigChanged, HookAction::ConfigChanged)
            .register(HookEvent::LogsRelationJoined, HookAction::LogsChanged)
            .register(HookEvent::LogsRelationChanged, HookAction::LogsChanged)
            .register(HookEvent::InputTcpRelationJoined, HookAction::InputTcpChanged)
            .register(HookEvent::InputTcpRelationChanged, HookAction::InputTcpChanged);
        registry
    }

    pub fn register(&mut self, event: HookEvent, action: HookAction) -> &mut Self {
        self.table.insert(event, action);
        self
    }

    #[must_use]
    pub fn action(&self, event: HookEvent) -> Option<HookAction> {
        self.table.get(&event).copied()
    }

    /// Run the handler registered for `event`
    ///
    /// # Errors
    /// Returns `UnknownHook` for unregistered events, otherwise whatever the handler returns
    #[instrument(skip(self, charm))]
    pub async fn dispatch(&self, charm: &BeaverCharm, event: HookEvent) -> Result<(), CharmError> {
        let action = self
            .action(event)
            .ok_or_else(|| CharmError::UnknownHook(event.name().to_string()))?;

        info!(hook = %event, ?action, "running hook");
        charm.run(action).await
    }
}

impl Default for HookRegistry {
    fn default() -> Self {
        Self::new()
    }
}
