//! beaver-core: Hook handling for the beaver charm
//!
//! Reads relation data, renders the beaver INI configuration, controls the
//! service and routes lifecycle events to their handlers.

pub mod beaver_config;
pub mod charm;
pub mod config;
pub mod error;
pub mod hooks;
pub mod juju;
pub mod relation;
pub mod service;
pub mod settings;

pub use beaver_config::{BeaverConfigFile, ConfigDocument};
pub use charm::{BeaverCharm, BeaverCharmArgs};
pub use config::CharmConfig;
pub use error::CharmError;
pub use hooks::{HookAction, HookEvent, HookRegistry};
pub use juju::{JujuRelations, JujuSettings};
pub use relation::{LogSource, RelationKind, RelationRecord, RelationSource, TcpInput};
pub use service::{RestartOutcome, ServiceController, ServiceManager, SysvService};
pub use settings::{SettingChange, SettingsSnapshot, SettingsStore, SettingsUpdate};
