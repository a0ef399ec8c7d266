//! Static charm configuration: what to install, where files live

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Settings for one beaver deployment
///
/// Every field has a default, so an empty TOML table is a valid configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CharmConfig {
    /// Service managed by the charm
    pub service: String,
    /// Beaver INI configuration file
    pub config_path: PathBuf,
    /// Apt sources file registering the beaver repository
    pub sources_path: PathBuf,
    /// `deb ...` line written to `sources_path`
    pub source_line: String,
    /// Keyserver URL for the repository signing key
    pub key_url: String,
    /// Packages required for the service to run
    pub dependencies: Vec<String>,
    /// Prefix privileged commands with sudo
    pub use_sudo: bool,
    /// Where the previous charm settings are persisted
    ///
    /// Defaults to `$CHARM_DIR/.juju-persistent-config`.
    pub snapshot_path: Option<PathBuf>,
}

impl Default for CharmConfig {
    fn default() -> Self {
        Self {
            service: "beaver".to_string(),
            config_path: PathBuf::from("/etc/beaver/conf"),
            sources_path: PathBuf::from("/etc/apt/sources.list.d/beaver.list"),
            source_line: "deb http://ppa.launchpad.net/evarlast/experimental/ubuntu trusty main"
                .to_string(),
            key_url: "http://keyserver.ubuntu.com:11371/pks/lookup?op=get&search=0xA65E2E5D742A38EE"
                .to_string(),
            dependencies: vec!["beaver".to_string()],
            use_sudo: false,
            snapshot_path: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_table_keeps_defaults() {
        let config: CharmConfig = serde_json::from_str(r#"{"use_sudo": true}"#).unwrap();

        assert!(config.use_sudo);
        assert_eq!(config.service, "beaver");
        assert_eq!(config.dependencies, vec!["beaver".to_string()]);
    }
}
