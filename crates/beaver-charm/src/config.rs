//! Configuration loading and types

use std::path::{Path, PathBuf};

use beaver_core::CharmConfig;
use serde::{Deserialize, Serialize};

/// File name of the settings snapshot inside the charm directory
const SNAPSHOT_FILE: &str = ".juju-persistent-config";

/// Top-level configuration for the charm executable
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// What to install and where files live
    #[serde(default)]
    pub charm: CharmConfig,
    /// Log output settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Log output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Emit JSON lines instead of human-readable text
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from file
    ///
    /// # Errors
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &Path) -> eyre::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load from `BEAVER_CHARM_CONFIG`, then `$CHARM_DIR/charm.toml`, else defaults
    pub fn load_default() -> eyre::Result<Self> {
        if let Ok(path) = std::env::var("BEAVER_CHARM_CONFIG") {
            return Self::load(Path::new(&path));
        }

        if let Some(path) = charm_dir().map(|dir| dir.join("charm.toml"))
            && path.exists()
        {
            return Self::load(&path);
        }

        Ok(Config::default())
    }

    /// Where the previous settings snapshot lives
    #[must_use]
    pub fn snapshot_path(&self) -> PathBuf {
        self.charm.snapshot_path.clone().unwrap_or_else(|| {
            charm_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(SNAPSHOT_FILE)
        })
    }
}

/// Charm root set by the hook runner
fn charm_dir() -> Option<PathBuf> {
    std::env::var_os("CHARM_DIR").map(PathBuf::from)
}
