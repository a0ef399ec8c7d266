//! Type definitions for package management

use serde::{Deserialize, Serialize};

/// A package with available updates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpgradablePackage {
    /// Package name
    pub name: String,
    /// Current installed version
    pub current_version: String,
    /// Available upgrade version
    pub new_version: String,
    /// Package architecture
    pub arch: Option<String>,
}

impl UpgradablePackage {
    /// Create a new upgradable package
    pub fn new(
        name: impl Into<String>,
        current: impl Into<String>,
        new: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            current_version: current.into(),
            new_version: new.into(),
            arch: None,
        }
    }

    /// Set architecture
    #[must_use]
    pub fn with_arch(mut self, arch: impl Into<String>) -> Self {
        self.arch = Some(arch.into());
        self
    }
}

/// What a transaction will do with a package
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackageMark {
    /// Package is absent and gets installed
    Install,
    /// Package is installed and a newer candidate exists
    Upgrade,
}

/// Marks collected before a single commit
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallPlan {
    pub marks: Vec<(String, PackageMark)>,
}

impl InstallPlan {
    pub fn mark(&mut self, name: impl Into<String>, mark: PackageMark) {
        self.marks.push((name.into(), mark));
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }

    /// Package names in mark order
    pub fn packages(&self) -> impl Iterator<Item = &str> {
        self.marks.iter().map(|(name, _)| name.as_str())
    }
}

/// Result of an install/upgrade transaction
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InstallResult {
    /// Number of packages upgraded
    pub upgraded_count: u32,
    /// Number of packages newly installed
    pub new_count: u32,
    /// Number of packages removed
    pub removed_count: u32,
    /// Packages that were marked for the transaction
    pub packages: Vec<String>,
}

impl InstallResult {
    /// Nothing needed to be done
    #[must_use]
    pub fn unchanged() -> Self {
        Self::default()
    }

    /// Whether a transaction was committed
    #[must_use]
    pub fn changed(&self) -> bool {
        !self.packages.is_empty()
    }
}

/// Outcome of registering the package repository
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepositoryStatus {
    /// Sources file already present with the expected entry
    AlreadyRegistered,
    /// Key imported and sources file written in this run
    Registered,
}
