//! Package manager, repository and key fetcher traits

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::PackageError;
use crate::types::{InstallResult, RepositoryStatus};

#[async_trait]
pub trait PackageManager: Send + Sync {
    /// Refresh the package index
    async fn update_index(&self) -> Result<(), PackageError>;

    /// Install absent packages and upgrade upgradable ones in one transaction
    async fn ensure_installed(&self, names: &[String]) -> Result<InstallResult, PackageError>;

    /// Best-effort index refresh: failures are logged and swallowed
    async fn refresh_index(&self) {
        match self.update_index().await {
            Ok(()) => debug!("package index refreshed"),
            Err(e) => warn!(error = %e, "package index refresh failed, continuing"),
        }
    }
}

#[async_trait]
pub trait PackageRepository: Send + Sync {
    /// Register the repository and its signing key unless already registered
    async fn ensure_repository(&self) -> Result<RepositoryStatus, PackageError>;
}

#[async_trait]
pub trait KeyFetcher: Send + Sync {
    /// Download the armored key material at `url`
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, PackageError>;
}
