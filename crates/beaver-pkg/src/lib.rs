//! beaver-pkg: Package and repository management
//!
//! Registers the beaver apt repository with its signing key, refreshes the package
//! index and installs/upgrades the charm's dependency set.

pub mod apt;
pub mod error;
pub mod keyserver;
pub mod repository;
pub mod traits;
pub mod types;

pub use apt::AptManager;
pub use error::PackageError;
pub use keyserver::HttpKeyFetcher;
pub use repository::{AptRepository, AptSource};
pub use traits::{KeyFetcher, PackageManager, PackageRepository};
pub use types::{InstallPlan, InstallResult, PackageMark, RepositoryStatus, UpgradablePackage};
