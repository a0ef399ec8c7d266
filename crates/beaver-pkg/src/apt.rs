//! APT package manager (Debian/Ubuntu)

use std::sync::Arc;

use async_trait::async_trait;
use beaver_exec::{CommandExecutor, CommandLine, CommandResult};
use tracing::{debug, info, instrument};

use crate::error::PackageError;
use crate::traits::PackageManager;
use crate::types::{InstallPlan, InstallResult, PackageMark, UpgradablePackage};

/// Recommended packages are never pulled in
const NO_RECOMMENDS: [&str; 2] = ["-o", "APT::Install-Recommends=0"];
const ASSUME_YES: [&str; 2] = ["-o", "APT::Get::Assume-Yes=1"];

/// APT package manager implementation
pub struct AptManager {
    /// Executor for running commands
    executor: Arc<dyn CommandExecutor>,
    /// Whether to use sudo
    use_sudo: bool,
}

impl AptManager {
    /// Create a new APT manager
    ///
    /// # Arguments
    /// * `executor` - Executor for running apt commands
    /// * `use_sudo` - Whether to prefix commands with sudo
    pub fn new(executor: Arc<dyn CommandExecutor>, use_sudo: bool) -> Self {
        Self { executor, use_sudo }
    }

    /// Build a non-interactive apt-get command with recommends disabled
    fn apt_get<I, S>(&self, args: I) -> CommandLine
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CommandLine::new("apt-get")
            .args(NO_RECOMMENDS)
            .args(args)
            .env("DEBIAN_FRONTEND", "noninteractive")
            .with_sudo(self.use_sudo)
    }

    /// Parse apt list --upgradable output
    fn parse_upgradable(output: &str) -> Vec<UpgradablePackage> {
        let mut packages = Vec::new();

        for line in output.lines() {
            // Skip header lines and empty lines
            if line.is_empty() || line.starts_with("Listing") || line.starts_with("WARNING") {
                continue;
            }

            // Parse: package/suite version arch [upgradable from: oldversion]
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() < 2 {
                continue;
            }

            let name = parts[0].split('/').next().unwrap_or(parts[0]);
            let current_version = line
                .split_once("[upgradable from: ")
                .and_then(|(_, rest)| rest.split_once(']'))
                .map_or("unknown", |(version, _)| version);

            let mut pkg = UpgradablePackage::new(name, current_version, parts[1]);
            if let Some(arch) = parts.get(2) {
                pkg = pkg.with_arch(*arch);
            }
            packages.push(pkg);
        }

        packages
    }

    /// Parse the "X upgraded, Y newly installed, Z to remove" summary line
    fn parse_summary(output: &str) -> (u32, u32, u32) {
        let mut upgraded = 0u32;
        let mut new_pkgs = 0u32;
        let mut removed = 0u32;

        for line in output.lines().filter(|l| l.contains("upgraded,")) {
            for part in line.split(',').map(str::trim) {
                if let Some(n) = part.find(" upgraded")
                    && let Ok(num) = part[..n].trim().parse::<u32>()
                {
                    upgraded = num;
                }
                if let Some(n) = part.find(" newly installed")
                    && let Ok(num) = part[..n].trim().parse::<u32>()
                {
                    new_pkgs = num;
                }
                if let Some(n) = part.find(" to remove")
                    && let Ok(num) = part[..n].trim().parse::<u32>()
                {
                    removed = num;
                }
            }
        }

        (upgraded, new_pkgs, removed)
    }

    /// `dpkg-query` status field reads `want flag status`, e.g. `install ok installed`
    fn status_is_installed(status: &str) -> bool {
        status.split_whitespace().nth(2) == Some("installed")
    }

    /// Map a failed apt invocation to the most specific error
    fn classify_failure(result: CommandResult) -> PackageError {
        let output = result.combined_output();
        if output.contains("Could not get lock") {
            PackageError::LockConflict(result.stderr)
        } else if output.contains("Permission denied") || output.contains("are you root?") {
            PackageError::PermissionDenied(result.stderr)
        } else if output.contains("Unable to locate package") {
            PackageError::PackageNotFound(result.stderr)
        } else {
            PackageError::CommandFailed {
                status: result.status,
                message: result.stderr,
            }
        }
    }

    async fn is_installed(&self, name: &str) -> Result<bool, PackageError> {
        let cmd = CommandLine::new("dpkg-query").args(["-W", "-f=${Status}", name]);
        let result = self.executor.run(&cmd).await?;

        // dpkg-query exits 1 for packages it has never heard of
        Ok(result.success() && Self::status_is_installed(&result.stdout))
    }

    async fn list_upgradable(&self) -> Result<Vec<UpgradablePackage>, PackageError> {
        let cmd = CommandLine::new("apt").args(["list", "--upgradable"]);
        let result = self.executor.run(&cmd).await?;

        if !result.success() {
            return Err(Self::classify_failure(result));
        }

        Ok(Self::parse_upgradable(&result.stdout))
    }

    /// Decide which of `names` need installing or upgrading
    #[instrument(skip(self))]
    pub async fn plan(&self, names: &[String]) -> Result<InstallPlan, PackageError> {
        let mut plan = InstallPlan::default();
        let mut installed = Vec::new();

        for name in names {
            if self.is_installed(name).await? {
                installed.push(name);
            } else {
                plan.mark(name.clone(), PackageMark::Install);
            }
        }

        if !installed.is_empty() {
            let upgradable = self.list_upgradable().await?;
            for name in installed {
                if upgradable.iter().any(|pkg| &pkg.name == name) {
                    plan.mark(name.clone(), PackageMark::Upgrade);
                }
            }
        }

        debug!(marks = ?plan.marks, "planned package transaction");
        Ok(plan)
    }

    /// Commit every mark of `plan` in a single apt-get transaction
    #[instrument(skip_all, fields(packages = plan.marks.len()))]
    pub async fn commit(&self, plan: &InstallPlan) -> Result<InstallResult, PackageError> {
        if plan.is_empty() {
            debug!("nothing to install or upgrade");
            return Ok(InstallResult::unchanged());
        }

        let cmd = self.apt_get(ASSUME_YES).arg("install").args(plan.packages());
        let result = self.executor.run(&cmd).await?;

        if !result.success() {
            return Err(Self::classify_failure(result));
        }

        let (upgraded, new_pkgs, removed) = Self::parse_summary(&result.combined_output());
        let install_result = InstallResult {
            upgraded_count: upgraded,
            new_count: new_pkgs,
            removed_count: removed,
            packages: plan.packages().map(str::to_string).collect(),
        };

        info!(
            upgraded = install_result.upgraded_count,
            installed = install_result.new_count,
            "apt transaction completed"
        );

        Ok(install_result)
    }
}

#[async_trait]
impl PackageManager for AptManager {
    #[instrument(skip(self))]
    async fn update_index(&self) -> Result<(), PackageError> {
        debug!("updating package index");

        let result = self.executor.run(&self.apt_get(["update", "-q"])).await?;

        if !result.success() {
            return Err(match Self::classify_failure(result) {
                PackageError::CommandFailed { message, .. } => {
                    PackageError::RepositoryUnavailable(message)
                }
                other => other,
            });
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn ensure_installed(&self, names: &[String]) -> Result<InstallResult, PackageError> {
        let plan = self.plan(names).await?;
        self.commit(&plan).await
    }
}
