//! Third-party apt repository registration

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use beaver_exec::{CommandExecutor, CommandLine};
use tracing::{debug, info, instrument, warn};

use crate::error::PackageError;
use crate::traits::{KeyFetcher, PackageRepository};
use crate::types::RepositoryStatus;

/// The repository to register: where its entry lives, what it says, and where its key is
#[derive(Debug, Clone)]
pub struct AptSource {
    /// File under `sources.list.d`
    pub path: PathBuf,
    /// Full `deb <url> <dist> <components>` line
    pub line: String,
    /// Keyserver URL serving the signing key
    pub key_url: String,
}

/// Registers an [`AptSource`] exactly once
pub struct AptRepository {
    executor: Arc<dyn CommandExecutor>,
    fetcher: Arc<dyn KeyFetcher>,
    source: AptSource,
    use_sudo: bool,
}

impl AptRepository {
    pub fn new(
        executor: Arc<dyn CommandExecutor>,
        fetcher: Arc<dyn KeyFetcher>,
        source: AptSource,
        use_sudo: bool,
    ) -> Self {
        Self {
            executor,
            fetcher,
            source,
            use_sudo,
        }
    }

    /// The sources file exists and its trimmed content is part of the expected line
    pub async fn is_registered(&self) -> Result<bool, PackageError> {
        match tokio::fs::read_to_string(&self.source.path).await {
            Ok(content) => Ok(self.source.line.contains(content.trim())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(sources_error(&self.source.path, &e)),
        }
    }

    /// Pipe key material into `apt-key add -`
    ///
    /// Anything other than a clean `OK` is logged; registration carries on regardless.
    #[instrument(skip_all)]
    async fn import_key(&self, key: Vec<u8>) -> Result<(), PackageError> {
        let cmd = CommandLine::new("apt-key")
            .args(["add", "-"])
            .stdin(key)
            .with_sudo(self.use_sudo);
        let result = self.executor.run(&cmd).await?;

        if result.stdout != "OK\n" || !result.stderr.is_empty() {
            warn!(
                status = result.status,
                output = %result.combined_output(),
                "error running apt-key add"
            );
        } else {
            debug!("signing key imported");
        }

        Ok(())
    }

    async fn write_source(&self) -> Result<(), PackageError> {
        let path = &self.source.path;
        tokio::fs::write(path, format!("{}\n", self.source.line))
            .await
            .map_err(|e| sources_error(path, &e))?;

        info!(path = %path.display(), "wrote apt source");
        Ok(())
    }
}

fn sources_error(path: &Path, e: &std::io::Error) -> PackageError {
    PackageError::SourcesFile {
        path: path.display().to_string(),
        message: e.to_string(),
    }
}

#[async_trait]
impl PackageRepository for AptRepository {
    #[instrument(skip(self), fields(path = %self.source.path.display()))]
    async fn ensure_repository(&self) -> Result<RepositoryStatus, PackageError> {
        if self.is_registered().await? {
            debug!("apt source already registered");
            return Ok(RepositoryStatus::AlreadyRegistered);
        }

        info!(url = %self.source.key_url, "registering apt source");
        let key = self.fetcher.fetch(&self.source.key_url).await?;
        self.import_key(key).await?;
        self.write_source().await?;

        Ok(RepositoryStatus::Registered)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use beaver_exec::{CommandResult, ExecError};
    use tempfile::TempDir;

    use super::*;

    const LINE: &str = "deb http://ppa.launchpad.net/evarlast/experimental/ubuntu trusty main";
    const KEY_URL: &str = "http://keyserver.example/pks/lookup?op=get&search=0xA65E2E5D742A38EE";

    #[derive(Default)]
    struct CountingFetcher {
        urls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl KeyFetcher for CountingFetcher {
        async fn fetch(&self, url: &str) -> Result<Vec<u8>, PackageError> {
            self.urls.lock().unwrap().push(url.to_string());
            Ok(b"-----BEGIN PGP PUBLIC KEY BLOCK-----".to_vec())
        }
    }

    struct AptKeyExecutor {
        reply: CommandResult,
        calls: Mutex<Vec<CommandLine>>,
    }

    impl AptKeyExecutor {
        fn replying(reply: CommandResult) -> Self {
            Self {
                reply,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl CommandExecutor for AptKeyExecutor {
        async fn run(&self, cmd: &CommandLine) -> Result<CommandResult, ExecError> {
            self.calls.lock().unwrap().push(cmd.clone());
            Ok(self.reply.clone())
        }

        fn executor_type(&self) -> &'static str {
            "apt-key"
        }
    }

    fn repository(
        dir: &TempDir,
        executor: Arc<AptKeyExecutor>,
        fetcher: Arc<CountingFetcher>,
    ) -> AptRepository {
        let source = AptSource {
            path: dir.path().join("beaver.list"),
            line: LINE.to_string(),
            key_url: KEY_URL.to_string(),
        };
        AptRepository::new(executor, fetcher, source, false)
    }

    #[tokio::test]
    async fn test_registers_missing_source() {
        let dir = TempDir::new().unwrap();
        let executor = Arc::new(AptKeyExecutor::replying(CommandResult::ok("OK\n")));
        let fetcher = Arc::new(CountingFetcher::default());
        let repo = repository(&dir, executor.clone(), fetcher.clone());

        let status = repo.ensure_repository().await.unwrap();

        assert_eq!(status, RepositoryStatus::Registered);
        assert_eq!(*fetcher.urls.lock().unwrap(), vec![KEY_URL.to_string()]);

        let calls = executor.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].to_string(), "apt-key add -");
        assert_eq!(
            calls[0].get_stdin(),
            Some(&b"-----BEGIN PGP PUBLIC KEY BLOCK-----"[..])
        );

        let written = std::fs::read_to_string(dir.path().join("beaver.list")).unwrap();
        assert_eq!(written, format!("{LINE}\n"));
    }

    #[tokio::test]
    async fn test_existing_source_is_a_no_op() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("beaver.list"), format!("{LINE}\n")).unwrap();
        let executor = Arc::new(AptKeyExecutor::replying(CommandResult::ok("OK\n")));
        let fetcher = Arc::new(CountingFetcher::default());
        let repo = repository(&dir, executor.clone(), fetcher.clone());

        let status = repo.ensure_repository().await.unwrap();

        assert_eq!(status, RepositoryStatus::AlreadyRegistered);
        assert!(fetcher.urls.lock().unwrap().is_empty());
        assert!(executor.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_foreign_source_content_is_replaced() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("beaver.list"), "deb http://mirror.example stable main\n")
            .unwrap();
        let executor = Arc::new(AptKeyExecutor::replying(CommandResult::ok("OK\n")));
        let fetcher = Arc::new(CountingFetcher::default());
        let repo = repository(&dir, executor, fetcher.clone());

        assert!(!repo.is_registered().await.unwrap());
        repo.ensure_repository().await.unwrap();

        assert_eq!(fetcher.urls.lock().unwrap().len(), 1);
        assert!(repo.is_registered().await.unwrap());
    }

    #[tokio::test]
    async fn test_failed_key_import_still_registers() {
        let dir = TempDir::new().unwrap();
        let executor = Arc::new(AptKeyExecutor::replying(CommandResult {
            stderr: "gpg: no valid OpenPGP data found.".to_string(),
            ..CommandResult::failed(2, "")
        }));
        let fetcher = Arc::new(CountingFetcher::default());
        let repo = repository(&dir, executor, fetcher);

        let status = repo.ensure_repository().await.unwrap();

        assert_eq!(status, RepositoryStatus::Registered);
        assert!(dir.path().join("beaver.list").exists());
    }
}
