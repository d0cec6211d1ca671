//! Engine binary provisioning.
//!
//! The runtime filesystem is ephemeral: the binary may survive from a prior
//! process instance or may need to be fetched now. Concurrent first callers
//! must share a single download.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::ProvisionError;

/// Where the engine binary is fetched from.
#[async_trait]
pub trait EngineSource: Send + Sync {
    async fn fetch(&self) -> Result<Bytes, ProvisionError>;
}

/// Downloads the official release asset for the current platform.
pub struct ReleaseSource {
    client: reqwest::Client,
    url: String,
}

impl ReleaseSource {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    /// Release asset URL for the current platform.
    pub fn default_url() -> &'static str {
        if cfg!(target_os = "windows") {
            "https://github.com/yt-dlp/yt-dlp/releases/latest/download/yt-dlp.exe"
        } else if cfg!(target_os = "macos") {
            "https://github.com/yt-dlp/yt-dlp/releases/latest/download/yt-dlp_macos"
        } else if cfg!(target_arch = "aarch64") {
            "https://github.com/yt-dlp/yt-dlp/releases/latest/download/yt-dlp_linux_aarch64"
        } else {
            "https://github.com/yt-dlp/yt-dlp/releases/latest/download/yt-dlp"
        }
    }
}

#[async_trait]
impl EngineSource for ReleaseSource {
    async fn fetch(&self) -> Result<Bytes, ProvisionError> {
        let response = self.client.get(&self.url).send().await?;
        if !response.status().is_success() {
            return Err(ProvisionError::BadStatus(response.status()));
        }
        Ok(response.bytes().await?)
    }
}

/// Makes the engine binary present and executable at a fixed path.
///
/// At most one download runs per process regardless of how many requests
/// arrive concurrently before it completes; a failed attempt leaves the
/// state clean so a later request retries from scratch.
pub struct EngineProvisioner {
    path: PathBuf,
    source: Arc<dyn EngineSource>,
    ready: AtomicBool,
    // Serializes provisioning; losers of the race re-check `ready` under it.
    gate: Mutex<()>,
}

impl EngineProvisioner {
    pub fn new(path: impl Into<PathBuf>, source: Arc<dyn EngineSource>) -> Self {
        Self {
            path: path.into(),
            source,
            ready: AtomicBool::new(false),
            gate: Mutex::new(()),
        }
    }

    /// Path the engine binary lives at once provisioned.
    pub fn engine_path(&self) -> &Path {
        &self.path
    }

    /// Resolves once the binary is present and executable at
    /// [`engine_path`](Self::engine_path), for the remainder of the
    /// process's life. Callable concurrently and repeatedly.
    pub async fn ensure_ready(&self) -> Result<(), ProvisionError> {
        if self.ready.load(Ordering::Acquire) {
            return Ok(());
        }

        let _flight = self.gate.lock().await;
        if self.ready.load(Ordering::Acquire) {
            return Ok(());
        }

        // A previous process instance may have left the binary behind.
        if tokio::fs::try_exists(&self.path).await? {
            debug!(path = %self.path.display(), "engine binary already present");
            self.ready.store(true, Ordering::Release);
            return Ok(());
        }

        self.install().await?;
        self.ready.store(true, Ordering::Release);
        Ok(())
    }

    async fn install(&self) -> Result<(), ProvisionError> {
        info!(path = %self.path.display(), "fetching engine binary");
        let bytes = self.source.fetch().await?;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Stage next to the target and rename into place so no caller ever
        // observes a partially-written binary at the known path.
        let staging = self.path.with_extension("tmp");
        tokio::fs::write(&staging, &bytes).await?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o755);
            tokio::fs::set_permissions(&staging, perms).await?;
        }

        if let Err(error) = tokio::fs::rename(&staging, &self.path).await {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(error.into());
        }

        info!(path = %self.path.display(), bytes = bytes.len(), "engine binary installed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct CountingSource {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl EngineSource for CountingSource {
        async fn fetch(&self) -> Result<Bytes, ProvisionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Bytes::from_static(b"#!/bin/sh\nexit 0\n"))
        }
    }

    /// Fails the first fetch, succeeds afterwards.
    #[derive(Default)]
    struct FlakySource {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl EngineSource for FlakySource {
        async fn fetch(&self) -> Result<Bytes, ProvisionError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                return Err(ProvisionError::Io(std::io::Error::other(
                    "connection reset",
                )));
            }
            Ok(Bytes::from_static(b"#!/bin/sh\nexit 0\n"))
        }
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let source = Arc::new(CountingSource::default());
        let provisioner = Arc::new(EngineProvisioner::new(
            dir.path().join("engine"),
            source.clone(),
        ));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let provisioner = provisioner.clone();
            handles.push(tokio::spawn(
                async move { provisioner.ensure_ready().await },
            ));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert!(provisioner.engine_path().exists());
    }

    #[tokio::test]
    async fn test_repeated_calls_download_once() {
        let dir = tempfile::tempdir().unwrap();
        let source = Arc::new(CountingSource::default());
        let provisioner = EngineProvisioner::new(dir.path().join("engine"), source.clone());

        provisioner.ensure_ready().await.unwrap();
        provisioner.ensure_ready().await.unwrap();

        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_attempt_is_retried_by_the_next_caller() {
        let dir = tempfile::tempdir().unwrap();
        let source = Arc::new(FlakySource::default());
        let provisioner = EngineProvisioner::new(dir.path().join("engine"), source.clone());

        assert!(provisioner.ensure_ready().await.is_err());
        provisioner.ensure_ready().await.unwrap();

        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
        assert!(provisioner.engine_path().exists());
    }

    #[tokio::test]
    async fn test_binary_left_by_a_prior_instance_is_reused() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine");
        std::fs::write(&path, b"already here").unwrap();

        let source = Arc::new(CountingSource::default());
        let provisioner = EngineProvisioner::new(&path, source.clone());
        provisioner.ensure_ready().await.unwrap();

        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_installed_binary_is_executable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let provisioner = EngineProvisioner::new(
            dir.path().join("engine"),
            Arc::new(CountingSource::default()),
        );
        provisioner.ensure_ready().await.unwrap();

        let mode = std::fs::metadata(provisioner.engine_path())
            .unwrap()
            .permissions()
            .mode();
        assert_ne!(mode & 0o111, 0);
    }

    #[tokio::test]
    async fn test_no_staging_residue_after_install() {
        let dir = tempfile::tempdir().unwrap();
        let provisioner = EngineProvisioner::new(
            dir.path().join("engine"),
            Arc::new(CountingSource::default()),
        );
        provisioner.ensure_ready().await.unwrap();

        assert!(!dir.path().join("engine.tmp").exists());
    }
}
