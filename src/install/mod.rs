//! Installer: resolves the artifact for this platform and version, fetches it
//! next to its final location, verifies it, makes it executable and moves it
//! into place.

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::{
    artifact::Artifact,
    error::LauncherError,
    fetch::{DownloadFetcher, FetchStrategy, PackageFetcher},
    http::{HttpClient, with_retry},
    manifest::read_version,
    runtime::Runtime,
    verify::{ChecksumPolicy, parse_checksum_file, sha256_file, verify_sha256},
};

pub mod config;
mod shim;

use config::{Config, FetchSource};
pub use shim::{shim_contents, shim_path};

/// Permission bits of an installed executable on Unix.
pub const EXECUTABLE_MODE: u32 = 0o755;

/// Something that can make the local binary exist and report where it is.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Install: Send + Sync {
    async fn install(&self) -> Result<PathBuf>;
}

pub struct Installer<R: Runtime, F: FetchStrategy + ?Sized = dyn FetchStrategy> {
    runtime: Arc<R>,
    fetcher: Arc<F>,
    http_client: HttpClient,
    config: Config,
}

impl<R: Runtime + 'static> Installer<R> {
    /// Wire up the fetch strategy selected by `config.source`.
    pub fn from_config(runtime: Arc<R>, config: Config) -> Result<Self> {
        let http_client = HttpClient::build()?;
        let fetcher: Arc<dyn FetchStrategy> = match &config.source {
            FetchSource::Download => Arc::new(DownloadFetcher::new(
                Arc::clone(&runtime),
                http_client.clone(),
            )),
            FetchSource::Package(dir) => {
                Arc::new(PackageFetcher::new(Arc::clone(&runtime), dir.clone()))
            }
        };
        Ok(Self::new(runtime, fetcher, http_client, config))
    }
}

impl<R: Runtime + 'static, F: FetchStrategy + ?Sized> Installer<R, F> {
    pub fn new(runtime: Arc<R>, fetcher: Arc<F>, http_client: HttpClient, config: Config) -> Self {
        Self {
            runtime,
            fetcher,
            http_client,
            config,
        }
    }

    /// Run the whole install and return the path of the executable.
    #[tracing::instrument(skip(self))]
    pub async fn run(&self) -> Result<PathBuf> {
        let version = read_version(self.runtime.as_ref(), &self.config.manifest_path)?;
        let artifact = Artifact::new(
            &self.config.release,
            &version,
            self.config.platform,
            &self.config.install_root,
        );
        debug!("Installing {:?}", artifact);

        let staging = staging_path(&artifact.destination);
        if let Err(e) = self.place(&artifact, &staging).await {
            self.discard(&staging);
            return Err(e);
        }

        info!("Installed {} to {:?}", artifact.name, artifact.destination);
        eprintln!(
            "seyuna CLI v{} installed to {}",
            version,
            artifact.destination.display()
        );
        Ok(artifact.destination)
    }

    /// Fetch into `staging`, verify, mark executable, write the shim and
    /// rename over the destination. The destination is never observed
    /// half-written, and it only appears once everything else is in place.
    async fn place(&self, artifact: &Artifact, staging: &Path) -> Result<()> {
        let source = self.fetcher.describe(artifact);
        let bytes = with_retry(self.config.retry, "fetch", || {
            self.fetcher.fetch(artifact, staging)
        })
        .await?;
        debug!("Fetched {} bytes from {}", bytes, source);

        self.verify(artifact, staging).await?;

        if !artifact.platform.is_windows() {
            self.runtime
                .set_permissions(staging, EXECUTABLE_MODE)
                .with_context(|| LauncherError::Write {
                    path: artifact.destination.clone(),
                })?;
        }

        if self.config.windows_shim && artifact.platform.is_windows() {
            self.write_shim(&artifact.destination)?;
        }

        self.runtime
            .rename(staging, &artifact.destination)
            .with_context(|| LauncherError::Write {
                path: artifact.destination.clone(),
            })?;
        Ok(())
    }

    async fn verify(&self, artifact: &Artifact, staging: &Path) -> Result<()> {
        match &self.config.checksum {
            ChecksumPolicy::None => Ok(()),
            ChecksumPolicy::Sha256(expected) => {
                verify_sha256(self.runtime.as_ref(), staging, expected)
            }
            ChecksumPolicy::Published => {
                let url = format!("{}.sha256", artifact.url);
                let text = self.http_client.get_text(&url).await?;
                match parse_checksum_file(&text, &artifact.name) {
                    Some(expected) => verify_sha256(self.runtime.as_ref(), staging, &expected),
                    None => {
                        let actual = sha256_file(self.runtime.as_ref(), staging)?;
                        Err(anyhow::Error::new(LauncherError::Verification {
                            expected: "<unpublished>".to_string(),
                            actual,
                        })
                        .context(format!("{} lists no checksum for {}", url, artifact.name)))
                    }
                }
            }
        }
    }

    fn write_shim(&self, destination: &Path) -> Result<()> {
        let path = shim_path(destination);
        self.runtime
            .write(&path, shim_contents(destination).as_bytes())
            .with_context(|| LauncherError::Write { path: path.clone() })?;
        debug!("Wrote command shim {:?}", path);
        Ok(())
    }

    /// Best-effort removal of a staging file left by a failed install.
    fn discard(&self, staging: &Path) {
        if self.runtime.exists(staging) {
            if let Err(e) = self.runtime.remove_file(staging) {
                warn!("Failed to remove partial download {:?}: {:#}", staging, e);
            }
        }
    }
}

#[async_trait]
impl<R: Runtime + 'static, F: FetchStrategy + ?Sized> Install for Installer<R, F> {
    async fn install(&self) -> Result<PathBuf> {
        self.run().await
    }
}

/// Sibling of `destination` that a fetch writes to before the final rename.
/// Unique per process so concurrent installs never share a staging file.
pub fn staging_path(destination: &Path) -> PathBuf {
    let name = destination
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    destination.with_file_name(format!(".{}.{}.part", name, std::process::id()))
}
