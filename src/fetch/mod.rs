//! Strategies for materializing a platform artifact on disk.
//!
//! The installer does not care whether bytes come from a release download or
//! from a platform-specific package already present on disk; it hands the
//! [`Artifact`] and a destination to a [`FetchStrategy`].

mod download;
mod package;

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::Path;

use crate::{artifact::Artifact, error::LauncherError, runtime::Runtime};

pub use download::DownloadFetcher;
pub use package::{PACKAGE_SCOPE, PackageFetcher, package_name};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FetchStrategy: Send + Sync {
    /// Write the artifact's bytes to `dest`, creating parent directories and
    /// truncating any previous content. Returns the number of bytes written.
    async fn fetch(&self, artifact: &Artifact, dest: &Path) -> Result<u64>;

    /// Human-readable origin of the bytes, for logs.
    fn describe(&self, artifact: &Artifact) -> String;
}

/// Create every missing parent directory of `dest`.
pub(crate) fn ensure_parent_dir<R: Runtime + ?Sized>(runtime: &R, dest: &Path) -> Result<()> {
    if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
        runtime
            .create_dir_all(parent)
            .with_context(|| LauncherError::Write {
                path: dest.to_path_buf(),
            })?;
    }
    Ok(())
}
