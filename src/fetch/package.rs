use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{debug, info};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use super::{FetchStrategy, ensure_parent_dir};
use crate::{artifact::Artifact, error::LauncherError, platform::Platform, runtime::Runtime};

/// npm scope the per-platform binary packages are published under.
pub const PACKAGE_SCOPE: &str = "@seyuna";

/// Name of the package carrying the binary for `platform`, e.g. `@seyuna/cli-linux`.
pub fn package_name(platform: Platform) -> String {
    format!("{}/cli-{}", PACKAGE_SCOPE, platform.package_tag())
}

/// Copies the executable out of an installed platform package instead of
/// downloading it.
///
/// The package is looked up the way Node resolves modules: in
/// `node_modules/` of the start directory, then of each ancestor.
pub struct PackageFetcher<R: Runtime> {
    runtime: Arc<R>,
    start_dir: PathBuf,
}

impl<R: Runtime> PackageFetcher<R> {
    pub fn new(runtime: Arc<R>, start_dir: PathBuf) -> Self {
        Self { runtime, start_dir }
    }

    /// Path of the packaged executable for `platform`, if one is installed.
    ///
    /// A relative start directory is taken from the current directory so that
    /// every ancestor gets searched.
    pub fn locate(&self, platform: Platform) -> Result<Option<PathBuf>> {
        let start = if self.start_dir.is_absolute() {
            self.start_dir.clone()
        } else {
            self.runtime
                .current_dir()?
                .join(&self.start_dir)
                .components()
                .filter(|c| *c != Component::CurDir)
                .collect()
        };

        let relative = Path::new("node_modules")
            .join(package_name(platform))
            .join("bin")
            .join(platform.executable_name());

        Ok(start.ancestors().find_map(|dir| {
            let candidate = dir.join(&relative);
            debug!("Looking for platform package binary at {:?}", candidate);
            self.runtime.is_file(&candidate).then_some(candidate)
        }))
    }
}

#[async_trait]
impl<R: Runtime + 'static> FetchStrategy for PackageFetcher<R> {
    #[tracing::instrument(skip(self, artifact))]
    async fn fetch(&self, artifact: &Artifact, dest: &Path) -> Result<u64> {
        let source = self
            .locate(artifact.platform)?
            .ok_or_else(|| LauncherError::PackageMissing {
                package: package_name(artifact.platform),
            })?;

        info!("Copying {:?}...", source);
        ensure_parent_dir(self.runtime.as_ref(), dest)?;

        let bytes = self
            .runtime
            .copy(&source, dest)
            .with_context(|| LauncherError::Write {
                path: dest.to_path_buf(),
            })?;

        if bytes == 0 {
            return Err(anyhow::Error::new(LauncherError::Write {
                path: dest.to_path_buf(),
            })
            .context(format!("Packaged binary {:?} is empty", source)));
        }

        Ok(bytes)
    }

    fn describe(&self, artifact: &Artifact) -> String {
        package_name(artifact.platform)
    }
}
