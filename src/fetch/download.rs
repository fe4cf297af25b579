use anyhow::{Context, Result};
use async_trait::async_trait;
use log::info;
use std::path::Path;
use std::sync::Arc;

use super::{FetchStrategy, ensure_parent_dir};
use crate::{artifact::Artifact, error::LauncherError, http::HttpClient, runtime::Runtime};

/// Fetches the artifact from its release URL.
pub struct DownloadFetcher<R: Runtime> {
    runtime: Arc<R>,
    http_client: HttpClient,
}

impl<R: Runtime> DownloadFetcher<R> {
    pub fn new(runtime: Arc<R>, http_client: HttpClient) -> Self {
        Self {
            runtime,
            http_client,
        }
    }
}

#[async_trait]
impl<R: Runtime + 'static> FetchStrategy for DownloadFetcher<R> {
    #[tracing::instrument(skip(self, artifact), fields(url = %artifact.url))]
    async fn fetch(&self, artifact: &Artifact, dest: &Path) -> Result<u64> {
        info!("Downloading {}...", artifact.url);

        let runtime = self.runtime.as_ref();
        let bytes = self
            .http_client
            .download_file(&artifact.url, dest, || {
                ensure_parent_dir(runtime, dest)?;
                runtime
                    .create_file(dest)
                    .with_context(|| LauncherError::Write {
                        path: dest.to_path_buf(),
                    })
            })
            .await?;

        info!("Download complete.");
        Ok(bytes)
    }

    fn describe(&self, artifact: &Artifact) -> String {
        artifact.url.clone()
    }
}
