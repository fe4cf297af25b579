//! Streaming HTTP client used to fetch release artifacts.

use anyhow::{Context, Result};
use log::debug;
use reqwest::Client;
use std::io::Write;
use std::path::Path;

use crate::error::LauncherError;

const USER_AGENT: &str = concat!("seyuna-launcher/", env!("CARGO_PKG_VERSION"));

/// Thin wrapper over a reqwest [`Client`]. Performs exactly one request per
/// call; retrying is the caller's decision.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Creates a new HTTP client wrapping the given reqwest Client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client with the launcher's user agent and no credentials.
    pub fn build() -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self::new(client))
    }

    /// GET `url` and return the body as text. Non-2xx is a download error.
    #[tracing::instrument(skip(self))]
    pub async fn get_text(&self, url: &str) -> Result<String> {
        debug!("GET text from {}...", url);

        let response = self.send(url).await?;
        let status = response.status().as_u16();

        response.text().await.with_context(|| LauncherError::Download {
            url: url.to_string(),
            status: Some(status),
        })
    }

    /// Stream the body of `url` into the writer produced by `create_writer`.
    ///
    /// The writer is only created once the response is known to be a 2xx with
    /// at least one body chunk, so a failed request never touches `dest`.
    /// Returns the number of bytes written.
    #[tracing::instrument(skip(self, create_writer))]
    pub async fn download_file<W, F>(&self, url: &str, dest: &Path, create_writer: F) -> Result<u64>
    where
        W: Write,
        F: FnOnce() -> Result<W>,
    {
        debug!("Downloading {} to {:?}...", url, dest);

        let mut response = self.send(url).await?;
        let status = response.status().as_u16();

        let write_error = || LauncherError::Write {
            path: dest.to_path_buf(),
        };

        let first = response.chunk().await.with_context(write_error)?;
        let Some(first) = first.filter(|chunk| !chunk.is_empty()) else {
            return Err(anyhow::Error::new(LauncherError::Download {
                url: url.to_string(),
                status: Some(status),
            })
            .context("Response carried no body"));
        };

        let mut writer = create_writer()?;
        writer.write_all(&first).with_context(write_error)?;
        let mut downloaded_bytes = first.len() as u64;

        while let Some(chunk) = response.chunk().await.with_context(write_error)? {
            writer.write_all(&chunk).with_context(write_error)?;
            downloaded_bytes += chunk.len() as u64;
        }
        writer.flush().with_context(write_error)?;

        debug!(
            "Downloaded {:.2} MB",
            downloaded_bytes as f64 / (1024.0 * 1024.0)
        );

        Ok(downloaded_bytes)
    }

    /// Issue the GET and turn transport failures and non-2xx statuses into
    /// [`LauncherError::Download`].
    async fn send(&self, url: &str) -> Result<reqwest::Response> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| LauncherError::Download {
                url: url.to_string(),
                status: None,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(LauncherError::Download {
                url: url.to_string(),
                status: Some(status.as_u16()),
            }
            .into());
        }

        Ok(response)
    }
}
