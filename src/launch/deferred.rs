use anyhow::Result;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;

use super::SubprocessInstaller;
use crate::{
    install::{Install, Installer, config::Config},
    platform::Platform,
    runtime::Runtime,
};

/// Installer whose configuration is read from the environment only when an
/// install is actually needed. A launch of an existing binary never parses
/// install settings or builds an HTTP client.
pub struct EnvInstaller<R: Runtime> {
    runtime: Arc<R>,
    platform: Platform,
}

impl<R: Runtime + 'static> EnvInstaller<R> {
    pub fn new(runtime: Arc<R>, platform: Platform) -> Self {
        Self { runtime, platform }
    }
}

#[async_trait]
impl<R: Runtime + 'static> Install for EnvInstaller<R> {
    async fn install(&self) -> Result<PathBuf> {
        let config = Config::from_env(self.runtime.as_ref(), self.platform)?;
        installer_for(Arc::clone(&self.runtime), config)?
            .install()
            .await
    }
}

/// The external installer command when one is configured, else the
/// in-process installer.
fn installer_for<R: Runtime + 'static>(
    runtime: Arc<R>,
    config: Config,
) -> Result<Arc<dyn Install>> {
    let installer: Arc<dyn Install> = match &config.install_command {
        Some(command) => Arc::new(SubprocessInstaller::new(
            runtime,
            command,
            config.binary_path(),
        )?),
        None => Arc::new(Installer::from_config(runtime, config)?),
    };
    Ok(installer)
}
