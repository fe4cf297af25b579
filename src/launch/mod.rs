//! Launcher: makes sure the local binary exists, then hands the process over
//! to it.

mod deferred;
mod subprocess;

use anyhow::{Context, Result};
use log::{debug, info};
use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::Arc;

use crate::{
    artifact::binary_path,
    error::LauncherError,
    install::{Install, config::install_root_from_env},
    platform::Platform,
    runtime::Runtime,
};

pub use deferred::EnvInstaller;
pub use subprocess::SubprocessInstaller;

pub struct Launcher<R: Runtime, I: Install + ?Sized = dyn Install> {
    runtime: Arc<R>,
    installer: Arc<I>,
    binary: PathBuf,
}

impl<R: Runtime + 'static> Launcher<R> {
    /// Launcher for the binary under the install root named by the
    /// environment. The remaining install settings are read only if an
    /// install turns out to be needed.
    pub fn from_env(runtime: Arc<R>, platform: Platform) -> Result<Self> {
        let binary = binary_path(&install_root_from_env(runtime.as_ref())?, platform);
        let installer: Arc<dyn Install> =
            Arc::new(EnvInstaller::new(Arc::clone(&runtime), platform));
        Ok(Self::new(runtime, installer, binary))
    }
}

impl<R: Runtime, I: Install + ?Sized> Launcher<R, I> {
    pub fn new(runtime: Arc<R>, installer: Arc<I>, binary: PathBuf) -> Self {
        Self {
            runtime,
            installer,
            binary,
        }
    }

    /// Install if needed, run the binary with `args` untouched, and return its
    /// exit code. Nothing is spawned if the install fails.
    #[tracing::instrument(skip(self, args))]
    pub async fn launch(&self, args: &[OsString]) -> Result<i32> {
        let binary = if self.runtime.exists(&self.binary) {
            debug!("Found {:?}", self.binary);
            self.binary.clone()
        } else {
            info!("{:?} not found, installing it first", self.binary);
            let installed = self.installer.install().await?;

            if !self.runtime.exists(&installed) {
                return Err(LauncherError::Delegation {
                    path: installed,
                    reason: "binary is missing after a successful install".to_string(),
                }
                .into());
            }
            installed
        };

        self.runtime
            .run(&binary, args)
            .with_context(|| LauncherError::Delegation {
                path: binary.clone(),
                reason: "could not spawn process".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{EXIT_DOWNLOAD, exit_code_for};
    use crate::install::MockInstall;
    use crate::runtime::MockRuntime;
    use mockall::predicate::eq;

    fn binary() -> PathBuf {
        PathBuf::from("/pkg/bin/seyuna")
    }

    #[tokio::test]
    async fn test_launch_installed_binary_skips_installer() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_exists()
            .with(eq(binary()))
            .returning(|_| true);
        runtime
            .expect_run()
            .withf(|program, args| {
                program == binary().as_path() && args == [OsString::from("--help")]
            })
            .times(1)
            .returning(|_, _| Ok(0));

        // No expectations: any install call panics.
        let installer = MockInstall::new();

        let launcher = Launcher::new(Arc::new(runtime), Arc::new(installer), binary());
        let code = launcher.launch(&[OsString::from("--help")]).await.unwrap();
        assert_eq!(code, 0);
    }

    #[tokio::test]
    async fn test_launch_missing_binary_installs_once_then_runs() {
        let mut runtime = MockRuntime::new();
        let mut seq = mockall::Sequence::new();
        runtime
            .expect_exists()
            .with(eq(binary()))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| false);
        runtime
            .expect_exists()
            .with(eq(binary()))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| true);
        runtime
            .expect_run()
            .withf(|program, args| program == binary().as_path() && args.is_empty())
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(0));

        let mut installer = MockInstall::new();
        installer.expect_install().times(1).returning(|| Ok(binary()));

        let launcher = Launcher::new(Arc::new(runtime), Arc::new(installer), binary());
        assert_eq!(launcher.launch(&[]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_launch_failed_install_never_spawns() {
        let mut runtime = MockRuntime::new();
        runtime.expect_exists().returning(|_| false);
        // No run expectation: spawning would panic.

        let mut installer = MockInstall::new();
        installer.expect_install().times(1).returning(|| {
            Err(LauncherError::Download {
                url: "https://github.com/seyuna-corp/seyuna-cli/releases/download/v1.0.0/seyuna-linux"
                    .to_string(),
                status: Some(404),
            }
            .into())
        });

        let launcher = Launcher::new(Arc::new(runtime), Arc::new(installer), binary());
        let err = launcher.launch(&[]).await.unwrap_err();
        assert_eq!(exit_code_for(&err), EXIT_DOWNLOAD);
    }

    #[tokio::test]
    async fn test_launch_relays_child_exit_code_and_arguments() {
        let args = vec![
            OsString::from("ui"),
            OsString::from("--watch"),
            OsString::from("a b"),
        ];
        let expected = args.clone();

        let mut runtime = MockRuntime::new();
        runtime.expect_exists().returning(|_| true);
        runtime
            .expect_run()
            .withf(move |_, passed| passed == expected.as_slice())
            .returning(|_, _| Ok(42));

        let launcher = Launcher::new(Arc::new(runtime), Arc::new(MockInstall::new()), binary());
        assert_eq!(launcher.launch(&args).await.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_launch_from_env_ignores_install_settings_when_installed() {
        let mut runtime = MockRuntime::new();
        runtime.expect_env_var().returning(|key| match key {
            "SEYUNA_ROOT" => Ok("/pkg".to_string()),
            "SEYUNA_RETRIES" => Ok("many".to_string()),
            "SEYUNA_WINDOWS_SHIM" => Ok("sometimes".to_string()),
            _ => Err(std::env::VarError::NotPresent),
        });
        runtime
            .expect_exists()
            .with(eq(binary()))
            .returning(|_| true);
        runtime
            .expect_run()
            .withf(|program, _| program == binary().as_path())
            .times(1)
            .returning(|_, _| Ok(0));

        let launcher = Launcher::from_env(Arc::new(runtime), Platform::Linux).unwrap();
        assert_eq!(launcher.launch(&[]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_launch_binary_missing_after_install() {
        let mut runtime = MockRuntime::new();
        runtime.expect_exists().returning(|_| false);

        let mut installer = MockInstall::new();
        installer.expect_install().returning(|| Ok(binary()));

        let launcher = Launcher::new(Arc::new(runtime), Arc::new(installer), binary());
        let err = launcher.launch(&[]).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LauncherError>(),
            Some(LauncherError::Delegation { .. })
        ));
    }

    #[tokio::test]
    async fn test_launch_spawn_failure_is_delegation_error() {
        let mut runtime = MockRuntime::new();
        runtime.expect_exists().returning(|_| true);
        runtime
            .expect_run()
            .returning(|_, _| Err(anyhow::anyhow!("Exec format error")));

        let launcher = Launcher::new(Arc::new(runtime), Arc::new(MockInstall::new()), binary());
        let err = launcher.launch(&[]).await.unwrap_err();
        match err.downcast_ref::<LauncherError>() {
            Some(LauncherError::Delegation { path, .. }) => assert_eq!(path, &binary()),
            other => panic!("expected Delegation error, got {:?}", other),
        }
    }
}
