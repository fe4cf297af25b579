use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use log::info;
use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::Arc;

use crate::{error::LauncherError, install::Install, runtime::Runtime};

/// Runs an external installer command with inherited standard streams
/// instead of installing in-process.
pub struct SubprocessInstaller<R: Runtime> {
    runtime: Arc<R>,
    program: PathBuf,
    args: Vec<OsString>,
    binary: PathBuf,
}

impl<R: Runtime> SubprocessInstaller<R> {
    /// `command` is the program followed by its arguments; `binary` is where
    /// the command is expected to leave the executable.
    pub fn new(runtime: Arc<R>, command: &[String], binary: PathBuf) -> Result<Self> {
        let Some((program, args)) = command.split_first() else {
            bail!("Installer command is empty");
        };
        Ok(Self {
            runtime,
            program: PathBuf::from(program),
            args: args.iter().map(OsString::from).collect(),
            binary,
        })
    }
}

#[async_trait]
impl<R: Runtime + 'static> Install for SubprocessInstaller<R> {
    #[tracing::instrument(skip(self))]
    async fn install(&self) -> Result<PathBuf> {
        info!("Running installer {:?} {:?}", self.program, self.args);

        let code = self
            .runtime
            .run(&self.program, &self.args)
            .with_context(|| format!("Failed to run installer {}", self.program.display()))?;

        if code != 0 {
            return Err(LauncherError::InstallerFailed { code }.into());
        }
        Ok(self.binary.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::exit_code_for;
    use crate::runtime::MockRuntime;

    fn command() -> Vec<String> {
        ["deno", "run", "--allow-net", "deno-install.ts"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_runs_command_with_arguments() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_run()
            .withf(|program, args| {
                program == std::path::Path::new("deno")
                    && args
                        == [
                            OsString::from("run"),
                            OsString::from("--allow-net"),
                            OsString::from("deno-install.ts"),
                        ]
            })
            .times(1)
            .returning(|_, _| Ok(0));

        let installer =
            SubprocessInstaller::new(Arc::new(runtime), &command(), PathBuf::from("bin/seyuna"))
                .unwrap();
        assert_eq!(installer.install().await.unwrap(), PathBuf::from("bin/seyuna"));
    }

    #[tokio::test]
    async fn test_nonzero_exit_propagates_code() {
        let mut runtime = MockRuntime::new();
        runtime.expect_run().returning(|_, _| Ok(3));

        let installer =
            SubprocessInstaller::new(Arc::new(runtime), &command(), PathBuf::from("bin/seyuna"))
                .unwrap();
        let err = installer.install().await.unwrap_err();
        assert_eq!(exit_code_for(&err), 3);
    }

    #[test]
    fn test_empty_command_is_rejected() {
        let result =
            SubprocessInstaller::new(Arc::new(MockRuntime::new()), &[], PathBuf::from("bin/seyuna"));
        assert!(result.is_err());
    }
}
