//! Child process spawning with inherited standard streams.

use anyhow::{Context, Result};
use log::debug;
use std::ffi::OsString;
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};

use super::RealRuntime;

/// Exit code reported when the platform gives neither a code nor a signal.
const UNKNOWN_EXIT_CODE: i32 = 1;

/// Collapse an [`ExitStatus`] into the integer the launcher should exit with.
///
/// A normal exit yields its own code. On Unix a signal-terminated child yields
/// `128 + signal`, matching what POSIX shells report.
pub fn exit_code_from_status(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    UNKNOWN_EXIT_CODE
}

impl RealRuntime {
    #[tracing::instrument(skip(self, args))]
    pub(crate) fn run_impl(&self, program: &Path, args: &[OsString]) -> Result<i32> {
        debug!("Spawning {:?} with {} argument(s)", program, args.len());

        let status = Command::new(program)
            .args(args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .with_context(|| format!("Failed to spawn {}", program.display()))?;

        let code = exit_code_from_status(status);
        debug!("{:?} exited with {}", program, code);
        Ok(code)
    }
}
