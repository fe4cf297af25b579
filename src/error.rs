//! Failure taxonomy for the resolve, fetch, place and delegate pipeline.
//!
//! Components return `anyhow::Result` and attach a [`LauncherError`] at the
//! point of failure; the binaries walk the chain with [`exit_code_for`] to pick
//! the process exit code.

use std::path::PathBuf;
use thiserror::Error;

/// `EX_DATAERR`: downloaded bytes did not match the expected checksum.
pub const EXIT_VERIFICATION: i32 = 65;
/// `EX_UNAVAILABLE`: no artifact exists for this platform.
pub const EXIT_UNSUPPORTED: i32 = 69;
/// `EX_SOFTWARE`: any launcher failure without a more specific code.
pub const EXIT_INTERNAL: i32 = 70;
/// `EX_OSERR`: the installed binary could not be spawned.
pub const EXIT_DELEGATION: i32 = 71;
/// `EX_IOERR`: the artifact could not be persisted.
pub const EXIT_WRITE: i32 = 74;
/// `EX_TEMPFAIL`: the artifact could not be downloaded.
pub const EXIT_DOWNLOAD: i32 = 75;
/// `EX_CONFIG`: the version manifest is missing or malformed.
pub const EXIT_MANIFEST: i32 = 78;

#[derive(Debug, Error)]
pub enum LauncherError {
    #[error("Unsupported platform: {platform}")]
    UnsupportedPlatform { platform: String },

    #[error("Failed to read version manifest {}", path.display())]
    ManifestRead { path: PathBuf },

    #[error("Invalid version manifest {}: {reason}", path.display())]
    ManifestParse { path: PathBuf, reason: String },

    /// `status` is `None` when the request never produced a response.
    #[error("Failed to download {url}: {}", describe_status(*status))]
    Download { url: String, status: Option<u16> },

    #[error("Failed to write artifact to {}", path.display())]
    Write { path: PathBuf },

    #[error("Platform package {package} is not installed")]
    PackageMissing { package: String },

    #[error("Checksum mismatch: expected {expected}, got {actual}")]
    Verification { expected: String, actual: String },

    #[error("Failed to launch {}: {reason}", path.display())]
    Delegation { path: PathBuf, reason: String },

    #[error("Installer exited with code {code}")]
    InstallerFailed { code: i32 },
}

fn describe_status(status: Option<u16>) -> String {
    match status {
        Some(0) | None => "no response".to_string(),
        Some(code) => format!("HTTP {}", code),
    }
}

impl LauncherError {
    /// Short name of the pipeline stage that failed, used in diagnostics.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::UnsupportedPlatform { .. } => "platform",
            Self::ManifestRead { .. } | Self::ManifestParse { .. } => "manifest",
            Self::Download { .. } | Self::PackageMissing { .. } => "fetch",
            Self::Write { .. } => "write",
            Self::Verification { .. } => "verify",
            Self::Delegation { .. } => "launch",
            Self::InstallerFailed { .. } => "install",
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            Self::UnsupportedPlatform { .. } | Self::PackageMissing { .. } => EXIT_UNSUPPORTED,
            Self::ManifestRead { .. } | Self::ManifestParse { .. } => EXIT_MANIFEST,
            Self::Download { .. } => EXIT_DOWNLOAD,
            Self::Write { .. } => EXIT_WRITE,
            Self::Verification { .. } => EXIT_VERIFICATION,
            Self::Delegation { .. } => EXIT_DELEGATION,
            Self::InstallerFailed { code } => *code,
        }
    }
}

/// Find the outermost [`LauncherError`] in an error chain, whether it was
/// attached as context or is the root cause.
pub fn find_launcher_error(error: &anyhow::Error) -> Option<&LauncherError> {
    error.downcast_ref::<LauncherError>().or_else(|| {
        error
            .chain()
            .find_map(|cause| cause.downcast_ref::<LauncherError>())
    })
}

/// Exit code for a failed run: the taxonomy's code, or [`EXIT_INTERNAL`].
pub fn exit_code_for(error: &anyhow::Error) -> i32 {
    find_launcher_error(error)
        .map(LauncherError::exit_code)
        .unwrap_or(EXIT_INTERNAL)
}

/// Render a diagnostic line naming the failing stage and the full cause chain.
pub fn diagnostic(error: &anyhow::Error) -> String {
    let stage = find_launcher_error(error)
        .map(LauncherError::stage)
        .unwrap_or("error");
    format!("seyuna: {}: {:#}", stage, error)
}
