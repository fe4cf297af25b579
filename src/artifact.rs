//! Release location and the artifact descriptor derived from it.

use std::path::{Path, PathBuf};

use crate::platform::Platform;

pub const DEFAULT_RELEASE_HOST: &str = "https://github.com";
pub const DEFAULT_OWNER: &str = "seyuna-corp";
pub const DEFAULT_PROJECT: &str = "seyuna-cli";

/// Directory under the install root that holds the executable.
pub const BIN_DIR: &str = "bin";

/// Where releases are hosted, keyed by organization and project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseLocation {
    /// Scheme and host, without a trailing slash (e.g. `https://github.com`).
    pub base_url: String,
    pub owner: String,
    pub project: String,
}

impl Default for ReleaseLocation {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_RELEASE_HOST.to_string(),
            owner: DEFAULT_OWNER.to_string(),
            project: DEFAULT_PROJECT.to_string(),
        }
    }
}

impl ReleaseLocation {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// `<base>/<owner>/<project>/releases/download/v<version>/<artifact>`
    pub fn download_url(&self, version: &str, artifact_name: &str) -> String {
        format!(
            "{}/{}/{}/releases/download/v{}/{}",
            self.base_url.trim_end_matches('/'),
            self.owner,
            self.project,
            version,
            artifact_name
        )
    }
}

/// Everything needed to fetch and place one platform artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub version: String,
    pub platform: Platform,
    /// Remote file name, e.g. `seyuna-linux`.
    pub name: String,
    pub url: String,
    /// Final location of the executable, `<install-root>/bin/<executable>`.
    pub destination: PathBuf,
}

impl Artifact {
    pub fn new(
        location: &ReleaseLocation,
        version: &str,
        platform: Platform,
        install_root: &Path,
    ) -> Self {
        let name = platform.artifact_name();
        Self {
            url: location.download_url(version, &name),
            destination: binary_path(install_root, platform),
            version: version.to_string(),
            platform,
            name,
        }
    }

    pub fn executable_name(&self) -> &'static str {
        self.platform.executable_name()
    }
}

/// Path of the installed executable for `platform` under `install_root`.
pub fn binary_path(install_root: &Path, platform: Platform) -> PathBuf {
    install_root.join(BIN_DIR).join(platform.executable_name())
}
