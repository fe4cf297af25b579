use anyhow::{Context, Result, bail};
use log::debug;
use std::path::{Path, PathBuf};

use crate::{
    artifact::{ReleaseLocation, binary_path},
    http::RetryPolicy,
    manifest::DEFAULT_MANIFEST,
    platform::Platform,
    runtime::Runtime,
    verify::ChecksumPolicy,
};

pub const ENV_ROOT: &str = "SEYUNA_ROOT";
pub const ENV_MANIFEST: &str = "SEYUNA_MANIFEST";
pub const ENV_RELEASE_URL: &str = "SEYUNA_RELEASE_URL";
pub const ENV_PACKAGE_DIR: &str = "SEYUNA_PACKAGE_DIR";
pub const ENV_SHA256: &str = "SEYUNA_SHA256";
pub const ENV_RETRIES: &str = "SEYUNA_RETRIES";
pub const ENV_WINDOWS_SHIM: &str = "SEYUNA_WINDOWS_SHIM";
pub const ENV_INSTALL_COMMAND: &str = "SEYUNA_INSTALL_COMMAND";

/// Value of [`ENV_SHA256`] that selects [`ChecksumPolicy::Published`].
pub const PUBLISHED_CHECKSUM: &str = "published";

/// Where the installer gets the artifact bytes from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FetchSource {
    #[default]
    Download,
    /// Copy from a platform package found from this directory upwards.
    Package(PathBuf),
}

/// Everything a launch or install needs, resolved once at the boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub platform: Platform,
    pub install_root: PathBuf,
    pub manifest_path: PathBuf,
    pub release: ReleaseLocation,
    pub source: FetchSource,
    pub checksum: ChecksumPolicy,
    pub retry: RetryPolicy,
    pub windows_shim: bool,
    /// External installer to run instead of installing in-process.
    pub install_command: Option<Vec<String>>,
}

impl Config {
    /// Defaults for an install rooted at `install_root`.
    pub fn new(platform: Platform, install_root: PathBuf) -> Self {
        Self {
            platform,
            manifest_path: install_root.join(DEFAULT_MANIFEST),
            install_root,
            release: ReleaseLocation::default(),
            source: FetchSource::default(),
            checksum: ChecksumPolicy::default(),
            retry: RetryPolicy::default(),
            windows_shim: false,
            install_command: None,
        }
    }

    /// Build the launcher's configuration from `SEYUNA_*` environment
    /// variables, falling back to the directory of the running executable as
    /// the install root.
    pub fn from_env<R: Runtime + ?Sized>(runtime: &R, platform: Platform) -> Result<Self> {
        let var = |key: &str| env_value(runtime, key);

        let mut config = Self::new(platform, install_root_from_env(runtime)?);

        if let Some(manifest) = var(ENV_MANIFEST) {
            config.manifest_path = PathBuf::from(manifest);
        }
        if let Some(url) = var(ENV_RELEASE_URL) {
            config.release.base_url = url;
        }
        if let Some(dir) = var(ENV_PACKAGE_DIR) {
            config.source = FetchSource::Package(PathBuf::from(dir));
        }
        if let Some(sha) = var(ENV_SHA256) {
            config.checksum = parse_checksum_policy(&sha);
        }
        if let Some(retries) = var(ENV_RETRIES) {
            let attempts = retries
                .trim()
                .parse::<usize>()
                .with_context(|| format!("{} must be a number, got {:?}", ENV_RETRIES, retries))?;
            config.retry = RetryPolicy::with_attempts(attempts);
        }
        if let Some(flag) = var(ENV_WINDOWS_SHIM) {
            config.windows_shim = parse_flag(ENV_WINDOWS_SHIM, &flag)?;
        }
        if let Some(command) = var(ENV_INSTALL_COMMAND) {
            config.install_command = Some(command.split_whitespace().map(String::from).collect());
        }

        debug!("Resolved configuration: {:?}", config);
        Ok(config)
    }

    /// Final location of the installed executable.
    pub fn binary_path(&self) -> PathBuf {
        binary_path(&self.install_root, self.platform)
    }
}

/// `SEYUNA_ROOT` if set, else the directory containing the running
/// executable. Reads nothing else, so it cannot fail on install-only settings.
pub fn install_root_from_env<R: Runtime + ?Sized>(runtime: &R) -> Result<PathBuf> {
    match env_value(runtime, ENV_ROOT) {
        Some(root) => Ok(PathBuf::from(root)),
        None => default_install_root(runtime),
    }
}

fn env_value<R: Runtime + ?Sized>(runtime: &R, key: &str) -> Option<String> {
    runtime.env_var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Directory containing the running executable.
pub fn default_install_root<R: Runtime + ?Sized>(runtime: &R) -> Result<PathBuf> {
    let exe = runtime.current_exe()?;
    exe.parent()
        .map(Path::to_path_buf)
        .with_context(|| format!("Executable path {:?} has no parent directory", exe))
}

pub fn parse_checksum_policy(value: &str) -> ChecksumPolicy {
    let value = value.trim();
    if value.eq_ignore_ascii_case(PUBLISHED_CHECKSUM) {
        ChecksumPolicy::Published
    } else {
        ChecksumPolicy::Sha256(value.to_lowercase())
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("{} must be a boolean, got {:?}", key, other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::MockRuntime;
    use std::collections::HashMap;

    fn runtime_with_env(vars: &[(&str, &str)]) -> MockRuntime {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        let mut runtime = MockRuntime::new();
        runtime
            .expect_env_var()
            .returning(move |key| vars.get(key).cloned().ok_or(std::env::VarError::NotPresent));
        runtime
            .expect_current_exe()
            .returning(|| Ok(PathBuf::from("/usr/lib/node_modules/@seyuna/cli/seyuna-launcher")));
        runtime
    }

    #[test]
    fn test_defaults_from_executable_location() {
        let runtime = runtime_with_env(&[]);
        let config = Config::from_env(&runtime, Platform::Linux).unwrap();

        let root = PathBuf::from("/usr/lib/node_modules/@seyuna/cli");
        assert_eq!(config.install_root, root);
        assert_eq!(config.manifest_path, root.join("package.json"));
        assert_eq!(config.binary_path(), root.join("bin").join("seyuna"));
        assert_eq!(config.release, ReleaseLocation::default());
        assert_eq!(config.source, FetchSource::Download);
        assert_eq!(config.checksum, ChecksumPolicy::None);
        assert_eq!(config.retry.attempts, 1);
        assert!(!config.windows_shim);
        assert_eq!(config.install_command, None);
    }

    #[test]
    fn test_environment_overrides() {
        let runtime = runtime_with_env(&[
            (ENV_ROOT, "/opt/seyuna"),
            (ENV_MANIFEST, "/opt/seyuna/deno.json"),
            (ENV_RELEASE_URL, "http://127.0.0.1:8080"),
            (ENV_PACKAGE_DIR, "/opt/app"),
            (ENV_SHA256, "ABCDEF"),
            (ENV_RETRIES, "3"),
            (ENV_WINDOWS_SHIM, "yes"),
            (ENV_INSTALL_COMMAND, "deno run --allow-net deno-install.ts"),
        ]);
        let config = Config::from_env(&runtime, Platform::Windows).unwrap();

        assert_eq!(config.install_root, PathBuf::from("/opt/seyuna"));
        assert_eq!(config.manifest_path, PathBuf::from("/opt/seyuna/deno.json"));
        assert_eq!(config.release.base_url, "http://127.0.0.1:8080");
        assert_eq!(config.source, FetchSource::Package(PathBuf::from("/opt/app")));
        assert_eq!(config.checksum, ChecksumPolicy::Sha256("abcdef".to_string()));
        assert_eq!(config.retry.attempts, 3);
        assert!(config.windows_shim);
        assert_eq!(
            config.install_command,
            Some(vec![
                "deno".to_string(),
                "run".to_string(),
                "--allow-net".to_string(),
                "deno-install.ts".to_string()
            ])
        );
        assert_eq!(config.binary_path(), PathBuf::from("/opt/seyuna/bin/seyuna.exe"));
    }

    #[test]
    fn test_blank_variables_are_ignored() {
        let runtime = runtime_with_env(&[(ENV_ROOT, "  "), (ENV_SHA256, "")]);
        let config = Config::from_env(&runtime, Platform::MacOs).unwrap();
        assert_eq!(config.install_root, PathBuf::from("/usr/lib/node_modules/@seyuna/cli"));
        assert_eq!(config.checksum, ChecksumPolicy::None);
    }

    #[test]
    fn test_published_checksum_keyword() {
        assert_eq!(parse_checksum_policy("published"), ChecksumPolicy::Published);
        assert_eq!(parse_checksum_policy("PUBLISHED"), ChecksumPolicy::Published);
    }

    #[test]
    fn test_invalid_retries_is_an_error() {
        let runtime = runtime_with_env(&[(ENV_RETRIES, "many")]);
        assert!(Config::from_env(&runtime, Platform::Linux).is_err());
    }

    #[test]
    fn test_invalid_flag_is_an_error() {
        let runtime = runtime_with_env(&[(ENV_WINDOWS_SHIM, "maybe")]);
        assert!(Config::from_env(&runtime, Platform::Linux).is_err());
    }
}
