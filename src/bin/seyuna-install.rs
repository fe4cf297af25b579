use anyhow::Result;
use clap::Parser;
use seyuna_launcher::{
    error::{diagnostic, exit_code_for},
    http::RetryPolicy,
    install::{
        Installer,
        config::{Config, FetchSource, default_install_root},
    },
    platform::Platform,
    runtime::{RealRuntime, Runtime},
    verify::ChecksumPolicy,
};
use std::path::PathBuf;
use std::sync::Arc;

/// seyuna-install - install the seyuna CLI binary
///
/// Reads the version from the package manifest, fetches the matching release
/// artifact for this platform and places it under `<root>/bin`.
///
/// Examples:
///   seyuna-install                          # Install next to this executable
///   seyuna-install --root ./node_modules/@seyuna/cli
///   seyuna-install --from-package .         # Copy from @seyuna/cli-<platform>
#[derive(Parser, Debug)]
#[command(name = "seyuna-install", author, version = env!("SEYUNA_LAUNCHER_VERSION"), about)]
struct Cli {
    /// Install root directory (defaults to this executable's directory)
    #[arg(long = "root", short = 'r', env = "SEYUNA_ROOT", value_name = "PATH")]
    pub install_root: Option<PathBuf>,

    /// Version manifest (defaults to <root>/package.json)
    #[arg(long, env = "SEYUNA_MANIFEST", value_name = "PATH")]
    pub manifest: Option<PathBuf>,

    /// Release host (defaults to https://github.com)
    #[arg(long = "release-url", env = "SEYUNA_RELEASE_URL", value_name = "URL")]
    pub release_url: Option<String>,

    /// Release owner
    #[arg(long, value_name = "OWNER")]
    pub owner: Option<String>,

    /// Release project
    #[arg(long, value_name = "PROJECT")]
    pub project: Option<String>,

    /// Copy the binary from an installed platform package, searching upwards
    /// from this directory, instead of downloading it
    #[arg(long = "from-package", env = "SEYUNA_PACKAGE_DIR", value_name = "DIR")]
    pub from_package: Option<PathBuf>,

    /// Expected SHA-256 of the artifact
    #[arg(long, value_name = "HEX", conflicts_with = "published_checksum")]
    pub sha256: Option<String>,

    /// Verify against the `.sha256` file published next to the artifact
    #[arg(long = "published-checksum")]
    pub published_checksum: bool,

    /// Download attempts before giving up
    #[arg(long, env = "SEYUNA_RETRIES", value_name = "N", default_value_t = 1)]
    pub retries: usize,

    /// Also write a `.cmd` shim next to the binary on Windows
    #[arg(long = "windows-shim")]
    pub windows_shim: bool,

    /// Install for this OS instead of the current one (windows, macos, linux)
    #[arg(long, value_name = "OS")]
    pub platform: Option<String>,
}

impl Cli {
    fn into_config<R: Runtime + ?Sized>(self, runtime: &R) -> Result<Config> {
        let platform = match &self.platform {
            Some(os) => Platform::from_os(os)?,
            None => Platform::detect()?,
        };
        let install_root = match self.install_root {
            Some(root) => root,
            None => default_install_root(runtime)?,
        };

        let mut config = Config::new(platform, install_root);
        if let Some(manifest) = self.manifest {
            config.manifest_path = manifest;
        }
        if let Some(url) = self.release_url {
            config.release.base_url = url;
        }
        if let Some(owner) = self.owner {
            config.release.owner = owner;
        }
        if let Some(project) = self.project {
            config.release.project = project;
        }
        if let Some(dir) = self.from_package {
            config.source = FetchSource::Package(dir);
        }
        config.checksum = match (self.sha256, self.published_checksum) {
            (_, true) => ChecksumPolicy::Published,
            (Some(hex), false) => ChecksumPolicy::Sha256(hex.trim().to_lowercase()),
            (None, false) => ChecksumPolicy::None,
        };
        config.retry = RetryPolicy::with_attempts(self.retries);
        config.windows_shim = self.windows_shim;
        Ok(config)
    }
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("{}", diagnostic(&e));
        std::process::exit(exit_code_for(&e));
    }
}

async fn run(cli: Cli) -> Result<()> {
    let runtime = Arc::new(RealRuntime);
    let config = cli.into_config(runtime.as_ref())?;
    let installer = Installer::from_config(runtime, config)?;
    installer.run().await?;
    Ok(())
}
