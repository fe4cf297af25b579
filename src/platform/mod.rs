//! Platform resolution.
//!
//! Maps the operating system to the release artifact published for it and the
//! name the executable takes once installed. The identity is resolved once at
//! the process boundary and passed down explicitly.

use std::fmt;

use crate::error::LauncherError;

/// Base name shared by every published artifact and the installed executable.
pub const BINARY_NAME: &str = "seyuna";

/// Operating systems a release artifact is published for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    MacOs,
    Linux,
}

impl Platform {
    /// Resolve the platform this process is running on.
    pub fn detect() -> Result<Self, LauncherError> {
        Self::from_os(std::env::consts::OS)
    }

    /// Resolve a raw operating system string.
    ///
    /// Accepts Rust's `std::env::consts::OS` values plus the Node.js spellings
    /// `darwin` and `win32`. Anything else is an unsupported platform.
    pub fn from_os(os: &str) -> Result<Self, LauncherError> {
        match os {
            "windows" | "win32" => Ok(Self::Windows),
            "macos" | "darwin" => Ok(Self::MacOs),
            "linux" => Ok(Self::Linux),
            other => Err(LauncherError::UnsupportedPlatform {
                platform: other.to_string(),
            }),
        }
    }

    /// Suffix appended to [`BINARY_NAME`] in the remote artifact name.
    pub fn artifact_suffix(&self) -> &'static str {
        match self {
            Self::Windows => "-windows.exe",
            Self::MacOs => "-macos",
            Self::Linux => "-linux",
        }
    }

    /// File name of the remote release artifact, e.g. `seyuna-linux`.
    pub fn artifact_name(&self) -> String {
        format!("{}{}", BINARY_NAME, self.artifact_suffix())
    }

    /// File name of the installed executable.
    pub fn executable_name(&self) -> &'static str {
        match self {
            Self::Windows => "seyuna.exe",
            Self::MacOs | Self::Linux => "seyuna",
        }
    }

    pub fn is_windows(&self) -> bool {
        matches!(self, Self::Windows)
    }

    /// Tag used by the per-platform npm packages (`@seyuna/cli-<tag>`).
    pub fn package_tag(&self) -> &'static str {
        match self {
            Self::Windows => "win32",
            Self::MacOs => "darwin",
            Self::Linux => "linux",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Windows => "windows",
            Self::MacOs => "macos",
            Self::Linux => "linux",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_table() {
        let cases = [
            ("windows", "-windows.exe", "seyuna.exe"),
            ("macos", "-macos", "seyuna"),
            ("linux", "-linux", "seyuna"),
        ];

        for (os, suffix, exe) in cases {
            let platform = Platform::from_os(os).unwrap();
            assert_eq!(platform.artifact_suffix(), suffix, "suffix for {}", os);
            assert_eq!(platform.executable_name(), exe, "executable for {}", os);
            assert_eq!(platform.to_string(), os);
        }
    }

    #[test]
    fn test_artifact_names() {
        assert_eq!(Platform::Windows.artifact_name(), "seyuna-windows.exe");
        assert_eq!(Platform::MacOs.artifact_name(), "seyuna-macos");
        assert_eq!(Platform::Linux.artifact_name(), "seyuna-linux");
    }

    #[test]
    fn test_node_aliases() {
        assert_eq!(Platform::from_os("darwin").unwrap(), Platform::MacOs);
        assert_eq!(Platform::from_os("win32").unwrap(), Platform::Windows);
    }

    #[test]
    fn test_unsupported_platform_reports_raw_string() {
        for os in ["freebsd", "aix", "", "Linux"] {
            match Platform::from_os(os) {
                Err(LauncherError::UnsupportedPlatform { platform }) => assert_eq!(platform, os),
                other => panic!("expected unsupported platform for {:?}, got {:?}", os, other),
            }
        }
    }

    #[test]
    fn test_detect_on_supported_hosts() {
        #[cfg(target_os = "linux")]
        assert_eq!(Platform::detect().unwrap(), Platform::Linux);

        #[cfg(target_os = "macos")]
        assert_eq!(Platform::detect().unwrap(), Platform::MacOs);

        #[cfg(target_os = "windows")]
        assert_eq!(Platform::detect().unwrap(), Platform::Windows);
    }

    #[test]
    fn test_only_windows_is_windows() {
        assert!(Platform::Windows.is_windows());
        assert!(!Platform::MacOs.is_windows());
        assert!(!Platform::Linux.is_windows());
    }
}
