//! `.cmd` shim that lets Windows shells resolve the executable by name.

use std::path::{Path, PathBuf};

/// `bin/seyuna.exe` -> `bin/seyuna.cmd`
pub fn shim_path(destination: &Path) -> PathBuf {
    destination.with_extension("cmd")
}

pub fn shim_contents(destination: &Path) -> String {
    format!("@echo off\r\n\"{}\" %*", destination.display())
}
