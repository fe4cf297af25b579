//! Version source: reads the release version from the JSON manifest that
//! ships next to the launcher (`package.json`, `deno.json`).

use anyhow::{Context, Result};
use log::debug;
use serde::Deserialize;
use std::path::Path;

use crate::{error::LauncherError, runtime::Runtime};

/// File name of the manifest looked up in the install root by default.
pub const DEFAULT_MANIFEST: &str = "package.json";

/// The only part of the manifest the launcher cares about; every other field
/// of a package descriptor is ignored.
#[derive(Debug, Deserialize)]
struct Manifest {
    version: Option<String>,
}

/// Read and validate the `version` field of the manifest at `path`.
///
/// The value must parse as a semantic version (without the `v` prefix, which
/// belongs to the release tag).
#[tracing::instrument(skip(runtime))]
pub fn read_version<R: Runtime + ?Sized>(runtime: &R, path: &Path) -> Result<String> {
    let text = runtime
        .read_to_string(path)
        .with_context(|| LauncherError::ManifestRead {
            path: path.to_path_buf(),
        })?;

    let version = parse_version(&text).map_err(|reason| LauncherError::ManifestParse {
        path: path.to_path_buf(),
        reason,
    })?;

    debug!("Manifest {:?} declares version {}", path, version);
    Ok(version)
}

fn parse_version(text: &str) -> Result<String, String> {
    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|e| format!("not valid JSON ({})", e))?;
    if !value.is_object() {
        return Err("top level is not a JSON object".to_string());
    }

    // `version` is the only field deserialized, so any error here is about it.
    let manifest: Manifest = serde_json::from_value(value)
        .map_err(|e| format!("\"version\" field must be a string ({})", e))?;

    let version = manifest
        .version
        .ok_or_else(|| "missing \"version\" field".to_string())?;

    semver::Version::parse(&version)
        .map_err(|e| format!("\"{}\" is not a semantic version ({})", version, e))?;

    Ok(version)
}
