//! Optional integrity check of a fetched artifact.
//!
//! Verification runs on the temporary file before it is moved into place, so
//! a mismatching download never becomes the installed executable.

use anyhow::{Context, Result};
use log::debug;
use sha2::{Digest, Sha256};
use std::io::Read;
use std::path::Path;

use crate::{error::LauncherError, runtime::Runtime};

/// Where the expected digest comes from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ChecksumPolicy {
    /// Install whatever was fetched.
    #[default]
    None,
    /// Compare against a digest supplied by configuration (hex, any case).
    Sha256(String),
    /// Fetch `<artifact-url>.sha256` from the release and compare against it.
    Published,
}

/// Stream `path` through SHA-256 and return the lowercase hex digest.
#[tracing::instrument(skip(runtime))]
pub fn sha256_file<R: Runtime + ?Sized>(runtime: &R, path: &Path) -> Result<String> {
    let mut reader = runtime
        .open(path)
        .with_context(|| format!("Failed to open {:?} for hashing", path))?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; 8192];

    loop {
        let n = reader
            .read(&mut buffer)
            .with_context(|| format!("Failed to read {:?} for hashing", path))?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Check the SHA-256 of `path` against `expected`.
pub fn verify_sha256<R: Runtime + ?Sized>(runtime: &R, path: &Path, expected: &str) -> Result<()> {
    let actual = sha256_file(runtime, path)?;
    let expected = expected.trim().to_lowercase();

    if actual != expected {
        return Err(LauncherError::Verification { expected, actual }.into());
    }

    debug!("Checksum of {:?} verified", path);
    Ok(())
}

/// Extract the digest for `artifact_name` from a published checksum file.
///
/// Accepts a bare digest, or `sha256sum` output (`<digest>  <name>`, with an
/// optional `*` binary marker before the name).
pub fn parse_checksum_file(text: &str, artifact_name: &str) -> Option<String> {
    let mut bare = None;

    for line in text.lines().map(str::trim).filter(|line| !line.is_empty()) {
        let mut parts = line.split_whitespace();
        let digest = parts.next()?;
        match parts.next() {
            Some(name) if name.trim_start_matches('*') == artifact_name => {
                return Some(digest.to_lowercase());
            }
            Some(_) => {}
            None if bare.is_none() => bare = Some(digest.to_lowercase()),
            None => {}
        }
    }

    bare
}
