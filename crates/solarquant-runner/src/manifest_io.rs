//! # Manifest I/O
//!
//! Atomic persistence and hashing for JSON manifests and artifacts.
//!
//! ## Files Written
//! - `<stem>.json` - Canonical JSON (compact, deterministic)
//! - `<stem>.sha256` - SHA-256 hash in sha256sum format
//!
//! ## Determinism Requirements
//! - Compact JSON (no pretty printing) for stable byte output
//! - Manifests use Vec/BTreeMap in a fixed order, never HashMap

use anyhow::{Context, Result};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Result of persisting a manifest.
#[derive(Debug, Clone)]
pub struct ManifestPersistResult {
    /// Path to the written manifest JSON file
    pub manifest_path: PathBuf,
    /// Path to the written SHA-256 hash file
    pub sha_path: PathBuf,
    /// SHA-256 hash (lowercase hex, 64 characters)
    pub sha256: String,
    /// Size of the manifest JSON in bytes
    pub bytes_len: usize,
}

/// Compute SHA-256 hash of bytes, returning lowercase hex string.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Write bytes to a file atomically.
///
/// Writes to a temporary file in the same directory, syncs it, then renames
/// it over the final path.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = path.parent().unwrap_or(Path::new("."));
    fs::create_dir_all(parent)
        .with_context(|| format!("Failed to create directory: {:?}", parent))?;

    let mut temp_name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    temp_name.push(".tmp");
    let temp_path = path.with_file_name(temp_name);
    {
        let mut file = File::create(&temp_path)
            .with_context(|| format!("Failed to create temp file: {:?}", temp_path))?;
        file.write_all(bytes)
            .with_context(|| format!("Failed to write to temp file: {:?}", temp_path))?;
        file.sync_all()
            .with_context(|| format!("Failed to sync temp file: {:?}", temp_path))?;
    }

    fs::rename(&temp_path, path)
        .with_context(|| format!("Failed to rename {:?} to {:?}", temp_path, path))?;

    Ok(())
}

/// Write `<file_name>.sha256` next to a file, in sha256sum format.
pub fn write_sha256_sidecar(path: &Path, sha256: &str) -> Result<PathBuf> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = path
        .file_stem()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let sha_path = path.with_file_name(format!("{}.sha256", stem));
    let hash_content = format!("{}  {}\n", sha256, file_name);
    write_atomic(&sha_path, hash_content.as_bytes())
        .with_context(|| format!("Failed to write hash file: {:?}", sha_path))?;
    Ok(sha_path)
}

/// Persist a manifest as `<dir>/<stem>.json` plus `<dir>/<stem>.sha256`.
pub fn persist_manifest<T: Serialize>(
    dir: &Path,
    stem: &str,
    manifest: &T,
) -> Result<ManifestPersistResult> {
    let bytes = serde_json::to_vec(manifest)
        .with_context(|| format!("Failed to serialize {} to JSON", stem))?;
    let sha256 = sha256_hex(&bytes);

    let manifest_path = dir.join(format!("{}.json", stem));
    write_atomic(&manifest_path, &bytes)
        .with_context(|| format!("Failed to write manifest: {:?}", manifest_path))?;
    let sha_path = write_sha256_sidecar(&manifest_path, &sha256)?;

    Ok(ManifestPersistResult {
        manifest_path,
        sha_path,
        sha256,
        bytes_len: bytes.len(),
    })
}
