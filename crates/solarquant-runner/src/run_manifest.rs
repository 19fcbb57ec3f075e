//! Run Manifest
//!
//! Binding between one study run, the input files it read and the artifacts
//! it produced.
//!
//! Goals:
//! - Deterministic JSON (stable ordering)
//! - Hash binding to every input file and the resolved config
//! - Hash binding to all declared output files

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::manifest_io::{sha256_hex, write_atomic, write_sha256_sidecar};

pub const RUN_MANIFEST_SCHEMA_VERSION: u32 = 1;

/// Canonical manifest describing one run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunManifest {
    pub schema_version: u32,

    pub binary_name: String,

    /// Git commit string (best-effort; may be "unknown")
    pub git_commit: String,

    /// First 16 hex chars of sha256(inputs_sha256 || config_sha256)
    pub run_id: String,

    pub data_dir: String,

    /// SHA-256 of the compact inputs manifest
    pub inputs_sha256: String,

    pub inputs: Vec<InputBinding>,

    pub config_sha256: String,

    /// Digest stamped inside report.json
    pub report_digest: String,

    pub outputs: Vec<OutputBinding>,
}

/// Input file binding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InputBinding {
    pub label: String,
    pub rel_path: String,
    pub sha256: String,
    pub bytes_len: usize,
}

/// Output file binding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OutputBinding {
    pub label: String,
    pub rel_path: String,
    pub sha256: String,
    pub bytes_len: usize,
}

/// Deterministic run id from the input and config hashes.
pub fn derive_run_id(inputs_sha256: &str, config_sha256: &str) -> String {
    let digest = sha256_hex(format!("{}{}", inputs_sha256, config_sha256).as_bytes());
    digest[..16].to_string()
}

/// Persist `run_manifest.json` + a sha256 file next to it.
///
/// Returns the sha256 of the manifest JSON bytes.
pub fn persist_run_manifest_atomic(run_dir: &Path, rm: &RunManifest) -> Result<String> {
    let mut rm_sorted = rm.clone();
    rm_sorted
        .inputs
        .sort_by(|a, b| a.label.cmp(&b.label).then(a.rel_path.cmp(&b.rel_path)));
    rm_sorted
        .outputs
        .sort_by(|a, b| a.label.cmp(&b.label).then(a.rel_path.cmp(&b.rel_path)));

    // Pretty JSON for human audit
    let bytes = serde_json::to_vec_pretty(&rm_sorted).context("Failed to serialize RunManifest")?;
    let sha = sha256_hex(&bytes);

    let manifest_path = run_dir.join("run_manifest.json");
    write_atomic(&manifest_path, &bytes)
        .with_context(|| format!("Failed to write run manifest: {}", manifest_path.display()))?;
    write_sha256_sidecar(&manifest_path, &sha)?;

    Ok(sha)
}

/// Compute sha256 + bytes_len for a file.
pub fn hash_file(path: &Path) -> Result<(String, usize)> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read file for hashing: {}", path.display()))?;
    Ok((sha256_hex(&bytes), bytes.len()))
}

/// Best-effort git commit string.
///
/// Set `SOLARQUANT_GIT_COMMIT` at build or run time (e.g. from CI).
pub fn git_commit_string() -> String {
    std::env::var("SOLARQUANT_GIT_COMMIT").unwrap_or_else(|_| "unknown".to_string())
}

/// Bind a file under `base_dir` as a run output.
pub fn bind_output(label: &str, rel_path: &str, base_dir: &Path) -> Result<OutputBinding> {
    let (sha256, bytes_len) = hash_file(&base_dir.join(rel_path))?;
    Ok(OutputBinding {
        label: label.to_string(),
        rel_path: rel_path.to_string(),
        sha256,
        bytes_len,
    })
}
