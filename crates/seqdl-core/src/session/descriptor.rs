//! Transfer descriptors for the local backend (TOML).
//!
//! ```toml
//! name = "photo.jpg"
//! source = "payload/photo.jpg"   # relative to the descriptor's directory
//! length = 482113                # optional
//! sha256 = "5891b5b5..."         # optional, lowercase hex
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use super::DescriptorError;
use crate::checksum;

/// Parsed descriptor with `source` already resolved against the descriptor's
/// directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferDescriptor {
    /// File name created in the destination directory.
    pub name: String,
    /// Payload to transfer.
    pub source: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
}

impl TransferDescriptor {
    pub fn load(path: &Path) -> Result<Self, DescriptorError> {
        if !path.exists() {
            return Err(DescriptorError::NotFound(path.to_path_buf()));
        }
        let invalid = |reason: String| DescriptorError::Invalid {
            path: path.to_path_buf(),
            reason,
        };
        let text = fs::read_to_string(path).map_err(|e| invalid(e.to_string()))?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        Self::parse(&text, base).map_err(invalid)
    }

    /// Parse descriptor text; relative `source` paths resolve against `base_dir`.
    pub fn parse(text: &str, base_dir: &Path) -> Result<Self, String> {
        let mut d: TransferDescriptor = toml::from_str(text).map_err(|e| e.to_string())?;
        check_plain_file_name(&d.name)?;
        if d.source.as_os_str().is_empty() {
            return Err("source must not be empty".to_string());
        }
        if d.source.is_relative() {
            d.source = base_dir.join(&d.source);
        }
        if let Some(digest) = d.sha256.take() {
            let digest = digest.to_ascii_lowercase();
            if digest.len() != 64 || !digest.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(format!("sha256 is not a 64-digit hex digest: {digest}"));
            }
            d.sha256 = Some(digest);
        }
        Ok(d)
    }

    /// Build a descriptor for an existing payload, recording its length and digest.
    pub fn describe(payload: &Path, name: Option<&str>) -> Result<Self> {
        let meta = fs::metadata(payload)
            .with_context(|| format!("stat payload {}", payload.display()))?;
        if !meta.is_file() {
            anyhow::bail!("payload is not a regular file: {}", payload.display());
        }
        let name = match name {
            Some(n) => n.to_string(),
            None => payload
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .ok_or_else(|| anyhow::anyhow!("payload has no file name"))?,
        };
        check_plain_file_name(&name).map_err(anyhow::Error::msg)?;
        let source = fs::canonicalize(payload)
            .with_context(|| format!("resolve payload {}", payload.display()))?;
        Ok(Self {
            name,
            sha256: Some(checksum::sha256_path(&source)?),
            source,
            length: Some(meta.len()),
        })
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("serialize descriptor")
    }
}

/// A destination name must be a single path component that needs no sanitizing.
fn check_plain_file_name(name: &str) -> Result<(), String> {
    const NAME_MAX: usize = 255;

    if name.is_empty() || name == "." || name == ".." {
        return Err(format!("name is not a file name: {name:?}"));
    }
    if name.len() > NAME_MAX {
        return Err("name exceeds 255 bytes".to_string());
    }
    if name
        .chars()
        .any(|c| c == '\0' || c == '/' || c == '\\' || c.is_control())
    {
        return Err(format!("name contains a separator or control character: {name:?}"));
    }
    Ok(())
}
