use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Global configuration loaded from `~/.config/seqdl/config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeqdlConfig {
    /// Inactivity timeout per job in milliseconds (0 = wait indefinitely).
    pub timeout_ms: u64,
    /// Bytes copied per step by the local backend.
    pub chunk_size: usize,
    /// Verify a descriptor's sha256, when it has one.
    pub verify_checksums: bool,
}

impl Default for SeqdlConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 0,
            chunk_size: DEFAULT_CHUNK_SIZE,
            verify_checksums: true,
        }
    }
}

impl SeqdlConfig {
    fn validate(self) -> Result<Self> {
        if self.chunk_size == 0 {
            anyhow::bail!("chunk_size must be greater than zero");
        }
        Ok(self)
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("seqdl")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<SeqdlConfig> {
    let path = config_path()?;
    if !path.exists() {
        return init_at(&path);
    }
    load_from_path(&path)
}

/// Load an explicit config file. Missing keys take their defaults.
pub fn load_from_path(path: &Path) -> Result<SeqdlConfig> {
    let data =
        fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
    let cfg: SeqdlConfig =
        toml::from_str(&data).with_context(|| format!("parse config {}", path.display()))?;
    cfg.validate()
}

fn init_at(path: &Path) -> Result<SeqdlConfig> {
    let default_cfg = SeqdlConfig::default();
    let toml = toml::to_string_pretty(&default_cfg)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, toml)?;
    tracing::info!("created default config at {}", path.display());
    Ok(default_cfg)
}
