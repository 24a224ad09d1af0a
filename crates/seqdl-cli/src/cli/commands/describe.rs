//! `seqdl describe <payload>` – write a transfer descriptor for a local file.

use anyhow::{Context, Result};
use seqdl_core::session::descriptor::TransferDescriptor;
use std::fs;
use std::path::Path;

/// Describe `payload` (length and SHA-256) and write the TOML to `output`, or
/// to stdout when no output path is given.
pub async fn run_describe(payload: &Path, name: Option<&str>, output: Option<&Path>) -> Result<()> {
    let descriptor = TransferDescriptor::describe(payload, name)?;
    let toml = descriptor.to_toml_string()?;
    match output {
        Some(path) => {
            fs::write(path, &toml).with_context(|| format!("write {}", path.display()))?;
            println!("Wrote {}", path.display());
        }
        None => print!("{toml}"),
    }
    Ok(())
}
