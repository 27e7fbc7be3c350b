//! `standby init` — scaffold a standby.toml.

use std::path::Path;

use anyhow::{bail, Context, Result};
use standby::StandbyConfig;
use tracing::info;

pub fn init(path: &Path) -> Result<()> {
    if path.exists() {
        bail!("{} already exists. Remove it first to regenerate.", path.display());
    }

    let toml_str = StandbyConfig::scaffold().to_toml_string()?;
    std::fs::write(path, &toml_str)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    info!("Generated {}", path.display());
    Ok(())
}
