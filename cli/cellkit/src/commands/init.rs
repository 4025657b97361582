//! `cellkit init`: write a default config.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::config::{CellkitConfig, CONFIG_FILE};

/// Write `cellkit.toml` into `dir`. An existing file is only replaced with
/// `force`.
pub fn run(dir: &Path, force: bool) -> Result<()> {
    let path = write_config(dir, force)?;
    println!("Created {}", path.display());
    Ok(())
}

pub(crate) fn write_config(dir: &Path, force: bool) -> Result<PathBuf> {
    let path = dir.join(CONFIG_FILE);
    if path.exists() && !force {
        bail!(
            "'{}' already exists (use --force to overwrite)",
            path.display()
        );
    }
    fs::write(&path, CellkitConfig::template())
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}
