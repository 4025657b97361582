//! `cellkit.toml` parsing.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use cellkit_boc::BocOptions;
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE: &str = "cellkit.toml";

/// Settings shared by every command. All sections are optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellkitConfig {
    /// Encoder switches.
    #[serde(default)]
    pub boc: BocConfig,
    /// How encoded bags are written out.
    #[serde(default)]
    pub output: OutputConfig,
}

/// `[boc]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BocConfig {
    #[serde(default = "default_true")]
    pub has_idx: bool,
    #[serde(default = "default_true")]
    pub has_crc32c: bool,
    #[serde(default)]
    pub has_cache_bits: bool,
}

fn default_true() -> bool {
    true
}

impl Default for BocConfig {
    fn default() -> Self {
        let options = BocOptions::default();
        Self {
            has_idx: options.has_idx,
            has_crc32c: options.has_crc32c,
            has_cache_bits: options.has_cache_bits,
        }
    }
}

/// `[output]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
}

/// Encoding used when writing a bag.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Hex,
    Base64,
    Binary,
}

impl FromStr for CellkitConfig {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("parsing cellkit.toml")
    }
}

impl CellkitConfig {
    /// Search upward from `start_dir` for a `cellkit.toml`, returning it with
    /// the directory it was found in.
    pub fn find_and_load(start_dir: &Path) -> Result<Option<(Self, PathBuf)>> {
        let mut dir = start_dir.to_path_buf();
        loop {
            let candidate = dir.join(CONFIG_FILE);
            if candidate.is_file() {
                let content = std::fs::read_to_string(&candidate)
                    .with_context(|| format!("reading {}", candidate.display()))?;
                let config: CellkitConfig = content
                    .parse()
                    .with_context(|| format!("reading {}", candidate.display()))?;
                tracing::debug!(path = %candidate.display(), "loaded config");
                return Ok(Some((config, dir)));
            }
            if !dir.pop() {
                break;
            }
        }
        Ok(None)
    }

    /// Like [`find_and_load`](Self::find_and_load), falling back to defaults.
    pub fn load_or_default(start_dir: &Path) -> Result<Self> {
        Ok(Self::find_and_load(start_dir)?
            .map(|(config, _)| config)
            .unwrap_or_default())
    }

    /// Encoder options from the `[boc]` section.
    pub fn boc_options(&self) -> BocOptions {
        BocOptions {
            has_idx: self.boc.has_idx,
            has_crc32c: self.boc.has_crc32c,
            has_cache_bits: self.boc.has_cache_bits,
            ..BocOptions::default()
        }
    }

    /// Default file written by `cellkit init`.
    pub fn template() -> String {
        r#"[boc]
has_idx = true
has_crc32c = true
has_cache_bits = false

[output]
# hex, base64 or binary
format = "hex"
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_config() {
        let config = CellkitConfig::from_str(
            r#"
[boc]
has_idx = false
has_crc32c = false
has_cache_bits = true

[output]
format = "base64"
"#,
        )
        .unwrap();
        assert!(!config.boc.has_idx);
        assert!(!config.boc.has_crc32c);
        assert!(config.boc.has_cache_bits);
        assert_eq!(config.output.format, OutputFormat::Base64);

        let options = config.boc_options();
        assert!(!options.has_idx);
        assert!(options.has_cache_bits);
        assert_eq!(options.flags, 0);
    }

    #[test]
    fn parse_empty_config() {
        let config: CellkitConfig = "".parse().unwrap();
        assert_eq!(config, CellkitConfig::default());
        assert_eq!(config.boc_options(), BocOptions::default());
        assert_eq!(config.output.format, OutputFormat::Hex);
    }

    #[test]
    fn missing_keys_take_defaults() {
        let config = CellkitConfig::from_str("[boc]\nhas_cache_bits = true\n").unwrap();
        assert!(config.boc.has_idx);
        assert!(config.boc.has_crc32c);
        assert!(config.boc.has_cache_bits);
    }

    #[test]
    fn reject_unknown_format() {
        assert!(CellkitConfig::from_str("[output]\nformat = \"yaml\"\n").is_err());
        assert!(CellkitConfig::from_str("not toml [[[").is_err());
    }

    #[test]
    fn template_is_valid_toml() {
        let config = CellkitConfig::from_str(&CellkitConfig::template()).unwrap();
        assert_eq!(config, CellkitConfig::default());
    }

    #[test]
    fn find_and_load_walks_up() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "[output]\nformat = \"binary\"\n",
        )
        .unwrap();
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        let (config, found) = CellkitConfig::find_and_load(&nested).unwrap().unwrap();
        assert_eq!(config.output.format, OutputFormat::Binary);
        assert_eq!(found, dir.path());
    }

    #[test]
    fn find_and_load_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "[boc]\nhas_idx = \"yes\"\n").unwrap();
        let err = CellkitConfig::find_and_load(dir.path()).unwrap_err();
        assert!(format!("{err:#}").contains("parsing"));
    }
}
