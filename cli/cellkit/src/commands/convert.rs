//! `cellkit convert`: re-encode a bag.

use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{bail, Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use cellkit_boc::{to_boc, BagOfCells, BocOptions};

use crate::config::{CellkitConfig, OutputFormat};
use crate::detect::load_bag;

/// Re-encode `input`. Flags override the config: `to` picks the output
/// encoding, `no_idx` and `no_crc` drop the index and the checksum.
pub fn run(
    input: &Path,
    config: &CellkitConfig,
    to: Option<OutputFormat>,
    output: Option<&Path>,
    no_idx: bool,
    no_crc: bool,
) -> Result<()> {
    let bag = load_bag(input)?;

    let mut options = config.boc_options();
    if no_idx {
        options.has_idx = false;
    }
    if no_crc {
        options.has_crc32c = false;
    }
    let format = to.unwrap_or(config.output.format);
    let encoded = convert(&bag, &options, format)?;

    match output {
        Some(path) => {
            fs::write(path, &encoded).with_context(|| format!("writing {}", path.display()))?;
            eprintln!("Wrote {} ({} bytes)", path.display(), encoded.len());
        }
        None => std::io::stdout()
            .write_all(&encoded)
            .context("writing to stdout")?,
    }
    Ok(())
}

pub(crate) fn convert(
    bag: &BagOfCells,
    options: &BocOptions,
    format: OutputFormat,
) -> Result<Vec<u8>> {
    let root = match bag.roots.as_slice() {
        [root] => *root,
        roots => bail!(
            "only single-root bags can be converted, input has {} roots",
            roots.len()
        ),
    };
    let bytes = to_boc(&bag.graph, root, options)?;
    tracing::debug!(?format, bytes = bytes.len(), "re-encoded bag");

    Ok(match format {
        OutputFormat::Binary => bytes,
        OutputFormat::Hex => format!("{}\n", hex::encode(&bytes)).into_bytes(),
        OutputFormat::Base64 => format!("{}\n", STANDARD.encode(&bytes)).into_bytes(),
    })
}
