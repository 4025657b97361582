//! `cellkit hash`: print root representation hashes.

use std::path::Path;

use anyhow::Result;
use cellkit_boc::BagOfCells;

use crate::detect::load_bag;

/// Print one hash per root, hex by default.
pub fn run(input: &Path, base64: bool) -> Result<()> {
    let bag = load_bag(input)?;
    print!("{}", render(&bag, base64)?);
    Ok(())
}

pub(crate) fn render(bag: &BagOfCells, base64: bool) -> Result<String> {
    let mut out = String::new();
    for &root in &bag.roots {
        let hash = if base64 {
            bag.graph.hash_base64(root)?
        } else {
            bag.graph.hash_hex(root)?
        };
        out.push_str(&hash);
        out.push('\n');
    }
    Ok(out)
}
