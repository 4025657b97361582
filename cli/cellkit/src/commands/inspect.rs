//! `cellkit inspect`: header fields, root hashes and cell trees.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::Result;
use cellkit_boc::BagOfCells;

use crate::detect::load_bag;

/// Describe the bag stored at `input`, as text or JSON.
pub fn run(input: &Path, json: bool) -> Result<()> {
    let bag = load_bag(input)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&to_json(&bag)?)?);
    } else {
        print!("{}", render(&bag)?);
    }
    Ok(())
}

pub(crate) fn render(bag: &BagOfCells) -> Result<String> {
    let header = &bag.header;
    let mut out = String::new();
    writeln!(out, "magic:          {}", header.magic)?;
    writeln!(out, "has_idx:        {}", header.has_idx)?;
    writeln!(out, "has_crc32c:     {}", header.has_crc32c)?;
    writeln!(out, "has_cache_bits: {}", header.has_cache_bits)?;
    writeln!(out, "size_bytes:     {}", header.size_bytes)?;
    writeln!(out, "off_bytes:      {}", header.off_bytes)?;
    writeln!(out, "cells:          {}", header.cells_num)?;
    writeln!(out, "roots:          {}", header.roots_num)?;
    writeln!(out, "absent:         {}", header.absent_num)?;
    writeln!(out, "tot_cells_size: {}", header.tot_cells_size)?;

    for (i, &root) in bag.roots.iter().enumerate() {
        writeln!(out)?;
        writeln!(
            out,
            "root {i} ({root}): hash {} depth {}",
            bag.graph.hash_hex(root)?,
            bag.graph.max_depth(root)?
        )?;
        out.push_str(&bag.graph.print(root)?);
    }
    Ok(out)
}

pub(crate) fn to_json(bag: &BagOfCells) -> Result<serde_json::Value> {
    let header = &bag.header;
    let roots = bag
        .roots
        .iter()
        .map(|&root| {
            Ok(serde_json::json!({
                "index": root.index(),
                "hash": bag.graph.hash_hex(root)?,
                "depth": bag.graph.max_depth(root)?,
                "tree": bag.graph.print(root)?,
            }))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(serde_json::json!({
        "header": {
            "magic": header.magic.to_string(),
            "has_idx": header.has_idx,
            "has_crc32c": header.has_crc32c,
            "has_cache_bits": header.has_cache_bits,
            "size_bytes": header.size_bytes,
            "off_bytes": header.off_bytes,
            "cells_num": header.cells_num,
            "roots_num": header.roots_num,
            "absent_num": header.absent_num,
            "tot_cells_size": header.tot_cells_size,
        },
        "cells": bag.graph.len(),
        "roots": roots,
    }))
}
