//! Input sniffing for BOC files.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use cellkit_boc::{from_boc, from_boc_base64, from_boc_hex, BagOfCells, BocMagic};

/// How a BOC file is stored on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEncoding {
    Binary,
    Hex,
    Base64,
}

/// Guess the encoding of a file's content.
///
/// Priority: binary magic > hex text > base64 text.
pub fn detect(content: &[u8]) -> Option<InputEncoding> {
    if content.get(..4).and_then(BocMagic::from_bytes).is_some() {
        return Some(InputEncoding::Binary);
    }
    let text = std::str::from_utf8(content).ok()?;
    let text = compact(text);
    if text.is_empty() {
        return None;
    }
    if text.len() % 2 == 0 && text.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Some(InputEncoding::Hex);
    }
    if text
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'/' | b'='))
    {
        return Some(InputEncoding::Base64);
    }
    None
}

/// Text with all whitespace removed, so wrapped dumps decode too.
fn compact(text: &str) -> String {
    text.split_whitespace().collect()
}

/// Decode a bag from raw file content in any supported encoding.
pub fn decode(content: &[u8]) -> Result<(BagOfCells, InputEncoding)> {
    let Some(encoding) = detect(content) else {
        bail!("input is neither a binary BOC nor hex or base64 text");
    };
    let bag = match encoding {
        InputEncoding::Binary => from_boc(content)?,
        InputEncoding::Hex => from_boc_hex(&compact(&String::from_utf8_lossy(content)))?,
        InputEncoding::Base64 => from_boc_base64(&compact(&String::from_utf8_lossy(content)))?,
    };
    tracing::debug!(?encoding, cells = bag.graph.len(), roots = bag.roots.len(), "decoded input");
    Ok((bag, encoding))
}

/// Read and decode the BOC stored at `path`.
pub fn load_bag(path: &Path) -> Result<BagOfCells> {
    let content = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let (bag, _) = decode(&content).with_context(|| format!("decoding {}", path.display()))?;
    Ok(bag)
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use cellkit_boc::{to_boc, BocOptions};
    use cellkit_core::CellGraph;

    fn sample() -> Vec<u8> {
        let mut graph = CellGraph::new();
        let root = graph.new_cell();
        graph.bits_mut(root).unwrap().write_string("cellkit").unwrap();
        to_boc(&graph, root, &BocOptions::default()).unwrap()
    }

    #[test]
    fn detects_binary() {
        assert_eq!(detect(&sample()), Some(InputEncoding::Binary));
        assert_eq!(detect(&[0x68, 0xFF, 0x65, 0xF3, 0x00]), Some(InputEncoding::Binary));
    }

    #[test]
    fn detects_text_encodings() {
        let boc = sample();
        let hex_text = format!("{}\n", hex::encode(&boc));
        assert_eq!(detect(hex_text.as_bytes()), Some(InputEncoding::Hex));
        let b64 = STANDARD.encode(&boc);
        assert_eq!(detect(b64.as_bytes()), Some(InputEncoding::Base64));
    }

    #[test]
    fn wrapped_text_decodes() {
        let boc = sample();
        let hex_text = hex::encode(&boc);
        let (head, tail) = hex_text.split_at(10);
        let wrapped = format!("{head}\n  {tail}\n");
        let (bag, encoding) = decode(wrapped.as_bytes()).unwrap();
        assert_eq!(encoding, InputEncoding::Hex);
        assert_eq!(bag.roots.len(), 1);
    }

    #[test]
    fn all_encodings_decode_to_same_hash() {
        let boc = sample();
        let (binary, _) = decode(&boc).unwrap();
        let (hexed, _) = decode(hex::encode(&boc).as_bytes()).unwrap();
        let (b64, _) = decode(STANDARD.encode(&boc).as_bytes()).unwrap();
        let hash = binary.graph.hash(binary.roots[0]).unwrap();
        assert_eq!(hexed.graph.hash(hexed.roots[0]).unwrap(), hash);
        assert_eq!(b64.graph.hash(b64.roots[0]).unwrap(), hash);
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(detect(b""), None);
        assert_eq!(detect(b"  \n"), None);
        assert_eq!(detect(b"not a boc!"), None);
        assert!(decode(b"not a boc!").is_err());
        assert!(decode(&[0xFF, 0xFE, 0x00]).is_err());
    }

    #[test]
    fn load_bag_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.boc");
        fs::write(&path, b"zz").unwrap();
        let err = load_bag(&path).unwrap_err();
        assert!(format!("{err:#}").contains("broken.boc"));
    }
}
