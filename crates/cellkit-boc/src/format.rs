//! BOC binary format implementation.
//!
//! Encoding always emits the generic `B5EE9C72` header with a single root.
//! Decoding accepts the generic header and both lean variants, and any
//! number of roots.

use std::io::{self, Read, Write};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use thiserror::Error;

use cellkit_core::{BitString, CellError, CellGraph, CellId, MAX_CELL_REFS};

use crate::crc32c::crc32c;
use crate::index::CellIndex;

/// Generic header: explicit flag byte.
pub const MAGIC: [u8; 4] = [0xB5, 0xEE, 0x9C, 0x72];

/// Lean header with index and without checksum.
pub const MAGIC_LEAN: [u8; 4] = [0x68, 0xFF, 0x65, 0xF3];

/// Lean header with index and trailing CRC32C.
pub const MAGIC_LEAN_CRC32C: [u8; 4] = [0xAC, 0xC3, 0xA7, 0x28];

const CRC_SIZE: usize = 4;

/// Errors that can occur while encoding or decoding a bag of cells.
#[derive(Debug, Error)]
pub enum BocError {
    #[error("unknown BOC magic prefix {0}")]
    InvalidMagic(String),

    #[error("BOC is truncated: not enough bytes for {0}")]
    Truncated(&'static str),

    #[error("invalid {field} width {width}")]
    InvalidFieldWidth { field: &'static str, width: usize },

    #[error("reserved BOC flags must be zero, got {0:#04b}")]
    ReservedFlags(u8),

    #[error("BOC declares no root cells")]
    NoRoots,

    #[error("BOC declares {0} absent cells, only complete BOCs are supported")]
    AbsentCells(u64),

    #[error("root index {index} out of range for {cells} cells")]
    InvalidRootIndex { index: usize, cells: usize },

    #[error("expected exactly one root cell, found {0}")]
    RootCount(usize),

    #[error("BOC checksum mismatch: stored {stored:#010x}, computed {computed:#010x}")]
    ChecksumMismatch { stored: u32, computed: u32 },

    #[error("{0} unexpected trailing bytes after BOC content")]
    TrailingBytes(usize),

    #[error("cell data size mismatch: header declares {declared} bytes, cells use {consumed}")]
    CellDataSize { declared: usize, consumed: usize },

    #[error("cell {index}: {reason}")]
    InvalidCell { index: usize, reason: String },

    #[error("cell {index}: {reason} cells are not supported")]
    UnsupportedCell { index: usize, reason: &'static str },

    #[error("broken topological order: cell {cell} references cell {reference}")]
    BrokenTopologicalOrder { cell: usize, reference: usize },

    #[error("invalid hex input: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("invalid base64 input: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error(transparent)]
    Cell(#[from] CellError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// The header variant a BOC was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BocMagic {
    Generic,
    Lean,
    LeanCrc32c,
}

impl BocMagic {
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        match bytes {
            b if b == MAGIC => Some(BocMagic::Generic),
            b if b == MAGIC_LEAN => Some(BocMagic::Lean),
            b if b == MAGIC_LEAN_CRC32C => Some(BocMagic::LeanCrc32c),
            _ => None,
        }
    }

    pub fn bytes(self) -> [u8; 4] {
        match self {
            BocMagic::Generic => MAGIC,
            BocMagic::Lean => MAGIC_LEAN,
            BocMagic::LeanCrc32c => MAGIC_LEAN_CRC32C,
        }
    }
}

impl std::fmt::Display for BocMagic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", hex::encode_upper(self.bytes()))
    }
}

/// Serialization switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BocOptions {
    /// Emit the per-cell offset index.
    pub has_idx: bool,
    /// Append a CRC32C of everything before it.
    pub has_crc32c: bool,
    /// Reserve the low bit of every index entry for a cache flag.
    pub has_cache_bits: bool,
    /// Reserved two-bit field; must be zero.
    pub flags: u8,
}

impl Default for BocOptions {
    fn default() -> Self {
        Self {
            has_idx: true,
            has_crc32c: true,
            has_cache_bits: false,
            flags: 0,
        }
    }
}

/// Header fields as found on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BocHeader {
    pub magic: BocMagic,
    pub has_idx: bool,
    pub has_crc32c: bool,
    pub has_cache_bits: bool,
    pub flags: u8,
    pub size_bytes: usize,
    pub off_bytes: usize,
    pub cells_num: usize,
    pub roots_num: usize,
    pub absent_num: u64,
    pub tot_cells_size: usize,
    pub root_list: Vec<usize>,
}

/// A decoded bag: the cells, the root handles and the header.
#[derive(Debug, Clone)]
pub struct BagOfCells {
    pub graph: CellGraph,
    pub roots: Vec<CellId>,
    pub header: BocHeader,
}

/// Smallest number of bytes (at least one) that can hold `value`.
fn byte_width(value: u64) -> usize {
    ((u64::BITS - value.leading_zeros()) as usize).div_ceil(8).max(1)
}

fn push_uint(buf: &mut Vec<u8>, value: u64, width: usize) {
    buf.extend_from_slice(&value.to_be_bytes()[8 - width..]);
}

/// Serialize the tree under `root` into a byte vector.
pub fn to_boc(graph: &CellGraph, root: CellId, options: &BocOptions) -> Result<Vec<u8>, BocError> {
    if options.flags != 0 {
        return Err(BocError::ReservedFlags(options.flags));
    }

    let index = CellIndex::build(graph, root)?;
    let cells_num = index.len();
    let size_bytes = byte_width(cells_num as u64);
    if size_bytes > 4 {
        return Err(BocError::InvalidFieldWidth {
            field: "size_bytes",
            width: size_bytes,
        });
    }

    // Sizing pass: every cell's bytes and its ending offset.
    let mut blob = Vec::new();
    let mut ends = Vec::with_capacity(cells_num);
    for &id in index.order() {
        let cell = graph.cell(id)?;
        blob.extend_from_slice(&cell.data_with_descriptors());
        for &child in cell.refs() {
            push_uint(&mut blob, index.position_of(child)? as u64, size_bytes);
        }
        ends.push(blob.len() as u64);
    }

    let tot_cells_size = blob.len() as u64;
    let index_entry = |end: u64| if options.has_cache_bits { end << 1 } else { end };
    let max_offset = if options.has_idx {
        tot_cells_size.max(index_entry(tot_cells_size))
    } else {
        tot_cells_size
    };
    let off_bytes = byte_width(max_offset);

    let mut out = Vec::new();
    out.extend_from_slice(&MAGIC);
    out.push(
        (u8::from(options.has_idx) << 7)
            | (u8::from(options.has_crc32c) << 6)
            | (u8::from(options.has_cache_bits) << 5)
            | (options.flags << 3)
            | size_bytes as u8,
    );
    out.push(off_bytes as u8);
    push_uint(&mut out, cells_num as u64, size_bytes);
    push_uint(&mut out, 1, size_bytes);
    push_uint(&mut out, 0, size_bytes);
    push_uint(&mut out, tot_cells_size, off_bytes);
    push_uint(&mut out, index.position_of(root)? as u64, size_bytes);
    if options.has_idx {
        for &end in &ends {
            push_uint(&mut out, index_entry(end), off_bytes);
        }
    }
    out.extend_from_slice(&blob);
    if options.has_crc32c {
        let crc = crc32c(&out);
        out.extend_from_slice(&crc.to_le_bytes());
    }

    tracing::debug!(
        cells = cells_num,
        size_bytes,
        off_bytes,
        tot_cells_size,
        total = out.len(),
        "encoded BOC"
    );
    Ok(out)
}

/// Serialize the tree under `root` to a writer.
pub fn write_boc<W: Write>(
    writer: &mut W,
    graph: &CellGraph,
    root: CellId,
    options: &BocOptions,
) -> Result<(), BocError> {
    writer.write_all(&to_boc(graph, root, options)?)?;
    Ok(())
}

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn take(&mut self, len: usize, field: &'static str) -> Result<&'a [u8], BocError> {
        if len > self.remaining() {
            return Err(BocError::Truncated(field));
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    fn byte(&mut self, field: &'static str) -> Result<u8, BocError> {
        Ok(self.take(1, field)?[0])
    }

    fn uint(&mut self, width: usize, field: &'static str) -> Result<u64, BocError> {
        Ok(self
            .take(width, field)?
            .iter()
            .fold(0u64, |acc, &b| (acc << 8) | u64::from(b)))
    }

    fn usize(&mut self, width: usize, field: &'static str) -> Result<usize, BocError> {
        usize::try_from(self.uint(width, field)?).map_err(|_| BocError::Truncated(field))
    }
}

fn check_width(field: &'static str, width: usize, max: usize) -> Result<(), BocError> {
    if width == 0 || width > max {
        return Err(BocError::InvalidFieldWidth { field, width });
    }
    Ok(())
}

fn read_header(reader: &mut Reader<'_>) -> Result<BocHeader, BocError> {
    let prefix = reader.take(4, "magic")?;
    let magic = BocMagic::from_bytes(prefix)
        .ok_or_else(|| BocError::InvalidMagic(hex::encode_upper(prefix)))?;

    let flag_byte = reader.byte("flags")?;
    let (has_idx, has_crc32c, has_cache_bits, flags, size_bytes) = match magic {
        BocMagic::Generic => (
            flag_byte & 0x80 != 0,
            flag_byte & 0x40 != 0,
            flag_byte & 0x20 != 0,
            (flag_byte >> 3) & 0b11,
            usize::from(flag_byte & 0b111),
        ),
        BocMagic::Lean => (true, false, false, 0, usize::from(flag_byte)),
        BocMagic::LeanCrc32c => (true, true, false, 0, usize::from(flag_byte)),
    };
    if flags != 0 {
        return Err(BocError::ReservedFlags(flags));
    }
    check_width("size_bytes", size_bytes, 4)?;
    let off_bytes = usize::from(reader.byte("off_bytes")?);
    check_width("off_bytes", off_bytes, 8)?;

    let cells_num = reader.usize(size_bytes, "cells_num")?;
    let roots_num = reader.usize(size_bytes, "roots_num")?;
    let absent_num = reader.uint(size_bytes, "absent_num")?;
    let tot_cells_size = reader.usize(off_bytes, "tot_cells_size")?;

    if roots_num == 0 {
        return Err(BocError::NoRoots);
    }
    if absent_num != 0 {
        return Err(BocError::AbsentCells(absent_num));
    }

    let mut root_list = Vec::with_capacity(roots_num.min(reader.remaining()));
    for _ in 0..roots_num {
        let index = reader.usize(size_bytes, "root_list")?;
        if index >= cells_num {
            return Err(BocError::InvalidRootIndex {
                index,
                cells: cells_num,
            });
        }
        root_list.push(index);
    }

    Ok(BocHeader {
        magic,
        has_idx,
        has_crc32c,
        has_cache_bits,
        flags,
        size_bytes,
        off_bytes,
        cells_num,
        roots_num,
        absent_num,
        tot_cells_size,
        root_list,
    })
}

/// Decode one cell's descriptors and data; returns the data bits and the
/// reference indices.
fn read_cell(
    reader: &mut Reader<'_>,
    index: usize,
    header: &BocHeader,
) -> Result<(BitString, Vec<usize>), BocError> {
    let d1 = reader.byte("cell descriptor")?;
    let d2 = reader.byte("cell descriptor")?;

    let refs_num = usize::from(d1 & 0b111);
    if d1 & 0b1000 != 0 {
        return Err(BocError::UnsupportedCell {
            index,
            reason: "exotic",
        });
    }
    if d1 >> 5 != 0 {
        return Err(BocError::UnsupportedCell {
            index,
            reason: "levelled",
        });
    }
    if refs_num > MAX_CELL_REFS {
        return Err(BocError::InvalidCell {
            index,
            reason: format!("{refs_num} references exceed the maximum of {MAX_CELL_REFS}"),
        });
    }

    let data = reader.take(usize::from(d2).div_ceil(2), "cell data")?;
    let bits = BitString::from_top_upped(data, d2 % 2 == 1)?;

    let mut refs = Vec::with_capacity(refs_num);
    for _ in 0..refs_num {
        let reference = reader.usize(header.size_bytes, "cell reference")?;
        if reference <= index || reference >= header.cells_num {
            return Err(BocError::BrokenTopologicalOrder {
                cell: index,
                reference,
            });
        }
        refs.push(reference);
    }
    Ok((bits, refs))
}

/// Decode a bag of cells with any number of roots.
pub fn from_boc(data: &[u8]) -> Result<BagOfCells, BocError> {
    let mut reader = Reader::new(data);
    let header = read_header(&mut reader)?;

    if header.has_idx {
        let index_len = header
            .cells_num
            .checked_mul(header.off_bytes)
            .ok_or(BocError::Truncated("index"))?;
        reader.take(index_len, "index")?;
    }
    let blob = reader.take(header.tot_cells_size, "cell data")?;
    let content_end = reader.pos;
    let stored_crc = if header.has_crc32c {
        let crc = reader.take(CRC_SIZE, "crc32c")?;
        Some(u32::from_le_bytes([crc[0], crc[1], crc[2], crc[3]]))
    } else {
        None
    };
    if reader.remaining() != 0 {
        return Err(BocError::TrailingBytes(reader.remaining()));
    }
    if let Some(stored) = stored_crc {
        let computed = crc32c(&data[..content_end]);
        if stored != computed {
            return Err(BocError::ChecksumMismatch { stored, computed });
        }
    }

    // Every cell takes at least its two descriptor bytes.
    if header.cells_num > header.tot_cells_size / 2 {
        return Err(BocError::CellDataSize {
            declared: header.tot_cells_size,
            consumed: header.cells_num * 2,
        });
    }

    let mut cells = Reader::new(blob);
    let mut graph = CellGraph::new();
    let mut ids = Vec::with_capacity(header.cells_num);
    let mut pending_refs = Vec::with_capacity(header.cells_num);
    for index in 0..header.cells_num {
        let (bits, refs) = read_cell(&mut cells, index, &header)?;
        ids.push(graph.add_bits(bits)?);
        pending_refs.push(refs);
    }
    if cells.remaining() != 0 {
        return Err(BocError::CellDataSize {
            declared: header.tot_cells_size,
            consumed: cells.pos,
        });
    }

    for (index, refs) in pending_refs.into_iter().enumerate() {
        for reference in refs {
            graph.push_ref(ids[index], ids[reference])?;
        }
    }
    let roots = header.root_list.iter().map(|&i| ids[i]).collect();

    tracing::debug!(
        magic = %header.magic,
        cells = header.cells_num,
        roots = header.roots_num,
        size_bytes = header.size_bytes,
        off_bytes = header.off_bytes,
        tot_cells_size = header.tot_cells_size,
        "decoded BOC"
    );
    Ok(BagOfCells {
        graph,
        roots,
        header,
    })
}

/// Decode a bag of cells from hex text (surrounding whitespace ignored).
pub fn from_boc_hex(text: &str) -> Result<BagOfCells, BocError> {
    from_boc(&hex::decode(text.trim())?)
}

/// Decode a bag of cells from standard base64 text.
pub fn from_boc_base64(text: &str) -> Result<BagOfCells, BocError> {
    from_boc(&STANDARD.decode(text.trim())?)
}

/// Decode a bag that must hold exactly one root.
pub fn one_from_boc(data: &[u8]) -> Result<(CellGraph, CellId), BocError> {
    let bag = from_boc(data)?;
    match bag.roots.as_slice() {
        [root] => Ok((bag.graph, *root)),
        roots => Err(BocError::RootCount(roots.len())),
    }
}

/// Decode a bag from a reader.
pub fn read_boc<R: Read>(reader: &mut R) -> Result<BagOfCells, BocError> {
    let mut data = Vec::new();
    reader.read_to_end(&mut data)?;
    from_boc(&data)
}
