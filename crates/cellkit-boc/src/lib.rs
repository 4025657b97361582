//! Bag-of-Cells (BOC) serialization for cellkit cell graphs.
//!
//! Cells are ordered so that every reference points forward, identical
//! sub-trees are stored once, and the bag is written in the standard binary
//! layout.
//!
//! ## Layout
//!
//! ```text
//! BOC Layout:
//! ┌────────────────────────────────────────┐
//! │ Magic: B5EE9C72                        │  4 bytes
//! │ has_idx:1 has_crc32c:1 cache_bits:1    │
//! │ flags:2 size_bytes:3                   │  1 byte
//! │ off_bytes                              │  1 byte
//! ├────────────────────────────────────────┤
//! │ cells_num       (size_bytes)           │
//! │ roots_num       (size_bytes)           │
//! │ absent_num      (size_bytes)           │
//! │ tot_cells_size  (off_bytes)            │
//! │ root_list       (roots × size_bytes)   │
//! ├────────────────────────────────────────┤
//! │ index, if has_idx (cells × off_bytes)  │
//! ├────────────────────────────────────────┤
//! │ cells: d1 d2 data refs…                │  tot_cells_size bytes
//! ├────────────────────────────────────────┤
//! │ CRC32C, if has_crc32c (little-endian)  │  4 bytes
//! └────────────────────────────────────────┘
//! ```
//!
//! The lean prefixes `68FF65F3` and `ACC3A728` replace the flag byte with a
//! plain `size_bytes` byte and always carry an index; the second one also
//! carries the checksum.

pub mod crc32c;
mod format;
mod index;

pub use format::{
    from_boc, from_boc_base64, from_boc_hex, one_from_boc, read_boc, to_boc, write_boc,
    BagOfCells, BocError, BocHeader, BocMagic, BocOptions, MAGIC, MAGIC_LEAN, MAGIC_LEAN_CRC32C,
};
pub use index::CellIndex;
