//! Cells and bit strings for the cellkit bag-of-cells toolkit.
//!
//! A cell is the unit of storage of the ledger: up to 1023 data bits and up
//! to four ordered references to other cells. Cells are content addressed by
//! the SHA-256 of their standard representation.
//!
//! ## Standard representation
//!
//! ```text
//! ┌──────────────────────────────────────┐
//! │ d1 = refs + 8·exotic + 32·level      │  1 byte
//! │ d2 = ⌊bits/8⌋ + ⌈bits/8⌉             │  1 byte
//! ├──────────────────────────────────────┤
//! │ data, completion-padded to a byte    │  ⌈d2/2⌉ bytes
//! ├──────────────────────────────────────┤
//! │ depth of each child, u16 big-endian  │  2 bytes × refs
//! ├──────────────────────────────────────┤
//! │ hash of each child                   │  32 bytes × refs
//! └──────────────────────────────────────┘
//! ```

pub mod address;
pub mod bits;
pub mod cell;
pub mod error;
pub mod hash;

pub use address::{Address, AddressTag};
pub use bits::{BitString, MAX_CELL_BITS};
pub use cell::{Cell, CellGraph, CellId, CellMeta, CellMetrics, CellSlice, MAX_CELL_REFS};
pub use error::{CellError, Result};
pub use hash::{hash_base64, hash_hex, sha256, CellHash};
