//! Dictionaries stored as binary tries of cells (`Hashmap n X`).
//!
//! Keys are fixed-width bit strings. Each edge carries a label with the bits
//! all keys below it share; a fork has exactly two references, left for `0`
//! and right for `1`. Leaves hold the value inline after their label.
//!
//! ```text
//! hm_edge#_ label:(HmLabel ~l n) node:(HashmapNode m X) = Hashmap n X
//! hmn_leaf#_ value:X = HashmapNode 0 X
//! hmn_fork#_ left:^(Hashmap n X) right:^(Hashmap n X) = HashmapNode (n + 1) X
//! ```
//!
//! ```
//! use std::collections::BTreeMap;
//! use cellkit_core::CellGraph;
//! use cellkit_dict::{parse_dict, serialize_dict};
//!
//! let entries = BTreeMap::from([(1u64, 10u8), (2u64, 20u8)]);
//! let mut graph = CellGraph::new();
//! let root = serialize_dict(&mut graph, 8, &entries, |value, graph, leaf| {
//!     graph.bits_mut(leaf)?.write_uint(*value, 8)?;
//!     Ok(())
//! })?
//! .expect("non-empty");
//!
//! let parsed: BTreeMap<u64, u8> =
//!     parse_dict(&graph, root, 8, 16, |slice| Ok(slice.load_u64(8)? as u8))?;
//! assert_eq!(parsed, entries);
//! # Ok::<(), cellkit_dict::DictError>(())
//! ```

mod dict;
mod error;
mod label;

pub use dict::{load_dict_root, parse_dict, serialize_dict, store_dict_root, DictKey};
pub use error::{DictError, Result};
