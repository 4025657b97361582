//! Dictionary encoder and decoder.

use std::collections::BTreeMap;

use cellkit_core::bits::{biguint_to_bits, bits_to_biguint};
use cellkit_core::{CellError, CellGraph, CellId, CellSlice, MAX_CELL_BITS, MAX_CELL_REFS};
use num_bigint::{BigInt, BigUint, Sign};
use num_traits::{One, ToPrimitive};

use crate::error::{DictError, Result};
use crate::label::{read_label, write_label};

/// A key that can be laid out as a fixed-width big-endian bit vector.
pub trait DictKey: Ord + Sized {
    /// Encode `self` using exactly `key_bits` bits.
    fn to_bits(&self, key_bits: usize) -> Result<Vec<bool>>;

    /// Decode a key from its full bit vector.
    fn from_bits(bits: &[bool]) -> Result<Self>;
}

impl DictKey for BigUint {
    fn to_bits(&self, key_bits: usize) -> Result<Vec<bool>> {
        biguint_to_bits(self, key_bits).ok_or_else(|| DictError::KeyOutOfRange {
            key: self.to_string(),
            bits: key_bits,
        })
    }

    fn from_bits(bits: &[bool]) -> Result<Self> {
        Ok(bits_to_biguint(bits))
    }
}

/// Two's complement.
impl DictKey for BigInt {
    fn to_bits(&self, key_bits: usize) -> Result<Vec<bool>> {
        let out_of_range = || DictError::KeyOutOfRange {
            key: self.to_string(),
            bits: key_bits,
        };
        let modulus = BigInt::one() << key_bits;
        let half = BigInt::one() << key_bits.saturating_sub(1);
        if *self >= half || *self < -&half {
            return Err(out_of_range());
        }
        let unsigned = if self.sign() == Sign::Minus {
            self + &modulus
        } else {
            self.clone()
        };
        let unsigned = unsigned.to_biguint().ok_or_else(out_of_range)?;
        biguint_to_bits(&unsigned, key_bits).ok_or_else(out_of_range)
    }

    fn from_bits(bits: &[bool]) -> Result<Self> {
        let value = BigInt::from(bits_to_biguint(bits));
        match bits.first() {
            Some(true) => Ok(value - (BigInt::one() << bits.len())),
            _ => Ok(value),
        }
    }
}

impl DictKey for u64 {
    fn to_bits(&self, key_bits: usize) -> Result<Vec<bool>> {
        BigUint::from(*self).to_bits(key_bits)
    }

    fn from_bits(bits: &[bool]) -> Result<Self> {
        let value = BigUint::from_bits(bits)?;
        value.to_u64().ok_or_else(|| DictError::KeyOutOfRange {
            key: value.to_string(),
            bits: 64,
        })
    }
}

impl DictKey for i64 {
    fn to_bits(&self, key_bits: usize) -> Result<Vec<bool>> {
        BigInt::from(*self).to_bits(key_bits)
    }

    fn from_bits(bits: &[bool]) -> Result<Self> {
        let value = BigInt::from_bits(bits)?;
        value.to_i64().ok_or_else(|| DictError::KeyOutOfRange {
            key: value.to_string(),
            bits: 64,
        })
    }
}

fn check_key_bits(key_bits: usize) -> Result<()> {
    if key_bits == 0 || key_bits > MAX_CELL_BITS {
        return Err(DictError::InvalidKeyBits(key_bits));
    }
    Ok(())
}

/// Serialize `entries` as a `Hashmap key_bits X` trie inside `graph`.
///
/// `store_value` writes a leaf's value into the leaf cell right after its
/// label; it may also add references. Returns `None` for an empty map.
pub fn serialize_dict<'v, K, V, I, F>(
    graph: &mut CellGraph,
    key_bits: usize,
    entries: I,
    mut store_value: F,
) -> Result<Option<CellId>>
where
    K: DictKey + 'v,
    V: 'v,
    I: IntoIterator<Item = (&'v K, &'v V)>,
    F: FnMut(&V, &mut CellGraph, CellId) -> Result<()>,
{
    check_key_bits(key_bits)?;

    let mut sorted: BTreeMap<Vec<bool>, &V> = BTreeMap::new();
    for (key, value) in entries {
        sorted.insert(key.to_bits(key_bits)?, value);
    }
    if sorted.is_empty() {
        return Ok(None);
    }

    let leaves: Vec<(Vec<bool>, &V)> = sorted.into_iter().collect();
    let root = build_edge(graph, &leaves, 0, key_bits, &mut store_value)?;
    tracing::debug!(entries = leaves.len(), key_bits, root = %root, "serialized dictionary");
    Ok(Some(root))
}

/// Build the edge covering `leaves`, whose keys all agree on the first
/// `offset` bits.
fn build_edge<V, F>(
    graph: &mut CellGraph,
    leaves: &[(Vec<bool>, &V)],
    offset: usize,
    key_bits: usize,
    store_value: &mut F,
) -> Result<CellId>
where
    F: FnMut(&V, &mut CellGraph, CellId) -> Result<()>,
{
    // Keys are sorted, so the first and last share the prefix of them all.
    let first = &leaves[0].0[offset..];
    let last = &leaves[leaves.len() - 1].0[offset..];
    let common = first
        .iter()
        .zip(last)
        .take_while(|(a, b)| a == b)
        .count();

    let id = graph.new_cell();
    write_label(graph.bits_mut(id)?, &first[..common], key_bits - offset)?;

    let fork = offset + common;
    if fork == key_bits {
        store_value(leaves[0].1, graph, id)?;
        return Ok(id);
    }

    let split = leaves.partition_point(|(key, _)| !key[fork]);
    let left = build_edge(graph, &leaves[..split], fork + 1, key_bits, store_value)?;
    let right = build_edge(graph, &leaves[split..], fork + 1, key_bits, store_value)?;
    graph.push_ref(id, left)?;
    graph.push_ref(id, right)?;
    Ok(id)
}

/// Parse the trie rooted at `root` back into a sorted map.
///
/// `load_value` reads one leaf value from the slice positioned right after
/// the leaf's label. Fails with [`DictError::TooManyElements`] as soon as a
/// leaf beyond `max_elements` is found.
pub fn parse_dict<K, V, F>(
    graph: &CellGraph,
    root: CellId,
    key_bits: usize,
    max_elements: usize,
    mut load_value: F,
) -> Result<BTreeMap<K, V>>
where
    K: DictKey,
    F: FnMut(&mut CellSlice<'_>) -> Result<V>,
{
    check_key_bits(key_bits)?;

    let mut parser = Parser {
        graph,
        key_bits,
        max_elements,
        out: BTreeMap::new(),
    };
    let mut prefix = Vec::with_capacity(key_bits);
    parser.edge(root, &mut prefix, &mut load_value)?;
    tracing::debug!(elements = parser.out.len(), key_bits, "parsed dictionary");
    Ok(parser.out)
}

struct Parser<'g, K, V> {
    graph: &'g CellGraph,
    key_bits: usize,
    max_elements: usize,
    out: BTreeMap<K, V>,
}

impl<K: DictKey, V> Parser<'_, K, V> {
    fn edge<F>(&mut self, id: CellId, prefix: &mut Vec<bool>, load_value: &mut F) -> Result<()>
    where
        F: FnMut(&mut CellSlice<'_>) -> Result<V>,
    {
        let start = prefix.len();
        let graph = self.graph;
        let mut slice = graph.parse(id)?;
        let label = read_label(&mut slice, self.key_bits - start)?;
        prefix.extend(label);

        if prefix.len() == self.key_bits {
            if self.out.len() >= self.max_elements {
                return Err(DictError::TooManyElements {
                    max: self.max_elements,
                });
            }
            let value = load_value(&mut slice)?;
            self.out.insert(K::from_bits(prefix.as_slice())?, value);
        } else {
            let left = slice.load_ref()?;
            let right = slice.load_ref()?;
            for (bit, child) in [(false, left), (true, right)] {
                prefix.push(bit);
                self.edge(child, prefix, load_value)?;
                prefix.pop();
            }
        }

        prefix.truncate(start);
        Ok(())
    }
}

/// Write a `HashmapE` header into `parent`: `0` for an empty dictionary,
/// otherwise `1` and a reference to `root`.
pub fn store_dict_root(
    graph: &mut CellGraph,
    parent: CellId,
    root: Option<CellId>,
) -> std::result::Result<(), CellError> {
    let Some(root) = root else {
        return graph.bits_mut(parent)?.write_bit(false);
    };

    graph.cell(root)?;
    let cell = graph.cell(parent)?;
    if cell.refs().len() >= MAX_CELL_REFS {
        return Err(CellError::TooManyRefs {
            cell: parent,
            max: MAX_CELL_REFS,
        });
    }
    if cell.bits().free_bits() == 0 {
        return Err(CellError::BitOverflow {
            requested: 1,
            free: 0,
        });
    }
    graph.bits_mut(parent)?.write_bit(true)?;
    graph.push_ref(parent, root)
}

/// Read a `HashmapE` header. The slice is left untouched on failure.
pub fn load_dict_root(slice: &mut CellSlice<'_>) -> std::result::Result<Option<CellId>, CellError> {
    slice.load_maybe_ref()
}
