//! Read cursor over a single cell.

use std::collections::HashSet;

use num_bigint::{BigInt, BigUint};
use num_traits::{One, Zero};

use super::{Cell, CellGraph, CellId};
use crate::address::{Address, AddressTag};
use crate::bits::{check_int_bit_length, read_bit, var_uint_length_bits, BitString};
use crate::error::{CellError, Result};

/// A cursor over the bits and references of one cell.
///
/// `load_*` methods advance the cursor only when the read succeeds;
/// `preload_*` methods never advance it.
#[derive(Debug, Clone, Copy)]
pub struct CellSlice<'a> {
    graph: &'a CellGraph,
    id: CellId,
    cell: &'a Cell,
    bit_offset: usize,
    ref_offset: usize,
}

impl<'a> CellSlice<'a> {
    pub(crate) fn new(graph: &'a CellGraph, id: CellId, cell: &'a Cell) -> Self {
        Self {
            graph,
            id,
            cell,
            bit_offset: 0,
            ref_offset: 0,
        }
    }

    /// Handle of the cell being read.
    pub fn cell_id(&self) -> CellId {
        self.id
    }

    pub fn remaining_bits(&self) -> usize {
        self.cell.bits().used_bits() - self.bit_offset
    }

    pub fn remaining_refs(&self) -> usize {
        self.cell.refs().len() - self.ref_offset
    }

    /// True when neither bits nor references remain.
    pub fn is_empty(&self) -> bool {
        self.is_data_empty() && self.is_refs_empty()
    }

    pub fn is_data_empty(&self) -> bool {
        self.remaining_bits() == 0
    }

    pub fn is_refs_empty(&self) -> bool {
        self.remaining_refs() == 0
    }

    fn preload_with<T>(&self, read: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let mut cursor = *self;
        read(&mut cursor)
    }

    fn load_with<T>(&mut self, read: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let mut cursor = *self;
        let value = read(&mut cursor)?;
        *self = cursor;
        Ok(value)
    }

    fn ensure_bits(&self, requested: usize) -> Result<()> {
        let remaining = self.remaining_bits();
        if requested > remaining {
            return Err(CellError::SliceExhausted {
                requested,
                remaining,
            });
        }
        Ok(())
    }

    // Callers must have checked bounds with `ensure_bits`.
    fn take_bit(&mut self) -> bool {
        let bit = read_bit(self.cell.bits().raw_bytes(), self.bit_offset);
        self.bit_offset += 1;
        bit
    }

    fn take_u64(&mut self, bit_length: usize) -> u64 {
        (0..bit_length).fold(0u64, |acc, _| (acc << 1) | u64::from(self.take_bit()))
    }

    fn read_bit(&mut self) -> Result<bool> {
        self.ensure_bits(1)?;
        Ok(self.take_bit())
    }

    fn read_uint(&mut self, bit_length: usize) -> Result<BigUint> {
        check_int_bit_length(bit_length)?;
        self.ensure_bits(bit_length)?;
        let mut value = BigUint::zero();
        for _ in 0..bit_length {
            value <<= 1u8;
            if self.take_bit() {
                value += 1u8;
            }
        }
        Ok(value)
    }

    fn read_int(&mut self, bit_length: usize) -> Result<BigInt> {
        let unsigned = BigInt::from(self.read_uint(bit_length)?);
        let half = BigInt::one() << (bit_length - 1);
        if unsigned >= half {
            Ok(unsigned - (BigInt::one() << bit_length))
        } else {
            Ok(unsigned)
        }
    }

    fn read_u64(&mut self, bit_length: usize) -> Result<u64> {
        if bit_length > 64 {
            return Err(CellError::InvalidBitLength(bit_length));
        }
        self.ensure_bits(bit_length)?;
        Ok(self.take_u64(bit_length))
    }

    fn read_bytes(&mut self, bit_length: Option<usize>) -> Result<Vec<u8>> {
        let bit_length = match bit_length {
            Some(n) => {
                if n % 8 != 0 {
                    return Err(CellError::NotByteAligned(format!("bit length {n}")));
                }
                self.ensure_bits(n)?;
                n
            }
            None => {
                let n = self.remaining_bits();
                if n % 8 != 0 {
                    return Err(CellError::NotByteAligned(format!(
                        "remaining slice data ({n} bits)"
                    )));
                }
                n
            }
        };
        Ok((0..bit_length / 8)
            .map(|_| self.take_u64(8) as u8)
            .collect())
    }

    fn read_bits(&mut self, bit_length: usize) -> Result<BitString> {
        self.ensure_bits(bit_length)?;
        let mut bits = BitString::new(bit_length);
        for _ in 0..bit_length {
            bits.write_bit(self.take_bit())?;
        }
        Ok(bits)
    }

    fn read_var_uint(&mut self, max_bytes: usize) -> Result<BigUint> {
        let length_bits = var_uint_length_bits(max_bytes)?;
        self.ensure_bits(length_bits)?;
        let byte_length = self.take_u64(length_bits) as usize;
        if byte_length == 0 {
            return Ok(BigUint::zero());
        }
        self.read_uint(byte_length * 8)
    }

    fn read_coins(&mut self) -> Result<BigUint> {
        self.read_var_uint(16)
    }

    fn read_maybe_ref(&mut self) -> Result<Option<CellId>> {
        if self.read_bit()? {
            Ok(Some(self.read_ref()?))
        } else {
            Ok(None)
        }
    }

    fn read_address(&mut self) -> Result<Option<Address>> {
        self.ensure_bits(2)?;
        match AddressTag::from_bits(self.take_u64(2)) {
            AddressTag::None => Ok(None),
            AddressTag::External => Err(CellError::UnsupportedAddress("external")),
            AddressTag::InternalVariable => Err(CellError::UnsupportedAddress("internal variable")),
            AddressTag::InternalStandard => {
                self.ensure_bits(Address::STD_BITS - 2)?;
                if self.take_bit() {
                    return Err(CellError::UnsupportedAddress("anycast"));
                }
                let workchain = self.take_u64(8) as u8 as i8;
                let mut hash = [0u8; 32];
                for byte in hash.iter_mut() {
                    *byte = self.take_u64(8) as u8;
                }
                Ok(Some(Address::new(workchain, hash)))
            }
        }
    }

    fn read_string(&mut self) -> Result<String> {
        let bytes = self.read_bytes(None)?;
        String::from_utf8(bytes).map_err(|_| CellError::InvalidUtf8)
    }

    fn read_ref(&mut self) -> Result<CellId> {
        let id = self
            .cell
            .refs()
            .get(self.ref_offset)
            .copied()
            .ok_or(CellError::RefsExhausted)?;
        self.ref_offset += 1;
        Ok(id)
    }

    pub fn load_bit(&mut self) -> Result<bool> {
        self.load_with(Self::read_bit)
    }

    pub fn preload_bit(&self) -> Result<bool> {
        self.preload_with(Self::read_bit)
    }

    /// Read an unsigned integer of `bit_length` bits, `bit_length ∈ (0, 256]`.
    pub fn load_uint(&mut self, bit_length: usize) -> Result<BigUint> {
        self.load_with(|s| s.read_uint(bit_length))
    }

    pub fn preload_uint(&self, bit_length: usize) -> Result<BigUint> {
        self.preload_with(|s| s.read_uint(bit_length))
    }

    /// Read a two's-complement integer of `bit_length` bits.
    pub fn load_int(&mut self, bit_length: usize) -> Result<BigInt> {
        self.load_with(|s| s.read_int(bit_length))
    }

    pub fn preload_int(&self, bit_length: usize) -> Result<BigInt> {
        self.preload_with(|s| s.read_int(bit_length))
    }

    /// Read a small unsigned field of at most 64 bits.
    pub fn load_u64(&mut self, bit_length: usize) -> Result<u64> {
        self.load_with(|s| s.read_u64(bit_length))
    }

    pub fn preload_u64(&self, bit_length: usize) -> Result<u64> {
        self.preload_with(|s| s.read_u64(bit_length))
    }

    /// Read `bit_length / 8` bytes, or every remaining byte when `None`.
    pub fn load_bytes(&mut self, bit_length: Option<usize>) -> Result<Vec<u8>> {
        self.load_with(|s| s.read_bytes(bit_length))
    }

    pub fn preload_bytes(&self, bit_length: Option<usize>) -> Result<Vec<u8>> {
        self.preload_with(|s| s.read_bytes(bit_length))
    }

    /// Read raw bits into a new bit string of exactly that capacity.
    pub fn load_bits(&mut self, bit_length: usize) -> Result<BitString> {
        self.load_with(|s| s.read_bits(bit_length))
    }

    pub fn preload_bits(&self, bit_length: usize) -> Result<BitString> {
        self.preload_with(|s| s.read_bits(bit_length))
    }

    /// Read a `VarUInteger max_bytes`: a byte count below `max_bytes`, then
    /// that many bytes of big-endian value.
    pub fn load_var_uint(&mut self, max_bytes: usize) -> Result<BigUint> {
        self.load_with(|s| s.read_var_uint(max_bytes))
    }

    pub fn preload_var_uint(&self, max_bytes: usize) -> Result<BigUint> {
        self.preload_with(|s| s.read_var_uint(max_bytes))
    }

    /// Read a `VarUInteger 16` token amount.
    pub fn load_coins(&mut self) -> Result<BigUint> {
        self.load_with(Self::read_coins)
    }

    pub fn preload_coins(&self) -> Result<BigUint> {
        self.preload_with(Self::read_coins)
    }

    /// Read `addr_none` (as `None`) or a standard internal address.
    pub fn load_address(&mut self) -> Result<Option<Address>> {
        self.load_with(Self::read_address)
    }

    pub fn preload_address(&self) -> Result<Option<Address>> {
        self.preload_with(Self::read_address)
    }

    /// Read the remaining data as a UTF-8 string.
    pub fn load_string(&mut self) -> Result<String> {
        self.load_with(Self::read_string)
    }

    pub fn preload_string(&self) -> Result<String> {
        self.preload_with(Self::read_string)
    }

    /// Take the next reference.
    pub fn load_ref(&mut self) -> Result<CellId> {
        self.load_with(Self::read_ref)
    }

    pub fn preload_ref(&self) -> Result<CellId> {
        self.preload_with(Self::read_ref)
    }

    /// Read a `Maybe ^Cell`: a presence bit, then a reference when it is set.
    pub fn load_maybe_ref(&mut self) -> Result<Option<CellId>> {
        self.load_with(Self::read_maybe_ref)
    }

    pub fn preload_maybe_ref(&self) -> Result<Option<CellId>> {
        self.preload_with(Self::read_maybe_ref)
    }

    /// Advance the bit cursor without reading.
    pub fn skip_bits(&mut self, bit_length: usize) -> Result<()> {
        self.ensure_bits(bit_length)?;
        self.bit_offset += bit_length;
        Ok(())
    }

    /// Collect snake-encoded bytes: the rest of this cell, then the rest of
    /// each cell along the chain of single references.
    pub fn load_snake_data(&mut self) -> Result<Vec<u8>> {
        self.load_with(|s| s.read_snake_data())
    }

    /// Snake data decoded as UTF-8.
    pub fn load_snake_data_string(&mut self) -> Result<String> {
        self.load_with(|s| {
            String::from_utf8(s.read_snake_data()?).map_err(|_| CellError::InvalidUtf8)
        })
    }

    fn read_snake_data(&mut self) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        let mut visited = HashSet::from([self.id]);

        if self.remaining_refs() > 1 {
            return Err(CellError::SnakeData(format!(
                "cell {} has more than one referenced cell",
                self.id
            )));
        }
        bytes.extend(self.read_bytes(None)?);
        let mut next = if self.is_refs_empty() {
            None
        } else {
            Some(self.read_ref()?)
        };

        while let Some(id) = next {
            if !visited.insert(id) {
                return Err(CellError::CycleDetected(id));
            }
            let mut hop = self.graph.parse(id)?;
            if hop.remaining_refs() > 1 {
                return Err(CellError::SnakeData(format!(
                    "cell {id} has more than one referenced cell"
                )));
            }
            bytes.extend(hop.read_bytes(None)?);
            next = hop.cell.refs().first().copied();
        }

        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph_with(write: impl FnOnce(&mut BitString)) -> (CellGraph, CellId) {
        let mut graph = CellGraph::new();
        let id = graph.new_cell();
        write(graph.bits_mut(id).unwrap());
        (graph, id)
    }

    #[test]
    fn load_advances_preload_does_not() {
        let (graph, id) = graph_with(|b| b.write_uint(0xABu8, 8).unwrap());
        let mut slice = graph.parse(id).unwrap();
        assert_eq!(slice.preload_uint(4).unwrap(), BigUint::from(0xAu8));
        assert_eq!(slice.remaining_bits(), 8);
        assert_eq!(slice.load_uint(4).unwrap(), BigUint::from(0xAu8));
        assert_eq!(slice.load_uint(4).unwrap(), BigUint::from(0xBu8));
        assert!(slice.is_empty());
    }

    #[test]
    fn failed_load_does_not_advance() {
        let (graph, id) = graph_with(|b| b.write_bit_array(&[true, false, true]).unwrap());
        let mut slice = graph.parse(id).unwrap();
        assert_eq!(
            slice.load_uint(8),
            Err(CellError::SliceExhausted {
                requested: 8,
                remaining: 3
            })
        );
        assert_eq!(slice.remaining_bits(), 3);
        assert!(slice.load_bit().unwrap());
    }

    #[test]
    fn int_round_trip() {
        let (graph, id) = graph_with(|b| {
            b.write_int(-5, 16).unwrap();
            b.write_int(42, 7).unwrap();
        });
        let mut slice = graph.parse(id).unwrap();
        assert_eq!(slice.load_int(16).unwrap(), BigInt::from(-5));
        assert_eq!(slice.load_int(7).unwrap(), BigInt::from(42));
    }

    #[test]
    fn uint_bit_length_validated() {
        let (graph, id) = graph_with(|b| b.write_bytes(&[0; 40]).unwrap());
        let slice = graph.parse(id).unwrap();
        assert_eq!(slice.preload_uint(0), Err(CellError::InvalidBitLength(0)));
        assert_eq!(slice.preload_uint(257), Err(CellError::InvalidBitLength(257)));
        assert!(slice.preload_uint(256).is_ok());
        assert_eq!(slice.preload_u64(65), Err(CellError::InvalidBitLength(65)));
    }

    #[test]
    fn u64_reader() {
        let (graph, id) = graph_with(|b| b.write_uint(u64::MAX, 64).unwrap());
        let mut slice = graph.parse(id).unwrap();
        assert_eq!(slice.load_u64(64).unwrap(), u64::MAX);
    }

    #[test]
    fn bytes_alignment() {
        let (graph, id) = graph_with(|b| {
            b.write_bytes(b"hi").unwrap();
            b.write_bit(true).unwrap();
        });
        let mut slice = graph.parse(id).unwrap();
        assert!(matches!(
            slice.load_bytes(Some(4)),
            Err(CellError::NotByteAligned(_))
        ));
        assert!(matches!(
            slice.load_bytes(None),
            Err(CellError::NotByteAligned(_))
        ));
        assert_eq!(slice.load_bytes(Some(16)).unwrap(), b"hi");
        assert!(slice.load_bit().unwrap());
    }

    #[test]
    fn bits_reader() {
        let (graph, id) = graph_with(|b| b.write_bit_array(&[true, true, false]).unwrap());
        let mut slice = graph.parse(id).unwrap();
        let bits = slice.load_bits(2).unwrap();
        assert_eq!(bits.used_bits(), 2);
        assert_eq!(bits.iter().collect::<Vec<_>>(), vec![true, true]);
        assert_eq!(slice.remaining_bits(), 1);
    }

    #[test]
    fn coins_round_trip() {
        let (graph, id) = graph_with(|b| {
            b.write_coins(0u8).unwrap();
            b.write_coins(1_000_000_000u64).unwrap();
        });
        let mut slice = graph.parse(id).unwrap();
        assert_eq!(slice.load_coins().unwrap(), BigUint::zero());
        assert_eq!(slice.load_coins().unwrap(), BigUint::from(1_000_000_000u64));
        assert!(slice.is_data_empty());
    }

    #[test]
    fn var_uint_round_trip() {
        let (graph, id) = graph_with(|b| {
            b.write_var_uint(0xABCDu32, 32).unwrap();
            b.write_var_uint(0u8, 8).unwrap();
        });
        let mut slice = graph.parse(id).unwrap();
        assert_eq!(slice.preload_var_uint(32).unwrap(), BigUint::from(0xABCDu32));
        assert_eq!(slice.remaining_bits(), 5 + 16 + 3);
        assert_eq!(slice.load_var_uint(32).unwrap(), BigUint::from(0xABCDu32));
        assert_eq!(slice.load_var_uint(8).unwrap(), BigUint::zero());
        assert!(slice.is_data_empty());
    }

    #[test]
    fn var_uint_failure_keeps_cursor() {
        // Length says three bytes, only one follows.
        let (graph, id) = graph_with(|b| {
            b.write_uint(3u8, 5).unwrap();
            b.write_uint(0xFFu8, 8).unwrap();
        });
        let mut slice = graph.parse(id).unwrap();
        assert!(matches!(
            slice.load_var_uint(32),
            Err(CellError::SliceExhausted { .. })
        ));
        assert_eq!(slice.remaining_bits(), 13);
        assert_eq!(slice.load_var_uint(1), Err(CellError::InvalidVarUintBound(1)));
        assert_eq!(slice.remaining_bits(), 13);
    }

    #[test]
    fn address_round_trip() {
        let addr = Address::new(-1, [0x5A; 32]);
        let (graph, id) = graph_with(|b| {
            b.write_address(Some(&addr)).unwrap();
            b.write_address(None).unwrap();
        });
        let mut slice = graph.parse(id).unwrap();
        assert_eq!(slice.preload_address().unwrap(), Some(addr));
        assert_eq!(slice.load_address().unwrap(), Some(addr));
        assert_eq!(slice.load_address().unwrap(), None);
    }

    #[test]
    fn unsupported_addresses() {
        let (graph, id) = graph_with(|b| b.write_uint(0b01u8, 2).unwrap());
        let slice = graph.parse(id).unwrap();
        assert_eq!(
            slice.preload_address(),
            Err(CellError::UnsupportedAddress("external"))
        );

        let (graph, id) = graph_with(|b| b.write_uint(0b11u8, 2).unwrap());
        assert!(graph.parse(id).unwrap().preload_address().is_err());

        let (graph, id) = graph_with(|b| {
            b.write_uint(0b101u8, 3).unwrap();
            b.write_bytes(&[0; 33]).unwrap();
        });
        assert_eq!(
            graph.parse(id).unwrap().preload_address(),
            Err(CellError::UnsupportedAddress("anycast"))
        );
    }

    #[test]
    fn string_reader() {
        let (graph, id) = graph_with(|b| b.write_string("héllo").unwrap());
        let mut slice = graph.parse(id).unwrap();
        assert_eq!(slice.load_string().unwrap(), "héllo");

        let (graph, id) = graph_with(|b| b.write_bytes(&[0xFF, 0xFE]).unwrap());
        assert_eq!(
            graph.parse(id).unwrap().preload_string(),
            Err(CellError::InvalidUtf8)
        );
    }

    #[test]
    fn refs_in_order() {
        let mut graph = CellGraph::new();
        let a = graph.new_cell();
        let b = graph.new_cell();
        let parent = graph.new_cell();
        graph.push_ref(parent, a).unwrap();
        graph.push_ref(parent, b).unwrap();

        let mut slice = graph.parse(parent).unwrap();
        assert_eq!(slice.preload_ref().unwrap(), a);
        assert_eq!(slice.load_ref().unwrap(), a);
        assert_eq!(slice.load_ref().unwrap(), b);
        assert!(slice.is_refs_empty());
        assert_eq!(slice.load_ref(), Err(CellError::RefsExhausted));
    }

    #[test]
    fn maybe_ref() {
        let mut graph = CellGraph::new();
        let child = graph.new_cell();
        let parent = graph.new_cell();
        graph.bits_mut(parent).unwrap().write_bit(false).unwrap();
        graph.bits_mut(parent).unwrap().write_bit(true).unwrap();
        graph.bits_mut(parent).unwrap().write_bit(true).unwrap();
        graph.push_ref(parent, child).unwrap();

        let mut slice = graph.parse(parent).unwrap();
        assert_eq!(slice.load_maybe_ref().unwrap(), None);
        assert_eq!(slice.preload_maybe_ref().unwrap(), Some(child));
        assert_eq!(slice.load_maybe_ref().unwrap(), Some(child));
        // Presence bit set but no reference left: nothing is consumed.
        assert_eq!(slice.load_maybe_ref(), Err(CellError::RefsExhausted));
        assert_eq!(slice.remaining_bits(), 1);
    }

    #[test]
    fn skip_bits() {
        let (graph, id) = graph_with(|b| b.write_uint(0b1001u8, 4).unwrap());
        let mut slice = graph.parse(id).unwrap();
        slice.skip_bits(3).unwrap();
        assert!(slice.load_bit().unwrap());
        assert!(slice.skip_bits(1).is_err());
    }

    fn snake_chain(chunks: &[&str]) -> (CellGraph, CellId) {
        let mut graph = CellGraph::new();
        let mut next: Option<CellId> = None;
        for chunk in chunks.iter().rev() {
            let id = graph.new_cell();
            graph.bits_mut(id).unwrap().write_string(chunk).unwrap();
            if let Some(child) = next {
                graph.push_ref(id, child).unwrap();
            }
            next = Some(id);
        }
        (graph, next.unwrap())
    }

    #[test]
    fn snake_data_follows_chain() {
        let (graph, head) = snake_chain(&["Hello, ", "snake ", "world"]);
        let mut slice = graph.parse(head).unwrap();
        assert_eq!(slice.load_snake_data_string().unwrap(), "Hello, snake world");
        assert!(slice.is_empty());
    }

    #[test]
    fn snake_data_after_prefix() {
        let mut graph = CellGraph::new();
        let tail = graph.new_cell();
        graph.bits_mut(tail).unwrap().write_bytes(b"def").unwrap();
        let head = graph.new_cell();
        let bits = graph.bits_mut(head).unwrap();
        bits.write_uint(0u8, 8).unwrap();
        bits.write_bytes(b"abc").unwrap();
        graph.push_ref(head, tail).unwrap();

        let mut slice = graph.parse(head).unwrap();
        slice.skip_bits(8).unwrap();
        assert_eq!(slice.load_snake_data().unwrap(), b"abcdef");
    }

    #[test]
    fn snake_data_rejects_forks() {
        let mut graph = CellGraph::new();
        let a = graph.new_cell();
        let b = graph.new_cell();
        let head = graph.new_cell();
        graph.push_ref(head, a).unwrap();
        graph.push_ref(head, b).unwrap();
        let mut slice = graph.parse(head).unwrap();
        assert!(matches!(
            slice.load_snake_data(),
            Err(CellError::SnakeData(_))
        ));
    }

    #[test]
    fn snake_data_rejects_unaligned_hop() {
        let mut graph = CellGraph::new();
        let tail = graph.new_cell();
        graph.bits_mut(tail).unwrap().write_bit(true).unwrap();
        let head = graph.new_cell();
        graph.push_ref(head, tail).unwrap();
        let mut slice = graph.parse(head).unwrap();
        assert!(matches!(
            slice.load_snake_data(),
            Err(CellError::NotByteAligned(_))
        ));
        assert_eq!(slice.remaining_refs(), 1);
    }

    #[test]
    fn snake_data_rejects_cycles() {
        let mut graph = CellGraph::new();
        let a = graph.new_cell();
        let b = graph.new_cell();
        graph.push_ref(a, b).unwrap();
        graph.push_ref(b, a).unwrap();
        let mut slice = graph.parse(a).unwrap();
        assert_eq!(slice.load_snake_data(), Err(CellError::CycleDetected(a)));
    }

    #[test]
    fn snake_data_string_failure_keeps_cursor() {
        let (graph, id) = graph_with(|b| b.write_bytes(&[0xFF, 0xFE]).unwrap());
        let mut slice = graph.parse(id).unwrap();
        assert_eq!(slice.load_snake_data_string(), Err(CellError::InvalidUtf8));
        assert_eq!(slice.remaining_bits(), 16);
        assert_eq!(slice.load_snake_data().unwrap(), vec![0xFF, 0xFE]);
    }

    #[test]
    fn snake_data_spans_multiple_full_cells() {
        let chunks: Vec<Vec<u8>> = (0..4u8)
            .map(|i| (0..127u8).map(|j| i.wrapping_mul(127).wrapping_add(j)).collect())
            .collect();
        let mut graph = CellGraph::new();
        let mut next: Option<CellId> = None;
        for chunk in chunks.iter().rev() {
            let id = graph.new_cell();
            graph.bits_mut(id).unwrap().write_bytes(chunk).unwrap();
            if let Some(child) = next {
                graph.push_ref(id, child).unwrap();
            }
            next = Some(id);
        }
        let head = next.unwrap();
        assert_eq!(graph.cell(head).unwrap().bits().used_bits(), 1016);

        let mut slice = graph.parse(head).unwrap();
        let data = slice.load_snake_data().unwrap();
        assert_eq!(data.len(), 4 * 127);
        assert!(data.len() * 8 > 1023);
        assert_eq!(data, chunks.concat());
        assert!(slice.is_empty());
    }

    #[test]
    fn snake_data_rejects_fork_mid_chain() {
        let mut graph = CellGraph::new();
        let left = graph.new_cell();
        let right = graph.new_cell();
        let mid = graph.new_cell();
        graph.bits_mut(mid).unwrap().write_string("mid").unwrap();
        graph.push_ref(mid, left).unwrap();
        graph.push_ref(mid, right).unwrap();
        let head = graph.new_cell();
        graph.bits_mut(head).unwrap().write_string("head").unwrap();
        graph.push_ref(head, mid).unwrap();

        let mut slice = graph.parse(head).unwrap();
        let err = slice.load_snake_data().unwrap_err();
        assert_eq!(
            err,
            CellError::SnakeData(format!("cell {mid} has more than one referenced cell"))
        );
        assert_eq!(slice.remaining_bits(), 32);
        assert_eq!(slice.remaining_refs(), 1);
    }
}
