//! Fixed-capacity bit strings.
//!
//! A [`BitString`] is the data container behind every cell. Bits are stored
//! MSB-first inside each byte, the write cursor only moves forward, and every
//! writer validates capacity and value range before touching a single bit.

use std::fmt;

use num_bigint::{BigInt, BigUint};
use num_traits::{One, Signed, Zero};

use crate::address::{Address, AddressTag};
use crate::error::{CellError, Result};

/// Maximum number of bits a cell may hold.
pub const MAX_CELL_BITS: usize = 1023;

/// Upper bound for the bit length of a single integer field.
pub const MAX_INT_BITS: usize = 256;

/// `n` in the `VarUInteger n` used for coins.
const COINS_MAX_BYTES: usize = 16;

/// Read the bit at `offset` (MSB first) from a byte array.
pub(crate) fn read_bit(bytes: &[u8], offset: usize) -> bool {
    bytes[offset / 8] & (1 << (7 - offset % 8)) != 0
}

fn set_bit(bytes: &mut [u8], offset: usize) {
    bytes[offset / 8] |= 1 << (7 - offset % 8);
}

fn clear_bit(bytes: &mut [u8], offset: usize) {
    bytes[offset / 8] &= !(1 << (7 - offset % 8));
}

/// Width of the length prefix of `VarUInteger max_bytes` (`#< max_bytes`).
///
/// The bound must leave room for at least one byte and keep values within
/// 256 bits.
pub(crate) fn var_uint_length_bits(max_bytes: usize) -> Result<usize> {
    if !(2..=MAX_INT_BITS / 8 + 1).contains(&max_bytes) {
        return Err(CellError::InvalidVarUintBound(max_bytes));
    }
    Ok((usize::BITS - (max_bytes - 1).leading_zeros()) as usize)
}

/// Reject integer bit lengths outside `(0, 256]`.
pub(crate) fn check_int_bit_length(bit_length: usize) -> Result<()> {
    if bit_length == 0 || bit_length > MAX_INT_BITS {
        return Err(CellError::InvalidBitLength(bit_length));
    }
    Ok(())
}

/// Append-only array of bits with a capacity fixed at creation.
#[derive(Debug, Clone)]
pub struct BitString {
    bytes: Vec<u8>,
    used_bits: usize,
    capacity: usize,
}

impl BitString {
    /// Create an empty bit string able to hold `capacity` bits.
    pub fn new(capacity: usize) -> Self {
        Self {
            bytes: vec![0; capacity.div_ceil(8)],
            used_bits: 0,
            capacity,
        }
    }

    /// Parse bytes produced by [`BitString::top_upped_bytes`].
    ///
    /// With `has_completion` set, the trailing `1` and the zeros after it are
    /// stripped. The `1` has to sit within the last seven bits.
    pub fn from_top_upped(bytes: &[u8], has_completion: bool) -> Result<Self> {
        let capacity = bytes.len() * 8;
        let mut length = capacity;

        if has_completion && length > 0 {
            let mut found = false;
            for _ in 0..7 {
                let bit = read_bit(bytes, length - 1);
                length -= 1;
                if bit {
                    found = true;
                    break;
                }
            }
            if !found {
                return Err(CellError::MissingCompletionBit);
            }
        }

        let mut bits = Self {
            bytes: bytes.to_vec(),
            used_bits: length,
            capacity,
        };
        for offset in length..capacity {
            clear_bit(&mut bits.bytes, offset);
        }
        Ok(bits)
    }

    /// Move the content into a buffer of a different capacity.
    pub fn into_capacity(self, capacity: usize) -> Result<Self> {
        if self.used_bits > capacity {
            return Err(CellError::TooManyBits {
                bits: self.used_bits,
                max: capacity,
            });
        }
        let mut bytes = self.bytes;
        bytes.resize(capacity.div_ceil(8), 0);
        Ok(Self {
            bytes,
            used_bits: self.used_bits,
            capacity,
        })
    }

    /// Maximum number of bits this string can hold.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of bits written so far.
    pub fn used_bits(&self) -> usize {
        self.used_bits
    }

    /// Number of bytes touched by the written bits, rounded up.
    pub fn used_bytes(&self) -> usize {
        self.used_bits.div_ceil(8)
    }

    /// Number of bits that can still be written.
    pub fn free_bits(&self) -> usize {
        self.capacity - self.used_bits
    }

    pub fn is_empty(&self) -> bool {
        self.used_bits == 0
    }

    /// The bit at `offset`, if it has been written.
    pub fn bit(&self, offset: usize) -> Option<bool> {
        (offset < self.used_bits).then(|| read_bit(&self.bytes, offset))
    }

    /// Iterate over the written bits.
    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.used_bits).map(|offset| read_bit(&self.bytes, offset))
    }

    /// Written bytes without completion; a partial last byte is zero-padded.
    pub fn raw_bytes(&self) -> &[u8] {
        &self.bytes[..self.used_bytes()]
    }

    fn ensure_free(&self, requested: usize) -> Result<()> {
        let free = self.free_bits();
        if requested > free {
            return Err(CellError::BitOverflow { requested, free });
        }
        Ok(())
    }

    // Callers must have reserved the space with `ensure_free`.
    fn push_bit(&mut self, bit: bool) {
        if bit {
            set_bit(&mut self.bytes, self.used_bits);
        }
        self.used_bits += 1;
    }

    fn push_small(&mut self, value: u64, bit_length: usize) {
        for i in (0..bit_length).rev() {
            self.push_bit((value >> i) & 1 == 1);
        }
    }

    fn push_biguint(&mut self, value: &BigUint, bit_length: usize) {
        let le = value.to_bytes_le();
        for i in (0..bit_length).rev() {
            let byte = le.get(i / 8).copied().unwrap_or(0);
            self.push_bit((byte >> (i % 8)) & 1 == 1);
        }
    }

    /// Append a single bit.
    pub fn write_bit(&mut self, bit: bool) -> Result<()> {
        self.ensure_free(1)?;
        self.push_bit(bit);
        Ok(())
    }

    /// Append a sequence of bits.
    pub fn write_bit_array(&mut self, bits: &[bool]) -> Result<()> {
        self.ensure_free(bits.len())?;
        for &bit in bits {
            self.push_bit(bit);
        }
        Ok(())
    }

    /// Append an unsigned integer occupying exactly `bit_length` bits.
    pub fn write_uint(&mut self, value: impl Into<BigUint>, bit_length: usize) -> Result<()> {
        let value = value.into();
        check_int_bit_length(bit_length)?;
        if value.bits() > bit_length as u64 {
            return Err(CellError::ValueOutOfRange {
                value: value.to_string(),
                bits: bit_length,
            });
        }
        self.ensure_free(bit_length)?;
        self.push_biguint(&value, bit_length);
        Ok(())
    }

    /// Append a two's-complement signed integer occupying `bit_length` bits.
    pub fn write_int(&mut self, value: impl Into<BigInt>, bit_length: usize) -> Result<()> {
        let value = value.into();
        check_int_bit_length(bit_length)?;
        let half = BigInt::one() << (bit_length - 1);
        if value >= half || value < -&half {
            return Err(CellError::ValueOutOfRange {
                value: value.to_string(),
                bits: bit_length,
            });
        }
        self.ensure_free(bit_length)?;
        let twos = if value.is_negative() {
            (BigInt::one() << bit_length) + value
        } else {
            value
        };
        let (_, magnitude) = twos.into_parts();
        self.push_biguint(&magnitude, bit_length);
        Ok(())
    }

    /// Append bytes, eight bits each, MSB first.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.ensure_free(bytes.len() * 8)?;
        for &byte in bytes {
            self.push_small(u64::from(byte), 8);
        }
        Ok(())
    }

    /// Append the UTF-8 encoding of `text`.
    pub fn write_string(&mut self, text: &str) -> Result<()> {
        self.write_bytes(text.as_bytes())
    }

    /// Append a token amount as `VarUInteger 16`: a 4-bit byte length followed
    /// by that many bytes of value.
    pub fn write_coins(&mut self, coins: impl Into<BigUint>) -> Result<()> {
        self.write_var_uint(coins, COINS_MAX_BYTES)
    }

    /// Append a `VarUInteger max_bytes`: the value's byte length in
    /// `ceil(log2 max_bytes)` bits, then the value in that many bytes.
    pub fn write_var_uint(&mut self, value: impl Into<BigUint>, max_bytes: usize) -> Result<()> {
        let value = value.into();
        let length_bits = var_uint_length_bits(max_bytes)?;
        let byte_length = value.bits().div_ceil(8) as usize;
        if byte_length >= max_bytes {
            return Err(CellError::ValueOutOfRange {
                value: value.to_string(),
                bits: (max_bytes - 1) * 8,
            });
        }
        self.ensure_free(length_bits + byte_length * 8)?;
        self.push_small(byte_length as u64, length_bits);
        self.push_biguint(&value, byte_length * 8);
        Ok(())
    }

    /// Alias of [`BitString::write_coins`].
    pub fn write_grams(&mut self, nanograms: impl Into<BigUint>) -> Result<()> {
        self.write_coins(nanograms)
    }

    /// Append `addr_none$00` or `addr_std$10` without anycast.
    pub fn write_address(&mut self, address: Option<&Address>) -> Result<()> {
        match address {
            None => {
                self.ensure_free(2)?;
                self.push_small(AddressTag::None as u64, 2);
            }
            Some(address) => {
                self.ensure_free(Address::STD_BITS)?;
                self.push_small(AddressTag::InternalStandard as u64, 2);
                // anycast:(Maybe Anycast)
                self.push_bit(false);
                self.push_small(u64::from(address.workchain as u8), 8);
                for &byte in &address.hash {
                    self.push_small(u64::from(byte), 8);
                }
            }
        }
        Ok(())
    }

    /// Append all written bits of another bit string.
    pub fn write_bit_string(&mut self, other: &BitString) -> Result<()> {
        self.ensure_free(other.used_bits)?;
        for bit in other.iter() {
            self.push_bit(bit);
        }
        Ok(())
    }

    /// Serialize to bytes, appending a `1` and then zeros up to the next byte
    /// boundary when the length is not a multiple of eight.
    pub fn top_upped_bytes(&self) -> Vec<u8> {
        let mut bytes = self.raw_bytes().to_vec();
        if self.used_bits % 8 != 0 {
            set_bit(&mut bytes, self.used_bits);
        }
        bytes
    }

    /// Fift-style hex dump with nibble-resolution completion.
    ///
    /// `_` marks that the last hex digit carries a completion bit.
    pub fn to_hex(&self) -> String {
        let mut hex = hex::encode_upper(self.top_upped_bytes());
        let rem = self.used_bits % 8;
        if rem != 0 && rem <= 4 {
            hex.pop();
        }
        if self.used_bits % 4 != 0 {
            hex.push('_');
        }
        hex
    }
}

impl Default for BitString {
    fn default() -> Self {
        Self::new(MAX_CELL_BITS)
    }
}

impl PartialEq for BitString {
    fn eq(&self, other: &Self) -> bool {
        self.used_bits == other.used_bits && self.raw_bytes() == other.raw_bytes()
    }
}

impl Eq for BitString {}

impl fmt::Display for BitString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Convert a `BigUint` below `2^bit_length` into a big-endian bit vector.
pub fn biguint_to_bits(value: &BigUint, bit_length: usize) -> Option<Vec<bool>> {
    if value.bits() > bit_length as u64 {
        return None;
    }
    if value.is_zero() {
        return Some(vec![false; bit_length]);
    }
    let le = value.to_bytes_le();
    Some(
        (0..bit_length)
            .rev()
            .map(|i| {
                let byte = le.get(i / 8).copied().unwrap_or(0);
                (byte >> (i % 8)) & 1 == 1
            })
            .collect(),
    )
}

/// Interpret big-endian bits as an unsigned integer.
pub fn bits_to_biguint(bits: &[bool]) -> BigUint {
    bits.iter().fold(BigUint::zero(), |acc, &bit| {
        let shifted = acc << 1u8;
        if bit {
            shifted + 1u8
        } else {
            shifted
        }
    })
}
