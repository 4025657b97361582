//! Edge labels (`HmLabel ~n m`).
//!
//! ```text
//! hml_short$0  len:(Unary ~n) s:(n * Bit)
//! hml_long$10  n:(#<= m) s:(n * Bit)
//! hml_same$11  v:Bit n:(#<= m)
//! ```
//!
//! `#<= m` takes as many bits as `m` itself needs.

use cellkit_core::{BitString, CellError, CellSlice};

use crate::error::{DictError, Result};

/// Bits needed to store any value in `0..=max_len`.
fn length_bits(max_len: usize) -> usize {
    (usize::BITS - max_len.leading_zeros()) as usize
}

pub(crate) fn all_same(bits: &[bool]) -> bool {
    bits.windows(2).all(|w| w[0] == w[1])
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LabelKind {
    Short,
    Long,
    Same,
}

/// Cheapest encoding for `label` under a key with `max_len` bits left, with
/// its size in bits. Ties go to short, then long.
pub(crate) fn choose_label(label: &[bool], max_len: usize) -> (LabelKind, usize) {
    let len = label.len();
    let k = length_bits(max_len);

    let mut best = (LabelKind::Short, 2 + 2 * len);
    let long = 2 + k + len;
    if long < best.1 {
        best = (LabelKind::Long, long);
    }
    let same = 3 + k;
    if all_same(label) && same < best.1 {
        best = (LabelKind::Same, same);
    }
    best
}

fn write_length(bits: &mut BitString, len: usize, k: usize) -> Result<()> {
    if k > 0 {
        bits.write_uint(len as u64, k)?;
    }
    Ok(())
}

/// Write `label` using the cheapest of the three encodings.
pub(crate) fn write_label(bits: &mut BitString, label: &[bool], max_len: usize) -> Result<()> {
    if label.len() > max_len {
        return Err(DictError::LabelTooLong {
            len: label.len(),
            max: max_len,
        });
    }
    let k = length_bits(max_len);
    let (kind, size) = choose_label(label, max_len);
    let free = bits.free_bits();
    if size > free {
        return Err(CellError::BitOverflow {
            requested: size,
            free,
        }
        .into());
    }
    match kind {
        LabelKind::Short => {
            bits.write_bit(false)?;
            bits.write_bit_array(&vec![true; label.len()])?;
            bits.write_bit(false)?;
            bits.write_bit_array(label)?;
        }
        LabelKind::Long => {
            bits.write_bit_array(&[true, false])?;
            write_length(bits, label.len(), k)?;
            bits.write_bit_array(label)?;
        }
        LabelKind::Same => {
            bits.write_bit_array(&[true, true])?;
            bits.write_bit(label.first().copied().unwrap_or(false))?;
            write_length(bits, label.len(), k)?;
        }
    }
    Ok(())
}

fn read_length(slice: &mut CellSlice<'_>, k: usize, max_len: usize) -> Result<usize> {
    let len = if k > 0 { slice.load_u64(k)? as usize } else { 0 };
    if len > max_len {
        return Err(DictError::LabelTooLong { len, max: max_len });
    }
    Ok(len)
}

fn read_bits(slice: &mut CellSlice<'_>, len: usize) -> Result<Vec<bool>> {
    Ok(slice.load_bits(len)?.iter().collect())
}

/// Read a label under a key with `max_len` bits left.
pub(crate) fn read_label(slice: &mut CellSlice<'_>, max_len: usize) -> Result<Vec<bool>> {
    let k = length_bits(max_len);
    if !slice.load_bit()? {
        let mut len = 0;
        while slice.load_bit()? {
            len += 1;
            if len > max_len {
                return Err(DictError::LabelTooLong { len, max: max_len });
            }
        }
        return read_bits(slice, len);
    }
    if !slice.load_bit()? {
        let len = read_length(slice, k, max_len)?;
        return read_bits(slice, len);
    }
    let value = slice.load_bit()?;
    let len = read_length(slice, k, max_len)?;
    Ok(vec![value; len])
}
