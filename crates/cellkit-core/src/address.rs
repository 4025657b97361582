//! Standard internal addresses (`addr_std`).
//!
//! Only the raw `workchain:hex` presentation is handled here. The wire tags
//! are shared with the bit string writer and the slice reader.

use std::fmt;
use std::str::FromStr;

use crate::error::CellError;

/// Two-bit `MsgAddress` constructor tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressTag {
    /// `addr_none$00`
    None = 0,
    /// `addr_extern$01`
    External = 1,
    /// `addr_std$10`
    InternalStandard = 2,
    /// `addr_var$11`
    InternalVariable = 3,
}

impl AddressTag {
    pub fn from_bits(value: u64) -> Self {
        match value & 0b11 {
            0 => AddressTag::None,
            1 => AddressTag::External,
            2 => AddressTag::InternalStandard,
            _ => AddressTag::InternalVariable,
        }
    }
}

/// A standard internal address: signed 8-bit workchain plus 256-bit account hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address {
    pub workchain: i8,
    pub hash: [u8; 32],
}

impl Address {
    /// Number of bits `addr_std` occupies without anycast: 2 + 1 + 8 + 256.
    pub const STD_BITS: usize = 267;

    pub fn new(workchain: i8, hash: [u8; 32]) -> Self {
        Self { workchain, hash }
    }

    /// Raw `workchain:hex` form.
    pub fn to_raw(&self) -> String {
        format!("{}:{}", self.workchain, hex::encode(self.hash))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_raw())
    }
}

impl FromStr for Address {
    type Err = CellError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (wc, hash_hex) = s
            .split_once(':')
            .ok_or_else(|| CellError::InvalidAddress(s.to_string()))?;
        let workchain: i8 = wc
            .trim()
            .parse()
            .map_err(|_| CellError::InvalidAddress(s.to_string()))?;
        let bytes = hex::decode(hash_hex.trim())
            .map_err(|_| CellError::InvalidAddress(s.to_string()))?;
        let hash: [u8; 32] = bytes
            .try_into()
            .map_err(|_| CellError::InvalidAddress(s.to_string()))?;
        Ok(Address { workchain, hash })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RAW: &str = "-1:3333333333333333333333333333333333333333333333333333333333333333";

    #[test]
    fn parse_and_display_raw() {
        let addr: Address = RAW.parse().unwrap();
        assert_eq!(addr.workchain, -1);
        assert_eq!(addr.hash, [0x33; 32]);
        assert_eq!(addr.to_string(), RAW);
    }

    #[test]
    fn reject_missing_separator() {
        assert!(matches!(
            "0".parse::<Address>(),
            Err(CellError::InvalidAddress(_))
        ));
    }

    #[test]
    fn reject_short_hash() {
        assert!("0:abcd".parse::<Address>().is_err());
    }

    #[test]
    fn reject_workchain_out_of_range() {
        let s = format!("300:{}", "00".repeat(32));
        assert!(s.parse::<Address>().is_err());
    }

    #[test]
    fn tag_from_bits() {
        assert_eq!(AddressTag::from_bits(0), AddressTag::None);
        assert_eq!(AddressTag::from_bits(1), AddressTag::External);
        assert_eq!(AddressTag::from_bits(2), AddressTag::InternalStandard);
        assert_eq!(AddressTag::from_bits(3), AddressTag::InternalVariable);
    }
}
