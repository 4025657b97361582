//! Content-addressed hashing for cells.
//!
//! A cell's hash is the SHA-256 digest of its standard representation, so two
//! cells holding the same bits and the same children always share a hash no
//! matter which graph they live in.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use sha2::{Digest, Sha256};

/// A 32-byte SHA-256 cell hash.
pub type CellHash = [u8; 32];

/// Compute the SHA-256 digest of a byte string.
pub fn sha256(data: &[u8]) -> CellHash {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Format a cell hash as a lowercase hex string.
pub fn hash_hex(hash: &CellHash) -> String {
    hex::encode(hash)
}

/// Format a cell hash as standard base64.
pub fn hash_base64(hash: &CellHash) -> String {
    STANDARD.encode(hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_hash() {
        assert_eq!(sha256(b"hello world"), sha256(b"hello world"));
    }

    #[test]
    fn different_inputs_different_hash() {
        assert_ne!(sha256(b"hello"), sha256(b"world"));
    }

    #[test]
    fn empty_input_known_digest() {
        assert_eq!(
            hash_hex(&sha256(b"")),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn base64_format() {
        let h = sha256(b"abc");
        let encoded = hash_base64(&h);
        assert_eq!(encoded.len(), 44);
        assert!(encoded.ends_with('='));
    }
}
