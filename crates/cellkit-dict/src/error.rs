//! Dictionary error types.

use cellkit_core::CellError;

/// Errors that can occur while encoding or decoding a dictionary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DictError {
    /// Key width outside `1..=1023`.
    #[error("invalid dictionary key width {0}: must be in range 1..=1023")]
    InvalidKeyBits(usize),

    /// Key does not fit the dictionary's key width.
    #[error("key {key} can't be represented using {bits} bits")]
    KeyOutOfRange { key: String, bits: usize },

    /// Decoding found more leaves than the caller allows.
    #[error("dictionary has more than {max} elements")]
    TooManyElements { max: usize },

    /// Edge label claims more bits than the key has left.
    #[error("edge label of {len} bits exceeds the remaining key width {max}")]
    LabelTooLong { len: usize, max: usize },

    /// Underlying cell operation failed.
    #[error(transparent)]
    Cell(#[from] CellError),
}

/// Result type alias for dictionary operations.
pub type Result<T> = std::result::Result<T, DictError>;
