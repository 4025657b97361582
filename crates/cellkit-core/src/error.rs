//! Cell error types.

use crate::cell::CellId;

/// Errors that can occur while building, hashing or reading cells.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CellError {
    /// Write would exceed the bit string's fixed capacity.
    #[error("bit string overflow: can't allocate {requested} more bits, only {free} bits are available")]
    BitOverflow { requested: usize, free: usize },

    /// Integer bit length outside `(0, 256]`.
    #[error("invalid bit length {0}: must be in range (0, 256]")]
    InvalidBitLength(usize),

    /// `VarUInteger` byte bound outside `[2, 33]`.
    #[error("invalid VarUInteger bound {0}: must be in range [2, 33]")]
    InvalidVarUintBound(usize),

    /// Value does not fit into the requested number of bits.
    #[error("value {value} can't be represented using {bits} bits")]
    ValueOutOfRange { value: String, bits: usize },

    /// Cell would get more than four references.
    #[error("cell {cell} already has the maximum number of references ({max})")]
    TooManyRefs { cell: CellId, max: usize },

    /// Cell data longer than 1023 bits.
    #[error("cell data of {bits} bits exceeds {max} bits")]
    TooManyBits { bits: usize, max: usize },

    /// Handle does not belong to this graph.
    #[error("cell {0} not found in graph")]
    UnknownCell(CellId),

    /// Cell is reachable from itself.
    #[error("cycle detected involving cell {0}")]
    CycleDetected(CellId),

    /// Cell depth does not fit the two-byte representation.
    #[error("cell {0} depth exceeds {max}", max = u16::MAX)]
    DepthOverflow(CellId),

    /// Padded bytes declared a completion bit that isn't there.
    #[error("failed to find the completion bit in the last byte")]
    MissingCompletionBit,

    /// Read requiring byte alignment found a partial byte.
    #[error("{0} is not aligned to bytes")]
    NotByteAligned(String),

    /// Read past the end of the slice data.
    #[error("slice exhausted: requested {requested} bits, {remaining} remaining")]
    SliceExhausted { requested: usize, remaining: usize },

    /// No more references to load from the slice.
    #[error("no more referenced cells to load from slice")]
    RefsExhausted,

    /// Address tag that is valid on the wire but not supported here.
    #[error("parsing of {0} addresses is not supported")]
    UnsupportedAddress(&'static str),

    /// Textual address that isn't `workchain:hex`.
    #[error("invalid raw address: {0}")]
    InvalidAddress(String),

    /// Bytes are not valid UTF-8.
    #[error("invalid UTF-8 string data")]
    InvalidUtf8,

    /// Snake data chain is malformed.
    #[error("malformed snake data: {0}")]
    SnakeData(String),
}

/// Result type alias for cell operations.
pub type Result<T> = std::result::Result<T, CellError>;
