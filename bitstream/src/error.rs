//! Error types for bitstream operations.

use thiserror::Error;

/// Result type for bitstream operations.
pub type BitResult<T> = Result<T, BitError>;

/// Errors that can occur during bit-level encoding/decoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BitError {
    /// Attempted to read past the end of the buffer.
    #[error("attempted to read {requested} bits but only {available} bits available")]
    UnexpectedEof {
        /// Number of bits requested.
        requested: usize,
        /// Number of bits available.
        available: usize,
    },

    /// Invalid bit count for the operation.
    #[error("invalid bit count {bits}, maximum allowed is {max_bits}")]
    InvalidBitCount {
        /// The invalid bit count provided.
        bits: u8,
        /// Maximum allowed bits for this operation.
        max_bits: u8,
    },

    /// Value exceeds the range representable by the specified number of bits.
    #[error("value {value} cannot be represented in {bits} bits")]
    ValueOutOfRange {
        /// The value that was out of range.
        value: u64,
        /// Number of bits available.
        bits: u8,
    },

    /// Byte-aligned access attempted at a non-aligned bit position.
    #[error("byte-aligned access at bit position {bit_position}")]
    MisalignedAccess {
        /// The misaligned bit position.
        bit_position: usize,
    },

    /// A variable-length integer had an invalid continuation sequence.
    #[error("invalid varint encoding")]
    InvalidVarint,

    /// A length-prefixed string contained invalid UTF-8.
    #[error("invalid UTF-8 in string of {len} bytes")]
    InvalidUtf8 {
        /// Byte length of the offending string.
        len: usize,
    },

    /// A packed list declared more items than the caller allows.
    #[error("packed list declares {count} items, maximum allowed is {max_items}")]
    TooManyItems {
        /// Declared item count.
        count: usize,
        /// Maximum allowed items.
        max_items: usize,
    },
}
