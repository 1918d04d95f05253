//! Wire-level encode/decode errors.

use thiserror::Error;

/// Result type for wire operations.
pub type WireResult<T> = Result<T, DecodeError>;

/// Errors that can occur while encoding a packet header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// Output buffer is too small for the header.
    #[error("output buffer too small: needed {needed} bytes, available {available}")]
    BufferTooSmall {
        /// Bytes required.
        needed: usize,
        /// Bytes available.
        available: usize,
    },
}

/// Errors that can occur while decoding a packet.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Packet is smaller than the fixed header.
    #[error("packet too small: {actual} bytes, header requires {required}")]
    PacketTooSmall {
        /// Actual packet size.
        actual: usize,
        /// Required minimum size.
        required: usize,
    },

    /// Magic number mismatch.
    #[error("invalid magic number {found:#010x}")]
    InvalidMagic {
        /// The magic value found.
        found: u32,
    },

    /// Unsupported wire format version.
    #[error("unsupported wire version {found}")]
    UnsupportedVersion {
        /// The version found.
        found: u16,
    },

    /// Flag combination is invalid for this version.
    #[error("invalid packet flags {flags:#06x}")]
    InvalidFlags {
        /// The raw flag bits.
        flags: u16,
    },

    /// Ack tick field inconsistent with the HAS_ACK flag.
    #[error("ack tick {ack_tick} inconsistent with flags {flags:#06x}")]
    InvalidAckTick {
        /// The raw ack tick value.
        ack_tick: u32,
        /// The raw flag bits.
        flags: u16,
    },

    /// Header payload length disagrees with the actual packet size.
    #[error("payload length mismatch: header says {header_len}, actual {actual_len}")]
    PayloadLengthMismatch {
        /// Length claimed by the header.
        header_len: u32,
        /// Actual payload length.
        actual_len: usize,
    },

    /// Packet exceeds the configured byte limit.
    #[error("packet too large: {actual} bytes, limit {limit}")]
    PacketTooLarge {
        /// The configured limit.
        limit: usize,
        /// The offending packet size.
        actual: usize,
    },
}
