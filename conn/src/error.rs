//! Connection-level errors.
//!
//! Only encode-side failures surface as errors; malformed inbound packets
//! are protocol-level discards, logged and dropped by the connection loops.

use bitstream::BitError;
use state::StateError;
use thiserror::Error;
use wire::{DecodeError, EncodeError};

/// Result type for connection operations.
pub type ConnResult<T> = Result<T, ConnError>;

/// Errors raised while building or parsing packets.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnError {
    /// Underlying bitstream failure.
    #[error(transparent)]
    Bits(#[from] BitError),

    /// State codec failure.
    #[error(transparent)]
    State(#[from] StateError),

    /// Packet header encoding failure.
    #[error(transparent)]
    Encode(#[from] EncodeError),

    /// Packet decoding failure.
    #[error(transparent)]
    Decode(#[from] DecodeError),
}
