//! State encode/decode and descriptor construction errors.

use bitstream::BitError;
use thiserror::Error;

use crate::value::WireType;

/// Result type for state codec operations.
pub type StateResult<T> = Result<T, StateError>;

/// Errors that can occur while encoding or decoding state data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    /// Underlying bitstream failure.
    #[error(transparent)]
    Bits(#[from] BitError),

    /// A tagged value carried a tag outside the known range.
    #[error("unknown wire type tag {tag}")]
    UnknownWireTag {
        /// The raw tag byte.
        tag: u8,
    },

    /// A value's type disagrees with the member definition.
    #[error("member `{member}` expects {expected:?}, got {actual:?}")]
    TypeMismatch {
        /// Member name.
        member: &'static str,
        /// Declared wire type.
        expected: WireType,
        /// Wire type of the offending value.
        actual: WireType,
    },

    /// A decoded value list has the wrong length for its member group.
    #[error("value count mismatch: expected {expected}, got {actual}")]
    ValueCountMismatch {
        /// Expected value count.
        expected: usize,
        /// Actual value count.
        actual: usize,
    },
}

/// Errors raised by descriptor construction.
///
/// These indicate a misconfigured registration and surface at build time,
/// before any state crosses the wire.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DescriptorError {
    /// Two members share a name.
    #[error("duplicate member `{name}`")]
    DuplicateMember {
        /// The repeated name.
        name: &'static str,
    },

    /// A member's getter produced a value of a different type than declared.
    #[error("member `{member}` declared {declared:?} but getter returned {actual:?}")]
    GetterTypeMismatch {
        /// Member name.
        member: &'static str,
        /// Declared wire type.
        declared: WireType,
        /// Type the getter actually produced.
        actual: WireType,
    },

    /// More mutable members than the change mask can address.
    #[error("{count} mutable members exceeds the limit of {max}")]
    TooManyMutableMembers {
        /// Registered mutable member count.
        count: usize,
        /// Maximum supported.
        max: usize,
    },

    /// A descriptor with no members cannot replicate anything.
    #[error("descriptor has no members")]
    NoMembers,
}
