//! State descriptors, wire values, and delta production for tickrep.
//!
//! This crate turns an application state struct into something the protocol
//! can replicate. The application registers each replicated member with a
//! [`DescriptorBuilder`]; the resulting [`StateDescriptor`] drives delta
//! computation against a basis, byte-exact encoding, and application on the
//! receiving side.
//!
//! Values travel as [`WireValue`], a closed tagged union, so member access
//! never involves reflection or unsafe casts. Two ends of a connection prove
//! they registered the same layout by comparing descriptor hashes in the
//! packet header.

mod delta;
mod descriptor;
mod error;
mod member;
mod value;

pub use delta::{DeltaScope, StateDelta};
pub use descriptor::{ChangeMask, DescriptorBuilder, StateDescriptor, MAX_MUTABLE_MEMBERS};
pub use error::{DescriptorError, StateError, StateResult};
pub use member::{MemberCategory, MemberDef};
pub use value::{WireType, WireValue};
