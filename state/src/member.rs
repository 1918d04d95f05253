//! Member definitions binding state struct fields to wire values.
//!
//! A [`MemberDef`] is a name, a category, a wire type, and a getter/setter
//! pair of plain function pointers. Descriptors hold a table of these;
//! everything the codec does with a state value flows through one.

use bitstream::{BitReader, BitResult, BitWriter};

use crate::value::{WireType, WireValue};

/// Replication category of a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberCategory {
    /// Changes over an entity's lifetime; delta-compressed per tick.
    Mutable,
    /// Fixed at creation; sent only with an entity's first delta.
    Immutable,
    /// Sent only to the peer that controls the entity.
    Controller,
}

/// One replicated member of a state struct.
pub struct MemberDef<S> {
    /// Member name, unique within a descriptor.
    pub name: &'static str,
    /// Replication category.
    pub category: MemberCategory,
    /// Declared wire type; getter output must match.
    pub wire_type: WireType,
    /// Reads the member's current value.
    pub get: fn(&S) -> WireValue,
    /// Writes a value into the member.
    pub set: fn(&mut S, WireValue),
}

// Manual impls: derives would demand `S: Clone` / `S: Copy`, but a table of
// function pointers is copyable regardless of the state type.
impl<S> Clone for MemberDef<S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S> Copy for MemberDef<S> {}

impl<S> std::fmt::Debug for MemberDef<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemberDef")
            .field("name", &self.name)
            .field("category", &self.category)
            .field("wire_type", &self.wire_type)
            .finish_non_exhaustive()
    }
}

impl<S> MemberDef<S> {
    /// Encodes this member's current value from `state`.
    pub fn write_to(&self, state: &S, writer: &mut BitWriter) -> BitResult<()> {
        (self.get)(state).encode(writer)
    }

    /// Decodes a value of this member's type and stores it into `state`.
    pub fn read_into(&self, state: &mut S, reader: &mut BitReader<'_>) -> BitResult<()> {
        let value = WireValue::decode(reader, self.wire_type)?;
        (self.set)(state, value);
        Ok(())
    }

    /// Copies this member's value from `src` into `dst`.
    pub fn apply_from(&self, dst: &mut S, src: &S) {
        (self.set)(dst, (self.get)(src));
    }

    /// Whether this member holds the same value in both states.
    #[must_use]
    pub fn equals(&self, a: &S, b: &S) -> bool {
        (self.get)(a) == (self.get)(b)
    }
}
