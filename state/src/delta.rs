//! Delta production, encoding, and application.
//!
//! A [`StateDelta`] is one entity's update for one tick: a change mask over
//! the mutable members plus the values those bits name. The first delta a
//! client sees for an entity is an *initial* delta and additionally carries
//! the immutable members; deltas addressed to the entity's controlling peer
//! also carry the controller members.
//!
//! Wire form, in order: entity id (varu32), tick (varu32), two scope bits
//! (initial, controller), one presence bit per mutable member, then the
//! present mutable values, then immutables if initial, then controller
//! values if addressed to the controller.

use bitstream::{BitReader, BitWriter};
use packed::Poolable;
use wire::{EntityId, Tick};

use crate::descriptor::{ChangeMask, StateDescriptor};
use crate::error::{StateError, StateResult};
use crate::member::MemberDef;
use crate::value::WireValue;

/// Which optional member groups a delta carries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeltaScope {
    /// First delta for this entity; immutable members included.
    pub initial: bool,
    /// Addressed to the controlling peer; controller members included.
    pub controller: bool,
}

/// One entity's replicated update for one tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateDelta {
    /// The entity this delta describes.
    pub entity: EntityId,
    /// The host tick the values were sampled at.
    pub tick: Tick,
    /// Optional group flags.
    pub scope: DeltaScope,
    /// Which mutable members are present.
    pub mask: ChangeMask,
    /// Present mutable values, in ascending member-index order.
    pub mutables: Vec<WireValue>,
    /// All immutable values; populated only when `scope.initial`.
    pub immutables: Vec<WireValue>,
    /// All controller values; populated only when `scope.controller`.
    pub controllers: Vec<WireValue>,
}

impl StateDelta {
    /// Whether the delta carries nothing worth sending.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.mask.is_empty() && !self.scope.initial && !self.scope.controller
    }
}

impl Poolable for StateDelta {
    fn reset(&mut self) {
        self.entity = EntityId::new(0);
        self.tick = Tick::START;
        self.scope = DeltaScope::default();
        self.mask = ChangeMask::empty();
        self.mutables.clear();
        self.immutables.clear();
        self.controllers.clear();
    }
}

impl<S> StateDescriptor<S> {
    /// Fills `delta` with the update that brings `basis` to `current`.
    ///
    /// With no basis the delta is a full initial snapshot: every mutable
    /// member is present and the immutable group is included. `controller`
    /// selects whether the controller group is sampled.
    pub fn produce_delta_into(
        &self,
        delta: &mut StateDelta,
        entity: EntityId,
        tick: Tick,
        basis: Option<&S>,
        current: &S,
        controller: bool,
    ) {
        delta.reset();
        delta.entity = entity;
        delta.tick = tick;
        delta.scope = DeltaScope {
            initial: basis.is_none(),
            controller,
        };
        delta.mask = basis.map_or_else(|| self.full_mask(), |b| self.compute_delta(b, current));

        for (index, member) in self.mutable_members().iter().enumerate() {
            if delta.mask.contains(index) {
                delta.mutables.push((member.get)(current));
            }
        }
        if delta.scope.initial {
            for member in self.immutable_members() {
                delta.immutables.push((member.get)(current));
            }
        }
        if delta.scope.controller {
            for member in self.controller_members() {
                delta.controllers.push((member.get)(current));
            }
        }
    }

    /// Encodes `delta` into `writer`.
    pub fn encode_delta(&self, delta: &StateDelta, writer: &mut BitWriter) -> StateResult<()> {
        check_count(delta.mask.count() as usize, delta.mutables.len())?;
        if delta.scope.initial {
            check_count(self.immutable_members().len(), delta.immutables.len())?;
        }
        if delta.scope.controller {
            check_count(self.controller_members().len(), delta.controllers.len())?;
        }

        writer.align_to_byte();
        writer.write_varu32(delta.entity.raw())?;
        writer.write_varu32(delta.tick.raw())?;
        writer.write_bit(delta.scope.initial);
        writer.write_bit(delta.scope.controller);
        for index in 0..self.mutable_members().len() {
            writer.write_bit(delta.mask.contains(index));
        }

        let mut values = delta.mutables.iter();
        for (index, member) in self.mutable_members().iter().enumerate() {
            if delta.mask.contains(index) {
                let value = values.next().ok_or(StateError::ValueCountMismatch {
                    expected: delta.mask.count() as usize,
                    actual: delta.mutables.len(),
                })?;
                encode_member_value(member, value, writer)?;
            }
        }
        if delta.scope.initial {
            for (member, value) in self.immutable_members().iter().zip(&delta.immutables) {
                encode_member_value(member, value, writer)?;
            }
        }
        if delta.scope.controller {
            for (member, value) in self.controller_members().iter().zip(&delta.controllers) {
                encode_member_value(member, value, writer)?;
            }
        }
        Ok(())
    }

    /// Decodes one delta from `reader` into a recycled `delta`.
    pub fn decode_delta_into(
        &self,
        delta: &mut StateDelta,
        reader: &mut BitReader<'_>,
    ) -> StateResult<()> {
        delta.reset();
        reader.align_to_byte()?;
        delta.entity = EntityId::new(reader.read_varu32()?);
        delta.tick = Tick::new(reader.read_varu32()?);
        delta.scope = DeltaScope {
            initial: reader.read_bit()?,
            controller: reader.read_bit()?,
        };
        let mut mask = ChangeMask::empty();
        for index in 0..self.mutable_members().len() {
            if reader.read_bit()? {
                mask.set(index);
            }
        }
        delta.mask = mask;

        for (index, member) in self.mutable_members().iter().enumerate() {
            if mask.contains(index) {
                delta
                    .mutables
                    .push(WireValue::decode(reader, member.wire_type)?);
            }
        }
        if delta.scope.initial {
            for member in self.immutable_members() {
                delta
                    .immutables
                    .push(WireValue::decode(reader, member.wire_type)?);
            }
        }
        if delta.scope.controller {
            for member in self.controller_members() {
                delta
                    .controllers
                    .push(WireValue::decode(reader, member.wire_type)?);
            }
        }
        Ok(())
    }

    /// Applies `delta` onto `state`, overwriting the members it carries.
    pub fn apply_delta(&self, delta: &StateDelta, state: &mut S) -> StateResult<()> {
        check_count(delta.mask.count() as usize, delta.mutables.len())?;

        let mut values = delta.mutables.iter();
        for (index, member) in self.mutable_members().iter().enumerate() {
            if delta.mask.contains(index) {
                let value = values.next().ok_or(StateError::ValueCountMismatch {
                    expected: delta.mask.count() as usize,
                    actual: delta.mutables.len(),
                })?;
                apply_member_value(member, value, state)?;
            }
        }
        if delta.scope.initial {
            check_count(self.immutable_members().len(), delta.immutables.len())?;
            for (member, value) in self.immutable_members().iter().zip(&delta.immutables) {
                apply_member_value(member, value, state)?;
            }
        }
        if delta.scope.controller {
            check_count(self.controller_members().len(), delta.controllers.len())?;
            for (member, value) in self.controller_members().iter().zip(&delta.controllers) {
                apply_member_value(member, value, state)?;
            }
        }
        Ok(())
    }
}

fn encode_member_value<S>(
    member: &MemberDef<S>,
    value: &WireValue,
    writer: &mut BitWriter,
) -> StateResult<()> {
    if value.wire_type() != member.wire_type {
        return Err(StateError::TypeMismatch {
            member: member.name,
            expected: member.wire_type,
            actual: value.wire_type(),
        });
    }
    Ok(value.encode(writer)?)
}

fn apply_member_value<S>(
    member: &MemberDef<S>,
    value: &WireValue,
    state: &mut S,
) -> StateResult<()> {
    if value.wire_type() != member.wire_type {
        return Err(StateError::TypeMismatch {
            member: member.name,
            expected: member.wire_type,
            actual: value.wire_type(),
        });
    }
    (member.set)(state, value.clone());
    Ok(())
}

const fn check_count(expected: usize, actual: usize) -> Result<(), StateError> {
    if expected == actual {
        Ok(())
    } else {
        Err(StateError::ValueCountMismatch { expected, actual })
    }
}
