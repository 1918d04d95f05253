//! State descriptors and change masks.
//!
//! A [`StateDescriptor`] is the shared contract between host and client: the
//! ordered member table of one replicated state type, its captured initial
//! values, and a deterministic layout hash. Both sides must build it from the
//! same registrations or the hash check at the wire layer rejects their
//! packets.

use blake3::Hasher;

use crate::error::DescriptorError;
use crate::member::{MemberCategory, MemberDef};
use crate::value::{WireType, WireValue};

/// Most mutable members a single descriptor can address.
pub const MAX_MUTABLE_MEMBERS: usize = 64;

/// A bitset naming which mutable members a delta carries.
///
/// Bit `i` corresponds to the `i`-th registered mutable member.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChangeMask(u64);

impl ChangeMask {
    /// A mask with no bits set.
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// A mask with the low `count` bits set.
    ///
    /// # Panics
    ///
    /// Panics if `count` exceeds [`MAX_MUTABLE_MEMBERS`].
    #[must_use]
    pub fn full(count: usize) -> Self {
        assert!(count <= MAX_MUTABLE_MEMBERS);
        if count == MAX_MUTABLE_MEMBERS {
            Self(u64::MAX)
        } else {
            Self((1u64 << count) - 1)
        }
    }

    /// Reconstructs a mask from its raw bits.
    #[must_use]
    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    /// The raw bits.
    #[must_use]
    pub const fn bits(self) -> u64 {
        self.0
    }

    /// Marks member `index` as changed.
    pub fn set(&mut self, index: usize) {
        debug_assert!(index < MAX_MUTABLE_MEMBERS);
        self.0 |= 1 << index;
    }

    /// Whether member `index` is marked.
    #[must_use]
    pub const fn contains(self, index: usize) -> bool {
        self.0 & (1 << index) != 0
    }

    /// Whether no member is marked.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Number of marked members.
    #[must_use]
    pub const fn count(self) -> u32 {
        self.0.count_ones()
    }
}

/// The validated member table for one replicated state type.
#[derive(Debug, Clone)]
pub struct StateDescriptor<S> {
    mutable: Vec<MemberDef<S>>,
    immutable: Vec<MemberDef<S>>,
    controller: Vec<MemberDef<S>>,
    /// Initial values in group order: mutable, immutable, controller.
    initial: Vec<WireValue>,
    layout_hash: u64,
}

impl<S> StateDescriptor<S> {
    /// Starts a registration.
    #[must_use]
    pub const fn builder() -> DescriptorBuilder<S> {
        DescriptorBuilder {
            members: Vec::new(),
        }
    }

    /// Mutable members in registration order.
    #[must_use]
    pub fn mutable_members(&self) -> &[MemberDef<S>] {
        &self.mutable
    }

    /// Immutable members in registration order.
    #[must_use]
    pub fn immutable_members(&self) -> &[MemberDef<S>] {
        &self.immutable
    }

    /// Controller members in registration order.
    #[must_use]
    pub fn controller_members(&self) -> &[MemberDef<S>] {
        &self.controller
    }

    /// Deterministic hash of the member layout.
    ///
    /// Two descriptors hash equal iff they registered the same names, types,
    /// and categories in the same order, so the hash doubles as a wire
    /// compatibility check.
    #[must_use]
    pub const fn layout_hash(&self) -> u64 {
        self.layout_hash
    }

    /// Mask of mutable members whose values differ between the two states.
    #[must_use]
    pub fn compute_delta(&self, basis: &S, current: &S) -> ChangeMask {
        let mut mask = ChangeMask::empty();
        for (index, member) in self.mutable.iter().enumerate() {
            if !member.equals(basis, current) {
                mask.set(index);
            }
        }
        mask
    }

    /// Mask naming every mutable member.
    #[must_use]
    pub fn full_mask(&self) -> ChangeMask {
        ChangeMask::full(self.mutable.len())
    }

    /// Whether every member, across all categories, compares equal.
    #[must_use]
    pub fn states_equal(&self, a: &S, b: &S) -> bool {
        self.members().all(|member| member.equals(a, b))
    }

    /// Restores every member of `state` to its registered initial value.
    pub fn reset(&self, state: &mut S) {
        for (member, value) in self.members().zip(self.initial.iter()) {
            (member.set)(state, value.clone());
        }
    }

    fn members(&self) -> impl Iterator<Item = &MemberDef<S>> {
        self.mutable
            .iter()
            .chain(self.immutable.iter())
            .chain(self.controller.iter())
    }
}

/// Accumulates member registrations for a [`StateDescriptor`].
///
/// Validation happens in [`DescriptorBuilder::build`], against a prototype
/// state, so a misregistered getter fails at startup rather than on the
/// first packet.
#[derive(Debug)]
pub struct DescriptorBuilder<S> {
    members: Vec<MemberDef<S>>,
}

impl<S> DescriptorBuilder<S> {
    /// Registers a mutable member.
    #[must_use]
    pub fn mutable(
        self,
        name: &'static str,
        wire_type: WireType,
        get: fn(&S) -> WireValue,
        set: fn(&mut S, WireValue),
    ) -> Self {
        self.member(MemberDef {
            name,
            category: MemberCategory::Mutable,
            wire_type,
            get,
            set,
        })
    }

    /// Registers an immutable member.
    #[must_use]
    pub fn immutable(
        self,
        name: &'static str,
        wire_type: WireType,
        get: fn(&S) -> WireValue,
        set: fn(&mut S, WireValue),
    ) -> Self {
        self.member(MemberDef {
            name,
            category: MemberCategory::Immutable,
            wire_type,
            get,
            set,
        })
    }

    /// Registers a controller-only member.
    #[must_use]
    pub fn controller(
        self,
        name: &'static str,
        wire_type: WireType,
        get: fn(&S) -> WireValue,
        set: fn(&mut S, WireValue),
    ) -> Self {
        self.member(MemberDef {
            name,
            category: MemberCategory::Controller,
            wire_type,
            get,
            set,
        })
    }

    /// Registers a fully spelled-out member definition.
    #[must_use]
    pub fn member(mut self, def: MemberDef<S>) -> Self {
        self.members.push(def);
        self
    }

    /// Validates the registrations against `prototype` and builds the
    /// descriptor.
    ///
    /// The prototype supplies each member's initial value and proves that
    /// every getter produces its declared wire type.
    pub fn build(self, prototype: &S) -> Result<StateDescriptor<S>, DescriptorError> {
        if self.members.is_empty() {
            return Err(DescriptorError::NoMembers);
        }

        for (index, member) in self.members.iter().enumerate() {
            if self.members[..index].iter().any(|m| m.name == member.name) {
                return Err(DescriptorError::DuplicateMember { name: member.name });
            }
            let actual = (member.get)(prototype).wire_type();
            if actual != member.wire_type {
                return Err(DescriptorError::GetterTypeMismatch {
                    member: member.name,
                    declared: member.wire_type,
                    actual,
                });
            }
        }

        let mut mutable = Vec::new();
        let mut immutable = Vec::new();
        let mut controller = Vec::new();
        for member in self.members {
            match member.category {
                MemberCategory::Mutable => mutable.push(member),
                MemberCategory::Immutable => immutable.push(member),
                MemberCategory::Controller => controller.push(member),
            }
        }

        if mutable.len() > MAX_MUTABLE_MEMBERS {
            return Err(DescriptorError::TooManyMutableMembers {
                count: mutable.len(),
                max: MAX_MUTABLE_MEMBERS,
            });
        }

        let initial = mutable
            .iter()
            .chain(immutable.iter())
            .chain(controller.iter())
            .map(|member| (member.get)(prototype))
            .collect();
        let layout_hash = layout_hash(&mutable, &immutable, &controller);

        Ok(StateDescriptor {
            mutable,
            immutable,
            controller,
            initial,
            layout_hash,
        })
    }
}

fn layout_hash<S>(
    mutable: &[MemberDef<S>],
    immutable: &[MemberDef<S>],
    controller: &[MemberDef<S>],
) -> u64 {
    let mut hasher = Hasher::new();
    for group in [mutable, immutable, controller] {
        write_u32(&mut hasher, group.len() as u32);
        for member in group {
            write_u32(&mut hasher, member.name.len() as u32);
            hasher.update(member.name.as_bytes());
            write_u8(&mut hasher, category_tag(member.category));
            write_u8(&mut hasher, member.wire_type.tag());
        }
    }
    let hash = hasher.finalize();
    let bytes = hash.as_bytes();
    u64::from_le_bytes(bytes[0..8].try_into().unwrap())
}

const fn category_tag(category: MemberCategory) -> u8 {
    match category {
        MemberCategory::Mutable => 0,
        MemberCategory::Immutable => 1,
        MemberCategory::Controller => 2,
    }
}

fn write_u8(hasher: &mut Hasher, value: u8) {
    hasher.update(&[value]);
}

fn write_u32(hasher: &mut Hasher, value: u32) {
    hasher.update(&value.to_le_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Turret {
        heat: u32,
        angle: i32,
        online: bool,
        label: String,
    }

    fn turret_descriptor() -> StateDescriptor<Turret> {
        StateDescriptor::builder()
            .mutable(
                "heat",
                WireType::UInt,
                |s: &Turret| WireValue::UInt(s.heat),
                |s, v| {
                    if let WireValue::UInt(value) = v {
                        s.heat = value;
                    }
                },
            )
            .mutable(
                "angle",
                WireType::Int,
                |s| WireValue::Int(s.angle),
                |s, v| {
                    if let WireValue::Int(value) = v {
                        s.angle = value;
                    }
                },
            )
            .mutable(
                "online",
                WireType::Bool,
                |s| WireValue::Bool(s.online),
                |s, v| {
                    if let WireValue::Bool(value) = v {
                        s.online = value;
                    }
                },
            )
            .immutable(
                "label",
                WireType::Str,
                |s| WireValue::Str(s.label.clone()),
                |s, v| {
                    if let WireValue::Str(value) = v {
                        s.label = value;
                    }
                },
            )
            .build(&Turret::default())
            .unwrap()
    }

    #[test]
    fn change_mask_full_boundaries() {
        assert_eq!(ChangeMask::full(0), ChangeMask::empty());
        assert_eq!(ChangeMask::full(3).bits(), 0b111);
        assert_eq!(ChangeMask::full(MAX_MUTABLE_MEMBERS).bits(), u64::MAX);
    }

    #[test]
    fn compute_delta_marks_only_differing_members() {
        let descriptor = turret_descriptor();
        let basis = Turret {
            heat: 10,
            angle: -5,
            online: true,
            label: "west".to_string(),
        };
        let mut current = basis.clone();
        current.angle = 30;

        let mask = descriptor.compute_delta(&basis, &current);
        assert!(!mask.contains(0));
        assert!(mask.contains(1));
        assert!(!mask.contains(2));
        assert_eq!(mask.count(), 1);

        assert!(descriptor.compute_delta(&basis, &basis).is_empty());
    }

    #[test]
    fn reset_restores_prototype_values() {
        let descriptor = turret_descriptor();
        let mut state = Turret {
            heat: 99,
            angle: 7,
            online: true,
            label: "north".to_string(),
        };
        descriptor.reset(&mut state);
        assert_eq!(state, Turret::default());
    }

    #[test]
    fn layout_hash_tracks_registration() {
        let a = turret_descriptor();
        let b = turret_descriptor();
        assert_eq!(a.layout_hash(), b.layout_hash());

        // A different member table must not collide.
        let other = StateDescriptor::<Turret>::builder()
            .mutable(
                "heat",
                WireType::UInt,
                |s| WireValue::UInt(s.heat),
                |s, v| {
                    if let WireValue::UInt(value) = v {
                        s.heat = value;
                    }
                },
            )
            .build(&Turret::default())
            .unwrap();
        assert_ne!(a.layout_hash(), other.layout_hash());
    }

    #[test]
    fn build_rejects_duplicate_names() {
        let err = StateDescriptor::<Turret>::builder()
            .mutable(
                "heat",
                WireType::UInt,
                |s| WireValue::UInt(s.heat),
                |_, _| {},
            )
            .mutable(
                "heat",
                WireType::UInt,
                |s| WireValue::UInt(s.heat),
                |_, _| {},
            )
            .build(&Turret::default())
            .unwrap_err();
        assert_eq!(err, DescriptorError::DuplicateMember { name: "heat" });
    }

    #[test]
    fn build_rejects_getter_type_mismatch() {
        let err = StateDescriptor::<Turret>::builder()
            .mutable(
                "heat",
                WireType::Byte,
                |s| WireValue::UInt(s.heat),
                |_, _| {},
            )
            .build(&Turret::default())
            .unwrap_err();
        assert_eq!(
            err,
            DescriptorError::GetterTypeMismatch {
                member: "heat",
                declared: WireType::Byte,
                actual: WireType::UInt,
            }
        );
    }

    #[test]
    fn build_rejects_empty_registration() {
        let err = StateDescriptor::<Turret>::builder()
            .build(&Turret::default())
            .unwrap_err();
        assert_eq!(err, DescriptorError::NoMembers);
    }
}
