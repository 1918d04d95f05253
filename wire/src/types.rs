//! Identity newtypes shared across the protocol.

use std::fmt;

/// A simulation tick number.
///
/// Ticks are monotonically increasing identifiers for simulation steps and
/// the unit of synchronization ordering. "No tick yet" (for example a peer
/// that has not acknowledged anything) is modeled as `Option<Tick>`, not a
/// sentinel value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Tick(u32);

impl Tick {
    /// The first simulation tick.
    pub const START: Self = Self(0);

    /// Creates a new tick.
    #[must_use]
    pub const fn new(tick: u32) -> Self {
        Self(tick)
    }

    /// Returns the raw tick value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Returns the next tick.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }

    /// Returns this tick advanced by `steps`.
    #[must_use]
    pub const fn advanced_by(self, steps: u32) -> Self {
        Self(self.0.wrapping_add(steps))
    }

    /// Returns `true` if this tick is a send tick for the given rate.
    ///
    /// A rate of 1 sends every tick.
    #[must_use]
    pub const fn is_send_tick(self, send_rate: u32) -> bool {
        send_rate != 0 && self.0 % send_rate == 0
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for Tick {
    fn from(tick: u32) -> Self {
        Self(tick)
    }
}

impl From<Tick> for u32 {
    fn from(tick: Tick) -> Self {
        tick.0
    }
}

/// A stable entity identifier.
///
/// Entity IDs are assigned by the simulation layer and must remain stable
/// for the lifetime of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct EntityId(u32);

impl EntityId {
    /// Creates a new entity ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw entity ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for EntityId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl From<EntityId> for u32 {
    fn from(id: EntityId) -> Self {
        id.0
    }
}
