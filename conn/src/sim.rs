//! Seams between the connection loops and the application.
//!
//! The simulation traits hand messages over by value. Returning `None`
//! means the simulation consumed the message and now owns it; returning it
//! back declines it, and the connection loop recycles it. There is no way
//! to both keep and decline a message.

use state::StateDelta;
use wire::{EntityId, Tick};

use crate::message::{Command, Event};
use crate::peer::PeerId;

/// Outbound byte transport, fire and forget.
///
/// Delivery, ordering, and fragmentation guarantees are whatever the
/// underlying channel provides; the protocol tolerates loss and reordering.
pub trait Transport {
    /// Hands one encoded packet to the channel.
    fn send(&mut self, bytes: &[u8]);
}

/// Outbound byte transport with per-peer addressing, fire and forget.
pub trait HostTransport {
    /// Hands one encoded packet for `peer` to the channel.
    fn send(&mut self, peer: PeerId, bytes: &[u8]);
}

/// The host-side application hooks.
pub trait HostSimulation<S> {
    /// Advances the authoritative simulation to `tick`.
    fn update_host(&mut self, tick: Tick);

    /// Samples every replicated entity's current state.
    fn snapshot(&self) -> Vec<(EntityId, S)>;

    /// Offers a client command to the simulation.
    fn process_command(&mut self, command: Command) -> Option<Command>;

    /// Offers a client event to the simulation.
    fn process_event(&mut self, event: Event) -> Option<Event>;
}

/// The client-side application hooks.
pub trait ClientSimulation<S> {
    /// Advances the predicted simulation.
    ///
    /// `estimated_host_tick` is the client's estimate of the host clock, or
    /// `None` before the first host packet arrives.
    fn client_update(&mut self, local_tick: Tick, estimated_host_tick: Option<Tick>);

    /// Offers a decoded state delta to the simulation.
    fn process_delta(&mut self, delta: StateDelta) -> Option<StateDelta>;

    /// Offers a host event to the simulation.
    fn process_event(&mut self, event: Event) -> Option<Event>;
}
