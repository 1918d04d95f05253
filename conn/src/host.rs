//! The authoritative host loop.
//!
//! Once per simulation tick the host drains every peer's inbound packets,
//! advances the simulation, and on send ticks broadcasts a packet per peer.
//! Each peer gets deltas against the newest snapshot that peer has
//! acknowledged and that the history still retains; a peer with no usable
//! basis silently receives full initial deltas instead.

use std::collections::BTreeMap;
use std::num::NonZeroUsize;

use bitstream::{BitReader, BitWriter};
use log::{debug, trace, warn};
use packed::{PackedReceiver, Pool};
use state::{StateDelta, StateDescriptor, WireValue};
use wire::{decode_packet, encode_header, EntityId, PacketHeader, Tick, HEADER_SIZE};

use crate::config::Config;
use crate::error::ConnResult;
use crate::history::SnapshotHistory;
use crate::message::{Command, Event, MAX_MESSAGE_VALUES};
use crate::peer::{Peer, PeerId};
use crate::sim::{HostSimulation, HostTransport};

/// The server end of a replication session.
pub struct Host<S> {
    descriptor: StateDescriptor<S>,
    config: Config,
    tick: Tick,
    peers: BTreeMap<PeerId, Peer>,
    controllers: BTreeMap<EntityId, PeerId>,
    history: SnapshotHistory<S>,
    delta_pool: Pool<StateDelta>,
    event_pool: Pool<Event>,
    command_pool: Pool<Command>,
}

impl<S> Host<S> {
    /// Creates a host from a shared descriptor and configuration.
    #[must_use]
    pub fn new(descriptor: StateDescriptor<S>, config: Config) -> Self {
        let capacity =
            NonZeroUsize::new(config.snapshot_history.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            descriptor,
            config,
            tick: Tick::START,
            peers: BTreeMap::new(),
            controllers: BTreeMap::new(),
            history: SnapshotHistory::new(capacity),
            delta_pool: Pool::new(),
            event_pool: Pool::new(),
            command_pool: Pool::new(),
        }
    }

    /// The current host tick.
    #[must_use]
    pub const fn current_tick(&self) -> Tick {
        self.tick
    }

    /// The highest tick `peer` has acknowledged, if any.
    #[must_use]
    pub fn acked_tick(&self, peer: PeerId) -> Option<Tick> {
        self.peers.get(&peer).and_then(|p| p.acked_tick)
    }

    /// Registers a peer. Re-adding an existing peer is a no-op.
    pub fn add_peer(&mut self, id: PeerId) {
        if self.peers.contains_key(&id) {
            warn!("peer {id} already registered");
            return;
        }
        debug!("peer {id} added");
        self.peers.insert(id, Peer::new());
    }

    /// Drops a peer and returns every message staged for it to the pools.
    pub fn remove_peer(&mut self, id: PeerId) {
        if let Some(mut peer) = self.peers.remove(&id) {
            peer.teardown(&mut self.delta_pool, &mut self.event_pool);
            self.controllers.retain(|_, owner| *owner != id);
            debug!("peer {id} removed");
        }
    }

    /// Assigns or clears the peer that controls `entity`.
    ///
    /// The controlling peer receives the entity's controller members in its
    /// deltas.
    pub fn set_controller(&mut self, entity: EntityId, peer: Option<PeerId>) {
        match peer {
            Some(id) => {
                self.controllers.insert(entity, id);
            }
            None => {
                self.controllers.remove(&entity);
            }
        }
    }

    /// Stages an event for every connected peer.
    ///
    /// The event stays pending on each peer until it has been sent
    /// `event_attempts` times. Events carrying more than
    /// [`MAX_MESSAGE_VALUES`] values are refused.
    pub fn raise_event(&mut self, kind: u16, values: Vec<WireValue>) {
        if values.len() > MAX_MESSAGE_VALUES {
            warn!(
                "event {kind} refused: {} values exceed the cap of {MAX_MESSAGE_VALUES}",
                values.len()
            );
            return;
        }
        for peer in self.peers.values_mut() {
            let mut event = self.event_pool.acquire();
            event.kind = kind;
            event.tick = self.tick;
            event.values.extend(values.iter().cloned());
            event.attempts_left = self.config.event_attempts;
            peer.events.add_pending(event);
        }
    }

    /// Queues a raw inbound packet from `peer` for the next update.
    pub fn receive(&mut self, peer: PeerId, bytes: &[u8]) {
        let Some(state) = self.peers.get_mut(&peer) else {
            trace!("dropping packet from unknown peer {peer}");
            return;
        };
        if !state.enqueue(bytes, self.config.max_inbound_packets) {
            warn!("peer {peer}: inbound buffer full, dropped oldest packet");
        }
    }

    /// Advances the host by one tick.
    ///
    /// Drains inbound traffic, steps the simulation, and on send ticks
    /// broadcasts one packet per peer through `transport`.
    pub fn update<T: HostTransport>(
        &mut self,
        sim: &mut impl HostSimulation<S>,
        transport: &mut T,
    ) -> ConnResult<()> {
        self.tick = self.tick.next();
        self.drain_inbound(sim);
        sim.update_host(self.tick);
        if self.tick.is_send_tick(self.config.send_rate) {
            self.broadcast(sim, transport)?;
        }
        Ok(())
    }

    fn drain_inbound(&mut self, sim: &mut impl HostSimulation<S>) {
        let layout_hash = self.descriptor.layout_hash();
        let limits = self.config.wire_limits();

        for (id, peer) in &mut self.peers {
            while let Some(bytes) = peer.inbound.pop_front() {
                let packet = match decode_packet(&bytes, &limits) {
                    Ok(packet) => packet,
                    Err(err) => {
                        warn!("peer {id}: dropping malformed packet: {err}");
                        continue;
                    }
                };
                if !packet.header.flags.is_from_client() {
                    warn!("peer {id}: dropping non-client packet");
                    continue;
                }
                if packet.header.layout_hash != layout_hash {
                    warn!(
                        "peer {id}: layout hash mismatch, theirs {:#018x}",
                        packet.header.layout_hash
                    );
                    continue;
                }
                peer.observe(packet.header.tick, packet.header.ack);

                let mut reader = BitReader::new(packet.payload);
                let mut commands: PackedReceiver<Command> = PackedReceiver::new();
                if let Err(err) = commands.decode(
                    &mut reader,
                    limits.max_list_items,
                    &mut self.command_pool,
                    |command, r| command.decode_into(r),
                ) {
                    warn!("peer {id}: dropping packet with bad command list: {err}");
                    continue;
                }
                while let Some(command) = commands.pop() {
                    if let Some(declined) = sim.process_command(command) {
                        self.command_pool.release(declined);
                    }
                }

                let mut events: PackedReceiver<Event> = PackedReceiver::new();
                if let Err(err) = events.decode(
                    &mut reader,
                    limits.max_list_items,
                    &mut self.event_pool,
                    |event, r| event.decode_into(r),
                ) {
                    warn!("peer {id}: dropping packet tail with bad event list: {err}");
                    continue;
                }
                while let Some(event) = events.pop() {
                    if let Some(declined) = sim.process_event(event) {
                        self.event_pool.release(declined);
                    }
                }
            }
        }
    }

    fn broadcast<T: HostTransport>(
        &mut self,
        sim: &mut impl HostSimulation<S>,
        transport: &mut T,
    ) -> ConnResult<()> {
        let snapshot = sim.snapshot();
        if let Err(err) = self.history.insert(self.tick, snapshot) {
            debug!("snapshot for tick {} not retained: {err:?}", self.tick);
            return Ok(());
        }
        let Some((_, current)) = self.history.latest() else {
            return Ok(());
        };

        let descriptor = &self.descriptor;
        let payload_budget = self.config.payload_budget();

        for (id, peer) in &mut self.peers {
            // A newer delta is about to be staged for every entity, so any
            // unsent delta from an earlier tick would violate tick-monotonic
            // apply if it went out later. Supersede it.
            peer.deltas.clear(&mut self.delta_pool);

            let basis = peer.acked_tick.and_then(|tick| self.history.get(tick));
            for (entity, state) in current {
                let basis_state = basis.and_then(|snap| {
                    snap.iter()
                        .find(|(basis_entity, _)| basis_entity == entity)
                        .map(|(_, basis_state)| basis_state)
                });
                let controller = self.controllers.get(entity) == Some(id);
                let mut delta = self.delta_pool.acquire();
                descriptor.produce_delta_into(
                    &mut delta,
                    *entity,
                    self.tick,
                    basis_state,
                    state,
                    controller,
                );
                if delta.is_empty() {
                    self.delta_pool.release(delta);
                } else {
                    peer.deltas.add_pending(delta);
                }
            }

            let mut writer = BitWriter::new();
            // Reserve one byte so the event count always fits.
            let delta_budget = payload_budget.saturating_sub(1);
            let deltas_out = peer.deltas.encode(
                &mut writer,
                delta_budget,
                self.config.max_item_bytes,
                self.config.max_list_items,
                |delta, w| descriptor.encode_delta(delta, w),
            )?;
            if deltas_out.skipped > 0 {
                warn!("peer {id}: {} oversized deltas skipped", deltas_out.skipped);
            }

            let remaining = payload_budget.saturating_sub(writer.bytes_written()).max(1);
            let events_out = peer.events.encode(
                &mut writer,
                remaining,
                self.config.max_item_bytes,
                self.config.max_list_items,
                |event, w| event.encode(w),
            )?;
            if events_out.skipped > 0 {
                warn!("peer {id}: {} oversized events skipped", events_out.skipped);
            }

            let payload = writer.finish();
            let header = PacketHeader::from_host(
                descriptor.layout_hash(),
                self.tick,
                peer.remote_tick,
                payload.len() as u32,
            );
            let mut buf = vec![0u8; HEADER_SIZE + payload.len()];
            encode_header(&header, &mut buf)?;
            buf[HEADER_SIZE..].copy_from_slice(&payload);
            transport.send(*id, &buf);
            trace!(
                "peer {id}: tick {} sent, {} deltas, {} events",
                self.tick,
                deltas_out.packed,
                events_out.packed
            );

            peer.deltas.release_sent(&mut self.delta_pool);
            for mut event in peer.events.drain_sent() {
                event.attempts_left = event.attempts_left.saturating_sub(1);
                if event.attempts_left > 0 {
                    peer.events.add_pending(event);
                } else {
                    self.event_pool.release(event);
                }
            }
        }
        Ok(())
    }
}
