//! The client loop.
//!
//! The client ticks at the same nominal rate as the host, applies host
//! deltas in tick-monotonic order, and on send ticks uploads its queued
//! commands and events. Every outgoing packet echoes the highest host tick
//! seen so far; that echo is what drives delta-basis selection on the host.

use std::collections::VecDeque;

use bitstream::{BitReader, BitWriter};
use log::{trace, warn};
use packed::{PackedReceiver, PackedSender, Pool};
use state::{StateDelta, StateDescriptor, WireValue};
use wire::{decode_packet, encode_header, EntityId, PacketHeader, Tick, HEADER_SIZE};

use crate::config::Config;
use crate::error::ConnResult;
use crate::message::{Command, Event, MAX_MESSAGE_VALUES};
use crate::sim::{ClientSimulation, Transport};

/// The client end of a replication session.
pub struct Client<S> {
    descriptor: StateDescriptor<S>,
    config: Config,
    tick: Tick,
    transport: Option<Box<dyn Transport>>,
    inbound: VecDeque<Vec<u8>>,
    /// Highest host tick seen in a packet header.
    host_tick: Option<Tick>,
    /// Local ticks elapsed since `host_tick` was observed.
    ticks_since_host: u32,
    commands: PackedSender<Command>,
    events: PackedSender<Event>,
    delta_pool: Pool<StateDelta>,
    event_pool: Pool<Event>,
    command_pool: Pool<Command>,
}

impl<S> Client<S> {
    /// Creates a client from a shared descriptor and configuration.
    #[must_use]
    pub fn new(descriptor: StateDescriptor<S>, config: Config) -> Self {
        Self {
            descriptor,
            config,
            tick: Tick::START,
            transport: None,
            inbound: VecDeque::new(),
            host_tick: None,
            ticks_since_host: 0,
            commands: PackedSender::new(),
            events: PackedSender::new(),
            delta_pool: Pool::new(),
            event_pool: Pool::new(),
            command_pool: Pool::new(),
        }
    }

    /// The current local tick.
    #[must_use]
    pub const fn current_tick(&self) -> Tick {
        self.tick
    }

    /// The client's estimate of the host clock.
    ///
    /// Both ends tick at the same nominal rate, so the estimate is the
    /// latest observed host tick advanced by the local ticks since.
    #[must_use]
    pub fn estimated_host_tick(&self) -> Option<Tick> {
        self.host_tick
            .map(|tick| tick.advanced_by(self.ticks_since_host))
    }

    /// Binds the outbound transport.
    ///
    /// # Panics
    ///
    /// Panics if a transport is already bound; rebinding without
    /// [`Self::clear_transport`] is a programming error.
    pub fn set_transport(&mut self, transport: Box<dyn Transport>) {
        assert!(
            self.transport.is_none(),
            "transport already bound; call clear_transport first"
        );
        self.transport = Some(transport);
    }

    /// Unbinds the transport and tears down all session state.
    ///
    /// Every staged message returns to its pool and the host-clock estimate
    /// is forgotten.
    pub fn clear_transport(&mut self) {
        self.transport = None;
        self.inbound.clear();
        self.host_tick = None;
        self.ticks_since_host = 0;
        self.commands.clear(&mut self.command_pool);
        self.events.clear(&mut self.event_pool);
    }

    /// Queues a raw inbound packet for the next update.
    pub fn receive(&mut self, bytes: &[u8]) {
        if self.inbound.len() >= self.config.max_inbound_packets {
            warn!("inbound buffer full, dropped oldest packet");
            self.inbound.pop_front();
        }
        self.inbound.push_back(bytes.to_vec());
    }

    /// Stages a command for the controlled entity, stamped with the current
    /// local tick.
    ///
    /// Commands carrying more than [`MAX_MESSAGE_VALUES`] values are refused.
    pub fn queue_command(&mut self, entity: EntityId, values: Vec<WireValue>) {
        if values.len() > MAX_MESSAGE_VALUES {
            warn!(
                "command refused: {} values exceed the cap of {MAX_MESSAGE_VALUES}",
                values.len()
            );
            return;
        }
        let mut command = self.command_pool.acquire();
        command.entity = entity;
        command.tick = self.tick;
        command.values = values;
        self.commands.add_pending(command);
    }

    /// Stages an event for the host, retried until its attempts run out.
    ///
    /// Events carrying more than [`MAX_MESSAGE_VALUES`] values are refused.
    pub fn raise_event(&mut self, kind: u16, values: Vec<WireValue>) {
        if values.len() > MAX_MESSAGE_VALUES {
            warn!(
                "event {kind} refused: {} values exceed the cap of {MAX_MESSAGE_VALUES}",
                values.len()
            );
            return;
        }
        let mut event = self.event_pool.acquire();
        event.kind = kind;
        event.tick = self.tick;
        event.values = values;
        event.attempts_left = self.config.event_attempts;
        self.events.add_pending(event);
    }

    /// Advances the client by one tick.
    ///
    /// Drains inbound packets, steps the predicted simulation, and on send
    /// ticks uploads one packet through the bound transport. Without a
    /// bound transport the client still consumes inbound traffic.
    pub fn update(&mut self, sim: &mut impl ClientSimulation<S>) -> ConnResult<()> {
        self.tick = self.tick.next();
        self.ticks_since_host = self.ticks_since_host.saturating_add(1);
        self.drain_inbound(sim);
        sim.client_update(self.tick, self.estimated_host_tick());
        if self.transport.is_some() && self.tick.is_send_tick(self.config.send_rate) {
            self.send_packet()?;
        }
        Ok(())
    }

    fn drain_inbound(&mut self, sim: &mut impl ClientSimulation<S>) {
        let limits = self.config.wire_limits();
        let descriptor = &self.descriptor;

        while let Some(bytes) = self.inbound.pop_front() {
            let packet = match decode_packet(&bytes, &limits) {
                Ok(packet) => packet,
                Err(err) => {
                    warn!("dropping malformed host packet: {err}");
                    continue;
                }
            };
            if !packet.header.flags.is_from_host() {
                warn!("dropping non-host packet");
                continue;
            }
            if packet.header.layout_hash != descriptor.layout_hash() {
                warn!(
                    "layout hash mismatch, host has {:#018x}",
                    packet.header.layout_hash
                );
                continue;
            }
            // Deltas must apply in tick-monotonic order; a packet at or
            // before the newest seen tick is discarded whole.
            if self
                .host_tick
                .map_or(false, |seen| packet.header.tick <= seen)
            {
                trace!("discarding stale host packet for tick {}", packet.header.tick);
                continue;
            }
            let mut reader = BitReader::new(packet.payload);
            let mut deltas: PackedReceiver<StateDelta> = PackedReceiver::new();
            if let Err(err) = deltas.decode(
                &mut reader,
                limits.max_list_items,
                &mut self.delta_pool,
                |delta, r| descriptor.decode_delta_into(delta, r),
            ) {
                warn!("dropping packet with bad delta list: {err}");
                continue;
            }

            let mut events: PackedReceiver<Event> = PackedReceiver::new();
            if let Err(err) = events.decode(
                &mut reader,
                limits.max_list_items,
                &mut self.event_pool,
                |event, r| event.decode_into(r),
            ) {
                warn!("dropping packet with bad event list: {err}");
                while let Some(delta) = deltas.pop() {
                    self.delta_pool.release(delta);
                }
                continue;
            }

            // A dropped packet is never acknowledged: the echo moves only
            // once both lists decoded, so the host never picks a delta
            // basis this client did not apply.
            self.host_tick = Some(packet.header.tick);
            self.ticks_since_host = 0;

            while let Some(delta) = deltas.pop() {
                if let Some(declined) = sim.process_delta(delta) {
                    self.delta_pool.release(declined);
                }
            }
            while let Some(event) = events.pop() {
                if let Some(declined) = sim.process_event(event) {
                    self.event_pool.release(declined);
                }
            }
        }
    }

    fn send_packet(&mut self) -> ConnResult<()> {
        let payload_budget = self.config.payload_budget();
        let mut writer = BitWriter::new();
        // Reserve one byte so the event count always fits.
        let command_budget = payload_budget.saturating_sub(1);
        let commands_out = self.commands.encode(
            &mut writer,
            command_budget,
            self.config.max_item_bytes,
            self.config.max_list_items,
            |command, w| command.encode(w),
        )?;
        if commands_out.skipped > 0 {
            warn!("{} oversized commands skipped", commands_out.skipped);
        }

        let remaining = payload_budget.saturating_sub(writer.bytes_written()).max(1);
        let events_out = self.events.encode(
            &mut writer,
            remaining,
            self.config.max_item_bytes,
            self.config.max_list_items,
            |event, w| event.encode(w),
        )?;
        if events_out.skipped > 0 {
            warn!("{} oversized events skipped", events_out.skipped);
        }

        let payload = writer.finish();
        let header = PacketHeader::from_client(
            self.descriptor.layout_hash(),
            self.tick,
            self.host_tick,
            payload.len() as u32,
        );
        let mut buf = vec![0u8; HEADER_SIZE + payload.len()];
        encode_header(&header, &mut buf)?;
        buf[HEADER_SIZE..].copy_from_slice(&payload);
        if let Some(transport) = self.transport.as_mut() {
            transport.send(&buf);
        }
        trace!(
            "tick {} sent, {} commands, {} events",
            self.tick,
            commands_out.packed,
            events_out.packed
        );

        self.commands.release_sent(&mut self.command_pool);
        for mut event in self.events.drain_sent() {
            event.attempts_left = event.attempts_left.saturating_sub(1);
            if event.attempts_left > 0 {
                self.events.add_pending(event);
            } else {
                self.event_pool.release(event);
            }
        }
        Ok(())
    }
}
