//! Per-peer connection state on the host.

use std::collections::VecDeque;
use std::fmt;

use packed::{PackedSender, Pool};
use state::StateDelta;
use wire::Tick;

use crate::message::Event;

/// A host-assigned peer identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PeerId(u32);

impl PeerId {
    /// Creates a new peer ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw peer ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Everything the host tracks for one connected peer.
#[derive(Debug)]
pub(crate) struct Peer {
    /// Highest host tick the peer has acknowledged receiving.
    pub acked_tick: Option<Tick>,
    /// Highest tick seen in packets from this peer; echoed back as the ack.
    pub remote_tick: Option<Tick>,
    /// Raw packets awaiting the next update, oldest first.
    pub inbound: VecDeque<Vec<u8>>,
    /// Deltas staged for this peer's next packet.
    pub deltas: PackedSender<StateDelta>,
    /// Events addressed to this peer, retried until attempts run out.
    pub events: PackedSender<Event>,
}

impl Peer {
    pub fn new() -> Self {
        Self {
            acked_tick: None,
            remote_tick: None,
            inbound: VecDeque::new(),
            deltas: PackedSender::new(),
            events: PackedSender::new(),
        }
    }

    /// Records the tick and ack carried by an inbound packet header.
    pub fn observe(&mut self, remote_tick: Tick, ack: Option<Tick>) {
        if self.remote_tick.map_or(true, |seen| remote_tick > seen) {
            self.remote_tick = Some(remote_tick);
        }
        if let Some(acked) = ack {
            if self.acked_tick.map_or(true, |seen| acked > seen) {
                self.acked_tick = Some(acked);
            }
        }
    }

    /// Queues a raw packet, dropping the oldest when the buffer is full.
    ///
    /// Returns `false` when a packet had to be dropped.
    pub fn enqueue(&mut self, bytes: &[u8], max_inbound: usize) -> bool {
        let overflowed = self.inbound.len() >= max_inbound;
        if overflowed {
            self.inbound.pop_front();
        }
        self.inbound.push_back(bytes.to_vec());
        !overflowed
    }

    /// Releases every staged message back to its pool.
    pub fn teardown(&mut self, delta_pool: &mut Pool<StateDelta>, event_pool: &mut Pool<Event>) {
        self.deltas.clear(delta_pool);
        self.events.clear(event_pool);
        self.inbound.clear();
    }
}
