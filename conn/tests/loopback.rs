//! End-to-end host/client convergence over an in-memory loopback.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use bitstream::BitWriter;
use conn::{
    Client, ClientSimulation, Command, Config, Event, Host, HostSimulation, HostTransport, PeerId,
    Transport,
};
use state::{StateDelta, StateDescriptor, WireType, WireValue};
use wire::{encode_header, EntityId, PacketHeader, Tick, HEADER_SIZE};

#[derive(Debug, Default, Clone, PartialEq)]
struct Ship {
    x: i32,
    y: i32,
    fuel: u32,
    name: String,
}

fn ship_descriptor() -> StateDescriptor<Ship> {
    StateDescriptor::builder()
        .mutable(
            "x",
            WireType::Int,
            |s: &Ship| WireValue::Int(s.x),
            |s, v| {
                if let WireValue::Int(value) = v {
                    s.x = value;
                }
            },
        )
        .mutable(
            "y",
            WireType::Int,
            |s| WireValue::Int(s.y),
            |s, v| {
                if let WireValue::Int(value) = v {
                    s.y = value;
                }
            },
        )
        .mutable(
            "fuel",
            WireType::UInt,
            |s| WireValue::UInt(s.fuel),
            |s, v| {
                if let WireValue::UInt(value) = v {
                    s.fuel = value;
                }
            },
        )
        .immutable(
            "name",
            WireType::Str,
            |s| WireValue::Str(s.name.clone()),
            |s, v| {
                if let WireValue::Str(value) = v {
                    s.name = value;
                }
            },
        )
        .build(&Ship::default())
        .unwrap()
}

/// Host side: one ship drifting east, steered by client commands.
struct ShipHostSim {
    ship: Ship,
    commands: Vec<(EntityId, Tick)>,
    events_seen: Vec<u16>,
}

impl HostSimulation<Ship> for ShipHostSim {
    fn update_host(&mut self, _tick: Tick) {
        self.ship.x += 1;
        self.ship.fuel = self.ship.fuel.saturating_sub(1);
    }

    fn snapshot(&self) -> Vec<(EntityId, Ship)> {
        vec![(EntityId::new(1), self.ship.clone())]
    }

    fn process_command(&mut self, command: Command) -> Option<Command> {
        if let Some(WireValue::Int(dy)) = command.values.first() {
            self.ship.y += dy;
        }
        self.commands.push((command.entity, command.tick));
        None
    }

    fn process_event(&mut self, event: Event) -> Option<Event> {
        self.events_seen.push(event.kind);
        None
    }
}

/// Client side: replicates ships by applying deltas onto local copies.
struct ShipClientSim {
    descriptor: StateDescriptor<Ship>,
    replicas: BTreeMap<EntityId, Ship>,
    last_delta_tick: Option<Tick>,
    events_seen: Vec<u16>,
}

impl ShipClientSim {
    fn new() -> Self {
        Self {
            descriptor: ship_descriptor(),
            replicas: BTreeMap::new(),
            last_delta_tick: None,
            events_seen: Vec::new(),
        }
    }
}

impl ClientSimulation<Ship> for ShipClientSim {
    fn client_update(&mut self, _local_tick: Tick, _estimated_host_tick: Option<Tick>) {}

    fn process_delta(&mut self, delta: StateDelta) -> Option<StateDelta> {
        if let Some(seen) = self.last_delta_tick {
            assert!(delta.tick >= seen, "deltas must arrive tick-monotonic");
        }
        self.last_delta_tick = Some(delta.tick);
        let replica = self.replicas.entry(delta.entity).or_default();
        self.descriptor.apply_delta(&delta, replica).unwrap();
        None
    }

    fn process_event(&mut self, event: Event) -> Option<Event> {
        self.events_seen.push(event.kind);
        None
    }
}

#[derive(Clone, Default)]
struct SharedQueue(Rc<RefCell<Vec<Vec<u8>>>>);

impl SharedQueue {
    fn drain(&self) -> Vec<Vec<u8>> {
        self.0.borrow_mut().drain(..).collect()
    }
}

impl Transport for SharedQueue {
    fn send(&mut self, bytes: &[u8]) {
        self.0.borrow_mut().push(bytes.to_vec());
    }
}

struct ToClient {
    queue: Vec<Vec<u8>>,
}

impl HostTransport for ToClient {
    fn send(&mut self, _peer: PeerId, bytes: &[u8]) {
        self.queue.push(bytes.to_vec());
    }
}

#[test]
fn host_and_client_converge_over_loopback() {
    let config = Config::for_testing();
    let peer = PeerId::new(1);

    let mut host = Host::new(ship_descriptor(), config.clone());
    host.add_peer(peer);
    let mut host_sim = ShipHostSim {
        ship: Ship {
            x: 0,
            y: 0,
            fuel: 500,
            name: "meridian".to_string(),
        },
        commands: Vec::new(),
        events_seen: Vec::new(),
    };

    let mut client = Client::new(ship_descriptor(), config);
    let uplink = SharedQueue::default();
    client.set_transport(Box::new(uplink.clone()));
    let mut client_sim = ShipClientSim::new();
    let mut downlink = ToClient { queue: Vec::new() };

    client.queue_command(EntityId::new(1), vec![WireValue::Int(2)]);
    client.raise_event(77, vec![WireValue::Str("hello".to_string())]);
    host.raise_event(5, vec![]);

    for _ in 0..20 {
        host.update(&mut host_sim, &mut downlink).unwrap();
        for packet in downlink.queue.drain(..) {
            client.receive(&packet);
        }
        client.update(&mut client_sim).unwrap();
        for packet in uplink.drain() {
            host.receive(peer, &packet);
        }
    }

    // The replica matches the host's last broadcast state. The host ship
    // advanced once more after the final broadcast the client saw applied,
    // so compare against the delta tick the client last applied.
    let replica = client_sim.replicas.get(&EntityId::new(1)).unwrap();
    assert_eq!(replica.name, "meridian");
    assert!(replica.x > 0);
    // The command steered the ship north by 2 exactly once.
    assert_eq!(host_sim.ship.y, 2);
    assert_eq!(replica.y, 2);

    // Events crossed in both directions at least once.
    assert!(host_sim.events_seen.contains(&77));
    assert!(client_sim.events_seen.contains(&5));
    // The host learned the client's ack and switched to delta broadcasts.
    assert!(host.acked_tick(peer).is_some());
}

#[test]
fn replica_matches_host_state_after_lossless_session() {
    let config = Config::for_testing();
    let peer = PeerId::new(1);
    let mut host = Host::new(ship_descriptor(), config.clone());
    host.add_peer(peer);
    let mut host_sim = ShipHostSim {
        ship: Ship {
            x: 0,
            y: 0,
            fuel: 100,
            name: "skiff".to_string(),
        },
        commands: Vec::new(),
        events_seen: Vec::new(),
    };
    let mut client = Client::new(ship_descriptor(), config);
    let uplink = SharedQueue::default();
    client.set_transport(Box::new(uplink.clone()));
    let mut client_sim = ShipClientSim::new();
    let mut downlink = ToClient { queue: Vec::new() };

    for _ in 0..10 {
        host.update(&mut host_sim, &mut downlink).unwrap();
        for packet in downlink.queue.drain(..) {
            client.receive(&packet);
        }
        client.update(&mut client_sim).unwrap();
        for packet in uplink.drain() {
            host.receive(peer, &packet);
        }
    }

    // The client saw every broadcast, so its replica equals the snapshot at
    // the last broadcast tick, which is the host's current state.
    let replica = client_sim.replicas.get(&EntityId::new(1)).unwrap();
    assert_eq!(replica, &host_sim.ship);
    assert_eq!(client_sim.last_delta_tick, Some(host.current_tick()));
}

#[test]
fn undecodable_packet_is_not_acknowledged() {
    let config = Config::for_testing();
    let descriptor = ship_descriptor();
    let mut client = Client::new(ship_descriptor(), config.clone());
    let mut client_sim = ShipClientSim::new();

    // A host-flagged packet for tick 1 whose delta list declares far more
    // items than the decode cap allows.
    let mut writer = BitWriter::new();
    writer.write_varu32(1000).unwrap();
    let payload = writer.finish();
    let header = PacketHeader::from_host(
        descriptor.layout_hash(),
        Tick::new(1),
        None,
        payload.len() as u32,
    );
    let mut bad = vec![0u8; HEADER_SIZE + payload.len()];
    encode_header(&header, &mut bad).unwrap();
    bad[HEADER_SIZE..].copy_from_slice(&payload);

    client.receive(&bad);
    client.update(&mut client_sim).unwrap();
    // The dropped packet left no trace: no clock estimate, no replicas, so
    // the next outgoing packet carries no ack the host could pick a stale
    // basis from.
    assert_eq!(client.estimated_host_tick(), None);
    assert!(client_sim.replicas.is_empty());

    // A well-formed broadcast for the same tick is still considered fresh.
    let mut host = Host::new(ship_descriptor(), config);
    host.add_peer(PeerId::new(1));
    let mut host_sim = ShipHostSim {
        ship: Ship {
            x: 0,
            y: 0,
            fuel: 10,
            name: "skiff".to_string(),
        },
        commands: Vec::new(),
        events_seen: Vec::new(),
    };
    let mut downlink = ToClient { queue: Vec::new() };
    host.update(&mut host_sim, &mut downlink).unwrap();
    for packet in downlink.queue.drain(..) {
        client.receive(&packet);
    }
    client.update(&mut client_sim).unwrap();
    assert_eq!(client.estimated_host_tick(), Some(Tick::new(1)));
    assert!(!client_sim.replicas.is_empty());
}

#[test]
#[should_panic(expected = "transport already bound")]
fn double_transport_bind_panics() {
    let mut client: Client<Ship> = Client::new(ship_descriptor(), Config::for_testing());
    client.set_transport(Box::new(SharedQueue::default()));
    client.set_transport(Box::new(SharedQueue::default()));
}

#[test]
fn clear_transport_tears_down_and_allows_rebinding() {
    let mut client: Client<Ship> = Client::new(ship_descriptor(), Config::for_testing());
    client.set_transport(Box::new(SharedQueue::default()));
    client.queue_command(EntityId::new(1), vec![]);
    client.raise_event(1, vec![]);
    client.clear_transport();
    assert_eq!(client.estimated_host_tick(), None);
    // Rebinding after a clear is legitimate.
    client.set_transport(Box::new(SharedQueue::default()));
}
