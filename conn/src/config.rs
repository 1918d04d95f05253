//! Connection tuning knobs.

use wire::Limits;

/// Tuning parameters shared by hosts and clients.
///
/// Both ends tick at the same nominal rate; `send_rate` controls how many
/// local ticks pass between outgoing packets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Local ticks between sends. 1 sends every tick; 0 never sends.
    pub send_rate: u32,

    /// Hard byte budget for one packet, header included.
    pub max_packet_bytes: usize,

    /// Byte budget for a single packed item; larger items are skipped.
    pub max_item_bytes: usize,

    /// Packed-list item count limit applied when decoding.
    pub max_list_items: usize,

    /// Default send attempts for a raised event.
    pub event_attempts: u8,

    /// Snapshots retained as delta bases.
    pub snapshot_history: usize,

    /// Raw packets buffered per peer between updates; the oldest packet is
    /// dropped on overflow.
    pub max_inbound_packets: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            send_rate: 2,
            // Conservative single-datagram budget under a typical MTU
            max_packet_bytes: 1200,
            max_item_bytes: 256,
            max_list_items: 256,
            event_attempts: 3,
            snapshot_history: 64,
            max_inbound_packets: 32,
        }
    }
}

impl Config {
    /// Creates a configuration with small values suitable for testing.
    #[must_use]
    pub const fn for_testing() -> Self {
        Self {
            send_rate: 1,
            max_packet_bytes: 512,
            max_item_bytes: 128,
            max_list_items: 32,
            event_attempts: 2,
            snapshot_history: 8,
            max_inbound_packets: 8,
        }
    }

    /// The wire-level decode limits implied by this configuration.
    #[must_use]
    pub const fn wire_limits(&self) -> Limits {
        Limits {
            max_packet_bytes: self.max_packet_bytes,
            max_list_items: self.max_list_items,
        }
    }

    /// Byte budget left for payload once the header is accounted for.
    #[must_use]
    pub const fn payload_budget(&self) -> usize {
        self.max_packet_bytes.saturating_sub(wire::HEADER_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn testing_config_is_tighter_than_default() {
        let test = Config::for_testing();
        let default = Config::default();
        assert!(test.max_packet_bytes < default.max_packet_bytes);
        assert!(test.snapshot_history < default.snapshot_history);
    }

    #[test]
    fn payload_budget_subtracts_header() {
        let config = Config::for_testing();
        assert_eq!(
            config.payload_budget(),
            config.max_packet_bytes - wire::HEADER_SIZE
        );
    }
}
