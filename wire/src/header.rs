//! Packet header types and byte-exact encoding.

use crate::error::{DecodeError, EncodeError, WireResult};
use crate::limits::Limits;
use crate::types::Tick;

/// Magic number identifying tickrep packets.
///
/// This value is fixed and must never change across versions.
pub const MAGIC: u32 = 0x5452_4550; // "TREP" in ASCII

/// Current wire format version.
pub const VERSION: u16 = 1;

/// Header size in bytes (28 total).
pub const HEADER_SIZE: usize = 4 + 2 + 2 + 8 + 4 + 4 + 4;

/// Packet flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PacketFlags(u16);

impl PacketFlags {
    /// Flag indicating a host-to-client packet.
    pub const FROM_HOST: u16 = 1 << 0;

    /// Flag indicating a client-to-host packet.
    pub const FROM_CLIENT: u16 = 1 << 1;

    /// Flag indicating the ack tick field is meaningful.
    pub const HAS_ACK: u16 = 1 << 2;

    /// Reserved bits mask (must be zero in version 1).
    const RESERVED_MASK: u16 = !0b111;

    /// Creates new flags from a raw value.
    #[must_use]
    pub const fn from_raw(raw: u16) -> Self {
        Self(raw)
    }

    /// Returns the raw flag bits.
    #[must_use]
    pub const fn raw(self) -> u16 {
        self.0
    }

    /// Returns `true` if this packet was sent by the host.
    #[must_use]
    pub const fn is_from_host(self) -> bool {
        self.0 & Self::FROM_HOST != 0
    }

    /// Returns `true` if this packet was sent by a client.
    #[must_use]
    pub const fn is_from_client(self) -> bool {
        self.0 & Self::FROM_CLIENT != 0
    }

    /// Returns `true` if the ack tick field is meaningful.
    #[must_use]
    pub const fn has_ack(self) -> bool {
        self.0 & Self::HAS_ACK != 0
    }

    /// Returns `true` if the flags are valid for version 1.
    ///
    /// Valid means exactly one of `FROM_HOST`/`FROM_CLIENT` is set and no
    /// reserved bits are set.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        let has_reserved = self.0 & Self::RESERVED_MASK != 0;
        (self.is_from_host() ^ self.is_from_client()) && !has_reserved
    }

    /// Creates flags for a host packet.
    #[must_use]
    pub const fn from_host(has_ack: bool) -> Self {
        if has_ack {
            Self(Self::FROM_HOST | Self::HAS_ACK)
        } else {
            Self(Self::FROM_HOST)
        }
    }

    /// Creates flags for a client packet.
    #[must_use]
    pub const fn from_client(has_ack: bool) -> Self {
        if has_ack {
            Self(Self::FROM_CLIENT | Self::HAS_ACK)
        } else {
            Self(Self::FROM_CLIENT)
        }
    }
}

/// Packet header (version 1).
///
/// The ack tick echoes the highest tick so far received from the remote:
/// client packets acknowledge host broadcasts (driving delta-basis
/// selection on the host), host packets acknowledge client traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketHeader {
    /// Wire format version.
    pub version: u16,
    /// Packet flags.
    pub flags: PacketFlags,
    /// State-descriptor layout hash for wire-compatibility checking.
    pub layout_hash: u64,
    /// Sender's simulation tick.
    pub tick: Tick,
    /// Highest remote tick acknowledged, if any.
    pub ack: Option<Tick>,
    /// Payload length in bytes.
    pub payload_len: u32,
}

impl PacketHeader {
    /// Creates a header for a host-to-client packet.
    #[must_use]
    pub const fn from_host(
        layout_hash: u64,
        tick: Tick,
        ack: Option<Tick>,
        payload_len: u32,
    ) -> Self {
        Self {
            version: VERSION,
            flags: PacketFlags::from_host(ack.is_some()),
            layout_hash,
            tick,
            ack,
            payload_len,
        }
    }

    /// Creates a header for a client-to-host packet.
    #[must_use]
    pub const fn from_client(
        layout_hash: u64,
        tick: Tick,
        ack: Option<Tick>,
        payload_len: u32,
    ) -> Self {
        Self {
            version: VERSION,
            flags: PacketFlags::from_client(ack.is_some()),
            layout_hash,
            tick,
            ack,
            payload_len,
        }
    }
}

/// A decoded packet: validated header plus the raw payload slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WirePacket<'a> {
    pub header: PacketHeader,
    pub payload: &'a [u8],
}

/// Encodes a packet header into the provided output buffer.
pub fn encode_header(header: &PacketHeader, out: &mut [u8]) -> Result<usize, EncodeError> {
    if out.len() < HEADER_SIZE {
        return Err(EncodeError::BufferTooSmall {
            needed: HEADER_SIZE,
            available: out.len(),
        });
    }

    let ack_raw = match header.ack {
        Some(tick) => tick.raw(),
        None => 0,
    };

    out[0..4].copy_from_slice(&MAGIC.to_le_bytes());
    out[4..6].copy_from_slice(&header.version.to_le_bytes());
    out[6..8].copy_from_slice(&header.flags.raw().to_le_bytes());
    out[8..16].copy_from_slice(&header.layout_hash.to_le_bytes());
    out[16..20].copy_from_slice(&header.tick.raw().to_le_bytes());
    out[20..24].copy_from_slice(&ack_raw.to_le_bytes());
    out[24..28].copy_from_slice(&header.payload_len.to_le_bytes());

    Ok(HEADER_SIZE)
}

/// Decodes and validates a packet, returning the header and payload slice.
pub fn decode_packet<'a>(buf: &'a [u8], limits: &Limits) -> WireResult<WirePacket<'a>> {
    if buf.len() < HEADER_SIZE {
        return Err(DecodeError::PacketTooSmall {
            actual: buf.len(),
            required: HEADER_SIZE,
        });
    }
    if buf.len() > limits.max_packet_bytes {
        return Err(DecodeError::PacketTooLarge {
            limit: limits.max_packet_bytes,
            actual: buf.len(),
        });
    }

    let magic = u32::from_le_bytes(buf[0..4].try_into().unwrap());
    if magic != MAGIC {
        return Err(DecodeError::InvalidMagic { found: magic });
    }

    let version = u16::from_le_bytes(buf[4..6].try_into().unwrap());
    if version != VERSION {
        return Err(DecodeError::UnsupportedVersion { found: version });
    }

    let flags_raw = u16::from_le_bytes(buf[6..8].try_into().unwrap());
    let flags = PacketFlags::from_raw(flags_raw);
    if !flags.is_valid() {
        return Err(DecodeError::InvalidFlags { flags: flags_raw });
    }

    let layout_hash = u64::from_le_bytes(buf[8..16].try_into().unwrap());
    let tick = u32::from_le_bytes(buf[16..20].try_into().unwrap());
    let ack_raw = u32::from_le_bytes(buf[20..24].try_into().unwrap());
    let payload_len = u32::from_le_bytes(buf[24..28].try_into().unwrap());

    if !flags.has_ack() && ack_raw != 0 {
        return Err(DecodeError::InvalidAckTick {
            ack_tick: ack_raw,
            flags: flags_raw,
        });
    }

    let actual_payload_len = buf.len() - HEADER_SIZE;
    if payload_len as usize != actual_payload_len {
        return Err(DecodeError::PayloadLengthMismatch {
            header_len: payload_len,
            actual_len: actual_payload_len,
        });
    }

    let header = PacketHeader {
        version,
        flags,
        layout_hash,
        tick: Tick::new(tick),
        ack: flags.has_ack().then(|| Tick::new(ack_raw)),
        payload_len,
    };

    Ok(WirePacket {
        header,
        payload: &buf[HEADER_SIZE..],
    })
}
