//! Wire framing and packet header layout for tickrep.
//!
//! This crate defines the byte-exact packet header (sender tick, ack echo,
//! descriptor layout hash) and the decode-side limits that keep packet
//! parsing resource-safe. Payload contents are opaque at this layer; the
//! packed-list and state crates give them meaning.

mod error;
mod header;
mod limits;
mod types;

pub use error::{DecodeError, EncodeError, WireResult};
pub use header::{
    decode_packet, encode_header, PacketFlags, PacketHeader, WirePacket, HEADER_SIZE, MAGIC,
    VERSION,
};
pub use limits::Limits;
pub use types::{EntityId, Tick};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_api_exports() {
        let _ = Tick::new(0);
        let _ = EntityId::new(0);
        let _ = Limits::default();
        let _ = PacketFlags::from_host(false);
        let _: WireResult<()> = Ok(());
    }

    #[test]
    fn payload_survives_framing() {
        let payload = [1u8, 2, 3, 4, 5];
        let header =
            PacketHeader::from_host(9, Tick::new(4), Some(Tick::new(2)), payload.len() as u32);
        let mut buf = vec![0u8; HEADER_SIZE + payload.len()];
        encode_header(&header, &mut buf).unwrap();
        buf[HEADER_SIZE..].copy_from_slice(&payload);

        let packet = decode_packet(&buf, &Limits::for_testing()).unwrap();
        assert_eq!(packet.payload, &payload);
        assert_eq!(packet.header.layout_hash, 9);
    }
}
