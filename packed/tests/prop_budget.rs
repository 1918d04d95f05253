//! Budget properties of the packed sender: no batch ever exceeds its byte
//! or count budget, and every message is accounted for exactly once.

use bitstream::{BitReader, BitResult, BitWriter};
use packed::{PackedReceiver, PackedSender, Pool, Poolable};
use proptest::prelude::*;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct Blob {
    bytes: Vec<u8>,
}

impl Poolable for Blob {
    fn reset(&mut self) {
        self.bytes.clear();
    }
}

fn encode_blob(blob: &Blob, writer: &mut BitWriter) -> BitResult<()> {
    writer.write_varu32(blob.bytes.len() as u32)?;
    writer.write_bytes_aligned(&blob.bytes)
}

fn decode_blob(blob: &mut Blob, reader: &mut BitReader<'_>) -> BitResult<()> {
    let len = reader.read_varu32()? as usize;
    blob.bytes.extend_from_slice(reader.read_bytes_aligned(len)?);
    Ok(())
}

proptest! {
    #[test]
    fn prop_encode_never_exceeds_its_budgets(
        sizes in prop::collection::vec(0usize..96, 0..24),
        max_total in 1usize..192,
        max_item in 1usize..96,
        max_items in 0usize..24,
    ) {
        let mut sender: PackedSender<Blob> = PackedSender::new();
        for (fill, len) in sizes.iter().enumerate() {
            sender.add_pending(Blob { bytes: vec![fill as u8; *len] });
        }

        let mut writer = BitWriter::new();
        let outcome = sender
            .encode(&mut writer, max_total, max_item, max_items, encode_blob)
            .unwrap();
        let bytes = writer.finish();

        prop_assert!(bytes.len() <= max_total);
        prop_assert!(outcome.packed <= max_items);
        prop_assert!(outcome.packed + outcome.skipped <= sizes.len());

        // The receiving side, bounded the same way, accepts the batch and
        // sees the exact messages the sender marked as sent.
        let mut pool = Pool::new();
        let mut receiver: PackedReceiver<Blob> = PackedReceiver::new();
        let mut reader = BitReader::new(&bytes);
        let count = receiver
            .decode(&mut reader, max_items, &mut pool, decode_blob)
            .unwrap();
        prop_assert_eq!(count, outcome.packed);

        let taken = sender.drain_sent();
        let received: Vec<Blob> = receiver.drain().collect();
        prop_assert_eq!(&taken, &received);

        // Unsent messages, skipped ones included, all stay pending.
        prop_assert_eq!(sender.pending().len(), sizes.len() - outcome.packed);
    }
}
