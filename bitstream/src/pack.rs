//! Size-bounded batch packing of independently encoded items.
//!
//! The wire form of a packed batch is `[varu32 count][item bytes]*` with every
//! item byte-aligned. Items are probed into a scratch writer first so the
//! batch never exceeds its byte budget and an oversized item is never
//! partially emitted.

use crate::error::BitError;
use crate::reader::BitReader;
use crate::writer::{varu32_len, BitWriter};

/// Greedily packs `items` into `writer` within byte and count budgets.
///
/// Items are attempted in order. An item whose encoded size exceeds
/// `max_item_bytes` is skipped entirely and reported via `on_skipped`.
/// Packing stops once the batch holds `max_items` items or adding the next
/// item would push the batch (count prefix plus bodies) past
/// `max_total_bytes`; `on_packed` fires with the index of each item that
/// made it into the batch. `max_items` must match the [`unpack_all`] bound
/// on the receiving side or a full batch is rejected there.
///
/// The packed subset respects insertion order but is not necessarily
/// contiguous when oversized items are skipped mid-list.
///
/// `encode` may use any error type that can absorb [`BitError`], so higher
/// layers can pack domain items without an error-mapping shim.
#[allow(clippy::too_many_arguments)]
pub fn pack_to_size<T, E: From<BitError>>(
    writer: &mut BitWriter,
    max_total_bytes: usize,
    max_item_bytes: usize,
    max_items: usize,
    items: &[T],
    mut encode: impl FnMut(&T, &mut BitWriter) -> Result<(), E>,
    mut on_packed: impl FnMut(usize),
    mut on_skipped: impl FnMut(usize),
) -> Result<(), E> {
    let mut bodies: Vec<Vec<u8>> = Vec::new();
    let mut body_bytes = 0usize;

    for (index, item) in items.iter().enumerate() {
        if bodies.len() >= max_items {
            break;
        }
        let mut probe = BitWriter::new();
        encode(item, &mut probe)?;
        let body = probe.finish();

        if body.len() > max_item_bytes {
            on_skipped(index);
            continue;
        }

        let candidate_count = bodies.len() + 1;
        let candidate_total = varu32_len(candidate_count as u32) + body_bytes + body.len();
        if candidate_total > max_total_bytes {
            break;
        }

        body_bytes += body.len();
        bodies.push(body);
        on_packed(index);
    }

    writer.align_to_byte();
    writer.write_varu32(bodies.len() as u32).map_err(E::from)?;
    for body in &bodies {
        writer.write_bytes_aligned(body).map_err(E::from)?;
    }
    Ok(())
}

/// Unpacks a batch previously written by [`pack_to_size`].
///
/// `max_items` bounds the declared count to keep decoding resource-safe
/// against malformed input.
pub fn unpack_all<T, E: From<BitError>>(
    reader: &mut BitReader<'_>,
    max_items: usize,
    mut decode: impl FnMut(&mut BitReader<'_>) -> Result<T, E>,
) -> Result<Vec<T>, E> {
    reader.align_to_byte().map_err(E::from)?;
    let count = reader.read_varu32().map_err(E::from)? as usize;
    if count > max_items {
        return Err(E::from(BitError::TooManyItems { count, max_items }));
    }

    let mut items = Vec::with_capacity(count);
    for _ in 0..count {
        reader.align_to_byte().map_err(E::from)?;
        items.push(decode(reader)?);
    }
    Ok(items)
}
