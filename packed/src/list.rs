//! Outbound and inbound message lists built on the batch-pack contract.
//!
//! [`PackedSender`] holds messages awaiting transmission and remembers which
//! of them made it into the last encoded batch. Sent messages are tracked as
//! indices into the pending list, so a message can never be freed twice: it
//! either leaves through [`PackedSender::drain_sent`] or through
//! [`PackedSender::clear`], never both.
//!
//! [`PackedReceiver`] is a FIFO queue of decoded messages. Items are decoded
//! into pool-acquired buffers and handed to the caller by value; the caller
//! returns each one to the pool once processed.

use std::collections::VecDeque;

use bitstream::{pack_to_size, unpack_all, BitError, BitReader, BitWriter};

use crate::pool::{Pool, Poolable};

/// Counts from one [`PackedSender::encode`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncodeOutcome {
    /// Messages that made it into the batch.
    pub packed: usize,
    /// Messages skipped because they exceeded the per-item byte limit.
    pub skipped: usize,
}

/// An ordered list of outbound messages with send-cycle tracking.
#[derive(Debug)]
pub struct PackedSender<T> {
    pending: Vec<T>,
    /// Ascending indices into `pending` for messages in the last batch.
    sent: Vec<usize>,
}

impl<T> PackedSender<T> {
    /// Creates an empty sender.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            pending: Vec::new(),
            sent: Vec::new(),
        }
    }

    /// Messages currently awaiting transmission.
    #[must_use]
    pub fn pending(&self) -> &[T] {
        &self.pending
    }

    /// Number of messages in the last encoded batch, not yet drained.
    #[must_use]
    pub fn sent_len(&self) -> usize {
        self.sent.len()
    }

    /// Appends a message to the end of the pending list.
    pub fn add_pending(&mut self, item: T) {
        self.pending.push(item);
    }

    /// Appends a batch of messages to the end of the pending list.
    pub fn extend_pending(&mut self, items: impl IntoIterator<Item = T>) {
        self.pending.extend(items);
    }

    /// Encodes as many pending messages as fit into the byte and count
    /// budgets.
    ///
    /// Packed messages stay in the pending list but are recorded as sent;
    /// call [`Self::drain_sent`] or [`Self::release_sent`] after the packet
    /// goes out. Messages larger than `max_item_bytes` are skipped and remain
    /// pending. `max_items` must match the bound the receiving side decodes
    /// with, or a full batch is rejected whole over there.
    ///
    /// # Panics
    ///
    /// Debug builds panic if the previous send cycle was never drained.
    pub fn encode<E: From<BitError>>(
        &mut self,
        writer: &mut BitWriter,
        max_total_bytes: usize,
        max_item_bytes: usize,
        max_items: usize,
        encode: impl FnMut(&T, &mut BitWriter) -> Result<(), E>,
    ) -> Result<EncodeOutcome, E> {
        debug_assert!(self.sent.is_empty(), "previous send cycle not drained");
        let mut outcome = EncodeOutcome::default();
        let sent = &mut self.sent;
        pack_to_size(
            writer,
            max_total_bytes,
            max_item_bytes,
            max_items,
            &self.pending,
            encode,
            |index| {
                sent.push(index);
                outcome.packed += 1;
            },
            |_| outcome.skipped += 1,
        )?;
        Ok(outcome)
    }

    /// Removes the sent messages from the pending list and returns them.
    ///
    /// Unsent messages keep their relative order. The caller decides each
    /// message's fate: recycle it, or put it back with
    /// [`Self::add_pending`] for another attempt.
    pub fn drain_sent(&mut self) -> Vec<T> {
        if self.sent.is_empty() {
            return Vec::new();
        }
        let sent_indices = std::mem::take(&mut self.sent);
        let pending = std::mem::take(&mut self.pending);
        let mut next_sent = sent_indices.iter().copied().peekable();
        let mut taken = Vec::with_capacity(sent_indices.len());
        for (index, item) in pending.into_iter().enumerate() {
            if next_sent.peek() == Some(&index) {
                next_sent.next();
                taken.push(item);
            } else {
                self.pending.push(item);
            }
        }
        taken
    }
}

impl<T: Poolable + Default> PackedSender<T> {
    /// Recycles every sent message; unsent messages stay pending.
    pub fn release_sent(&mut self, pool: &mut Pool<T>) {
        for item in self.drain_sent() {
            pool.release(item);
        }
    }

    /// Recycles every pending message, sent or not.
    pub fn clear(&mut self, pool: &mut Pool<T>) {
        self.sent.clear();
        for item in self.pending.drain(..) {
            pool.release(item);
        }
    }
}

impl<T> Default for PackedSender<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// A FIFO queue of inbound messages decoded from packed batches.
#[derive(Debug)]
pub struct PackedReceiver<T> {
    received: VecDeque<T>,
}

impl<T> PackedReceiver<T> {
    /// Creates an empty receiver.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            received: VecDeque::new(),
        }
    }

    /// Number of queued messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.received.len()
    }

    /// Whether the queue is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.received.is_empty()
    }

    /// Takes the oldest queued message, transferring ownership to the caller.
    pub fn pop(&mut self) -> Option<T> {
        self.received.pop_front()
    }

    /// Takes every queued message in arrival order.
    pub fn drain(&mut self) -> impl Iterator<Item = T> + '_ {
        self.received.drain(..)
    }

    /// Drops every queued message.
    ///
    /// Ownership of decoded messages passes downstream via [`Self::pop`] or
    /// [`Self::drain`]; anything still queued at teardown is simply dropped.
    pub fn clear(&mut self) {
        self.received.clear();
    }
}

impl<T: Poolable + Default> PackedReceiver<T> {
    /// Decodes a packed batch, appending each message to the queue.
    ///
    /// Buffers come from `pool`; `decode_into` fills one buffer from the
    /// reader. Returns the number of messages decoded.
    pub fn decode<E: From<BitError>>(
        &mut self,
        reader: &mut BitReader<'_>,
        max_items: usize,
        pool: &mut Pool<T>,
        mut decode_into: impl FnMut(&mut T, &mut BitReader<'_>) -> Result<(), E>,
    ) -> Result<usize, E> {
        let items = unpack_all::<_, E>(reader, max_items, |r| {
            let mut item = pool.acquire();
            decode_into(&mut item, r)?;
            Ok(item)
        })?;
        let count = items.len();
        self.received.extend(items);
        Ok(count)
    }
}

impl<T> Default for PackedReceiver<T> {
    fn default() -> Self {
        Self::new()
    }
}
