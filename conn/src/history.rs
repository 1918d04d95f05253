//! Retained snapshot history for delta-basis selection.

use std::num::NonZeroUsize;

use wire::{EntityId, Tick};

/// One captured snapshot: every replicated entity's state at a tick.
pub type Snapshot<S> = Vec<(EntityId, S)>;

/// Errors that can occur when inserting into the history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryError {
    /// Ticks must be strictly increasing.
    OutOfOrder {
        /// The newest retained tick.
        last_tick: Tick,
        /// The offending tick.
        new_tick: Tick,
    },
}

/// A fixed-capacity ring of snapshots keyed by strictly-increasing tick.
///
/// When full, inserting overwrites the oldest entry; a peer whose acked
/// tick has been evicted falls back to full-state deltas until it acks a
/// retained tick again.
#[derive(Debug)]
pub struct SnapshotHistory<S> {
    entries: Vec<Option<Entry<S>>>,
    head: usize,
    len: usize,
    last_tick: Option<Tick>,
}

#[derive(Debug)]
struct Entry<S> {
    tick: Tick,
    snapshot: Snapshot<S>,
}

impl<S> SnapshotHistory<S> {
    /// Creates an empty history with the given capacity.
    #[must_use]
    pub fn new(capacity: NonZeroUsize) -> Self {
        let cap = capacity.get();
        let mut entries = Vec::with_capacity(cap);
        entries.resize_with(cap, || None);
        Self {
            entries,
            head: 0,
            len: 0,
            last_tick: None,
        }
    }

    /// Number of retained snapshots.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether no snapshot is retained.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Inserts a snapshot at `tick`, evicting the oldest entry when full.
    pub fn insert(&mut self, tick: Tick, snapshot: Snapshot<S>) -> Result<(), HistoryError> {
        if let Some(last) = self.last_tick {
            if tick <= last {
                return Err(HistoryError::OutOfOrder {
                    last_tick: last,
                    new_tick: tick,
                });
            }
        }

        let cap = self.entries.len();
        if self.len < cap {
            let index = (self.head + self.len) % cap;
            self.entries[index] = Some(Entry { tick, snapshot });
            self.len += 1;
        } else {
            self.entries[self.head] = Some(Entry { tick, snapshot });
            self.head = (self.head + 1) % cap;
        }
        self.last_tick = Some(tick);
        Ok(())
    }

    /// The snapshot captured at exactly `tick`, if still retained.
    #[must_use]
    pub fn get(&self, tick: Tick) -> Option<&[(EntityId, S)]> {
        self.iter()
            .find(|entry| entry.tick == tick)
            .map(|entry| entry.snapshot.as_slice())
    }

    /// The newest retained snapshot.
    #[must_use]
    pub fn latest(&self) -> Option<(Tick, &[(EntityId, S)])> {
        if self.len == 0 {
            return None;
        }
        let index = (self.head + self.len - 1) % self.entries.len();
        self.entries[index]
            .as_ref()
            .map(|entry| (entry.tick, entry.snapshot.as_slice()))
    }

    /// Drops every retained snapshot and forgets the tick watermark.
    pub fn clear(&mut self) {
        for entry in &mut self.entries {
            *entry = None;
        }
        self.head = 0;
        self.len = 0;
        self.last_tick = None;
    }

    fn iter(&self) -> impl Iterator<Item = &Entry<S>> {
        let cap = self.entries.len();
        (0..self.len).filter_map(move |offset| self.entries[(self.head + offset) % cap].as_ref())
    }
}
