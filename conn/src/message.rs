//! Event and command messages.
//!
//! Events and commands carry self-describing tagged value lists, so their
//! shape is free-form per application message kind. Events are best-effort
//! reliable: each send decrements an attempt counter and the event stays
//! pending until delivered attempts are exhausted. Commands are sent once.

use bitstream::{BitError, BitReader, BitWriter};
use packed::Poolable;
use state::{StateResult, WireValue};
use wire::{EntityId, Tick};

/// Most values one event or command may carry.
pub const MAX_MESSAGE_VALUES: usize = 64;

/// An application-defined notification, host to client or client to host.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Event {
    /// Application-defined event kind.
    pub kind: u16,
    /// Sender tick the event was raised at.
    pub tick: Tick,
    /// Tagged payload values.
    pub values: Vec<WireValue>,
    /// Remaining send attempts; local bookkeeping, never on the wire.
    pub attempts_left: u8,
}

impl Poolable for Event {
    fn reset(&mut self) {
        self.kind = 0;
        self.tick = Tick::START;
        self.values.clear();
        self.attempts_left = 0;
    }
}

impl Event {
    /// Encodes the event.
    pub fn encode(&self, writer: &mut BitWriter) -> StateResult<()> {
        writer.align_to_byte();
        writer.write_u16_aligned(self.kind)?;
        writer.write_varu32(self.tick.raw())?;
        encode_values(&self.values, writer)
    }

    /// Decodes an event into a recycled buffer.
    pub fn decode_into(&mut self, reader: &mut BitReader<'_>) -> StateResult<()> {
        self.reset();
        reader.align_to_byte()?;
        self.kind = reader.read_u16_aligned()?;
        self.tick = Tick::new(reader.read_varu32()?);
        decode_values(&mut self.values, reader)
    }
}

/// A client's input for one tick, addressed to one entity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Command {
    /// The entity this command steers.
    pub entity: EntityId,
    /// Client tick the command was issued at.
    pub tick: Tick,
    /// Tagged payload values.
    pub values: Vec<WireValue>,
}

impl Poolable for Command {
    fn reset(&mut self) {
        self.entity = EntityId::new(0);
        self.tick = Tick::START;
        self.values.clear();
    }
}

impl Command {
    /// Encodes the command.
    pub fn encode(&self, writer: &mut BitWriter) -> StateResult<()> {
        writer.align_to_byte();
        writer.write_varu32(self.entity.raw())?;
        writer.write_varu32(self.tick.raw())?;
        encode_values(&self.values, writer)
    }

    /// Decodes a command into a recycled buffer.
    pub fn decode_into(&mut self, reader: &mut BitReader<'_>) -> StateResult<()> {
        self.reset();
        reader.align_to_byte()?;
        self.entity = EntityId::new(reader.read_varu32()?);
        self.tick = Tick::new(reader.read_varu32()?);
        decode_values(&mut self.values, reader)
    }
}

fn encode_values(values: &[WireValue], writer: &mut BitWriter) -> StateResult<()> {
    // Enforced on both sides: a list the receiver would reject never
    // reaches the wire.
    if values.len() > MAX_MESSAGE_VALUES {
        return Err(BitError::TooManyItems {
            count: values.len(),
            max_items: MAX_MESSAGE_VALUES,
        }
        .into());
    }
    writer.write_varu32(values.len() as u32)?;
    for value in values {
        value.encode_tagged(writer)?;
    }
    Ok(())
}

fn decode_values(values: &mut Vec<WireValue>, reader: &mut BitReader<'_>) -> StateResult<()> {
    let count = reader.read_varu32()? as usize;
    if count > MAX_MESSAGE_VALUES {
        return Err(BitError::TooManyItems {
            count,
            max_items: MAX_MESSAGE_VALUES,
        }
        .into());
    }
    for _ in 0..count {
        values.push(WireValue::decode_tagged(reader)?);
    }
    Ok(())
}
