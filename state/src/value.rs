//! Tagged wire values.
//!
//! Every replicated member, event argument, and command argument is one of a
//! small closed set of value kinds. The tagged form (`encode_tagged`) carries
//! the kind on the wire and is used for event and command payloads whose
//! shape the receiver cannot know in advance; the untagged form relies on a
//! shared descriptor to supply the type.

use bitstream::{BitReader, BitResult, BitWriter};

use crate::error::{StateError, StateResult};

/// The closed set of replicable value kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum WireType {
    /// Unsigned 8-bit integer.
    Byte = 0,
    /// Unsigned 16-bit integer.
    UShort = 1,
    /// Unsigned 32-bit integer, varint-encoded.
    UInt = 2,
    /// Signed 32-bit integer, zigzag varint-encoded.
    Int = 3,
    /// Single-bit boolean.
    Bool = 4,
    /// Length-prefixed UTF-8 string.
    Str = 5,
}

impl WireType {
    /// Parses a raw tag byte.
    #[must_use]
    pub const fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::Byte),
            1 => Some(Self::UShort),
            2 => Some(Self::UInt),
            3 => Some(Self::Int),
            4 => Some(Self::Bool),
            5 => Some(Self::Str),
            _ => None,
        }
    }

    /// The tag byte for this type.
    #[must_use]
    pub const fn tag(self) -> u8 {
        self as u8
    }
}

/// A single replicated value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireValue {
    /// Unsigned 8-bit integer.
    Byte(u8),
    /// Unsigned 16-bit integer.
    UShort(u16),
    /// Unsigned 32-bit integer.
    UInt(u32),
    /// Signed 32-bit integer.
    Int(i32),
    /// Boolean.
    Bool(bool),
    /// UTF-8 string.
    Str(String),
}

impl WireValue {
    /// The wire type of this value.
    #[must_use]
    pub const fn wire_type(&self) -> WireType {
        match self {
            Self::Byte(_) => WireType::Byte,
            Self::UShort(_) => WireType::UShort,
            Self::UInt(_) => WireType::UInt,
            Self::Int(_) => WireType::Int,
            Self::Bool(_) => WireType::Bool,
            Self::Str(_) => WireType::Str,
        }
    }

    /// Encodes the value without a type tag.
    ///
    /// Booleans take a single bit; every other kind aligns to a byte
    /// boundary first.
    pub fn encode(&self, writer: &mut BitWriter) -> BitResult<()> {
        match self {
            Self::Bool(value) => {
                writer.write_bit(*value);
                Ok(())
            }
            Self::Byte(value) => {
                writer.align_to_byte();
                writer.write_u8_aligned(*value)
            }
            Self::UShort(value) => {
                writer.align_to_byte();
                writer.write_u16_aligned(*value)
            }
            Self::UInt(value) => {
                writer.align_to_byte();
                writer.write_varu32(*value)
            }
            Self::Int(value) => {
                writer.align_to_byte();
                writer.write_vars32(*value)
            }
            Self::Str(value) => {
                writer.align_to_byte();
                writer.write_string(value)
            }
        }
    }

    /// Decodes an untagged value of a known type.
    pub fn decode(reader: &mut BitReader<'_>, wire_type: WireType) -> BitResult<Self> {
        match wire_type {
            WireType::Bool => Ok(Self::Bool(reader.read_bit()?)),
            WireType::Byte => {
                reader.align_to_byte()?;
                Ok(Self::Byte(reader.read_u8_aligned()?))
            }
            WireType::UShort => {
                reader.align_to_byte()?;
                Ok(Self::UShort(reader.read_u16_aligned()?))
            }
            WireType::UInt => {
                reader.align_to_byte()?;
                Ok(Self::UInt(reader.read_varu32()?))
            }
            WireType::Int => {
                reader.align_to_byte()?;
                Ok(Self::Int(reader.read_vars32()?))
            }
            WireType::Str => {
                reader.align_to_byte()?;
                Ok(Self::Str(reader.read_string()?))
            }
        }
    }

    /// Encodes the value preceded by its type tag.
    pub fn encode_tagged(&self, writer: &mut BitWriter) -> BitResult<()> {
        writer.align_to_byte();
        writer.write_u8_aligned(self.wire_type().tag())?;
        self.encode(writer)
    }

    /// Decodes a tag byte followed by the value it announces.
    pub fn decode_tagged(reader: &mut BitReader<'_>) -> StateResult<Self> {
        reader.align_to_byte()?;
        let tag = reader.read_u8_aligned()?;
        let wire_type =
            WireType::from_tag(tag).ok_or(StateError::UnknownWireTag { tag })?;
        Ok(Self::decode(reader, wire_type)?)
    }
}
