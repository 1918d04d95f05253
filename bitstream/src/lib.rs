//! Low-level bit packing primitives for tickrep.
//!
//! This crate provides [`BitWriter`] and [`BitReader`] for bit-level encoding
//! and decoding, plus the size-bounded batch-pack contract
//! ([`pack_to_size`]/[`unpack_all`]) used by the packed-list layer.
//!
//! # Design Principles
//!
//! - **No unsafe code** - Safety is paramount.
//! - **Bounded operations** - All reads are bounds-checked.
//! - **No domain knowledge** - This crate knows nothing about entities,
//!   deltas, or game state.
//! - **Explicit errors** - All failures return structured errors, never panic.
//!
//! # Example
//!
//! ```
//! use bitstream::{BitWriter, BitReader};
//!
//! let mut writer = BitWriter::new();
//! writer.write_bit(true);
//! writer.write_bits(42, 7).unwrap();
//!
//! let bytes = writer.finish();
//!
//! let mut reader = BitReader::new(&bytes);
//! assert_eq!(reader.read_bit().unwrap(), true);
//! assert_eq!(reader.read_bits(7).unwrap(), 42);
//! ```

mod error;
mod pack;
mod reader;
mod writer;

pub use error::{BitError, BitResult};
pub use pack::{pack_to_size, unpack_all};
pub use reader::BitReader;
pub use writer::{varu32_len, BitWriter};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_roundtrip() {
        let writer = BitWriter::new();
        let bytes = writer.finish();
        assert!(bytes.is_empty());

        let reader = BitReader::new(&bytes);
        assert!(reader.is_empty());
    }

    #[test]
    fn mixed_roundtrip() {
        let mut writer = BitWriter::new();
        writer.write_bit(true);
        writer.write_bits(0b1010, 4).unwrap();
        writer.write_bit(false);
        writer.align_to_byte();
        writer.write_varu32(300).unwrap();
        writer.write_string("tick").unwrap();
        let bytes = writer.finish();

        let mut reader = BitReader::new(&bytes);
        assert!(reader.read_bit().unwrap());
        assert_eq!(reader.read_bits(4).unwrap(), 0b1010);
        assert!(!reader.read_bit().unwrap());
        reader.align_to_byte().unwrap();
        assert_eq!(reader.read_varu32().unwrap(), 300);
        assert_eq!(reader.read_string().unwrap(), "tick");
    }
}
