//! Bit-level writer for encoding packed binary data.

use crate::error::{BitError, BitResult};

/// A bit-level writer for encoding packed binary data.
///
/// Bits are packed MSB-first within each byte. Writes accumulate in an
/// internal buffer; call [`finish`](Self::finish) to get the final bytes.
#[derive(Debug, Default)]
pub struct BitWriter {
    /// The accumulated bytes.
    bytes: Vec<u8>,
    /// Current byte being written (not yet pushed to bytes).
    current_byte: u8,
    /// Number of bits written to `current_byte` (0-7).
    bit_count: u8,
}

impl BitWriter {
    /// Creates a new empty `BitWriter`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new `BitWriter` with pre-allocated capacity.
    #[must_use]
    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(bytes),
            current_byte: 0,
            bit_count: 0,
        }
    }

    /// Returns the number of bits written so far.
    #[must_use]
    pub fn bits_written(&self) -> usize {
        self.bytes.len() * 8 + self.bit_count as usize
    }

    /// Returns the number of bytes the finished buffer will occupy.
    #[must_use]
    pub fn bytes_written(&self) -> usize {
        self.bytes.len() + usize::from(self.bit_count > 0)
    }

    /// Writes a single bit.
    pub fn write_bit(&mut self, value: bool) {
        self.current_byte = (self.current_byte << 1) | u8::from(value);
        self.bit_count += 1;
        if self.bit_count == 8 {
            self.bytes.push(self.current_byte);
            self.current_byte = 0;
            self.bit_count = 0;
        }
    }

    /// Writes up to 64 bits from an unsigned integer, MSB first.
    ///
    /// # Errors
    ///
    /// Returns [`BitError::InvalidBitCount`] if `bits > 64`.
    /// Returns [`BitError::ValueOutOfRange`] if `value` doesn't fit in `bits`.
    pub fn write_bits(&mut self, value: u64, bits: u8) -> BitResult<()> {
        if bits > 64 {
            return Err(BitError::InvalidBitCount { bits, max_bits: 64 });
        }
        if bits == 0 {
            return Ok(());
        }
        if bits < 64 && value >= (1u64 << bits) {
            return Err(BitError::ValueOutOfRange { value, bits });
        }

        for i in (0..bits).rev() {
            self.write_bit((value >> i) & 1 == 1);
        }
        Ok(())
    }

    /// Pads the current byte with zero bits up to the next byte boundary.
    pub fn align_to_byte(&mut self) {
        while self.bit_count != 0 {
            self.write_bit(false);
        }
    }

    /// Writes a byte-aligned `u8`.
    pub fn write_u8_aligned(&mut self, value: u8) -> BitResult<()> {
        self.ensure_aligned()?;
        self.bytes.push(value);
        Ok(())
    }

    /// Writes a byte-aligned `u16` (little-endian).
    pub fn write_u16_aligned(&mut self, value: u16) -> BitResult<()> {
        self.write_aligned_bytes(&value.to_le_bytes())
    }

    /// Writes a byte-aligned `u32` (little-endian).
    pub fn write_u32_aligned(&mut self, value: u32) -> BitResult<()> {
        self.write_aligned_bytes(&value.to_le_bytes())
    }

    /// Writes a byte-aligned `u64` (little-endian).
    pub fn write_u64_aligned(&mut self, value: u64) -> BitResult<()> {
        self.write_aligned_bytes(&value.to_le_bytes())
    }

    /// Writes a byte-aligned raw byte slice.
    pub fn write_bytes_aligned(&mut self, bytes: &[u8]) -> BitResult<()> {
        self.write_aligned_bytes(bytes)
    }

    /// Writes a byte-aligned varint `u32` (LEB128, at most 5 bytes).
    pub fn write_varu32(&mut self, mut value: u32) -> BitResult<()> {
        self.ensure_aligned()?;
        loop {
            let mut byte = (value & 0x7F) as u8;
            value >>= 7;
            if value != 0 {
                byte |= 0x80;
            }
            self.bytes.push(byte);
            if value == 0 {
                return Ok(());
            }
        }
    }

    /// Writes a byte-aligned zigzag varint `i32`.
    pub fn write_vars32(&mut self, value: i32) -> BitResult<()> {
        let encoded = ((value << 1) ^ (value >> 31)) as u32;
        self.write_varu32(encoded)
    }

    /// Writes a byte-aligned length-prefixed UTF-8 string.
    pub fn write_string(&mut self, value: &str) -> BitResult<()> {
        self.ensure_aligned()?;
        self.write_varu32(value.len() as u32)?;
        self.bytes.extend_from_slice(value.as_bytes());
        Ok(())
    }

    /// Finishes writing and returns the byte buffer.
    ///
    /// If the last byte is incomplete, it is padded with zeros on the right.
    #[must_use]
    pub fn finish(mut self) -> Vec<u8> {
        if self.bit_count > 0 {
            self.current_byte <<= 8 - self.bit_count;
            self.bytes.push(self.current_byte);
        }
        self.bytes
    }

    fn ensure_aligned(&self) -> BitResult<()> {
        if self.bit_count != 0 {
            return Err(BitError::MisalignedAccess {
                bit_position: self.bits_written(),
            });
        }
        Ok(())
    }

    fn write_aligned_bytes(&mut self, bytes: &[u8]) -> BitResult<()> {
        self.ensure_aligned()?;
        self.bytes.extend_from_slice(bytes);
        Ok(())
    }
}

/// Returns the number of bytes a varint `u32` encoding occupies.
#[must_use]
pub fn varu32_len(mut value: u32) -> usize {
    let mut len = 1;
    while value >= 0x80 {
        value >>= 7;
        len += 1;
    }
    len
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_writer() {
        let writer = BitWriter::new();
        assert_eq!(writer.bits_written(), 0);
        assert_eq!(writer.bytes_written(), 0);
        assert!(writer.finish().is_empty());
    }

    #[test]
    fn write_single_bit_true() {
        let mut writer = BitWriter::new();
        writer.write_bit(true);
        assert_eq!(writer.bits_written(), 1);
        assert_eq!(writer.bytes_written(), 1);
        // Single bit 1, padded with 7 zeros = 0b1000_0000
        assert_eq!(writer.finish(), vec![0b1000_0000]);
    }

    #[test]
    fn write_bits_across_byte_boundary() {
        let mut writer = BitWriter::new();
        writer.write_bits(0b1111, 4).unwrap();
        writer.write_bits(0b1010_1010, 8).unwrap();
        // 1111 + 10101010 = 1111_1010 1010_0000
        assert_eq!(writer.finish(), vec![0b1111_1010, 0b1010_0000]);
    }

    #[test]
    fn write_bits_invalid_count() {
        let mut writer = BitWriter::new();
        let result = writer.write_bits(0, 65);
        assert!(matches!(
            result,
            Err(BitError::InvalidBitCount {
                bits: 65,
                max_bits: 64
            })
        ));
    }

    #[test]
    fn write_bits_value_out_of_range() {
        let mut writer = BitWriter::new();
        // 256 does not fit in 8 bits
        let result = writer.write_bits(256, 8);
        assert!(matches!(
            result,
            Err(BitError::ValueOutOfRange {
                value: 256,
                bits: 8
            })
        ));
    }

    #[test]
    fn write_bits_64_bits() {
        let mut writer = BitWriter::new();
        writer.write_bits(u64::MAX, 64).unwrap();
        assert_eq!(writer.finish(), vec![0xFF; 8]);
    }

    #[test]
    fn align_pads_with_zeros() {
        let mut writer = BitWriter::new();
        writer.write_bit(true);
        writer.align_to_byte();
        assert_eq!(writer.bits_written(), 8);
        writer.write_u8_aligned(0xAB).unwrap();
        assert_eq!(writer.finish(), vec![0b1000_0000, 0xAB]);
    }

    #[test]
    fn align_is_idempotent() {
        let mut writer = BitWriter::new();
        writer.align_to_byte();
        writer.align_to_byte();
        assert_eq!(writer.bits_written(), 0);
    }

    #[test]
    fn aligned_write_fails_when_misaligned() {
        let mut writer = BitWriter::new();
        writer.write_bit(true);
        let err = writer.write_u32_aligned(1).unwrap_err();
        assert!(matches!(err, BitError::MisalignedAccess { bit_position: 1 }));
    }

    #[test]
    fn write_u32_aligned_little_endian() {
        let mut writer = BitWriter::new();
        writer.write_u32_aligned(0x1234_5678).unwrap();
        assert_eq!(writer.finish(), vec![0x78, 0x56, 0x34, 0x12]);
    }

    #[test]
    fn write_varu32_single_byte() {
        let mut writer = BitWriter::new();
        writer.write_varu32(127).unwrap();
        assert_eq!(writer.finish(), vec![0x7F]);
    }

    #[test]
    fn write_varu32_multi_byte() {
        let mut writer = BitWriter::new();
        writer.write_varu32(300).unwrap();
        assert_eq!(writer.finish(), vec![0xAC, 0x02]);
    }

    #[test]
    fn write_vars32_negative_one() {
        let mut writer = BitWriter::new();
        writer.write_vars32(-1).unwrap();
        assert_eq!(writer.finish(), vec![0x01]);
    }

    #[test]
    fn write_string_length_prefixed() {
        let mut writer = BitWriter::new();
        writer.write_string("hi").unwrap();
        assert_eq!(writer.finish(), vec![2, b'h', b'i']);
    }

    #[test]
    fn write_empty_string() {
        let mut writer = BitWriter::new();
        writer.write_string("").unwrap();
        assert_eq!(writer.finish(), vec![0]);
    }

    #[test]
    fn varu32_len_boundaries() {
        assert_eq!(varu32_len(0), 1);
        assert_eq!(varu32_len(127), 1);
        assert_eq!(varu32_len(128), 2);
        assert_eq!(varu32_len(16_383), 2);
        assert_eq!(varu32_len(16_384), 3);
        assert_eq!(varu32_len(u32::MAX), 5);
    }
}
