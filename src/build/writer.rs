//! Big-endian binary writer shared by the font table encoders

use skrifa::raw::types::Tag;

#[derive(Debug, Clone, Default)]
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    pub fn u8(&mut self, value: u8) -> &mut Self {
        self.buf.push(value);
        self
    }

    pub fn u16(&mut self, value: u16) -> &mut Self {
        self.buf.extend_from_slice(&value.to_be_bytes());
        self
    }

    pub fn i16(&mut self, value: i16) -> &mut Self {
        self.buf.extend_from_slice(&value.to_be_bytes());
        self
    }

    pub fn u32(&mut self, value: u32) -> &mut Self {
        self.buf.extend_from_slice(&value.to_be_bytes());
        self
    }

    pub fn i32(&mut self, value: i32) -> &mut Self {
        self.buf.extend_from_slice(&value.to_be_bytes());
        self
    }

    pub fn i64(&mut self, value: i64) -> &mut Self {
        self.buf.extend_from_slice(&value.to_be_bytes());
        self
    }

    pub fn tag(&mut self, tag: Tag) -> &mut Self {
        self.buf.extend_from_slice(&tag.to_be_bytes());
        self
    }

    pub fn bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    /// Zero-pad to a multiple of four bytes
    pub fn pad4(&mut self) -> &mut Self {
        while self.buf.len() % 4 != 0 {
            self.buf.push(0);
        }
        self
    }

    /// Overwrite four bytes at `offset`
    pub fn patch_u32(&mut self, offset: usize, value: u32) {
        self.buf[offset..offset + 4].copy_from_slice(&value.to_be_bytes());
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }
}

/// OpenType table checksum: sum of big-endian u32 words, zero-padded
pub fn checksum(data: &[u8]) -> u32 {
    data.chunks(4).fold(0u32, |sum, chunk| {
        let mut word = [0u8; 4];
        word[..chunk.len()].copy_from_slice(chunk);
        sum.wrapping_add(u32::from_be_bytes(word))
    })
}

/// Length rounded up to a multiple of four
pub fn padded_len(len: usize) -> usize {
    (len + 3) & !3
}

/// `(searchRange, entrySelector, rangeShift)` for binary-searchable arrays
pub fn search_params(count: u16, unit: u16) -> (u16, u16, u16) {
    if count == 0 {
        return (0, 0, 0);
    }
    let entry_selector = 15 - count.leading_zeros() as u16;
    let search_range = (1u16 << entry_selector) * unit;
    let range_shift = count * unit - search_range;
    (search_range, entry_selector, range_shift)
}

/// Read helpers for parsing font binaries
pub fn read_u16(data: &[u8], offset: usize) -> Option<u16> {
    data.get(offset..offset + 2)
        .map(|b| u16::from_be_bytes([b[0], b[1]]))
}

pub fn read_u32(data: &[u8], offset: usize) -> Option<u32> {
    data.get(offset..offset + 4)
        .map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_big_endian() {
        let mut writer = ByteWriter::new();
        writer.u16(0x0102).i16(-2).u32(0x0A0B0C0D).tag(Tag::new(b"head"));
        assert_eq!(
            writer.as_slice(),
            &[1, 2, 0xFF, 0xFE, 0x0A, 0x0B, 0x0C, 0x0D, b'h', b'e', b'a', b'd']
        );
    }

    #[test]
    fn test_checksum_pads_tail() {
        assert_eq!(checksum(&[0, 0, 0, 1, 0, 0, 0, 2]), 3);
        assert_eq!(checksum(&[1]), 0x0100_0000);
        assert_eq!(checksum(&[0xFF, 0xFF, 0xFF, 0xFF, 0, 0, 0, 2]), 1);
    }

    #[test]
    fn test_search_params() {
        assert_eq!(search_params(10, 16), (128, 3, 32));
        assert_eq!(search_params(1, 16), (16, 0, 0));
        assert_eq!(search_params(4, 2), (8, 2, 0));
    }

    #[test]
    fn test_padding() {
        let mut writer = ByteWriter::new();
        writer.u8(1).pad4();
        assert_eq!(writer.len(), 4);
        assert_eq!(padded_len(5), 8);
        assert_eq!(padded_len(8), 8);
    }
}
