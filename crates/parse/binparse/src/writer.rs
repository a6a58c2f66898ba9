//! Growable little-endian byte sink.

use alloc::vec::Vec;

use crate::Record;

/// Appends little-endian scalars and fixed-width fields to a byte buffer.
#[derive(Debug, Clone, Default)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    /// Creates an empty writer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty writer with room for `capacity` bytes.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Number of bytes written so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns `true` if nothing has been written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Consumes the writer and returns the written bytes.
    #[must_use]
    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }

    /// Appends a single byte.
    pub fn u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    /// Appends a little-endian `u16`.
    pub fn u16_le(&mut self, value: u16) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Appends a little-endian `u32`.
    pub fn u32_le(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Appends raw bytes.
    pub fn bytes(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Appends `len` zero bytes.
    pub fn zeros(&mut self, len: usize) {
        self.buf.resize(self.buf.len() + len, 0);
    }

    /// Appends a fixed-width field of exactly `capacity` bytes.
    ///
    /// At most `capacity` bytes of `data` are copied and the remainder of the
    /// field is zero-filled. Returns the number of bytes of `data` that did
    /// not fit.
    pub fn fixed(&mut self, data: &[u8], capacity: usize) -> usize {
        let kept = data.len().min(capacity);
        self.buf.extend_from_slice(&data[..kept]);
        self.zeros(capacity - kept);
        data.len() - kept
    }

    /// Appends an encoded [`Record`].
    pub fn record<R: Record>(&mut self, record: &R) {
        let start = self.buf.len();
        record.encode(self);
        debug_assert_eq!(self.buf.len() - start, R::SIZE, "record encoded a wrong size");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_little_endian_scalars() {
        let mut w = Writer::new();
        w.u8(0x01);
        w.u16_le(0x1234);
        w.u32_le(0x1234_5678);
        assert_eq!(w.into_inner(), [0x01, 0x34, 0x12, 0x78, 0x56, 0x34, 0x12]);
    }

    #[test]
    fn fixed_field_pads_with_zeros() {
        let mut w = Writer::new();
        let dropped = w.fixed(b"abc", 6);
        assert_eq!(dropped, 0);
        assert_eq!(w.into_inner(), b"abc\0\0\0");
    }

    #[test]
    fn fixed_field_truncates_and_reports() {
        let mut w = Writer::new();
        let dropped = w.fixed(b"abcdef", 4);
        assert_eq!(dropped, 2);
        assert_eq!(w.into_inner(), b"abcd");
    }

    #[test]
    fn zeros_and_len() {
        let mut w = Writer::with_capacity(8);
        assert!(w.is_empty());
        w.zeros(5);
        w.bytes(&[1, 2]);
        assert_eq!(w.len(), 7);
        assert_eq!(w.into_inner(), [0, 0, 0, 0, 0, 1, 2]);
    }
}
