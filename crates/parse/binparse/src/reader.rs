//! Bounds-checked little-endian byte cursor.

use core::fmt;

use crate::Record;

/// Errors that can occur while decoding a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// Fewer bytes were available than the read required.
    Truncated {
        /// Offset into the underlying buffer where the read started.
        offset: usize,
        /// Number of bytes the read required.
        needed: usize,
        /// Number of bytes left in the buffer at `offset`.
        available: usize,
    },
    /// A field held a value the record does not accept.
    InvalidValue {
        /// Offset of the offending field.
        offset: usize,
        /// Short description of the field.
        field: &'static str,
    },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Truncated {
                offset,
                needed,
                available,
            } => write!(
                f,
                "input truncated at offset {offset:#x}: needed {needed} bytes, {available} available"
            ),
            Self::InvalidValue { offset, field } => {
                write!(f, "invalid {field} at offset {offset:#x}")
            }
        }
    }
}

impl core::error::Error for DecodeError {}

/// A forward-only cursor over a byte slice.
///
/// All multi-byte reads are little-endian. Every read checks the remaining
/// length first and leaves the cursor untouched on failure.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    /// Creates a reader positioned at the start of `data`.
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Creates a reader positioned at `offset` within `data`.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Truncated`] if `offset` lies past the end of
    /// `data`.
    pub fn at(data: &'a [u8], offset: usize) -> Result<Self, DecodeError> {
        if offset > data.len() {
            return Err(DecodeError::Truncated {
                offset,
                needed: 0,
                available: 0,
            });
        }
        Ok(Self { data, pos: offset })
    }

    /// Current offset into the underlying buffer.
    #[must_use]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Number of bytes left to read.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Fails unless at least `needed` bytes remain.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Truncated`] describing the shortfall.
    pub fn ensure(&self, needed: usize) -> Result<(), DecodeError> {
        if self.remaining() < needed {
            return Err(DecodeError::Truncated {
                offset: self.pos,
                needed,
                available: self.remaining(),
            });
        }
        Ok(())
    }

    /// Returns the next `len` bytes and advances past them.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Truncated`] if fewer than `len` bytes remain.
    pub fn bytes(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        self.ensure(len)?;
        let out = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(out)
    }

    /// Reads a fixed-size byte array.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Truncated`] if fewer than `N` bytes remain.
    pub fn array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        self.ensure(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(&self.data[self.pos..self.pos + N]);
        self.pos += N;
        Ok(out)
    }

    /// Skips `len` bytes of padding or unused fields.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Truncated`] if fewer than `len` bytes remain.
    pub fn skip(&mut self, len: usize) -> Result<(), DecodeError> {
        self.bytes(len).map(|_| ())
    }

    /// Reads a single byte.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Truncated`] at end of input.
    pub fn u8(&mut self) -> Result<u8, DecodeError> {
        self.array::<1>().map(|[b]| b)
    }

    /// Reads a little-endian `u16`.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Truncated`] if fewer than 2 bytes remain.
    pub fn u16_le(&mut self) -> Result<u16, DecodeError> {
        self.array().map(u16::from_le_bytes)
    }

    /// Reads a little-endian `u32`.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Truncated`] if fewer than 4 bytes remain.
    pub fn u32_le(&mut self) -> Result<u32, DecodeError> {
        self.array().map(u32::from_le_bytes)
    }

    /// Decodes a [`Record`] at the current position.
    ///
    /// The full `R::SIZE` bytes are checked up front, so a record either
    /// decodes completely or the cursor is left where it was.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Truncated`] if fewer than `R::SIZE` bytes
    /// remain, or the error reported by `R::decode`.
    pub fn record<R: Record>(&mut self) -> Result<R, DecodeError> {
        self.ensure(R::SIZE)?;
        let mut sub = Reader {
            data: &self.data[..self.pos + R::SIZE],
            pos: self.pos,
        };
        let record = R::decode(&mut sub)?;
        debug_assert_eq!(sub.pos, self.pos + R::SIZE, "record decoded a wrong size");
        self.pos += R::SIZE;
        Ok(record)
    }
}
