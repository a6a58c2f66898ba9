//! Fixed-layout binary record decoding and encoding.
//!
//! Binary formats such as ELF and the PS-X EXE header are sequences of
//! fixed-size records made of little-endian scalars and fixed-width byte
//! fields. This crate provides a bounds-checked [`Reader`] cursor, a growable
//! [`Writer`] and the [`Record`] trait tying both together, so each format
//! describes its layout once instead of doing offset arithmetic per field.
//!
//! # Usage
//!
//! ```
//! use psx_binparse::{DecodeError, Reader, Record, Writer};
//!
//! #[derive(Debug, PartialEq)]
//! struct Pair {
//!     tag: u16,
//!     value: u32,
//! }
//!
//! impl Record for Pair {
//!     const SIZE: usize = 8;
//!
//!     fn decode(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
//!         let tag = r.u16_le()?;
//!         r.skip(2)?;
//!         let value = r.u32_le()?;
//!         Ok(Self { tag, value })
//!     }
//!
//!     fn encode(&self, w: &mut Writer) {
//!         w.u16_le(self.tag);
//!         w.zeros(2);
//!         w.u32_le(self.value);
//!     }
//! }
//!
//! let bytes = psx_binparse::encode(&Pair { tag: 1, value: 0xdead_beef });
//! assert_eq!(bytes.len(), Pair::SIZE);
//! assert_eq!(psx_binparse::decode::<Pair>(&bytes, 0), Ok(Pair { tag: 1, value: 0xdead_beef }));
//! ```

#![cfg_attr(not(test), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

pub mod reader;
pub mod writer;

use alloc::vec::Vec;

pub use reader::{DecodeError, Reader};
pub use writer::Writer;

/// A fixed-size binary record.
///
/// Implementations must consume exactly [`Record::SIZE`] bytes in
/// [`Record::decode`] and produce exactly [`Record::SIZE`] bytes in
/// [`Record::encode`].
pub trait Record: Sized {
    /// Encoded size of the record in bytes.
    const SIZE: usize;

    /// Decodes the record from the reader's current position.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] if the reader runs out of data or a field
    /// holds a value the record cannot represent.
    fn decode(r: &mut Reader<'_>) -> Result<Self, DecodeError>;

    /// Appends the encoded record to `w`.
    fn encode(&self, w: &mut Writer);
}

/// Decodes a record of type `R` located at `offset` in `data`.
///
/// # Errors
///
/// Returns [`DecodeError::Truncated`] if `data` does not hold `R::SIZE` bytes
/// at `offset`, or whatever error `R::decode` reports.
pub fn decode<R: Record>(data: &[u8], offset: usize) -> Result<R, DecodeError> {
    let mut r = Reader::at(data, offset)?;
    r.record()
}

/// Encodes `record` into a freshly allocated buffer of `R::SIZE` bytes.
#[must_use]
pub fn encode<R: Record>(record: &R) -> Vec<u8> {
    let mut w = Writer::with_capacity(R::SIZE);
    w.record(record);
    w.into_inner()
}
