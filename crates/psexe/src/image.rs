//! Flattening of loadable segments into one contiguous memory image.

use psx_elf::Segment;

use crate::error::ConvertError;

/// Block size the PS1 BIOS loads executables in; the image is padded to a
/// multiple of it.
pub const EXE_ALIGNMENT: usize = 2048;

/// A contiguous memory image starting at `start_address`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatImage {
    /// Address of the first byte of `data`.
    pub start_address: u32,
    /// Image contents; bytes not covered by any segment are zero.
    pub data: Vec<u8>,
}

impl FlatImage {
    /// Length of the image in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the image holds no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Address one past the last byte of the image.
    #[must_use]
    pub fn end_address(&self) -> u64 {
        u64::from(self.start_address) + self.data.len() as u64
    }

    /// Pads the image with zeros to a multiple of `alignment` bytes.
    pub fn align(&mut self, alignment: usize) {
        align_to_multiple(&mut self.data, alignment);
    }
}

/// Appends zero bytes until `data.len()` is a multiple of `alignment`.
///
/// Nothing is appended when the length is already a multiple, including
/// when `data` is empty.
pub fn align_to_multiple(data: &mut Vec<u8>, alignment: usize) {
    let pad = alignment - data.len() % alignment;
    if pad < alignment {
        data.resize(data.len() + pad, 0);
    }
}

/// Merges `segments` into one zero-filled image spanning the lowest to the
/// highest address they cover.
///
/// With `strip_read_only`, segments that are neither writable nor
/// executable are dropped first and take no part in the address range.
/// Segments are copied in table order, so where two overlap the later one
/// wins; overlaps are logged as warnings.
///
/// # Errors
///
/// Returns [`ConvertError::EmptyInput`] if no segment remains, or
/// [`ConvertError::ImageTooLarge`] if the range exceeds `u32::MAX` bytes.
pub fn flatten(segments: &[Segment], strip_read_only: bool) -> Result<FlatImage, ConvertError> {
    let kept: Vec<&Segment> = segments
        .iter()
        .filter(|seg| {
            let strip = strip_read_only && seg.is_read_only();
            if strip {
                log::debug!(
                    "stripping read-only segment at {:#010x} ({} bytes)",
                    seg.address,
                    seg.data.len()
                );
            }
            !strip
        })
        .collect();

    let (Some(start), Some(end)) = (
        kept.iter().map(|seg| seg.address).min(),
        kept.iter().map(|seg| seg.end_address()).max(),
    ) else {
        return Err(ConvertError::EmptyInput {
            stripped: segments.len(),
        });
    };

    let size = end - u64::from(start);
    if size > u64::from(u32::MAX) {
        return Err(ConvertError::ImageTooLarge { size });
    }

    warn_overlaps(&kept);

    #[expect(clippy::cast_possible_truncation, reason = "size checked against u32::MAX")]
    let mut data = vec![0u8; size as usize];
    for seg in &kept {
        let offset = (seg.address - start) as usize;
        data[offset..offset + seg.data.len()].copy_from_slice(&seg.data);
        log::debug!(
            "placed segment at {:#010x} ({} bytes, {:?})",
            seg.address,
            seg.data.len(),
            seg.flags
        );
    }

    Ok(FlatImage {
        start_address: start,
        data,
    })
}

/// Logs every segment whose range intersects one that starts at or below it.
fn warn_overlaps(segments: &[&Segment]) {
    for (earlier, later, bytes) in find_overlaps(segments) {
        let winner = segments[earlier.max(later)].address;
        log::warn!(
            "segments at {:#010x} and {:#010x} overlap by {bytes} bytes; {winner:#010x} is written last",
            segments[earlier].address,
            segments[later].address,
        );
    }
}

/// Sweeps the ranges in address order against the one reaching furthest so
/// far, returning `(furthest, current, overlap_bytes)` index triples. Each
/// segment appears as `current` at most once.
fn find_overlaps(segments: &[&Segment]) -> Vec<(usize, usize, u64)> {
    let mut order: Vec<usize> = (0..segments.len()).collect();
    order.sort_by_key(|&i| segments[i].address);

    let mut overlaps = Vec::new();
    let mut reach: Option<usize> = None;
    for i in order {
        let current = segments[i];
        let Some(r) = reach else {
            reach = Some(i);
            continue;
        };

        let furthest = segments[r];
        let lo = u64::from(current.address);
        let hi = furthest.end_address().min(current.end_address());
        if lo < hi {
            overlaps.push((r, i, hi - lo));
        }
        if current.end_address() > furthest.end_address() {
            reach = Some(i);
        }
    }
    overlaps
}
