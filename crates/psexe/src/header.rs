//! PS-X EXE header layout.
//!
//! The header is a fixed 2048-byte record read by the PS1 BIOS before it
//! copies the image to RAM:
//!
//! | Offset  | Size | Field                          |
//! |---------|------|--------------------------------|
//! | `0x000` | 16   | `"PS-X EXE"`, zero padded      |
//! | `0x010` | 4    | entry point (`$pc`)            |
//! | `0x014` | 4    | initial `$gp`                  |
//! | `0x018` | 4    | load address                   |
//! | `0x01c` | 4    | image size                     |
//! | `0x020` | 16   | reserved                       |
//! | `0x030` | 4    | initial `$sp` (stack offset)   |
//! | `0x034` | 4    | stack size                     |
//! | `0x038` | 20   | reserved                       |
//! | `0x04c` | 1972 | region string, zero padded     |

use std::fmt;
use std::str::FromStr;

use psx_binparse::{DecodeError, Reader, Record, Writer};

use crate::error::ConvertError;

/// Magic string at the start of every PS-X EXE.
pub const EXE_MAGIC: &[u8; 8] = b"PS-X EXE";

/// Total size of the header in bytes.
pub const EXE_HEADER_SIZE: usize = 2048;

/// Width of the magic field.
const MAGIC_FIELD_SIZE: usize = 16;

/// Capacity of the region string field in bytes.
pub const REGION_CAPACITY: usize = 1972;

/// A region string restricted to printable ASCII.
///
/// Emulators read it to pick PAL or NTSC timing, so a licensed-looking
/// string such as `"Sony Computer Entertainment Inc. for Europe area"` is
/// what usually goes here. Strings longer than [`REGION_CAPACITY`] are kept
/// whole here; [`ExeHeader::new`] cuts them to fit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegionString(String);

impl RegionString {
    /// Validates `s` after trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::InvalidRegionString`] naming the first
    /// character outside `0x20..=0x7e`.
    pub fn new(s: &str) -> Result<Self, ConvertError> {
        let trimmed = s.trim();
        if let Some((position, character)) = trimmed
            .char_indices()
            .find(|&(_, c)| !(' '..='~').contains(&c))
        {
            return Err(ConvertError::InvalidRegionString {
                position,
                character,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// The validated string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if the string is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns `true` if packing the string into the header drops bytes.
    #[must_use]
    pub fn exceeds_capacity(&self) -> bool {
        self.0.len() > REGION_CAPACITY
    }

    /// Cuts the string to [`REGION_CAPACITY`] bytes.
    fn truncate_to_capacity(&mut self) {
        // Printable ASCII only, so every byte index is a char boundary.
        self.0.truncate(REGION_CAPACITY);
    }
}

impl FromStr for RegionString {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for RegionString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A PS-X EXE header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExeHeader {
    /// Initial program counter.
    pub entry_point: u32,
    /// Initial value of `$gp`.
    pub global_pointer: u32,
    /// Address the image is copied to.
    pub load_address: u32,
    /// Size of the image following the header, in bytes.
    pub image_size: u32,
    /// Initial value of `$sp`; zero keeps the BIOS default.
    pub stack_pointer: u32,
    /// Added to `stack_pointer` by the BIOS; always emitted as zero.
    pub stack_size: u32,
    /// Region string.
    pub region: RegionString,
}

impl Record for ExeHeader {
    const SIZE: usize = EXE_HEADER_SIZE;

    fn decode(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let offset = r.position();
        let magic: [u8; MAGIC_FIELD_SIZE] = r.array()?;
        if magic[..EXE_MAGIC.len()] != EXE_MAGIC[..] {
            return Err(DecodeError::InvalidValue {
                offset,
                field: "PS-X EXE magic",
            });
        }

        let entry_point = r.u32_le()?;
        let global_pointer = r.u32_le()?;
        let load_address = r.u32_le()?;
        let image_size = r.u32_le()?;
        r.skip(16)?;
        let stack_pointer = r.u32_le()?;
        let stack_size = r.u32_le()?;
        r.skip(20)?;

        let offset = r.position();
        let field = r.bytes(REGION_CAPACITY)?;
        let len = field.iter().position(|&b| b == 0).unwrap_or(field.len());
        let region = core::str::from_utf8(&field[..len])
            .ok()
            .and_then(|s| RegionString::new(s).ok())
            .ok_or(DecodeError::InvalidValue {
                offset,
                field: "region string",
            })?;

        Ok(Self {
            entry_point,
            global_pointer,
            load_address,
            image_size,
            stack_pointer,
            stack_size,
            region,
        })
    }

    fn encode(&self, w: &mut Writer) {
        w.fixed(EXE_MAGIC, MAGIC_FIELD_SIZE);
        w.u32_le(self.entry_point);
        w.u32_le(self.global_pointer);
        w.u32_le(self.load_address);
        w.u32_le(self.image_size);
        w.zeros(16);
        w.u32_le(self.stack_pointer);
        w.u32_le(self.stack_size);
        w.zeros(20);
        w.fixed(self.region.as_str().as_bytes(), REGION_CAPACITY);
    }
}

impl ExeHeader {
    /// Builds the header for an image of `image_size` bytes loaded at
    /// `load_address`. The stack size is always zero.
    ///
    /// `region` is trimmed and validated; a string longer than
    /// [`REGION_CAPACITY`] is cut to fit, with a warning, so the header
    /// always matches its packed form.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::InvalidRegionString`] if `region` is not
    /// printable ASCII once trimmed.
    pub fn new(
        entry_point: u32,
        global_pointer: u32,
        load_address: u32,
        image_size: u32,
        stack_pointer: u32,
        region: &str,
    ) -> Result<Self, ConvertError> {
        let mut region = RegionString::new(region)?;
        if region.exceeds_capacity() {
            let original = region.as_str().len();
            region.truncate_to_capacity();
            log::warn!("region string is {original} bytes long, truncating to {REGION_CAPACITY}");
        }

        Ok(Self {
            entry_point,
            global_pointer,
            load_address,
            image_size,
            stack_pointer,
            stack_size: 0,
            region,
        })
    }

    /// Parses the header at the start of a PS-X EXE.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] if `data` is shorter than the header, the
    /// magic does not match, or the region string is not printable ASCII.
    pub fn parse(data: &[u8]) -> Result<Self, DecodeError> {
        psx_binparse::decode(data, 0)
    }

    /// Packs the header into its 2048-byte representation.
    ///
    /// Only the first [`REGION_CAPACITY`] bytes of the region are written.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        psx_binparse::encode(self)
    }
}

/// Validates `region` and packs a header for an image of `image_length`
/// bytes loaded at `start_address`.
///
/// # Errors
///
/// Returns [`ConvertError::InvalidRegionString`] if `region` is not
/// printable ASCII once trimmed.
pub fn build_header(
    entry_point: u32,
    global_pointer: u32,
    start_address: u32,
    image_length: u32,
    stack_pointer: u32,
    region: &str,
) -> Result<Vec<u8>, ConvertError> {
    ExeHeader::new(
        entry_point,
        global_pointer,
        start_address,
        image_length,
        stack_pointer,
        region,
    )
    .map(|header| header.to_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ExeHeader {
        ExeHeader {
            entry_point: 0x8001_0000,
            global_pointer: 0x8003_8000,
            load_address: 0x8001_0000,
            image_size: 0x1_8000,
            stack_pointer: 0x801F_FFF0,
            stack_size: 0,
            region: RegionString::new("Sony Computer Entertainment Inc. for Europe area").unwrap(),
        }
    }

    #[test]
    fn header_is_2048_bytes() {
        assert_eq!(sample().to_bytes().len(), EXE_HEADER_SIZE);
        let empty = ExeHeader {
            region: RegionString::default(),
            ..sample()
        };
        assert_eq!(empty.to_bytes().len(), EXE_HEADER_SIZE);
    }

    #[test]
    fn fields_at_bios_offsets() {
        let bytes = sample().to_bytes();
        assert_eq!(&bytes[0x00..0x10], b"PS-X EXE\0\0\0\0\0\0\0\0");
        assert_eq!(&bytes[0x10..0x14], &0x8001_0000u32.to_le_bytes());
        assert_eq!(&bytes[0x14..0x18], &0x8003_8000u32.to_le_bytes());
        assert_eq!(&bytes[0x18..0x1c], &0x8001_0000u32.to_le_bytes());
        assert_eq!(&bytes[0x1c..0x20], &0x1_8000u32.to_le_bytes());
        assert!(bytes[0x20..0x30].iter().all(|&b| b == 0));
        assert_eq!(&bytes[0x30..0x34], &0x801F_FFF0u32.to_le_bytes());
        assert_eq!(&bytes[0x34..0x38], &[0; 4]);
        assert!(bytes[0x38..0x4c].iter().all(|&b| b == 0));
        assert!(bytes[0x4c..].starts_with(b"Sony Computer Entertainment Inc. for Europe area"));
    }

    #[test]
    fn pack_unpack_round_trip() {
        let header = sample();
        let bytes = header.to_bytes();
        assert_eq!(ExeHeader::parse(&bytes), Ok(header));

        let region_end = 0x4c + "Sony Computer Entertainment Inc. for Europe area".len();
        assert!(bytes[region_end..].iter().all(|&b| b == 0));
    }

    #[test]
    fn round_trip_extreme_values() {
        let header = ExeHeader {
            entry_point: u32::MAX,
            global_pointer: 0,
            load_address: 1,
            image_size: u32::MAX - 1,
            stack_pointer: 0x8000_0000,
            stack_size: 0,
            region: RegionString::new(&"~".repeat(REGION_CAPACITY)).unwrap(),
        };
        assert_eq!(ExeHeader::parse(&header.to_bytes()), Ok(header));
    }

    #[test]
    fn build_header_trims_region() {
        let bytes = build_header(1, 2, 3, 4, 5, "  SCEA \t\n").unwrap();
        let header = ExeHeader::parse(&bytes).unwrap();
        assert_eq!(header.region.as_str(), "SCEA");
        assert_eq!(header.entry_point, 1);
        assert_eq!(header.global_pointer, 2);
        assert_eq!(header.load_address, 3);
        assert_eq!(header.image_size, 4);
        assert_eq!(header.stack_pointer, 5);
        assert_eq!(header.stack_size, 0);
    }

    #[test]
    fn region_string_rejects_non_ascii() {
        assert_eq!(
            RegionString::new("Europe área"),
            Err(ConvertError::InvalidRegionString {
                position: 7,
                character: 'á',
            })
        );
        assert!(build_header(0, 0, 0, 0, 0, "日本").is_err());
    }

    #[test]
    fn region_string_rejects_control_characters() {
        assert_eq!(
            RegionString::new("a\tb"),
            Err(ConvertError::InvalidRegionString {
                position: 1,
                character: '\t',
            })
        );
        assert!("x\0y".parse::<RegionString>().is_err());
    }

    #[test]
    fn region_string_longer_than_field_is_truncated() {
        let long = "A".repeat(REGION_CAPACITY + 100);
        let region = RegionString::new(&long).unwrap();
        assert!(region.exceeds_capacity());

        let bytes = build_header(0, 0, 0, 0, 0, &long).unwrap();
        assert_eq!(bytes.len(), EXE_HEADER_SIZE);
        assert!(bytes[0x4c..].iter().all(|&b| b == b'A'));

        let header = ExeHeader::parse(&bytes).unwrap();
        assert_eq!(header.region.as_str().len(), REGION_CAPACITY);
    }

    #[test]
    fn new_cuts_long_region_to_packed_form() {
        let header = ExeHeader::new(0, 0, 0, 0, 0, &"B".repeat(REGION_CAPACITY + 1)).unwrap();
        assert!(!header.region.exceeds_capacity());
        assert_eq!(header.region.as_str().len(), REGION_CAPACITY);
        assert_eq!(ExeHeader::parse(&header.to_bytes()), Ok(header));
    }

    #[test]
    fn new_matches_build_header() {
        let header = ExeHeader::new(1, 2, 3, 4, 5, " SCEE ").unwrap();
        assert_eq!(header.stack_size, 0);
        assert_eq!(header.region.as_str(), "SCEE");
        assert_eq!(header.to_bytes(), build_header(1, 2, 3, 4, 5, " SCEE ").unwrap());
    }

    #[test]
    fn parse_rejects_bad_magic() {
        let mut bytes = sample().to_bytes();
        bytes[3] = b'Y';
        assert_eq!(
            ExeHeader::parse(&bytes),
            Err(DecodeError::InvalidValue {
                offset: 0,
                field: "PS-X EXE magic",
            })
        );
    }

    #[test]
    fn parse_rejects_short_input() {
        let bytes = sample().to_bytes();
        assert!(matches!(
            ExeHeader::parse(&bytes[..EXE_HEADER_SIZE - 1]),
            Err(DecodeError::Truncated { .. })
        ));
    }
}
