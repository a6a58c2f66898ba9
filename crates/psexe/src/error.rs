//! Error types for ELF to PS-X EXE conversion.

use std::fmt;

use psx_elf::ElfError;

/// Errors that abort a conversion.
///
/// Every variant is fatal: no output is produced once one is returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConvertError {
    /// The input is not an ELF file or its header is cut short.
    MalformedInput(ElfError),
    /// The input is an ELF file this converter cannot read (not 32-bit
    /// little-endian, or unexpected header record sizes).
    UnsupportedFormat(ElfError),
    /// The ELF file is readable but is not a MIPS executable.
    UnsupportedFile(ElfError),
    /// No loadable segment is left to build an image from.
    EmptyInput {
        /// Number of segments dropped by the read-only filter.
        stripped: usize,
    },
    /// The flattened image does not fit the 32-bit size field.
    ImageTooLarge {
        /// Size the image would have, in bytes.
        size: u64,
    },
    /// The region string contains a character that is not printable ASCII.
    InvalidRegionString {
        /// Byte offset of the offending character in the trimmed string.
        position: usize,
        /// The offending character.
        character: char,
    },
}

impl fmt::Display for ConvertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedInput(e) => write!(f, "malformed input: {e}"),
            Self::UnsupportedFormat(e) => write!(f, "unsupported format: {e}"),
            Self::UnsupportedFile(e) => write!(f, "unsupported file: {e}"),
            Self::EmptyInput { stripped: 0 } => {
                write!(f, "ELF file must contain at least one loadable segment")
            }
            Self::EmptyInput { stripped } => write!(
                f,
                "ELF file has no loadable segment left after stripping {stripped} read-only segment(s)"
            ),
            Self::ImageTooLarge { size } => {
                write!(f, "image of {size} bytes does not fit in a PS-X EXE")
            }
            Self::InvalidRegionString {
                position,
                character,
            } => write!(
                f,
                "region string must be printable ASCII (found {character:?} at byte {position})"
            ),
        }
    }
}

impl std::error::Error for ConvertError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::MalformedInput(e) | Self::UnsupportedFormat(e) | Self::UnsupportedFile(e) => {
                Some(e)
            }
            _ => None,
        }
    }
}

impl From<ElfError> for ConvertError {
    fn from(e: ElfError) -> Self {
        match e {
            ElfError::BadMagic | ElfError::Truncated => Self::MalformedInput(e),
            ElfError::UnsupportedClass(_)
            | ElfError::UnsupportedEncoding(_)
            | ElfError::UnsupportedLayout { .. } => Self::UnsupportedFormat(e),
            ElfError::UnsupportedType(_) | ElfError::UnsupportedMachine(_) => {
                Self::UnsupportedFile(e)
            }
        }
    }
}
