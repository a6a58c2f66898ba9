//! The ELF to PS-X EXE conversion pipeline.

use std::io::{self, Write};

use psx_binparse::DecodeError;
use psx_elf::ElfFile;

use crate::error::ConvertError;
use crate::header::{EXE_HEADER_SIZE, ExeHeader};
use crate::image::{EXE_ALIGNMENT, FlatImage, flatten};

/// User-controlled values that end up in the executable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Initial `$sp`; zero keeps the BIOS default.
    pub stack_pointer: u32,
    /// Initial `$gp`.
    pub global_pointer: u32,
    /// Region string; trimmed and validated as printable ASCII.
    pub region: String,
    /// Drop segments that are neither writable nor executable.
    pub strip_read_only: bool,
}

/// A complete PS-X EXE: header plus aligned image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Executable {
    /// The 2048-byte header.
    pub header: ExeHeader,
    /// The memory image, padded to [`EXE_ALIGNMENT`].
    pub image: FlatImage,
}

impl Executable {
    /// Total size of the executable in bytes.
    #[must_use]
    #[expect(
        clippy::len_without_is_empty,
        reason = "an executable always holds its header"
    )]
    pub fn len(&self) -> usize {
        EXE_HEADER_SIZE + self.image.len()
    }

    /// Serializes the header followed by the image.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = self.header.to_bytes();
        out.extend_from_slice(&self.image.data);
        out
    }

    /// Writes the header followed by the image to `w`.
    ///
    /// # Errors
    ///
    /// Returns any I/O error raised by `w`.
    pub fn write_to<W: Write>(&self, mut w: W) -> io::Result<()> {
        w.write_all(&self.header.to_bytes())?;
        w.write_all(&self.image.data)?;
        w.flush()
    }

    /// Reads back an executable produced by [`convert`].
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] if the header is invalid or `data` holds
    /// fewer image bytes than the header declares.
    pub fn parse(data: &[u8]) -> Result<Self, DecodeError> {
        let header = ExeHeader::parse(data)?;
        let mut r = psx_binparse::Reader::at(data, EXE_HEADER_SIZE)?;
        let image = r.bytes(header.image_size as usize)?.to_vec();
        Ok(Self {
            image: FlatImage {
                start_address: header.load_address,
                data: image,
            },
            header,
        })
    }
}

/// Converts an ELF executable into a PS-X EXE.
///
/// Runs the whole pipeline in memory: parse the ELF, check it is a MIPS
/// executable, flatten its loadable segments, pad the image to
/// [`EXE_ALIGNMENT`] and build the header. Nothing is returned unless every
/// step succeeds.
///
/// # Errors
///
/// Returns the first [`ConvertError`] raised by any step.
pub fn convert(input: &[u8], options: &ConvertOptions) -> Result<Executable, ConvertError> {
    let elf = ElfFile::parse(input)?;
    elf.ensure_mips_executable()?;
    log::debug!(
        "parsed ELF: entry {:#010x}, {} loadable segment(s)",
        elf.entry_point(),
        elf.segments().len()
    );

    let mut image = flatten(elf.segments(), options.strip_read_only)?;
    image.align(EXE_ALIGNMENT);

    let image_size = u32::try_from(image.len()).map_err(|_| ConvertError::ImageTooLarge {
        size: image.len() as u64,
    })?;

    let header = ExeHeader::new(
        elf.entry_point(),
        options.global_pointer,
        image.start_address,
        image_size,
        options.stack_pointer,
        &options.region,
    )?;

    log::info!(
        "image: {:#010x}..{:#010x} ({} bytes), entry {:#010x}",
        image.start_address,
        image.end_address(),
        image.len(),
        header.entry_point
    );

    Ok(Executable { header, image })
}
