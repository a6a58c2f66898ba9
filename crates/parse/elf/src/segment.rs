//! ELF32 loadable segment extraction.
//!
//! Provides [`ElfFile`] as the main entry point for parsing an ELF32 binary,
//! and [`Segment`] for the owned contents of each `PT_LOAD` entry.

use alloc::vec::Vec;

use crate::header::{
    ELF32_PHDR_SIZE, Elf32Header, Elf32ProgramHeader, ElfError, ElfType, Machine, SegmentType,
};

bitflags::bitflags! {
    /// Segment permission flags (`p_flags`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SegmentFlags: u32 {
        /// Segment is executable (`PF_X`).
        const EXECUTE = 1 << 0;
        /// Segment is writable (`PF_W`).
        const WRITE   = 1 << 1;
        /// Segment is readable (`PF_R`).
        const READ    = 1 << 2;
    }
}

impl SegmentFlags {
    /// Returns `true` if the segment is neither writable nor executable.
    #[must_use]
    pub fn is_read_only(self) -> bool {
        !self.intersects(Self::WRITE | Self::EXECUTE)
    }
}

/// A loadable segment extracted from an ELF32 file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Virtual address where this segment is loaded.
    pub address: u32,
    /// In-memory contents; exactly `p_memsz` bytes long.
    pub data: Vec<u8>,
    /// Segment permission flags.
    pub flags: SegmentFlags,
}

impl Segment {
    /// Address one past the last byte of the segment, in 64-bit arithmetic
    /// so segments ending at the top of the address space do not wrap.
    #[must_use]
    pub fn end_address(&self) -> u64 {
        u64::from(self.address) + self.data.len() as u64
    }

    /// Returns `true` if the segment is neither writable nor executable.
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.flags.is_read_only()
    }
}

/// A parsed ELF32 file: the validated header and its loadable segments in
/// program header table order.
#[derive(Debug, Clone)]
pub struct ElfFile {
    header: Elf32Header,
    segments: Vec<Segment>,
}

impl ElfFile {
    /// Parse an ELF32 file from raw bytes.
    ///
    /// Validates the header (see [`Elf32Header::parse`]), then walks the
    /// program header table in order, skipping every entry that is not
    /// `PT_LOAD`. Each loadable segment is copied out of `data` and resized
    /// to its in-memory size: zero-padded when the file holds fewer bytes
    /// (a `.bss`-like tail, or file data cut short by the end of `data`),
    /// truncated when the file holds more.
    ///
    /// # Errors
    ///
    /// Returns [`ElfError`] if the header is invalid or the data is too
    /// short. No segment is extracted unless the whole header validates.
    pub fn parse(data: &[u8]) -> Result<Self, ElfError> {
        let header = Elf32Header::parse(data)?;
        let phoff = header.e_phoff as usize;

        let mut segments = Vec::new();
        for i in 0..usize::from(header.e_phnum) {
            let phdr: Elf32ProgramHeader =
                psx_binparse::decode(data, phoff + i * ELF32_PHDR_SIZE)
                    .map_err(|_| ElfError::Truncated)?;
            if phdr.p_type != SegmentType::Load {
                continue;
            }

            let start = (phdr.p_offset as usize).min(data.len());
            let end = start.saturating_add(phdr.p_filesz as usize).min(data.len());

            let mut contents = data[start..end].to_vec();
            contents.resize(phdr.p_memsz as usize, 0);

            segments.push(Segment {
                address: phdr.p_vaddr,
                data: contents,
                flags: phdr.p_flags,
            });
        }

        Ok(Self { header, segments })
    }

    /// Returns the virtual address of the entry point.
    #[must_use]
    pub fn entry_point(&self) -> u32 {
        self.header.e_entry
    }

    /// Returns the parsed ELF32 file header.
    #[must_use]
    pub fn header(&self) -> &Elf32Header {
        &self.header
    }

    /// Returns the object file type.
    #[must_use]
    pub fn elf_type(&self) -> ElfType {
        self.header.e_type
    }

    /// Returns the target architecture.
    #[must_use]
    pub fn machine(&self) -> Machine {
        self.header.e_machine
    }

    /// Returns the loadable segments in program header table order.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Consumes the file and returns its loadable segments.
    #[must_use]
    pub fn into_segments(self) -> Vec<Segment> {
        self.segments
    }

    /// Checks that the file is an `ET_EXEC` image for `EM_MIPS`.
    ///
    /// # Errors
    ///
    /// Returns [`ElfError::UnsupportedType`] or
    /// [`ElfError::UnsupportedMachine`].
    pub fn ensure_mips_executable(&self) -> Result<(), ElfError> {
        if self.header.e_type != ElfType::Executable {
            return Err(ElfError::UnsupportedType(self.header.e_type));
        }
        if self.header.e_machine != Machine::Mips {
            return Err(ElfError::UnsupportedMachine(self.header.e_machine));
        }
        Ok(())
    }
}
