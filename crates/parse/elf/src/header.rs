//! ELF32 header parsing.
//!
//! Parses the ELF32 file header and program headers as fixed-layout
//! [`Record`]s, so the byte layout is declared once for both reading and
//! writing.

use core::fmt;

use psx_binparse::{DecodeError, Reader, Record, Writer};

use crate::segment::SegmentFlags;

/// ELF magic bytes: `\x7fELF`.
pub const ELF_MAGIC: [u8; 4] = [0x7f, b'E', b'L', b'F'];

/// ELF class: 32-bit.
pub const ELFCLASS32: u8 = 1;

/// ELF data encoding: little-endian.
pub const ELFDATA2LSB: u8 = 1;

/// Current ELF version.
const EV_CURRENT: u8 = 1;

/// Size of an ELF32 file header (52 bytes).
pub const ELF32_EHDR_SIZE: usize = 52;

/// Size of an ELF32 program header entry (32 bytes).
pub const ELF32_PHDR_SIZE: usize = 32;

/// Errors that can occur when parsing an ELF file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElfError {
    /// The file does not start with the ELF magic bytes.
    BadMagic,
    /// The input data is too short for the declared structure.
    Truncated,
    /// The ELF file is not 32-bit (`ELFCLASS32`).
    UnsupportedClass(u8),
    /// The ELF file is not little-endian.
    UnsupportedEncoding(u8),
    /// The declared header or program header sizes are not the ELF32 ones.
    UnsupportedLayout {
        /// Declared `e_ehsize`.
        header_size: u16,
        /// Declared `e_phentsize`.
        phdr_size: u16,
    },
    /// The ELF type is not `ET_EXEC`.
    UnsupportedType(ElfType),
    /// The ELF machine type is not `EM_MIPS`.
    UnsupportedMachine(Machine),
}

impl fmt::Display for ElfError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadMagic => write!(f, "file is not a valid ELF (bad magic bytes)"),
            Self::Truncated => write!(f, "input data truncated"),
            Self::UnsupportedClass(class) => {
                write!(f, "ELF file must be 32-bit (EI_CLASS is {class})")
            }
            Self::UnsupportedEncoding(data) => {
                write!(f, "ELF file must be little-endian (EI_DATA is {data})")
            }
            Self::UnsupportedLayout {
                header_size,
                phdr_size,
            } => write!(
                f,
                "unsupported ELF format (header size {header_size}, program header size {phdr_size}; expected {ELF32_EHDR_SIZE} and {ELF32_PHDR_SIZE})"
            ),
            Self::UnsupportedType(ty) => write!(f, "ELF file must be an executable (type is {ty})"),
            Self::UnsupportedMachine(machine) => {
                write!(f, "ELF architecture must be MIPS (machine is {machine})")
            }
        }
    }
}

impl core::error::Error for ElfError {}

/// ELF object file type (`e_type`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElfType {
    /// No file type.
    None,
    /// Relocatable object (`ET_REL`).
    Relocatable,
    /// Executable (`ET_EXEC`).
    Executable,
    /// Shared object (`ET_DYN`).
    Shared,
    /// Core dump (`ET_CORE`).
    Core,
    /// Any other value.
    Other(u16),
}

impl From<u16> for ElfType {
    fn from(raw: u16) -> Self {
        match raw {
            0 => Self::None,
            1 => Self::Relocatable,
            2 => Self::Executable,
            3 => Self::Shared,
            4 => Self::Core,
            other => Self::Other(other),
        }
    }
}

impl From<ElfType> for u16 {
    fn from(ty: ElfType) -> Self {
        match ty {
            ElfType::None => 0,
            ElfType::Relocatable => 1,
            ElfType::Executable => 2,
            ElfType::Shared => 3,
            ElfType::Core => 4,
            ElfType::Other(other) => other,
        }
    }
}

impl fmt::Display for ElfType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "ET_NONE"),
            Self::Relocatable => write!(f, "ET_REL"),
            Self::Executable => write!(f, "ET_EXEC"),
            Self::Shared => write!(f, "ET_DYN"),
            Self::Core => write!(f, "ET_CORE"),
            Self::Other(raw) => write!(f, "{raw:#06x}"),
        }
    }
}

/// Target architecture (`e_machine`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Machine {
    /// MIPS (`EM_MIPS`), the only architecture a PS1 can run.
    Mips,
    /// Any other value.
    Other(u16),
}

/// ELF machine: MIPS.
const EM_MIPS: u16 = 8;

impl From<u16> for Machine {
    fn from(raw: u16) -> Self {
        match raw {
            EM_MIPS => Self::Mips,
            other => Self::Other(other),
        }
    }
}

impl From<Machine> for u16 {
    fn from(machine: Machine) -> Self {
        match machine {
            Machine::Mips => EM_MIPS,
            Machine::Other(other) => other,
        }
    }
}

impl fmt::Display for Machine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mips => write!(f, "EM_MIPS"),
            Self::Other(raw) => write!(f, "{raw}"),
        }
    }
}

/// Parsed ELF32 file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Elf32Header {
    /// `EI_CLASS`: word size.
    pub class: u8,
    /// `EI_DATA`: byte order.
    pub encoding: u8,
    /// `EI_VERSION`.
    pub ident_version: u8,
    /// `EI_OSABI`.
    pub os_abi: u8,
    /// Object file type.
    pub e_type: ElfType,
    /// Target machine architecture.
    pub e_machine: Machine,
    /// Object file version.
    pub e_version: u32,
    /// Virtual address of the entry point.
    pub e_entry: u32,
    /// Offset of the program header table in the file.
    pub e_phoff: u32,
    /// Offset of the section header table in the file.
    pub e_shoff: u32,
    /// Processor-specific flags.
    pub e_flags: u32,
    /// Size of this header.
    pub e_ehsize: u16,
    /// Size of each program header entry.
    pub e_phentsize: u16,
    /// Number of program header entries.
    pub e_phnum: u16,
    /// Size of each section header entry.
    pub e_shentsize: u16,
    /// Number of section header entries.
    pub e_shnum: u16,
    /// Section header string table index.
    pub e_shstrndx: u16,
}

impl Record for Elf32Header {
    const SIZE: usize = ELF32_EHDR_SIZE;

    /// Decodes the header fields. The magic bytes are skipped here; they are
    /// checked by [`Elf32Header::parse`] before anything else is read.
    fn decode(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        r.skip(ELF_MAGIC.len())?;
        let class = r.u8()?;
        let encoding = r.u8()?;
        let ident_version = r.u8()?;
        let os_abi = r.u8()?;
        r.skip(8)?;
        Ok(Self {
            class,
            encoding,
            ident_version,
            os_abi,
            e_type: r.u16_le()?.into(),
            e_machine: r.u16_le()?.into(),
            e_version: r.u32_le()?,
            e_entry: r.u32_le()?,
            e_phoff: r.u32_le()?,
            e_shoff: r.u32_le()?,
            e_flags: r.u32_le()?,
            e_ehsize: r.u16_le()?,
            e_phentsize: r.u16_le()?,
            e_phnum: r.u16_le()?,
            e_shentsize: r.u16_le()?,
            e_shnum: r.u16_le()?,
            e_shstrndx: r.u16_le()?,
        })
    }

    fn encode(&self, w: &mut Writer) {
        w.bytes(&ELF_MAGIC);
        w.u8(self.class);
        w.u8(self.encoding);
        w.u8(self.ident_version);
        w.u8(self.os_abi);
        w.zeros(8);
        w.u16_le(self.e_type.into());
        w.u16_le(self.e_machine.into());
        w.u32_le(self.e_version);
        w.u32_le(self.e_entry);
        w.u32_le(self.e_phoff);
        w.u32_le(self.e_shoff);
        w.u32_le(self.e_flags);
        w.u16_le(self.e_ehsize);
        w.u16_le(self.e_phentsize);
        w.u16_le(self.e_phnum);
        w.u16_le(self.e_shentsize);
        w.u16_le(self.e_shnum);
        w.u16_le(self.e_shstrndx);
    }
}

impl Elf32Header {
    /// Returns the header of a MIPS little-endian executable with the
    /// program header table placed right after the file header.
    #[must_use]
    #[expect(clippy::cast_possible_truncation, reason = "ELF32 record sizes fit in u16")]
    pub fn mips_executable(entry: u32, phnum: u16) -> Self {
        Self {
            class: ELFCLASS32,
            encoding: ELFDATA2LSB,
            ident_version: EV_CURRENT,
            os_abi: 0,
            e_type: ElfType::Executable,
            e_machine: Machine::Mips,
            e_version: u32::from(EV_CURRENT),
            e_entry: entry,
            e_phoff: ELF32_EHDR_SIZE as u32,
            e_shoff: 0,
            e_flags: 0,
            e_ehsize: ELF32_EHDR_SIZE as u16,
            e_phentsize: ELF32_PHDR_SIZE as u16,
            e_phnum: phnum,
            e_shentsize: 0,
            e_shnum: 0,
            e_shstrndx: 0,
        }
    }

    /// Parse an ELF32 file header from raw bytes.
    ///
    /// Validates, in order: the magic, that a whole header is present, the
    /// class and data encoding, the declared header record sizes, and that
    /// a non-empty program header table lies within `data`. The file type and
    /// machine are not checked here; see [`crate::ElfFile::ensure_mips_executable`].
    ///
    /// # Errors
    ///
    /// Returns [`ElfError`] if validation fails or the data is too short.
    pub fn parse(data: &[u8]) -> Result<Self, ElfError> {
        if data.get(..ELF_MAGIC.len()) != Some(&ELF_MAGIC[..]) {
            return Err(ElfError::BadMagic);
        }

        let header: Self = psx_binparse::decode(data, 0).map_err(|_| ElfError::Truncated)?;

        if header.class != ELFCLASS32 {
            return Err(ElfError::UnsupportedClass(header.class));
        }
        if header.encoding != ELFDATA2LSB {
            return Err(ElfError::UnsupportedEncoding(header.encoding));
        }

        if usize::from(header.e_ehsize) != ELF32_EHDR_SIZE
            || usize::from(header.e_phentsize) != ELF32_PHDR_SIZE
        {
            return Err(ElfError::UnsupportedLayout {
                header_size: header.e_ehsize,
                phdr_size: header.e_phentsize,
            });
        }

        // Validate program header table bounds; an empty table has none
        let ph_end = u64::from(header.e_phoff)
            + u64::from(header.e_phnum) * ELF32_PHDR_SIZE as u64;
        if header.e_phnum > 0 && ph_end > data.len() as u64 {
            return Err(ElfError::Truncated);
        }

        Ok(header)
    }
}

/// Program header type (`p_type`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentType {
    /// Unused entry (`PT_NULL`).
    Null,
    /// Loadable segment (`PT_LOAD`).
    Load,
    /// Dynamic linking information (`PT_DYNAMIC`).
    Dynamic,
    /// Interpreter path (`PT_INTERP`).
    Interpreter,
    /// Auxiliary information (`PT_NOTE`).
    Note,
    /// Any other value, including processor-specific ones such as
    /// `PT_MIPS_REGINFO` and `PT_MIPS_ABIFLAGS`.
    Other(u32),
}

impl From<u32> for SegmentType {
    fn from(raw: u32) -> Self {
        match raw {
            0 => Self::Null,
            1 => Self::Load,
            2 => Self::Dynamic,
            3 => Self::Interpreter,
            4 => Self::Note,
            other => Self::Other(other),
        }
    }
}

impl From<SegmentType> for u32 {
    fn from(ty: SegmentType) -> Self {
        match ty {
            SegmentType::Null => 0,
            SegmentType::Load => 1,
            SegmentType::Dynamic => 2,
            SegmentType::Interpreter => 3,
            SegmentType::Note => 4,
            SegmentType::Other(other) => other,
        }
    }
}

/// Parsed ELF32 program header entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Elf32ProgramHeader {
    /// Segment type.
    pub p_type: SegmentType,
    /// Offset of the segment data in the file.
    pub p_offset: u32,
    /// Virtual address of the segment.
    pub p_vaddr: u32,
    /// Physical address of the segment (unused by the PS1 loader).
    pub p_paddr: u32,
    /// Size of the segment data in the file.
    pub p_filesz: u32,
    /// Size of the segment in memory.
    pub p_memsz: u32,
    /// Segment permission flags.
    pub p_flags: SegmentFlags,
    /// Required alignment.
    pub p_align: u32,
}

impl Record for Elf32ProgramHeader {
    const SIZE: usize = ELF32_PHDR_SIZE;

    fn decode(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            p_type: r.u32_le()?.into(),
            p_offset: r.u32_le()?,
            p_vaddr: r.u32_le()?,
            p_paddr: r.u32_le()?,
            p_filesz: r.u32_le()?,
            p_memsz: r.u32_le()?,
            p_flags: SegmentFlags::from_bits_retain(r.u32_le()?),
            p_align: r.u32_le()?,
        })
    }

    fn encode(&self, w: &mut Writer) {
        w.u32_le(self.p_type.into());
        w.u32_le(self.p_offset);
        w.u32_le(self.p_vaddr);
        w.u32_le(self.p_paddr);
        w.u32_le(self.p_filesz);
        w.u32_le(self.p_memsz);
        w.u32_le(self.p_flags.bits());
        w.u32_le(self.p_align);
    }
}

impl Elf32ProgramHeader {
    /// Returns a `PT_LOAD` entry mapping `filesz` bytes at file offset
    /// `offset` to `vaddr`, occupying `memsz` bytes in memory.
    #[must_use]
    pub fn load(offset: u32, vaddr: u32, filesz: u32, memsz: u32, flags: SegmentFlags) -> Self {
        Self {
            p_type: SegmentType::Load,
            p_offset: offset,
            p_vaddr: vaddr,
            p_paddr: vaddr,
            p_filesz: filesz,
            p_memsz: memsz,
            p_flags: flags,
            p_align: 4,
        }
    }
}
