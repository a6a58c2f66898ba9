//! Minimal ELF32 parser for PlayStation 1 executables.
//!
//! Parses 32-bit little-endian ELF headers and extracts `PT_LOAD` segments
//! as owned, zero-filled buffers. Section headers, symbols, relocations and
//! dynamic linking information are never read.
//!
//! # Usage
//!
//! ```
//! use psx_elf::ElfFile;
//!
//! fn load_elf(data: &[u8]) {
//!     let elf = ElfFile::parse(data).expect("valid ELF");
//!     elf.ensure_mips_executable().expect("MIPS executable");
//!     for seg in elf.segments() {
//!         // Place seg.data at seg.address
//!     }
//! }
//! ```

#![cfg_attr(not(test), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

pub mod header;
pub mod segment;

pub use header::{
    ELF_MAGIC, ELF32_EHDR_SIZE, ELF32_PHDR_SIZE, Elf32Header, Elf32ProgramHeader, ElfError,
    ElfType, Machine, SegmentType,
};
pub use segment::{ElfFile, Segment, SegmentFlags};
