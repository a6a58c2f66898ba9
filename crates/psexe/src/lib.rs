//! ELF to PlayStation 1 executable conversion.
//!
//! Turns a statically linked MIPS ELF into the "PS-X EXE" format the PS1
//! BIOS boots: every loadable segment is flattened into one zero-filled
//! image, the image is padded to 2048 bytes, and a fixed 2048-byte header
//! carrying the entry point, initial `$gp`/`$sp`, load address, image size
//! and region string is placed in front of it.
//!
//! Pipeline: [`psx_elf::ElfFile::parse`] → [`flatten`] →
//! [`FlatImage::align`] → [`ExeHeader`] → [`Executable::to_bytes`].
//!
//! # Usage
//!
//! ```no_run
//! let elf = std::fs::read("main.elf").unwrap();
//! let options = psexe::ConvertOptions {
//!     stack_pointer: 0x801f_fff0,
//!     ..Default::default()
//! };
//! let exe = psexe::convert(&elf, &options).unwrap();
//! std::fs::write("main.exe", exe.to_bytes()).unwrap();
//! ```

#![forbid(unsafe_code)]

pub mod convert;
pub mod error;
pub mod header;
pub mod image;

pub use convert::{ConvertOptions, Executable, convert};
pub use error::ConvertError;
pub use header::{
    EXE_HEADER_SIZE, EXE_MAGIC, ExeHeader, REGION_CAPACITY, RegionString, build_header,
};
pub use image::{EXE_ALIGNMENT, FlatImage, align_to_multiple, flatten};
