//! End-to-end tests for the elf2exe binary.
//!
//! Each test writes a synthetic ELF into its own scratch directory, runs the
//! compiled binary on it and inspects the resulting PS-X EXE.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use psexe::{EXE_ALIGNMENT, EXE_HEADER_SIZE, Executable};
use psx_elf::{ELF32_EHDR_SIZE, ELF32_PHDR_SIZE, Elf32Header, Elf32ProgramHeader, SegmentFlags};

/// A scratch directory removed when the test ends.
struct Scratch(PathBuf);

impl Scratch {
    fn new(name: &str) -> Self {
        let dir = std::env::temp_dir().join(format!("elf2exe-{}-{name}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).expect("failed to create scratch directory");
        Self(dir)
    }

    fn path(&self, file: &str) -> PathBuf {
        self.0.join(file)
    }
}

impl Drop for Scratch {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.0);
    }
}

/// Build an ELF with one `PT_LOAD` segment per entry, payloads placed back
/// to back after the program header table.
fn make_elf(entry: u32, segments: &[(u32, Vec<u8>, SegmentFlags)]) -> Vec<u8> {
    let phnum = u16::try_from(segments.len()).unwrap();
    let mut buf = psx_binparse::encode(&Elf32Header::mips_executable(entry, phnum));

    let mut offset = u32::try_from(ELF32_EHDR_SIZE + ELF32_PHDR_SIZE * segments.len()).unwrap();
    for (address, payload, flags) in segments {
        let len = u32::try_from(payload.len()).unwrap();
        buf.extend(psx_binparse::encode(&Elf32ProgramHeader::load(
            offset, *address, len, len, *flags,
        )));
        offset += len;
    }
    for (_, payload, _) in segments {
        buf.extend_from_slice(payload);
    }
    buf
}

fn sample_elf() -> Vec<u8> {
    make_elf(
        0x8001_0010,
        &[
            (
                0x8001_0000,
                vec![0x24; 0x100],
                SegmentFlags::READ | SegmentFlags::EXECUTE,
            ),
            (0x8001_0100, vec![0x42; 0x40], SegmentFlags::READ),
            (
                0x8001_0140,
                vec![0x99; 0x20],
                SegmentFlags::READ | SegmentFlags::WRITE,
            ),
        ],
    )
}

fn run(input: &Path, output: &Path) -> Output {
    run_with(&[], input, output)
}

fn run_with(flags: &[&str], input: &Path, output: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_elf2exe"))
        .args(flags)
        .arg(input)
        .arg(output)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to execute elf2exe")
}

fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "elf2exe failed (exit={:?}):\nstderr:\n{}",
        output.status.code(),
        String::from_utf8_lossy(&output.stderr),
    );
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn converts_elf_to_exe() {
    let scratch = Scratch::new("basic");
    let input = scratch.path("main.elf");
    let output = scratch.path("main.exe");
    std::fs::write(&input, sample_elf()).unwrap();

    let result = run(&input, &output);
    assert_success(&result);

    let bytes = std::fs::read(&output).unwrap();
    assert_eq!(bytes.len(), EXE_HEADER_SIZE + EXE_ALIGNMENT);

    let exe = Executable::parse(&bytes).unwrap();
    assert_eq!(exe.header.entry_point, 0x8001_0010);
    assert_eq!(exe.header.load_address, 0x8001_0000);
    assert_eq!(exe.header.image_size, 0x800);
    assert_eq!(exe.header.stack_pointer, 0);
    assert_eq!(exe.header.global_pointer, 0);
    assert!(exe.header.region.is_empty());
    assert_eq!(&exe.image.data[0x100..0x140], &[0x42; 0x40]);
    assert_eq!(&exe.image.data[0x140..0x160], &[0x99; 0x20]);

    assert!(!scratch.path(".main.exe.tmp").exists());
}

#[test]
fn applies_flags() {
    let scratch = Scratch::new("flags");
    let input = scratch.path("main.elf");
    let output = scratch.path("main.exe");
    std::fs::write(&input, sample_elf()).unwrap();

    let result = run_with(
        &[
            "--set-sp",
            "0x801FFFF0",
            "-g",
            "0x80018000",
            "-r",
            "  Sony Computer Entertainment Inc. for Europe area  ",
        ],
        &input,
        &output,
    );
    assert_success(&result);

    let exe = Executable::parse(&std::fs::read(&output).unwrap()).unwrap();
    assert_eq!(exe.header.stack_pointer, 0x801F_FFF0);
    assert_eq!(exe.header.global_pointer, 0x8001_8000);
    assert_eq!(
        exe.header.region.as_str(),
        "Sony Computer Entertainment Inc. for Europe area"
    );
}

#[test]
fn strip_read_only_drops_segment_contents() {
    let scratch = Scratch::new("strip");
    let input = scratch.path("main.elf");
    let output = scratch.path("main.exe");
    std::fs::write(&input, sample_elf()).unwrap();

    assert_success(&run_with(&["-S"], &input, &output));

    let exe = Executable::parse(&std::fs::read(&output).unwrap()).unwrap();
    assert!(exe.image.data[0x100..0x140].iter().all(|&b| b == 0));
    assert_eq!(&exe.image.data[0x140..0x160], &[0x99; 0x20]);
}

#[test]
fn reads_config_file() {
    let scratch = Scratch::new("config");
    let input = scratch.path("main.elf");
    let output = scratch.path("main.exe");
    let config = scratch.path("elf2exe.toml");
    std::fs::write(&input, sample_elf()).unwrap();
    std::fs::write(
        &config,
        "[exe]\nstack-pointer = 0x801FFF00\nregion = \"SCEI\"\n",
    )
    .unwrap();

    let config_arg = config.to_str().unwrap();
    assert_success(&run_with(&["-c", config_arg, "-r", "SCEA"], &input, &output));

    let exe = Executable::parse(&std::fs::read(&output).unwrap()).unwrap();
    assert_eq!(exe.header.stack_pointer, 0x801F_FF00);
    assert_eq!(exe.header.region.as_str(), "SCEA");
}

#[test]
fn rejects_non_elf_without_writing_output() {
    let scratch = Scratch::new("bad-magic");
    let input = scratch.path("main.elf");
    let output = scratch.path("main.exe");
    std::fs::write(&input, b"this is not an ELF file at all, just some text").unwrap();

    let result = run(&input, &output);

    assert!(!result.status.success());
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(stderr.contains("malformed input"), "stderr:\n{stderr}");
    assert!(!output.exists());
}

#[test]
fn rejects_elf_without_segments() {
    let scratch = Scratch::new("empty");
    let input = scratch.path("main.elf");
    let output = scratch.path("main.exe");
    std::fs::write(&input, make_elf(0x8001_0000, &[])).unwrap();

    let result = run(&input, &output);

    assert!(!result.status.success());
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(stderr.contains("at least one loadable segment"), "stderr:\n{stderr}");
    assert!(!output.exists());
}

#[test]
fn rejects_non_ascii_region_and_keeps_existing_output() {
    let scratch = Scratch::new("region");
    let input = scratch.path("main.elf");
    let output = scratch.path("main.exe");
    std::fs::write(&input, sample_elf()).unwrap();
    std::fs::write(&output, b"previous build").unwrap();

    let result = run_with(&["-r", "Europe \u{e9}"], &input, &output);

    assert!(!result.status.success());
    assert_eq!(std::fs::read(&output).unwrap(), b"previous build");
}

#[test]
fn missing_input_fails() {
    let scratch = Scratch::new("missing");
    let result = run(&scratch.path("nope.elf"), &scratch.path("out.exe"));

    assert!(!result.status.success());
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(stderr.contains("failed to read"), "stderr:\n{stderr}");
}
