//! Command-line interface definitions for elf2exe.

use std::path::PathBuf;

use clap::Parser;

/// Converts an ELF executable into a PlayStation 1 .EXE file.
#[derive(Debug, Parser)]
#[command(name = "elf2exe", version, about)]
pub struct Cli {
    /// Path to ELF input executable.
    pub input: PathBuf,

    /// Path to PS1 executable to generate.
    pub output: PathBuf,

    /// Add a custom region string to the header.
    #[arg(long = "region-str", short = 'r', value_name = "STRING")]
    pub region: Option<String>,

    /// Add an initial value for the stack pointer to the header.
    #[arg(long = "set-sp", short = 's', value_name = "VALUE", value_parser = parse_int)]
    pub stack_pointer: Option<u32>,

    /// Add an initial value for the global pointer to the header.
    #[arg(long = "set-gp", short = 'g', value_name = "VALUE", value_parser = parse_int)]
    pub global_pointer: Option<u32>,

    /// Remove all ELF segments not marked writable nor executable from the
    /// output file.
    #[arg(long, short = 'S')]
    pub strip_read_only: bool,

    /// Read default conversion options from a TOML file.
    #[arg(long, short = 'c', value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Only print errors.
    #[arg(long, short = 'q', conflicts_with = "verbose")]
    pub quiet: bool,

    /// Print every segment placed or stripped.
    #[arg(long, short = 'v')]
    pub verbose: bool,
}

/// Parses an unsigned 32-bit integer the way a C literal is written:
/// decimal, or hexadecimal, octal or binary with a `0x`, `0o` or `0b`
/// prefix. Underscores between digits are ignored.
pub fn parse_int(value: &str) -> Result<u32, String> {
    let cleaned: String = value.trim().chars().filter(|&c| c != '_').collect();
    let lower = cleaned.to_ascii_lowercase();

    let (digits, radix) = if let Some(rest) = lower.strip_prefix("0x") {
        (rest, 16)
    } else if let Some(rest) = lower.strip_prefix("0o") {
        (rest, 8)
    } else if let Some(rest) = lower.strip_prefix("0b") {
        (rest, 2)
    } else {
        (lower.as_str(), 10)
    };

    if digits.is_empty() || digits.starts_with('+') {
        return Err(format!("invalid integer: {value:?}"));
    }
    u32::from_str_radix(digits, radix).map_err(|e| format!("invalid integer {value:?}: {e}"))
}
