//! ELF executable to PlayStation 1 .EXE converter.
//!
//! Usage:
//!   elf2exe [OPTIONS] <INPUT> <OUTPUT>
//!
//! Converts a statically linked MIPS ELF into the PS-X EXE format used by
//! the BIOS, with support for setting initial `$sp`/`$gp` values and a
//! custom region string (read by some emulators to choose PAL or NTSC mode).
//! Defaults may come from a TOML file passed with `--config`.

mod cli;
mod config;

use std::fs;
use std::io::BufWriter;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use log::LevelFilter;

use crate::cli::Cli;
use crate::config::ExeConfig;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    let file_config = match &cli.config {
        Some(path) => ExeConfig::load(path)?,
        None => ExeConfig::default(),
    };
    let options = file_config.resolve(&cli);

    let input = fs::read(&cli.input)
        .with_context(|| format!("failed to read {}", cli.input.display()))?;
    let exe = psexe::convert(&input, &options)
        .with_context(|| format!("failed to convert {}", cli.input.display()))?;
    drop(input);

    write_output(&cli.output, &exe)?;
    log::info!("wrote {} ({} bytes)", cli.output.display(), exe.len());
    Ok(())
}

/// Set up `env_logger` at the level chosen by `-q`/`-v`; `RUST_LOG` still
/// takes precedence when set.
fn init_logging(cli: &Cli) {
    let level = if cli.quiet {
        LevelFilter::Error
    } else if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level.as_str()))
        .format_timestamp(None)
        .format_target(false)
        .init();
}

/// Write the executable next to `path` under a temporary name, then rename
/// it into place so `path` never holds a partial file.
fn write_output(path: &Path, exe: &psexe::Executable) -> Result<()> {
    let file_name = path
        .file_name()
        .ok_or_else(|| anyhow::anyhow!("output path has no file name: {}", path.display()))?;
    let mut tmp_name = std::ffi::OsString::from(".");
    tmp_name.push(file_name);
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    let result = fs::File::create(&tmp_path)
        .and_then(|file| exe.write_to(BufWriter::new(file)))
        .and_then(|()| fs::rename(&tmp_path, path));

    if let Err(e) = result {
        let _ = fs::remove_file(&tmp_path);
        return Err(e).with_context(|| format!("failed to write {}", path.display()));
    }
    Ok(())
}
