//! Conversion defaults loaded from a TOML file.
//!
//! ```toml
//! [exe]
//! stack-pointer = 0x801FFFF0
//! global-pointer = 0
//! region = "Sony Computer Entertainment Inc. for Europe area"
//! strip-read-only = true
//! ```
//!
//! Command-line flags take precedence over values from the file.

use std::path::Path;

use anyhow::{Context, Result};
use psexe::ConvertOptions;
use serde::Deserialize;

use crate::cli::Cli;

/// Top-level layout of the configuration file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    exe: ExeConfig,
}

/// The `[exe]` table: every field is optional.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ExeConfig {
    /// Initial `$sp`.
    pub stack_pointer: Option<u32>,
    /// Initial `$gp`.
    pub global_pointer: Option<u32>,
    /// Region string.
    pub region: Option<String>,
    /// Drop segments that are neither writable nor executable.
    pub strip_read_only: Option<bool>,
}

impl ExeConfig {
    /// Load the `[exe]` table from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Parse the `[exe]` table from TOML text.
    pub fn parse(content: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(content)?;
        Ok(file.exe)
    }

    /// Merge with command-line flags, which win over file values.
    pub fn resolve(self, cli: &Cli) -> ConvertOptions {
        ConvertOptions {
            stack_pointer: cli.stack_pointer.or(self.stack_pointer).unwrap_or(0),
            global_pointer: cli.global_pointer.or(self.global_pointer).unwrap_or(0),
            region: cli.region.clone().or(self.region).unwrap_or_default(),
            strip_read_only: cli.strip_read_only || self.strip_read_only.unwrap_or(false),
        }
    }
}
