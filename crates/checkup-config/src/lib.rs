//! # Checkup Instructions
//!
//! Turns instruction sources into the normalized mapping the health engine
//! consumes:
//! - Multiple formats (YAML, TOML, JSON), detected by extension
//! - In-memory mappings passed through untouched
//! - Layered files merged in order

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod loader;
pub mod merger;

pub use loader::{load_and_merge, load_from_file, load_from_str};
pub use merger::merge_instructions;

use checkup_core::{Error, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Instruction file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstructionFormat {
    /// YAML format
    Yaml,
    /// TOML format
    Toml,
    /// JSON format
    Json,
}

impl InstructionFormat {
    /// Detect format from file extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .ok_or_else(|| {
                Error::Config(format!(
                    "Unable to detect instruction format of {}",
                    path.display()
                ))
            })?;

        match ext.to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Ok(InstructionFormat::Yaml),
            "toml" => Ok(InstructionFormat::Toml),
            "json" => Ok(InstructionFormat::Json),
            _ => Err(Error::Config(format!(
                "Unsupported instruction format: {ext}"
            ))),
        }
    }
}

/// Where instructions come from
#[derive(Debug, Clone, PartialEq)]
pub enum InstructionSource {
    /// Already parsed mapping
    Mapping(Value),
    /// File whose extension selects the parser
    File(PathBuf),
}

impl InstructionSource {
    /// Produce the normalized mapping
    pub fn normalize(self) -> Result<Value> {
        match self {
            InstructionSource::Mapping(value) => Ok(value),
            InstructionSource::File(path) => load_from_file(path),
        }
    }
}

impl From<Value> for InstructionSource {
    fn from(value: Value) -> Self {
        InstructionSource::Mapping(value)
    }
}

impl From<PathBuf> for InstructionSource {
    fn from(path: PathBuf) -> Self {
        InstructionSource::File(path)
    }
}

impl From<&Path> for InstructionSource {
    fn from(path: &Path) -> Self {
        InstructionSource::File(path.to_path_buf())
    }
}

/// Normalize any instruction source
pub fn normalize(source: impl Into<InstructionSource>) -> Result<Value> {
    source.into().normalize()
}
