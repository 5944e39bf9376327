//! Decoder configuration
//!
//! Loaded from an optional TOML file and then overridden by command-line
//! flags:
//!
//! ```toml
//! verbose = true
//! max_string_len = 64
//! max_array_elements = 16
//! ```

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DecodeConfig {
    /// Decode records; when off only raw pointers are printed.
    pub verbose: bool,
    /// Longest string printed before `...`.
    pub max_string_len: usize,
    /// Most array elements fetched from the tracee.
    pub max_array_elements: usize,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            verbose: true,
            max_string_len: 32,
            max_array_elements: 32,
        }
    }
}

impl DecodeConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse decoder configuration")
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).with_context(|| {
            format!("Failed to read config file: {}", path.as_ref().display())
        })?;
        Self::from_toml_str(&content)
    }
}
