//! CLI argument parsing for renacer-drm

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, ValueEnum};

use crate::config::DecodeConfig;

/// Output format for traced ioctls
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format (default)
    Text,
    /// JSON format for machine parsing
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "renacer-drm")]
#[command(version)]
#[command(about = "Traces and decodes DRM ioctls of a process", long_about = None)]
pub struct Cli {
    /// Filter requests to print (e.g., -e ioctl=mode or -e ioctl=DRM_IOCTL_VERSION)
    #[arg(short = 'e', long = "expr", value_name = "EXPR")]
    pub filter: Option<String>,

    /// Show a per-request summary instead of individual calls
    #[arg(short = 'c', long = "summary")]
    pub statistics: bool,

    /// Show time spent in each call
    #[arg(short = 'T', long = "timing")]
    pub timing: bool,

    /// Output format (text or json)
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Attach to running process by PID (mutually exclusive with command)
    #[arg(short = 'p', long = "pid", value_name = "PID")]
    pub pid: Option<i32>,

    /// Follow forks (trace child processes)
    #[arg(short = 'f', long = "follow-forks")]
    pub follow_forks: bool,

    /// Longest string printed before truncation
    #[arg(short = 's', long = "string-limit", value_name = "LEN")]
    pub string_limit: Option<usize>,

    /// Most array elements printed before truncation
    #[arg(long = "array-limit", value_name = "COUNT")]
    pub array_limit: Option<usize>,

    /// Print ioctl arguments as raw pointers
    #[arg(long = "raw")]
    pub raw: bool,

    /// Decoder configuration file (TOML)
    #[arg(long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable debug tracing output to stderr
    #[arg(long = "debug")]
    pub debug: bool,

    /// Command to trace (everything after --)
    #[arg(last = true)]
    pub command: Option<Vec<String>>,
}

impl Cli {
    /// Configuration file (if any) overridden by the command-line flags.
    pub fn decode_config(&self) -> Result<DecodeConfig> {
        let mut config = match &self.config {
            Some(path) => DecodeConfig::from_file(path)?,
            None => DecodeConfig::default(),
        };
        if let Some(limit) = self.string_limit {
            config.max_string_len = limit;
        }
        if let Some(limit) = self.array_limit {
            config.max_array_elements = limit;
        }
        if self.raw {
            config.verbose = false;
        }
        Ok(config)
    }
}
