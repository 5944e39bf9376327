//! JSON output format for `--format json`

use serde::{Deserialize, Serialize};

/// One decoded ioctl
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonIoctl {
    /// Process that made the call
    pub pid: i32,
    pub fd: i32,
    /// Symbolic request number
    pub request: String,
    /// Decoded argument text
    pub arg: String,
    /// Return value, or `-errno` on failure
    pub result: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errno: Option<String>,
    /// Duration in microseconds (if timing enabled)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_us: Option<u64>,
}

/// Root JSON document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonOutput {
    /// Format version identifier
    pub version: String,
    pub format: String,
    pub ioctls: Vec<JsonIoctl>,
    /// Exit code of the traced process
    pub exit_code: i32,
}

impl JsonOutput {
    pub fn new() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            format: "renacer-drm-json-v1".to_string(),
            ioctls: Vec::new(),
            exit_code: 0,
        }
    }

    pub fn add_ioctl(&mut self, ioctl: JsonIoctl) {
        self.ioctls.push(ioctl);
    }

    pub fn set_exit_code(&mut self, code: i32) {
        self.exit_code = code;
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl Default for JsonOutput {
    fn default() -> Self {
        Self::new()
    }
}
