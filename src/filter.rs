//! Request filtering for `-e ioctl=` expressions
//!
//! Supports:
//! - Individual requests: `-e ioctl=DRM_IOCTL_VERSION,DRM_IOCTL_GEM_CLOSE`
//! - Request classes: `core`, `mode`, `gem`, `syncobj`, `legacy`, `vendor`
//! - Negation: `-e ioctl=!mode` traces everything except the class

use anyhow::{bail, Result};
use std::collections::HashSet;

use crate::decoders;

/// Class names accepted after `ioctl=`.
pub const CLASSES: &[&str] = &["core", "mode", "gem", "syncobj", "legacy", "vendor"];

/// Decides which decoded requests are printed
#[derive(Debug, Clone)]
pub struct IoctlFilter {
    /// Request names to include (None = all requests)
    include: Option<HashSet<String>>,
    exclude: HashSet<String>,
}

impl IoctlFilter {
    /// Filter that passes every request
    pub fn all() -> Self {
        Self {
            include: None,
            exclude: HashSet::new(),
        }
    }

    /// Parse an expression like `ioctl=mode,DRM_IOCTL_VERSION`.
    pub fn from_expr(expr: &str) -> Result<Self> {
        if let Some(spec) = expr.strip_prefix("ioctl=") {
            Self::from_spec(spec)
        } else {
            bail!(
                "Invalid filter expression: {}. Expected format: ioctl=SPEC",
                expr
            );
        }
    }

    fn from_spec(spec: &str) -> Result<Self> {
        let mut include = HashSet::new();
        let mut exclude = HashSet::new();

        for part in spec.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            let (negated, name) = match part.strip_prefix('!') {
                Some(rest) => (true, rest),
                None => (false, part),
            };
            let target = if negated { &mut exclude } else { &mut include };

            if let Some(members) = decoders::class_members(name) {
                target.extend(members.into_iter().map(str::to_string));
            } else if name.starts_with("DRM_IOCTL_") {
                // unknown names are kept; they may be drifted or foreign
                target.insert(name.to_string());
            } else {
                bail!(
                    "Unknown ioctl class or request: {}. Classes: {}",
                    name,
                    CLASSES.join(", ")
                );
            }
        }

        if include.is_empty() && exclude.is_empty() {
            bail!("Empty ioctl filter expression");
        }

        Ok(Self {
            include: if include.is_empty() { None } else { Some(include) },
            exclude,
        })
    }

    /// Whether a request with this symbolic name should be printed.
    ///
    /// Drifted names (`DRM_IOWR(0xc3, ...) /* NAME */`) and generic
    /// `_IOC(...)` spellings are matched on the embedded command name.
    pub fn should_trace(&self, request: &str) -> bool {
        let name = base_name(request);
        if self.exclude.contains(name) {
            return false;
        }
        match &self.include {
            None => true,
            Some(set) => set.contains(name),
        }
    }
}

impl Default for IoctlFilter {
    fn default() -> Self {
        Self::all()
    }
}

fn base_name(request: &str) -> &str {
    match request.split_once("/* ") {
        Some((_, rest)) => rest.trim_end_matches(" */").trim(),
        None => request,
    }
}
