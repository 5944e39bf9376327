//! Driver-private command routing
//!
//! Requests in the DRM driver range `[0x40, 0xa0)` mean different things
//! for different drivers. The driver behind a descriptor is found through
//! procfs and sysfs:
//!
//! ```text
//! /proc/PID/fd/FD  ->  /dev/dri/renderD128
//! /sys/class/drm/renderD128/device/driver  ->  .../drivers/amdgpu
//! ```
//!
//! and cached per descriptor until the harness reports that the
//! descriptor was closed or replaced.

use std::fs;
use std::path::{Path, PathBuf};

use fnv::FnvHashMap;
use tracing::debug;

use crate::ioc::Opcode;
use crate::registry::{CommandDescriptor, Registry};

/// Finds the kernel driver bound to a file descriptor
pub trait DriverResolver: Send {
    fn resolve(&self, fd: i32) -> Option<String>;
}

fn final_component(path: &Path) -> Option<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
}

/// Resolution through `/proc` and `/sys`, with overridable roots
#[derive(Debug, Clone)]
pub struct SysfsResolver {
    pid: i32,
    proc_root: PathBuf,
    sys_root: PathBuf,
}

impl SysfsResolver {
    pub fn new(pid: i32) -> Self {
        Self::with_roots(pid, "/proc", "/sys")
    }

    pub fn with_roots(pid: i32, proc_root: impl Into<PathBuf>, sys_root: impl Into<PathBuf>) -> Self {
        Self {
            pid,
            proc_root: proc_root.into(),
            sys_root: sys_root.into(),
        }
    }
}

impl DriverResolver for SysfsResolver {
    fn resolve(&self, fd: i32) -> Option<String> {
        let fd_link = self
            .proc_root
            .join(self.pid.to_string())
            .join("fd")
            .join(fd.to_string());
        let node = final_component(&fs::read_link(&fd_link).ok()?)?;

        let driver_link = self
            .sys_root
            .join("class/drm")
            .join(&node)
            .join("device/driver");
        final_component(&fs::read_link(driver_link).ok()?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Identity {
    Resolved(String),
    Unresolved,
}

/// Driver names per descriptor of one process
pub struct DriverIdentityCache {
    resolver: Box<dyn DriverResolver>,
    entries: FnvHashMap<i32, Identity>,
}

impl DriverIdentityCache {
    pub fn new(resolver: Box<dyn DriverResolver>) -> Self {
        Self {
            resolver,
            entries: FnvHashMap::default(),
        }
    }

    /// Driver bound to `fd`; the resolver runs at most once per descriptor
    /// lifetime, failures included.
    pub fn identify(&mut self, fd: i32) -> Option<&str> {
        let resolver = &self.resolver;
        let entry = self.entries.entry(fd).or_insert_with(|| match resolver.resolve(fd) {
            Some(driver) => {
                debug!(fd, driver = %driver, "resolved DRM driver");
                Identity::Resolved(driver)
            }
            None => {
                debug!(fd, "DRM driver unresolved");
                Identity::Unresolved
            }
        });
        match entry {
            Identity::Resolved(driver) => Some(driver.as_str()),
            Identity::Unresolved => None,
        }
    }

    pub fn invalidate(&mut self, fd: i32) {
        if self.entries.remove(&fd).is_some() {
            debug!(fd, "driver identity invalidated");
        }
    }

    /// Drop entries for `first..=last`, as `close_range(2)` does.
    pub fn invalidate_range(&mut self, first: i32, last: i32) {
        self.entries.retain(|fd, _| *fd < first || *fd > last);
        debug!(first, last, "driver identities invalidated");
    }

    /// Forget everything, as after `execve(2)`.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for DriverIdentityCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriverIdentityCache")
            .field("entries", &self.entries)
            .finish()
    }
}

/// Per-driver command tables for one ABI
#[derive(Debug, Default, Clone)]
pub struct VendorRouter {
    tables: FnvHashMap<&'static str, Registry>,
}

/// Result of vendor routing
#[derive(Debug)]
pub enum Route {
    /// The driver has its own table; the descriptor is its entry or the
    /// raw fallback.
    Vendor(&'static str, CommandDescriptor),
    /// Continue with the generic table.
    Generic,
}

impl VendorRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, driver: &'static str, registry: Registry) {
        self.tables.insert(driver, registry);
    }

    pub fn route(&self, opcode: Opcode, driver: Option<&str>) -> Route {
        let Some((&name, table)) = driver.and_then(|d| self.tables.get_key_value(d)) else {
            return Route::Generic;
        };
        let descriptor = table
            .lookup(opcode)
            .unwrap_or_else(|| CommandDescriptor::raw(opcode));
        Route::Vendor(name, descriptor)
    }
}
