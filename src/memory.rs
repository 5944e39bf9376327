//! Bounded reads from the traced process's address space
//!
//! Every read is all-or-nothing: a request for `len` bytes either yields
//! exactly `len` bytes or fails. Callers never see a partially filled buffer.

use std::io::IoSliceMut;
use std::sync::Mutex;

use nix::errno::Errno;
use nix::sys::uio::{process_vm_readv, RemoteIoVec};
use nix::unistd::Pid;
use thiserror::Error;

/// Why a remote read produced no bytes
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryError {
    #[error("bad address {addr:#x}")]
    Fault { addr: u64 },

    #[error("short read at {addr:#x}: wanted {wanted} bytes, got {got}")]
    ShortRead { addr: u64, wanted: usize, got: usize },

    #[error("address range {addr:#x}+{len} overflows")]
    AddressOverflow { addr: u64, len: usize },

    #[error("process is gone")]
    ProcessGone,
}

pub type Result<T> = std::result::Result<T, MemoryError>;

/// Read-only view of a tracee's memory
pub trait TraceeMemory {
    /// Fetch exactly `len` bytes starting at `addr`.
    fn read(&self, addr: u64, len: usize) -> Result<Vec<u8>>;
}

fn checked_end(addr: u64, len: usize) -> Result<u64> {
    addr.checked_add(len as u64)
        .ok_or(MemoryError::AddressOverflow { addr, len })
}

/// Live process memory through `process_vm_readv(2)`
#[derive(Debug, Clone, Copy)]
pub struct ProcessMemory {
    pid: Pid,
}

impl ProcessMemory {
    pub fn new(pid: Pid) -> Self {
        Self { pid }
    }

    pub fn pid(&self) -> Pid {
        self.pid
    }
}

impl TraceeMemory for ProcessMemory {
    fn read(&self, addr: u64, len: usize) -> Result<Vec<u8>> {
        checked_end(addr, len)?;
        if len == 0 {
            return Ok(Vec::new());
        }
        let base = usize::try_from(addr).map_err(|_| MemoryError::Fault { addr })?;

        let mut buf = vec![0u8; len];
        let mut local_iov = [IoSliceMut::new(&mut buf)];
        let remote_iov = [RemoteIoVec { base, len }];

        match process_vm_readv(self.pid, &mut local_iov, &remote_iov) {
            Ok(got) if got == len => Ok(buf),
            Ok(got) => Err(MemoryError::ShortRead { addr, wanted: len, got }),
            Err(Errno::ESRCH) => Err(MemoryError::ProcessGone),
            Err(_) => Err(MemoryError::Fault { addr }),
        }
    }
}

/// A contiguous run of mapped bytes inside a [`MemoryImage`]
#[derive(Debug, Clone)]
struct Region {
    base: u64,
    bytes: Vec<u8>,
}

impl Region {
    fn end(&self) -> u64 {
        self.base + self.bytes.len() as u64
    }
}

/// In-memory address space with a read log, for driving the decoder
/// without a live tracee.
#[derive(Debug, Default)]
pub struct MemoryImage {
    regions: Vec<Region>,
    log: Mutex<Vec<(u64, usize)>>,
}

impl MemoryImage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `bytes` at `base`, replacing any overlapping mapping.
    pub fn map(&mut self, base: u64, bytes: impl Into<Vec<u8>>) -> &mut Self {
        let bytes = bytes.into();
        let end = base.saturating_add(bytes.len() as u64);
        self.regions.retain(|r| r.end() <= base || r.base >= end);
        self.regions.push(Region { base, bytes });
        self
    }

    /// Overwrite already-mapped bytes, as the kernel does on a successful call.
    pub fn write(&mut self, addr: u64, bytes: &[u8]) -> bool {
        let Ok(end) = checked_end(addr, bytes.len()) else {
            return false;
        };
        for region in &mut self.regions {
            if addr >= region.base && end <= region.end() {
                let start = (addr - region.base) as usize;
                region.bytes[start..start + bytes.len()].copy_from_slice(bytes);
                return true;
            }
        }
        false
    }

    /// Every `(addr, len)` requested so far.
    pub fn reads(&self) -> Vec<(u64, usize)> {
        self.log.lock().map(|log| log.clone()).unwrap_or_default()
    }

    pub fn bytes_requested(&self) -> usize {
        self.reads().iter().map(|(_, len)| len).sum()
    }

    pub fn clear_log(&self) {
        if let Ok(mut log) = self.log.lock() {
            log.clear();
        }
    }
}

impl TraceeMemory for MemoryImage {
    fn read(&self, addr: u64, len: usize) -> Result<Vec<u8>> {
        if let Ok(mut log) = self.log.lock() {
            log.push((addr, len));
        }
        let end = checked_end(addr, len)?;
        if len == 0 {
            return Ok(Vec::new());
        }

        let region = self
            .regions
            .iter()
            .find(|r| addr >= r.base && addr < r.end())
            .ok_or(MemoryError::Fault { addr })?;

        if end > region.end() {
            return Err(MemoryError::ShortRead {
                addr,
                wanted: len,
                got: (region.end() - addr) as usize,
            });
        }
        let start = (addr - region.base) as usize;
        Ok(region.bytes[start..start + len].to_vec())
    }
}

impl<T: TraceeMemory + ?Sized> TraceeMemory for &T {
    fn read(&self, addr: u64, len: usize) -> Result<Vec<u8>> {
        (**self).read(addr, len)
    }
}
