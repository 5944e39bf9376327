//! Command tables
//!
//! Each submodule declares the commands of one family as a static
//! [`CommandSpec`] slice. The generic table is the concatenation of the
//! core, mode, syncobj and legacy families; vendor tables are only
//! consulted once the descriptor's driver is known.

pub mod amdgpu;
pub mod core;
pub mod i915;
pub mod legacy;
pub mod mode;
pub mod syncobj;

use crate::registry::CommandSpec;

/// Families in the generic table, by filter class name.
pub static GENERIC: &[(&str, &[CommandSpec])] = &[
    ("core", core::COMMANDS),
    ("mode", mode::COMMANDS),
    ("syncobj", syncobj::COMMANDS),
    ("legacy", legacy::COMMANDS),
];

/// Driver tables, keyed by the kernel driver name.
pub static VENDORS: &[(&str, &[CommandSpec])] = &[
    ("amdgpu", amdgpu::COMMANDS),
    ("i915", i915::COMMANDS),
];

pub fn generic_commands() -> impl Iterator<Item = &'static CommandSpec> {
    GENERIC.iter().flat_map(|&(_, commands)| commands.iter())
}

fn vendor_commands() -> impl Iterator<Item = &'static CommandSpec> {
    VENDORS.iter().flat_map(|&(_, commands)| commands.iter())
}

fn is_buffer_command(name: &str) -> bool {
    name.contains("_GEM_") || name.contains("_PRIME_") || name.contains("_DUMB")
}

/// Request names selected by a filter class, or `None` for an unknown class.
///
/// `gem` cuts across families: every buffer object command, generic or
/// vendor.
pub fn class_members(class: &str) -> Option<Vec<&'static str>> {
    let names: Vec<&'static str> = match class {
        "gem" => generic_commands()
            .chain(vendor_commands())
            .map(|c| c.name)
            .filter(|name| is_buffer_command(name))
            .collect(),
        "vendor" => vendor_commands().map(|c| c.name).collect(),
        _ => {
            let &(_, commands) = GENERIC.iter().find(|(name, _)| *name == class)?;
            commands.iter().map(|c| c.name).collect()
        }
    };
    Some(names)
}

/// Every request name any table knows about.
pub fn all_names() -> impl Iterator<Item = &'static str> {
    generic_commands().chain(vendor_commands()).map(|c| c.name)
}

#[cfg(test)]
pub(crate) mod testing {
    //! Runs whole calls through the engine against a memory image.

    use crate::engine::{Engine, Tracee};
    use crate::ioc::{Direction, Opcode, DRM_TYPE};
    use crate::memory::MemoryImage;
    use crate::personality::Abi;
    use crate::session::{CallContext, DecodeSession, Outcome};
    use crate::vendor::{DriverIdentityCache, DriverResolver};

    struct Fixed(Option<&'static str>);

    impl DriverResolver for Fixed {
        fn resolve(&self, _fd: i32) -> Option<String> {
            self.0.map(str::to_string)
        }
    }

    pub fn io(nr: u8) -> u32 {
        Opcode::new(Direction::None, DRM_TYPE, nr, 0).raw()
    }

    pub fn ior(nr: u8, size: usize) -> u32 {
        Opcode::new(Direction::Read, DRM_TYPE, nr, size).raw()
    }

    pub fn iow(nr: u8, size: usize) -> u32 {
        Opcode::new(Direction::Write, DRM_TYPE, nr, size).raw()
    }

    pub fn iowr(nr: u8, size: usize) -> u32 {
        Opcode::new(Direction::ReadWrite, DRM_TYPE, nr, size).raw()
    }

    /// Full argument text of one call on an x86_64 tracee.
    pub fn decode(mem: &MemoryImage, request: u32, arg: u64, outcome: Outcome) -> String {
        decode_with(Abi::X86_64, None, mem, request, arg, outcome)
    }

    /// Same, with the descriptor bound to `driver`.
    pub fn decode_on(
        driver: &'static str,
        mem: &MemoryImage,
        request: u32,
        arg: u64,
        outcome: Outcome,
    ) -> String {
        decode_with(Abi::X86_64, Some(driver), mem, request, arg, outcome)
    }

    pub fn decode_with(
        abi: Abi,
        driver: Option<&'static str>,
        mem: &MemoryImage,
        request: u32,
        arg: u64,
        outcome: Outcome,
    ) -> String {
        let engine = Engine::default();
        let mut drivers = DriverIdentityCache::new(Box::new(Fixed(driver)));
        let mut tracee = Tracee { abi, memory: mem, drivers: &mut drivers };
        let mut session = DecodeSession::new(CallContext::new(3, request, arg));
        engine.decode(&mut session, &mut tracee);
        session.exiting(outcome);
        engine.decode(&mut session, &mut tracee);
        session.text().to_string()
    }

    /// Little-endian record image builder
    #[derive(Debug, Default, Clone)]
    pub struct Bytes(pub Vec<u8>);

    impl Bytes {
        pub fn u8(mut self, v: u8) -> Self {
            self.0.push(v);
            self
        }

        pub fn u16(mut self, v: u16) -> Self {
            self.0.extend_from_slice(&v.to_le_bytes());
            self
        }

        pub fn u32(mut self, v: u32) -> Self {
            self.0.extend_from_slice(&v.to_le_bytes());
            self
        }

        pub fn i32(mut self, v: i32) -> Self {
            self.0.extend_from_slice(&v.to_le_bytes());
            self
        }

        pub fn u64(mut self, v: u64) -> Self {
            self.0.extend_from_slice(&v.to_le_bytes());
            self
        }

        pub fn i64(mut self, v: i64) -> Self {
            self.0.extend_from_slice(&v.to_le_bytes());
            self
        }

        pub fn zeros(mut self, n: usize) -> Self {
            self.0.resize(self.0.len() + n, 0);
            self
        }

        /// `text` NUL-padded to `len` bytes.
        pub fn text(mut self, text: &str, len: usize) -> Self {
            let mut field = text.as_bytes().to_vec();
            field.resize(len, 0);
            self.0.extend_from_slice(&field);
            self
        }

        pub fn extend(mut self, other: Bytes) -> Self {
            self.0.extend_from_slice(&other.0);
            self
        }
    }
}
