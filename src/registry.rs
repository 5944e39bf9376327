//! Opcode to command descriptor lookup tables
//!
//! Commands are declared once as [`CommandSpec`] values holding a generic
//! record description. [`Registry::build`] lays each record out for one
//! ABI, derives the request number the process would pass, and indexes the
//! result. Commands whose record size changed between kernel header
//! versions are also indexed by `(direction, type, nr)`.

use std::fmt;
use std::sync::Arc;

use fnv::FnvHashMap;
use tracing::trace;

use crate::decode::{DecodeCtx, Step};
use crate::ioc::{Direction, Opcode, DRM_TYPE};
use crate::personality::{Abi, PersonalityResolver, RecordDesc, RecordLayout};

pub type Handler = fn(&mut DecodeCtx<'_>) -> Step;

/// Static declaration of one command
#[derive(Clone, Copy)]
pub struct CommandSpec {
    pub name: &'static str,
    pub dir: Direction,
    pub ty: u8,
    pub nr: u8,
    pub record: Option<&'static RecordDesc>,
    pub match_nr: bool,
    pub enter: Option<Handler>,
    pub exit: Option<Handler>,
}

impl CommandSpec {
    const fn new(name: &'static str, dir: Direction, nr: u8, record: Option<&'static RecordDesc>) -> Self {
        Self {
            name,
            dir,
            ty: DRM_TYPE,
            nr,
            record,
            match_nr: false,
            enter: None,
            exit: None,
        }
    }

    pub const fn io(name: &'static str, nr: u8) -> Self {
        Self::new(name, Direction::None, nr, None)
    }

    pub const fn ior(name: &'static str, nr: u8, record: &'static RecordDesc) -> Self {
        Self::new(name, Direction::Read, nr, Some(record))
    }

    pub const fn iow(name: &'static str, nr: u8, record: &'static RecordDesc) -> Self {
        Self::new(name, Direction::Write, nr, Some(record))
    }

    pub const fn iowr(name: &'static str, nr: u8, record: &'static RecordDesc) -> Self {
        Self::new(name, Direction::ReadWrite, nr, Some(record))
    }

    pub const fn enter(mut self, handler: Handler) -> Self {
        self.enter = Some(handler);
        self
    }

    pub const fn exit(mut self, handler: Handler) -> Self {
        self.exit = Some(handler);
        self
    }

    /// Also match requests with this direction and number but any size.
    pub const fn by_nr(mut self) -> Self {
        self.match_nr = true;
        self
    }
}

impl fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandSpec")
            .field("name", &self.name)
            .field("dir", &self.dir)
            .field("nr", &self.nr)
            .field("record", &self.record.map(|r| r.name))
            .finish()
    }
}

/// A command resolved for one ABI
#[derive(Clone)]
pub struct CommandDescriptor {
    pub name: Option<&'static str>,
    /// Request number registered for this ABI.
    pub opcode: Opcode,
    pub direction: Direction,
    pub layout: Option<Arc<RecordLayout>>,
    pub enter: Option<Handler>,
    pub exit: Option<Handler>,
    /// Matched by number while the encoded size differs.
    pub drifted: bool,
    /// Layout unavailable for this ABI; only the pointer is printed.
    pub opaque: bool,
}

impl CommandDescriptor {
    /// Fallback that prints the argument as a pointer.
    pub fn raw(opcode: Opcode) -> Self {
        Self {
            name: None,
            opcode,
            direction: opcode.direction(),
            layout: None,
            enter: None,
            exit: None,
            drifted: false,
            opaque: true,
        }
    }

    /// Symbolic request number as seen on the wire.
    pub fn request_name(&self, wire: Opcode) -> String {
        match self.name {
            Some(name) if self.drifted || (self.opaque && wire != self.opcode) => {
                wire.drifted_name(name)
            }
            Some(name) => name.to_string(),
            None => wire.generic_name(),
        }
    }
}

impl fmt::Debug for CommandDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDescriptor")
            .field("name", &self.name)
            .field("opcode", &self.opcode)
            .field("direction", &self.direction)
            .field("size", &self.layout.as_ref().map(|l| l.size))
            .field("drifted", &self.drifted)
            .field("opaque", &self.opaque)
            .finish()
    }
}

/// Lookup tables for one command set under one ABI
#[derive(Debug, Default, Clone)]
pub struct Registry {
    exact: FnvHashMap<u32, CommandDescriptor>,
    by_nr: FnvHashMap<(Direction, u8, u8), CommandDescriptor>,
}

impl Registry {
    pub fn build<'s, I>(specs: I, resolver: &PersonalityResolver, abi: Abi) -> Self
    where
        I: IntoIterator<Item = &'s CommandSpec>,
    {
        let mut registry = Self::default();
        for spec in specs {
            registry.insert(spec, resolver, abi);
        }
        registry
    }

    fn insert(&mut self, spec: &CommandSpec, resolver: &PersonalityResolver, abi: Abi) {
        let key = (spec.dir, spec.ty, spec.nr);
        let layout = match spec.record {
            Some(desc) => match resolver.layout_for(abi, desc) {
                Some(layout) => Some(Arc::new(layout)),
                None => {
                    trace!(command = spec.name, %abi, "no layout, registering opaque");
                    self.by_nr.insert(
                        key,
                        CommandDescriptor {
                            name: Some(spec.name),
                            opcode: Opcode::new(spec.dir, spec.ty, spec.nr, 0),
                            direction: spec.dir,
                            layout: None,
                            enter: None,
                            exit: None,
                            drifted: false,
                            opaque: true,
                        },
                    );
                    return;
                }
            },
            None => None,
        };

        let size = layout.as_ref().map_or(0, |l| l.size);
        let descriptor = CommandDescriptor {
            name: Some(spec.name),
            opcode: Opcode::new(spec.dir, spec.ty, spec.nr, size),
            direction: spec.dir,
            layout,
            enter: spec.enter,
            exit: spec.exit,
            drifted: false,
            opaque: false,
        };

        if spec.match_nr {
            self.by_nr.insert(key, descriptor.clone());
        }
        self.exact.insert(descriptor.opcode.raw(), descriptor);
    }

    /// Exact request number first, then the size-agnostic table.
    pub fn lookup(&self, opcode: Opcode) -> Option<CommandDescriptor> {
        if let Some(found) = self.exact.get(&opcode.raw()) {
            return Some(found.clone());
        }
        self.by_nr.get(&opcode.nr_key()).map(|found| {
            let mut found = found.clone();
            found.drifted = !found.opaque;
            found
        })
    }

    pub fn len(&self) -> usize {
        self.exact.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exact.is_empty() && self.by_nr.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::personality::Field;

    static CAP: RecordDesc =
        RecordDesc::structure("drm_get_cap", &[Field::u64("capability"), Field::u64("value")]);
    static UNIQUE: RecordDesc =
        RecordDesc::structure("drm_unique", &[Field::ulong("unique_len"), Field::ptr("unique")]);

    fn noop(_: &mut DecodeCtx<'_>) -> Step {
        Step::Decoded
    }

    static SPECS: &[CommandSpec] = &[
        CommandSpec::iowr("DRM_IOCTL_GET_CAP", 0x0c, &CAP).enter(noop),
        CommandSpec::iowr("DRM_IOCTL_GET_UNIQUE", 0x01, &UNIQUE).enter(noop),
        CommandSpec::iowr("DRM_IOCTL_MODE_GETCONNECTOR", 0xa7, &CAP).by_nr(),
        CommandSpec::io("DRM_IOCTL_SET_MASTER", 0x1e),
    ];

    fn registry(abi: Abi) -> Registry {
        Registry::build(SPECS, &PersonalityResolver::default(), abi)
    }

    #[test]
    fn test_exact_lookup() {
        let r = registry(Abi::X86_64);
        let d = r.lookup(Opcode(0xc010_640c)).unwrap();
        assert_eq!(d.name, Some("DRM_IOCTL_GET_CAP"));
        assert!(!d.drifted);
        assert_eq!(d.layout.unwrap().size, 16);
        assert!(r.lookup(Opcode(0x1234)).is_none());
    }

    #[test]
    fn test_width_sensitive_opcode_per_abi() {
        let lp64 = registry(Abi::X86_64);
        let ilp32 = registry(Abi::I386);
        let wide = Opcode::new(Direction::ReadWrite, DRM_TYPE, 0x01, 16);
        let narrow = Opcode::new(Direction::ReadWrite, DRM_TYPE, 0x01, 8);
        assert!(lp64.lookup(wide).is_some());
        assert!(lp64.lookup(narrow).is_none());
        assert!(ilp32.lookup(narrow).is_some());
    }

    #[test]
    fn test_unknown_abi_is_opaque() {
        let r = registry(Abi::Unknown);
        let d = r.lookup(Opcode::new(Direction::ReadWrite, DRM_TYPE, 0x01, 16)).unwrap();
        assert!(d.opaque);
        assert!(d.enter.is_none());
        // width-insensitive records still resolve
        assert!(!r.lookup(Opcode(0xc010_640c)).unwrap().opaque);
    }

    #[test]
    fn test_drifted_size_matches_by_nr() {
        let r = registry(Abi::X86_64);
        let wire = Opcode::new(Direction::ReadWrite, DRM_TYPE, 0xa7, 0x4c);
        let d = r.lookup(wire).unwrap();
        assert!(d.drifted);
        assert_eq!(
            d.request_name(wire),
            "DRM_IOWR(0xa7, 0x4c) /* DRM_IOCTL_MODE_GETCONNECTOR */"
        );
        // a different direction does not match
        assert!(r.lookup(Opcode::new(Direction::Read, DRM_TYPE, 0xa7, 0x4c)).is_none());
    }

    #[test]
    fn test_no_direction_command() {
        let r = registry(Abi::X86_64);
        let d = r.lookup(Opcode(0x641e)).unwrap();
        assert_eq!(d.direction, Direction::None);
        assert_eq!(d.request_name(Opcode(0x641e)), "DRM_IOCTL_SET_MASTER");
    }

    #[test]
    fn test_raw_descriptor_name() {
        let wire = Opcode::new(Direction::ReadWrite, DRM_TYPE, 0xfe, 0xff);
        assert_eq!(
            CommandDescriptor::raw(wire).request_name(wire),
            "_IOC(_IOC_READ|_IOC_WRITE, 0x64, 0xfe, 0xff)"
        );
    }
}
