//! Dispatch and the two-phase decode driver
//!
//! The harness calls [`Engine::decode`] once when an ioctl enters and once
//! when it exits. On entry the engine picks a descriptor (vendor table,
//! generic table, or the raw fallback) and runs its entering handler; on
//! exit it runs the exiting handler if the command asked for one. Which
//! handler may run in which phase follows from the command direction.

use std::sync::Arc;

use fnv::FnvHashMap;
use tracing::{trace, warn};

use crate::config::DecodeConfig;
use crate::decode::{DecodeCtx, Step};
use crate::decoders;
use crate::ioc::{Direction, Opcode};
use crate::memory::TraceeMemory;
use crate::personality::{Abi, PersonalityResolver, RecordLayout};
use crate::registry::{CommandDescriptor, Handler, Registry};
use crate::session::{DecodeSession, Phase, SessionState};
use crate::vendor::{DriverIdentityCache, Route, VendorRouter};

/// Per-process inputs of a decode
pub struct Tracee<'a> {
    pub abi: Abi,
    pub memory: &'a dyn TraceeMemory,
    pub drivers: &'a mut DriverIdentityCache,
}

#[derive(Debug, Clone, Default)]
struct AbiTables {
    generic: Registry,
    vendors: VendorRouter,
}

/// Immutable after construction; shared by every traced process.
#[derive(Debug, Clone)]
pub struct Engine {
    config: DecodeConfig,
    resolver: PersonalityResolver,
    tables: FnvHashMap<Abi, AbiTables>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(DecodeConfig::default())
    }
}

impl Engine {
    pub fn new(config: DecodeConfig) -> Self {
        Self::with_resolver(config, PersonalityResolver::default())
    }

    pub fn with_resolver(config: DecodeConfig, resolver: PersonalityResolver) -> Self {
        let mut tables = FnvHashMap::default();
        for abi in Abi::ALL {
            let generic = Registry::build(decoders::generic_commands(), &resolver, abi);
            let mut vendors = VendorRouter::new();
            for &(driver, commands) in decoders::VENDORS {
                vendors.register(driver, Registry::build(commands.iter(), &resolver, abi));
            }
            tables.insert(abi, AbiTables { generic, vendors });
        }
        Self {
            config,
            resolver,
            tables,
        }
    }

    pub fn config(&self) -> &DecodeConfig {
        &self.config
    }

    fn tables(&self, abi: Abi) -> Option<&AbiTables> {
        self.tables.get(&abi).or_else(|| self.tables.get(&Abi::Unknown))
    }

    /// Select the descriptor for one call.
    pub fn dispatch(
        &self,
        abi: Abi,
        opcode: Opcode,
        fd: i32,
        drivers: &mut DriverIdentityCache,
    ) -> CommandDescriptor {
        let Some(tables) = self.tables(abi) else {
            return CommandDescriptor::raw(opcode);
        };

        if opcode.is_vendor() && self.config.verbose {
            if let Route::Vendor(driver, descriptor) = tables.vendors.route(opcode, drivers.identify(fd)) {
                trace!(fd, driver, command = ?descriptor.name, "vendor dispatch");
                return descriptor;
            }
        }

        match tables.generic.lookup(opcode) {
            Some(descriptor) => descriptor,
            None => {
                trace!(?opcode, "unregistered request");
                CommandDescriptor::raw(opcode)
            }
        }
    }

    /// Decode the phase the session is in and return the text it added.
    pub fn decode<'s>(&self, session: &'s mut DecodeSession, tracee: &mut Tracee<'_>) -> &'s str {
        let start = session.render.len();
        match session.state {
            SessionState::Entering => {
                let descriptor = self.dispatch(
                    tracee.abi,
                    session.call.opcode,
                    session.call.fd,
                    tracee.drivers,
                );
                session.descriptor = Some(descriptor);
                session.state = self.enter(session, tracee);
            }
            SessionState::Exiting => {
                self.exit(session, tracee);
                session.state = SessionState::Decoded;
            }
            SessionState::Decoded => {}
        }
        &session.render.as_str()[start..]
    }

    /// Symbolic request number of a dispatched call.
    pub fn request_name(&self, session: &DecodeSession) -> String {
        match &session.descriptor {
            Some(descriptor) => descriptor.request_name(session.call.opcode),
            None => self.name_request(Abi::Unknown, session.call.opcode),
        }
    }

    /// Symbolic request number from the generic table alone.
    pub fn name_request(&self, abi: Abi, opcode: Opcode) -> String {
        self.tables(abi)
            .and_then(|t| t.generic.lookup(opcode))
            .unwrap_or_else(|| CommandDescriptor::raw(opcode))
            .request_name(opcode)
    }

    fn enter(&self, session: &mut DecodeSession, tracee: &Tracee<'_>) -> SessionState {
        let Some(descriptor) = session.descriptor.clone() else {
            return SessionState::Decoded;
        };

        let no_handlers = descriptor.enter.is_none() && descriptor.exit.is_none();
        if descriptor.opaque || no_handlers || !self.config.verbose {
            session.render.raw(&crate::ioc::addr(session.call.arg));
            return SessionState::Decoded;
        }

        match descriptor.direction {
            Direction::None | Direction::Write => {
                if let Some(handler) = descriptor.enter.or(descriptor.exit) {
                    let step = self.run(handler, Phase::Entering, &descriptor, session, tracee);
                    if step == Step::AwaitExit {
                        warn!(
                            command = ?descriptor.name,
                            "write-only command requested an exit decode"
                        );
                    }
                }
                SessionState::Decoded
            }
            // read-only records are written by the kernel, nothing to show yet
            Direction::Read => SessionState::Exiting,
            Direction::ReadWrite => match descriptor.enter {
                Some(handler) => {
                    match self.run(handler, Phase::Entering, &descriptor, session, tracee) {
                        Step::AwaitExit if descriptor.exit.is_some() => SessionState::Exiting,
                        Step::AwaitExit => {
                            warn!(command = ?descriptor.name, "no exit handler registered");
                            SessionState::Decoded
                        }
                        Step::Decoded => SessionState::Decoded,
                    }
                }
                None => SessionState::Exiting,
            },
        }
    }

    fn exit(&self, session: &mut DecodeSession, tracee: &Tracee<'_>) {
        let Some(descriptor) = session.descriptor.clone() else {
            return;
        };
        let handler = match descriptor.direction {
            Direction::Read => descriptor.exit.or(descriptor.enter),
            Direction::ReadWrite => descriptor.exit,
            Direction::None | Direction::Write => None,
        };
        if let Some(handler) = handler {
            self.run(handler, Phase::Exiting, &descriptor, session, tracee);
        }
    }

    fn run(
        &self,
        handler: Handler,
        phase: Phase,
        descriptor: &CommandDescriptor,
        session: &mut DecodeSession,
        tracee: &Tracee<'_>,
    ) -> Step {
        let read_len = fetch_len(descriptor, session.call.opcode);
        let mut ctx = DecodeCtx {
            call: session.call,
            phase,
            outcome: session.outcome,
            abi: tracee.abi,
            mem: tracee.memory,
            resolver: &self.resolver,
            layout: descriptor.layout.as_ref(),
            read_len,
            config: &self.config,
            out: &mut session.render,
            stash: &mut session.stash,
        };
        handler(&mut ctx)
    }
}

/// Bytes to fetch for the command record: the record size, or for a
/// request matched by number, whichever of the encoded and known sizes is
/// smaller.
fn fetch_len(descriptor: &CommandDescriptor, wire: Opcode) -> usize {
    let known = descriptor.layout.as_ref().map_or(0, |l: &Arc<RecordLayout>| l.size);
    if descriptor.drifted {
        known.min(wire.size())
    } else {
        known
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ioc::DRM_TYPE;
    use crate::memory::MemoryImage;
    use crate::session::{CallContext, Outcome};
    use crate::vendor::DriverResolver;

    const GET_CAP: u32 = 0xc010_640c;
    const GEM_CLOSE: u32 = 0x4008_6409;

    struct Fixed(Option<&'static str>);

    impl DriverResolver for Fixed {
        fn resolve(&self, _fd: i32) -> Option<String> {
            self.0.map(str::to_string)
        }
    }

    fn cap_image(capability: u64, value: u64) -> MemoryImage {
        let mut mem = MemoryImage::new();
        let mut bytes = capability.to_le_bytes().to_vec();
        bytes.extend_from_slice(&value.to_le_bytes());
        mem.map(0x1000, bytes);
        mem
    }

    fn run_call(
        engine: &Engine,
        mem: &MemoryImage,
        call: CallContext,
        outcome: Outcome,
    ) -> (String, String) {
        let mut drivers = DriverIdentityCache::new(Box::new(Fixed(None)));
        let mut tracee = Tracee { abi: Abi::X86_64, memory: mem, drivers: &mut drivers };
        let mut session = DecodeSession::new(call);
        let entering = engine.decode(&mut session, &mut tracee).to_string();
        session.exiting(outcome);
        let exiting = engine.decode(&mut session, &mut tracee).to_string();
        (entering, exiting)
    }

    #[test]
    fn test_read_write_two_phases() {
        let engine = Engine::default();
        let mem = cap_image(1, 1);
        let call = CallContext::new(3, GET_CAP, 0x1000);
        let (enter, exit) = run_call(&engine, &mem, call, Outcome::Success(0));
        assert_eq!(enter, "{capability=CAP_DUMB_BUFFER");
        assert_eq!(exit, ", value=1}");
    }

    #[test]
    fn test_read_write_failure_closes_only() {
        let engine = Engine::default();
        let mem = cap_image(1, 1);
        let call = CallContext::new(3, GET_CAP, 0x1000);
        let (_, exit) = run_call(&engine, &mem, call, Outcome::Failure(libc::EINVAL));
        assert_eq!(exit, "}");
    }

    #[test]
    fn test_write_only_exit_is_silent() {
        let engine = Engine::default();
        let mut mem = MemoryImage::new();
        mem.map(0x2000, 42u64.to_le_bytes().to_vec());
        let call = CallContext::new(3, GEM_CLOSE, 0x2000);

        let mut drivers = DriverIdentityCache::new(Box::new(Fixed(None)));
        let mut tracee = Tracee { abi: Abi::X86_64, memory: &mem, drivers: &mut drivers };
        let mut session = DecodeSession::new(call);
        assert_eq!(engine.decode(&mut session, &mut tracee), "{handle=42}");
        assert!(session.is_decoded());

        mem.clear_log();
        session.exiting(Outcome::Success(0));
        assert_eq!(engine.decode(&mut session, &mut tracee), "");
        assert!(mem.reads().is_empty());
    }

    #[test]
    fn test_unregistered_request_prints_pointer() {
        let engine = Engine::default();
        let mem = MemoryImage::new();
        let call = CallContext::new(3, 0x1234u32, 0x7ffe_1230);
        let (enter, exit) = run_call(&engine, &mem, call, Outcome::Success(0));
        assert_eq!(enter, "0x7ffe1230");
        assert_eq!(exit, "");
    }

    #[test]
    fn test_not_verbose_prints_pointer() {
        let engine = Engine::new(DecodeConfig { verbose: false, ..DecodeConfig::default() });
        let mem = cap_image(1, 1);
        let call = CallContext::new(3, GET_CAP, 0x1000);
        let (enter, exit) = run_call(&engine, &mem, call, Outcome::Success(0));
        assert_eq!(enter, "0x1000");
        assert_eq!(exit, "");
    }

    #[test]
    fn test_vendor_dispatch_follows_driver() {
        let engine = Engine::default();
        // DRM_IOCTL_AMDGPU_GEM_CREATE
        let opcode = Opcode::new(Direction::ReadWrite, DRM_TYPE, 0x40, 32);

        let mut amdgpu = DriverIdentityCache::new(Box::new(Fixed(Some("amdgpu"))));
        let d = engine.dispatch(Abi::X86_64, opcode, 5, &mut amdgpu);
        assert_eq!(d.name, Some("DRM_IOCTL_AMDGPU_GEM_CREATE"));

        let mut unknown = DriverIdentityCache::new(Box::new(Fixed(None)));
        let d = engine.dispatch(Abi::X86_64, opcode, 5, &mut unknown);
        assert!(d.name.is_none());
        assert!(d.opaque);
    }

    #[test]
    fn test_vendor_table_miss_is_raw() {
        let engine = Engine::default();
        let opcode = Opcode::new(Direction::ReadWrite, DRM_TYPE, 0x9e, 8);
        let mut drivers = DriverIdentityCache::new(Box::new(Fixed(Some("i915"))));
        let d = engine.dispatch(Abi::X86_64, opcode, 5, &mut drivers);
        assert!(d.opaque);
    }

    #[test]
    fn test_request_names() {
        let engine = Engine::default();
        assert_eq!(engine.name_request(Abi::X86_64, Opcode(GET_CAP)), "DRM_IOCTL_GET_CAP");
        let odd = Opcode::new(Direction::ReadWrite, DRM_TYPE, 0xfe, 0xff);
        assert_eq!(
            engine.name_request(Abi::X86_64, odd),
            "_IOC(_IOC_READ|_IOC_WRITE, 0x64, 0xfe, 0xff)"
        );
    }

    #[test]
    fn test_engine_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Engine>();
    }
}
