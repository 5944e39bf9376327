//! renacer-drm - DRM ioctl decoding for a pure Rust ptrace tracer
//!
//! The decoding core turns one observed `ioctl(2)` on a DRM device into
//! the strace-style argument text: it names the request, fetches the
//! command record from tracee memory under the tracee's ABI, and renders
//! fields in two phases (entry and exit). The [`tracer`] module wraps it
//! in a ptrace harness.
//!
//! ```no_run
//! use renacer_drm::engine::{Engine, Tracee};
//! use renacer_drm::memory::MemoryImage;
//! use renacer_drm::personality::Abi;
//! use renacer_drm::session::{CallContext, DecodeSession, Outcome};
//! use renacer_drm::vendor::{DriverIdentityCache, SysfsResolver};
//!
//! let engine = Engine::default();
//! let memory = MemoryImage::new();
//! let mut drivers = DriverIdentityCache::new(Box::new(SysfsResolver::new(1)));
//! let mut tracee = Tracee { abi: Abi::X86_64, memory: &memory, drivers: &mut drivers };
//!
//! let mut session = DecodeSession::new(CallContext::new(3, 0x641e_u32, 0));
//! engine.decode(&mut session, &mut tracee);
//! session.exiting(Outcome::Success(0));
//! engine.decode(&mut session, &mut tracee);
//! println!("ioctl(3, {}, {})", engine.request_name(&session), session.text());
//! ```

pub mod array;
pub mod cli;
pub mod config;
pub mod decode;
pub mod decoders;
pub mod engine;
pub mod filter;
pub mod ioc;
pub mod json_output;
pub mod memory;
pub mod personality;
pub mod record;
pub mod registry;
pub mod render;
pub mod session;
pub mod stats;
pub mod syscalls;
pub mod tracer;
pub mod vendor;
pub mod xlat;
