#![no_main]

use libfuzzer_sys::fuzz_target;
use renacer_drm::engine::{Engine, Tracee};
use renacer_drm::memory::MemoryImage;
use renacer_drm::personality::Abi;
use renacer_drm::session::{CallContext, DecodeSession, Outcome};
use renacer_drm::vendor::{DriverIdentityCache, DriverResolver};

struct Driver(Option<&'static str>);

impl DriverResolver for Driver {
    fn resolve(&self, _fd: i32) -> Option<String> {
        self.0.map(str::to_string)
    }
}

// First 6 bytes pick the request, ABI, driver and outcome; the rest is the
// command record, also mapped where pointers inside it commonly land.
fuzz_target!(|data: &[u8]| {
    if data.len() < 6 {
        return;
    }
    let request = u32::from_le_bytes([data[0], data[1], 0x64, data[2]]);
    let abi = Abi::ALL[data[3] as usize % Abi::ALL.len()];
    let driver = match data[4] % 3 {
        0 => None,
        1 => Some("amdgpu"),
        _ => Some("i915"),
    };
    let outcome = if data[5] & 1 == 0 {
        Outcome::Success(0)
    } else {
        Outcome::Failure(errno_of(data[5]))
    };

    let mut mem = MemoryImage::new();
    mem.map(0x1000, data[6..].to_vec());
    mem.map(0x10_0000, data[6..].to_vec());
    let mut drivers = DriverIdentityCache::new(Box::new(Driver(driver)));
    let mut tracee = Tracee { abi, memory: &mem, drivers: &mut drivers };

    let engine = Engine::default();
    let mut session = DecodeSession::new(CallContext::new(3, request, 0x1000));
    engine.decode(&mut session, &mut tracee);
    session.exiting(outcome);
    engine.decode(&mut session, &mut tracee);
    let _ = engine.request_name(&session);
});

fn errno_of(byte: u8) -> i32 {
    i32::from(byte >> 1).max(1)
}
