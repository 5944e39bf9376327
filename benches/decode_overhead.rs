/// Decoding overhead benchmarks
///
/// Measures the per-call cost of the decoding core with tracee memory served
/// from an in-process image, so the numbers exclude ptrace round trips.
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use renacer_drm::config::DecodeConfig;
use renacer_drm::engine::{Engine, Tracee};
use renacer_drm::memory::MemoryImage;
use renacer_drm::personality::Abi;
use renacer_drm::session::{CallContext, DecodeSession, Outcome};
use renacer_drm::vendor::{DriverIdentityCache, DriverResolver};

const GET_CAP: u32 = 0xc010_640c;
const VERSION: u32 = 0xc040_6400;
const GETRESOURCES: u32 = 0xc040_64a0;

struct NoDriver;

impl DriverResolver for NoDriver {
    fn resolve(&self, _fd: i32) -> Option<String> {
        None
    }
}

fn words(values: &[u64]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn image() -> MemoryImage {
    let mut mem = MemoryImage::new();
    mem.map(0x1000, words(&[1, 1]));

    let mut version: Vec<u8> = [1u32, 6, 0, 0].iter().flat_map(|v| v.to_le_bytes()).collect();
    version.extend(words(&[4, 0x3000, 8, 0x3100, 0, 0]));
    mem.map(0x2000, version);
    mem.map(0x3000, b"i915".to_vec());
    mem.map(0x3100, b"20200313".to_vec());

    let mut res = words(&[0x5000, 0x5100, 0x5200, 0x5300]);
    res.extend([4u32, 2, 4, 4, 0, 16384, 0, 16384].iter().flat_map(|v| v.to_le_bytes()));
    mem.map(0x4000, res);
    for base in [0x5000u64, 0x5100, 0x5200, 0x5300] {
        mem.map(base, [31u32, 32, 33, 34].iter().flat_map(|v| v.to_le_bytes()).collect::<Vec<u8>>());
    }
    mem
}

fn decode_once(engine: &Engine, tracee: &mut Tracee<'_>, request: u32, arg: u64) -> usize {
    let mut session = DecodeSession::new(CallContext::new(3, request, arg));
    engine.decode(&mut session, tracee);
    session.exiting(Outcome::Success(0));
    engine.decode(&mut session, tracee);
    session.text().len()
}

fn bench_decode(c: &mut Criterion) {
    let engine = Engine::default();
    let raw = Engine::new(DecodeConfig {
        verbose: false,
        ..DecodeConfig::default()
    });
    let mem = image();
    let mut drivers = DriverIdentityCache::new(Box::new(NoDriver));

    let mut group = c.benchmark_group("decode");
    for (name, request, arg) in [
        ("get_cap", GET_CAP, 0x1000u64),
        ("version", VERSION, 0x2000),
        ("get_resources", GETRESOURCES, 0x4000),
    ] {
        group.bench_function(name, |b| {
            let mut tracee = Tracee { abi: Abi::X86_64, memory: &mem, drivers: &mut drivers };
            b.iter(|| black_box(decode_once(&engine, &mut tracee, request, arg)));
        });
    }
    group.bench_function("get_resources_raw", |b| {
        let mut tracee = Tracee { abi: Abi::X86_64, memory: &mem, drivers: &mut drivers };
        b.iter(|| black_box(decode_once(&raw, &mut tracee, GETRESOURCES, 0x4000)));
    });
    group.finish();
}

fn bench_engine_construction(c: &mut Criterion) {
    c.bench_function("engine_new", |b| b.iter(|| black_box(Engine::default())));
}

criterion_group!(benches, bench_decode, bench_engine_construction);
criterion_main!(benches);
