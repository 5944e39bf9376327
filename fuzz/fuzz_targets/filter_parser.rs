#![no_main]

use libfuzzer_sys::fuzz_target;
use renacer_drm::filter::IoctlFilter;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        if let Ok(filter) = IoctlFilter::from_expr(input) {
            let _ = filter.should_trace(input);
        }
    }
});
