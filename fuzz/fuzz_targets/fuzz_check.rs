#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let _ = hybridbeleg::zugferd::check_hybrid(data);
});
