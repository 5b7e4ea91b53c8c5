#![no_main]

use html::charref::{may_continue_reference, reference_len, resolve};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(s) = std::str::from_utf8(data) else {
        return;
    };
    let candidate = format!("&{s}");
    if let Some(len) = reference_len(&candidate) {
        let _ = resolve(&candidate[..len]);
    }
    let _ = resolve(&candidate);
    // A candidate that may still grow has no terminator yet.
    if may_continue_reference(&candidate) {
        assert!(!candidate.ends_with(';'), "{candidate:?}");
    }
});
