#![no_main]

use ecobee_client::auth::{format_duration, parse_duration};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(d) = parse_duration(s) {
            // Whatever parses must format without panicking
            let _ = format_duration(d);
        }
    }
});
