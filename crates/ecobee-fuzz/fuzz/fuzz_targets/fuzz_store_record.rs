#![no_main]

use ecobee_client::auth::TokenRecord;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // A corrupt store file must decode to an error, never a panic
    if let Ok(record) = serde_json::from_slice::<TokenRecord>(data) {
        let _ = serde_json::to_vec(&record);
        let _ = record.valid_for(chrono::Utc::now());
    }
});
