#![no_main]

use ecobee_client::auth::{AuthorizationErrorResponse, PinAuthenticationChallenge, TokenRefreshResponse};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Everything the authorization and token endpoints can send back
    if let Ok(json) = serde_json::from_slice::<serde_json::Value>(data) {
        let _ = serde_json::from_value::<TokenRefreshResponse>(json.clone());
        let _ = serde_json::from_value::<AuthorizationErrorResponse>(json.clone());
        let _ = serde_json::from_value::<PinAuthenticationChallenge>(json);
    }
});
