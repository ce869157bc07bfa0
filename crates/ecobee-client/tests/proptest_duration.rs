//! Property-based tests for token lifetime parsing and formatting.

use std::time::Duration;

use proptest::prelude::*;
use ecobee_client::auth::{TokenDuration, TokenRefreshResponse, format_duration, parse_duration};

proptest! {
    /// Whole-second lifetimes survive formatting and parsing.
    #[test]
    fn whole_seconds_roundtrip(secs in 0u64..1_000_000_000) {
        let d = Duration::from_secs(secs);
        prop_assert_eq!(parse_duration(&format_duration(d)).unwrap(), d);
    }

    /// Millisecond lifetimes under an hour survive formatting and parsing.
    #[test]
    fn millis_roundtrip(millis in 0u64..3_600_000) {
        let d = Duration::from_millis(millis);
        prop_assert_eq!(parse_duration(&format_duration(d)).unwrap(), d);
    }

    /// A bare number string is seconds.
    #[test]
    fn bare_number_is_seconds(secs in 0u64..u64::from(u32::MAX)) {
        prop_assert_eq!(parse_duration(&secs.to_string()).unwrap(), Duration::from_secs(secs));
    }

    /// `expires_in` decodes identically from a JSON number and a JSON string.
    #[test]
    fn expires_in_number_and_string_agree(secs in 0u64..1_000_000) {
        let from_number: TokenRefreshResponse =
            serde_json::from_value(serde_json::json!({"access_token": "a", "expires_in": secs}))
                .expect("number decodes");
        let from_string: TokenRefreshResponse = serde_json::from_value(
            serde_json::json!({"access_token": "a", "expires_in": secs.to_string()}),
        )
        .expect("string decodes");

        prop_assert_eq!(from_number.expires_in, TokenDuration::from_secs(secs));
        prop_assert_eq!(from_string.expires_in, from_number.expires_in);
    }

    /// Parsing never panics on arbitrary input.
    #[test]
    fn parse_never_panics(input in ".*") {
        let _ = parse_duration(&input);
    }

    /// Unit components add up.
    #[test]
    fn components_sum(h in 0u64..100, m in 0u64..60, s in 0u64..60) {
        let input = format!("{h}h{m}m{s}s");
        prop_assert_eq!(
            parse_duration(&input).unwrap(),
            Duration::from_secs(h * 3600 + m * 60 + s)
        );
    }
}
