//! Token lifetime (`expires_in`) encoding.
//!
//! The ecobee token endpoint reports lifetimes in seconds, sometimes as a JSON
//! number and sometimes as a string. Strings carrying a unit suffix
//! (`"3h25m45s"`, `"1.5h"`, `"250ms"`) are taken literally; bare strings are
//! seconds. Lifetimes are written back out in the unit-suffixed form.

use std::fmt;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};

static HAS_UNIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-zA-Z]+").expect("valid unit detection pattern"));

static WHOLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(?:\d+(?:\.\d*)?|\.\d+)(?:ns|us|µs|μs|ms|s|m|h))+$")
        .expect("valid duration pattern")
});

static COMPONENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+(?:\.\d*)?|\.\d+)(ns|us|µs|μs|ms|s|m|h)").expect("valid component pattern")
});

/// Error returned when a lifetime cannot be interpreted.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid duration: {0:?}")]
pub struct InvalidDuration(pub String);

/// Parse a lifetime string.
///
/// A string with no unit letters is read as whole (or fractional) seconds.
///
/// # Errors
///
/// Returns [`InvalidDuration`] for empty, negative, or malformed input.
pub fn parse_duration(input: &str) -> Result<Duration, InvalidDuration> {
    let trimmed = input.trim();
    if HAS_UNIT.is_match(trimmed) {
        parse_with_units(trimmed)
    } else {
        parse_with_units(&format!("{trimmed}s"))
    }
    .map_err(|()| InvalidDuration(input.to_string()))
}

fn parse_with_units(input: &str) -> Result<Duration, ()> {
    if !WHOLE.is_match(input) {
        return Err(());
    }

    let mut total = Duration::ZERO;
    for cap in COMPONENT.captures_iter(input) {
        let value: f64 = cap[1].parse().map_err(|_| ())?;
        let unit_nanos: f64 = match &cap[2] {
            "ns" => 1.0,
            "us" | "µs" | "μs" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60e9,
            "h" => 3600e9,
            _ => return Err(()),
        };
        let nanos = value * unit_nanos;
        if !nanos.is_finite() || nanos > u64::MAX as f64 {
            return Err(());
        }
        total = total.checked_add(Duration::from_nanos(nanos.round() as u64)).ok_or(())?;
    }
    Ok(total)
}

/// Render a duration as `1h2m3.5s`, `250ms`, `0s`, ...
#[must_use]
pub fn format_duration(d: Duration) -> String {
    if d.is_zero() {
        return "0s".to_string();
    }

    let nanos = d.subsec_nanos();
    if d.as_secs() == 0 {
        return if nanos < 1_000 {
            format!("{nanos}ns")
        } else if nanos < 1_000_000 {
            format!("{}µs", with_fraction(u64::from(nanos / 1_000), nanos % 1_000, 3))
        } else {
            format!("{}ms", with_fraction(u64::from(nanos / 1_000_000), nanos % 1_000_000, 6))
        };
    }

    let total = d.as_secs();
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);
    let seconds = format!("{}s", with_fraction(seconds, nanos, 9));

    match (hours, minutes) {
        (0, 0) => seconds,
        (0, m) => format!("{m}m{seconds}"),
        (h, m) => format!("{h}h{m}m{seconds}"),
    }
}

fn with_fraction(whole: u64, fraction: u32, digits: usize) -> String {
    if fraction == 0 {
        return whole.to_string();
    }
    let padded = format!("{fraction:0digits$}");
    format!("{whole}.{}", padded.trim_end_matches('0'))
}

/// A token lifetime that (de)serializes the way the token endpoint speaks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TokenDuration(pub Duration);

impl TokenDuration {
    /// Lifetime of `secs` seconds.
    #[must_use]
    pub const fn from_secs(secs: u64) -> Self {
        Self(Duration::from_secs(secs))
    }

    /// The wrapped duration.
    #[must_use]
    pub const fn as_duration(self) -> Duration {
        self.0
    }
}

impl From<Duration> for TokenDuration {
    fn from(d: Duration) -> Self {
        Self(d)
    }
}

impl fmt::Display for TokenDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_duration(self.0))
    }
}

impl Serialize for TokenDuration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_duration(self.0))
    }
}

impl<'de> Deserialize<'de> for TokenDuration {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(TokenDurationVisitor)
    }
}

struct TokenDurationVisitor;

impl Visitor<'_> for TokenDurationVisitor {
    type Value = TokenDuration;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a number of seconds or a duration string")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(TokenDuration::from_secs(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        u64::try_from(v)
            .map(TokenDuration::from_secs)
            .map_err(|_| E::custom(InvalidDuration(v.to_string())))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        // Fractional seconds are truncated, matching the whole-second API contract.
        if v.is_finite() && v >= 0.0 && v <= u64::MAX as f64 {
            Ok(TokenDuration::from_secs(v as u64))
        } else {
            Err(E::custom(InvalidDuration(v.to_string())))
        }
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        parse_duration(v).map(TokenDuration).map_err(E::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize, Serialize, PartialEq)]
    struct Holder {
        duration: TokenDuration,
    }

    #[test]
    fn test_bare_string_is_seconds() {
        let h: Holder = serde_json::from_str(r#"{"duration":"12345"}"#).unwrap();
        assert_eq!(h.duration, TokenDuration::from_secs(12345));
    }

    #[test]
    fn test_number_is_seconds() {
        let h: Holder = serde_json::from_str(r#"{"duration":12345}"#).unwrap();
        assert_eq!(h.duration, TokenDuration::from_secs(12345));

        let h: Holder = serde_json::from_str(r#"{"duration":3599.0}"#).unwrap();
        assert_eq!(h.duration, TokenDuration::from_secs(3599));
    }

    #[test]
    fn test_unit_string_is_literal() {
        let h: Holder = serde_json::from_str(r#"{"duration":"3h25m45s"}"#).unwrap();
        assert_eq!(h.duration, TokenDuration::from_secs(12345));

        assert_eq!(parse_duration("1.5h").unwrap(), Duration::from_secs(5400));
        assert_eq!(parse_duration("250ms").unwrap(), Duration::from_millis(250));
        assert_eq!(parse_duration("3h25m").unwrap(), Duration::from_secs(12300));
    }

    #[test]
    fn test_rejects_garbage() {
        for bad in ["", "abc", "-5", "5x", "h", "1h-2m", "1..5s"] {
            assert!(parse_duration(bad).is_err(), "{bad:?} should not parse");
        }
        assert!(serde_json::from_str::<Holder>(r#"{"duration":-3}"#).is_err());
        assert!(serde_json::from_str::<Holder>(r#"{"duration":true}"#).is_err());
    }

    #[test]
    fn test_serializes_with_units() {
        let h = Holder { duration: TokenDuration::from_secs(12345) };
        assert_eq!(serde_json::to_string(&h).unwrap(), r#"{"duration":"3h25m45s"}"#);
    }

    #[test]
    fn test_format_small_and_fractional() {
        assert_eq!(format_duration(Duration::ZERO), "0s");
        assert_eq!(format_duration(Duration::from_nanos(10)), "10ns");
        assert_eq!(format_duration(Duration::from_micros(500)), "500µs");
        assert_eq!(format_duration(Duration::from_micros(1500)), "1.5ms");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.5s");
        assert_eq!(format_duration(Duration::from_secs(60)), "1m0s");
        assert_eq!(format_duration(Duration::from_secs(3600)), "1h0m0s");
    }
}
