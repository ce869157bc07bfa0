//! Fuzzing library for ecobee-client.
//!
//! This crate provides fuzzing targets for the parsers that see untrusted bytes:
//! token endpoint responses, the durable store's record file, and lifetime strings.
//!
//! # Usage
//!
//! ```bash
//! cd crates/ecobee-fuzz
//! cargo +nightly fuzz run fuzz_token_response -- -max_total_time=60
//! ```

pub use ecobee_client::{auth, models};
