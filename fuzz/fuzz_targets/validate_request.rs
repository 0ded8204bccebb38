//! Fuzz harness for the request validation chain.
//!
//! Feeds arbitrary byte sequences through JSON parsing and, where they
//! parse, through `parse_envelope` and `validate`, ensuring no panics on
//! malformed envelopes, non-object payloads, mixed-type columns, or
//! boundary numeric values. Validation must either produce a typed
//! observation or a typed error, never abort.

#![no_main]

use libfuzzer_sys::fuzz_target;
use pledger_core::validate::{parse_envelope, validate};

fuzz_target!(|data: &[u8]| {
    let Ok(raw) = serde_json::from_slice::<serde_json::Value>(data) else {
        return;
    };

    if let Ok((observation_id, payload)) = parse_envelope(&raw) {
        assert!(!observation_id.is_empty());
        if let Ok(observation) = validate(payload) {
            // Domain invariants hold for anything the validator accepts.
            assert!((10..=100).contains(&observation.age));
            assert!(observation.capital_gain >= 0);
            assert!(observation.capital_loss >= 0);
            assert!((0..=168).contains(&observation.hours_per_week));
        }
    }
});
