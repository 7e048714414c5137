//! Fuzz target: payload decoders
//!
//! Feeds arbitrary bytes to every decoder and checks the canonical
//! re-encoding decodes back to the same value.
//!
//! cargo fuzz run fuzz_payload_decoders

#![no_main]

use libfuzzer_sys::fuzz_target;
use photoniq::app::attributes::ValueKind;
use photoniq::app::codec::{decode, encode};

fuzz_target!(|data: &[u8]| {
    for kind in [ValueKind::Text, ValueKind::Integer, ValueKind::Flag] {
        let value = decode(kind, data);
        let canonical = encode(&value);
        assert_eq!(decode(kind, &canonical), value);
    }
});
