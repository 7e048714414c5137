//! Fuzz target: `AttributeServer::handle_write`
//!
//! Treats the input as a sequence of writes.  Each record is one selector
//! byte (picks a registry attribute, or an unknown id when out of range),
//! one length byte, then the payload.  Asserts that dispatch never panics,
//! the scan command always ends reset and the server stays idle between
//! writes.
//!
//! cargo fuzz run fuzz_write_dispatch

#![no_main]

use libfuzzer_sys::fuzz_target;
use photoniq::adapters::nvs::NvsAdapter;
use photoniq::app::attributes::{AttributeId, CHAR_WIFI_SCAN_CMD};
use photoniq::app::codec::FLAG_RESET;
use photoniq::app::events::AttributeEvent;
use photoniq::app::ports::{EventSink, ScannerPort};
use photoniq::app::scan::ScanCommandState;
use photoniq::app::server::AttributeServer;
use photoniq::app::settings::SettingsStore;

struct FixedScanner;

impl ScannerPort for FixedScanner {
    fn scan(&mut self) -> Vec<String> {
        vec!["Net-A".into(), "Net-B".into()]
    }
}

struct Discard;

impl EventSink for Discard {
    fn emit(&mut self, _event: &AttributeEvent) {}
}

fuzz_target!(|data: &[u8]| {
    let mut server = AttributeServer::new(
        SettingsStore::new(NvsAdapter::default()),
        FixedScanner,
        Discard,
    );
    let ids: Vec<AttributeId> = server.registry().iter().map(|d| d.id).collect();

    let mut rest = data;
    while let [selector, len, tail @ ..] = rest {
        let take = usize::from(*len).min(tail.len());
        let (payload, next) = tail.split_at(take);
        rest = next;

        let id = ids
            .get(usize::from(*selector))
            .copied()
            .unwrap_or(AttributeId(u128::from(*selector)));
        server.handle_write(id, payload);

        assert_eq!(server.scan_state(), ScanCommandState::Idle);
        if id == CHAR_WIFI_SCAN_CMD && server.value(id) != Some(payload) {
            assert_eq!(server.value(id), Some(&FLAG_RESET[..]));
        }
    }
});
