//! Integration tests for the write path: radio write → dispatcher →
//! handler → reflected value + settings store.

use photoniq::app::attributes::{
    AttributeId, CHAR_LIGHT_LEVEL, CHAR_SCAN_INTERVAL, CHAR_SENSOR_NAME, CHAR_WIFI_ENABLED,
    CHAR_WIFI_NETWORKS, CHAR_WIFI_PASSWORD, CHAR_WIFI_SSID,
};
use photoniq::app::dispatcher::DispatchOutcome;
use photoniq::app::events::AttributeEvent;
use photoniq::app::ports::{SensorError, SettingsPort};
use photoniq::app::publisher::StatePublisher;
use photoniq::app::settings::SettingsStore;
use photoniq::config::{DeviceSettings, KEY_SENSOR_NAME, MAX_ATTRIBUTE_LEN, SETTINGS_NAMESPACE};

use crate::mock_hw::{server, server_with, MockNvs, MockScanner, MockSensor};

// ── Seeding ───────────────────────────────────────────────────

#[test]
fn fresh_device_reflects_defaults() {
    let srv = server();
    assert_eq!(srv.text(CHAR_LIGHT_LEVEL), "-1");
    assert_eq!(srv.text(CHAR_SENSOR_NAME), "PhotonIQSensor");
    assert_eq!(srv.text(CHAR_SCAN_INTERVAL), "60");
    assert_eq!(srv.text(CHAR_WIFI_SSID), "");
    assert_eq!(srv.value(CHAR_WIFI_ENABLED), Some(&b"1"[..]));
}

#[test]
fn stored_settings_seed_configuration_attributes() {
    let mut store = SettingsStore::new(MockNvs::new());
    store
        .save(&DeviceSettings {
            name: "Porch".into(),
            scan_interval_secs: 15,
            wifi_ssid: "Home".into(),
            wifi_password: "hunter22".into(),
            wifi_enabled: false,
        })
        .unwrap();

    let nvs = std::mem::take(store.storage_mut());
    let srv = server_with(nvs, MockScanner::default());
    assert_eq!(srv.text(CHAR_SENSOR_NAME), "Porch");
    assert_eq!(srv.text(CHAR_SCAN_INTERVAL), "15");
    assert_eq!(srv.text(CHAR_WIFI_SSID), "Home");
    assert_eq!(srv.text(CHAR_WIFI_PASSWORD), "hunter22");
    assert_eq!(srv.value(CHAR_WIFI_ENABLED), Some(&b"0"[..]));
}

// ── Sensor name ───────────────────────────────────────────────

#[test]
fn sensor_name_persists_and_reflects() {
    let mut srv = server();
    assert_eq!(srv.handle_write(CHAR_SENSOR_NAME, b"Kitchen"), DispatchOutcome::Handled);

    assert_eq!(srv.text(CHAR_SENSOR_NAME), "Kitchen");
    assert_eq!(srv.settings().load().name, "Kitchen");
    assert_eq!(
        srv.settings().storage().raw(SETTINGS_NAMESPACE, KEY_SENSOR_NAME),
        Some(&b"Kitchen"[..])
    );
}

#[test]
fn invalid_utf8_name_survives_later_writes() {
    let mut srv = server();
    srv.handle_write(CHAR_SENSOR_NAME, &[0xC0; 60]);
    let expected = "\u{FFFD}".repeat(60);
    assert_eq!(srv.settings().load().name, expected);

    srv.handle_write(CHAR_SCAN_INTERVAL, b"30");
    assert_eq!(srv.settings().load().name, expected);
    assert_eq!(
        srv.settings().storage().raw(SETTINGS_NAMESPACE, KEY_SENSOR_NAME),
        Some(expected.as_bytes())
    );
}

#[test]
fn full_length_invalid_name_loads_back() {
    let mut srv = server();
    srv.handle_write(CHAR_SENSOR_NAME, &[0xFF; MAX_ATTRIBUTE_LEN]);
    assert_eq!(
        srv.settings().load().name,
        "\u{FFFD}".repeat(MAX_ATTRIBUTE_LEN)
    );
}

#[test]
fn oversized_name_write_is_capped() {
    let mut srv = server();
    let long = [b'n'; MAX_ATTRIBUTE_LEN + 1];
    assert_eq!(srv.handle_write(CHAR_SENSOR_NAME, &long), DispatchOutcome::Handled);

    let capped = "n".repeat(MAX_ATTRIBUTE_LEN);
    assert_eq!(srv.text(CHAR_SENSOR_NAME), capped);
    assert_eq!(srv.settings().load().name, capped);

    srv.handle_write(CHAR_WIFI_ENABLED, b"0");
    assert_eq!(srv.settings().load().name, capped);
}

#[test]
fn textual_identifier_is_case_insensitive() {
    let mut srv = server();
    let outcome =
        srv.handle_write_str("D2C1A3B2-7E2F-4F4C-9F1D-3A2B1C0D4E5F", b"Garage");
    assert_eq!(outcome, DispatchOutcome::Handled);
    assert_eq!(srv.settings().load().name, "Garage");
}

// ── Scan interval ─────────────────────────────────────────────

#[test]
fn scan_interval_is_parsed_and_reflected_canonically() {
    let mut srv = server();
    srv.handle_write(CHAR_SCAN_INTERVAL, b"120abc");
    assert_eq!(srv.text(CHAR_SCAN_INTERVAL), "120");
    assert_eq!(srv.settings().load().scan_interval_secs, 120);
}

#[test]
fn malformed_scan_interval_defaults_to_zero() {
    let mut srv = server();
    srv.handle_write(CHAR_SCAN_INTERVAL, b"soon");
    assert_eq!(srv.text(CHAR_SCAN_INTERVAL), "0");
    assert_eq!(srv.settings().load().scan_interval_secs, 0);

    srv.handle_write(CHAR_SCAN_INTERVAL, b"");
    assert_eq!(srv.settings().load().scan_interval_secs, 0);
}

// ── Wi-Fi credentials ─────────────────────────────────────────

#[test]
fn ssid_then_password_persists_both() {
    let mut srv = server();
    srv.handle_write(CHAR_WIFI_SSID, b"Home");
    srv.handle_write(CHAR_WIFI_PASSWORD, b"hunter22");

    let s = srv.settings().load();
    assert_eq!(s.wifi_ssid, "Home");
    assert_eq!(s.wifi_password, "hunter22");
}

#[test]
fn password_then_ssid_persists_both() {
    let mut srv = server();
    srv.handle_write(CHAR_WIFI_PASSWORD, b"hunter22");
    srv.handle_write(CHAR_WIFI_SSID, b"Home");

    let s = srv.settings().load();
    assert_eq!(s.wifi_ssid, "Home");
    assert_eq!(s.wifi_password, "hunter22");
}

#[test]
fn credentials_keep_last_values() {
    let mut srv = server();
    srv.handle_write(CHAR_WIFI_SSID, b"Old");
    srv.handle_write(CHAR_WIFI_PASSWORD, b"password1");
    srv.handle_write(CHAR_WIFI_SSID, b"New");

    let s = srv.settings().load();
    assert_eq!(s.wifi_ssid, "New");
    assert_eq!(s.wifi_password, "password1");
}

// ── Wi-Fi enabled ─────────────────────────────────────────────

#[test]
fn wifi_enabled_truthy_encodings() {
    let cases: [&[u8]; 5] = [&[0x01], b"1", b"t", b"T", b"true"];
    for raw in cases {
        let mut srv = server();
        srv.handle_write(CHAR_WIFI_ENABLED, b"0");
        srv.handle_write(CHAR_WIFI_ENABLED, raw);
        assert!(srv.settings().load().wifi_enabled, "{:?} should enable", raw);
        assert_eq!(srv.value(CHAR_WIFI_ENABLED), Some(&b"1"[..]));
    }
}

#[test]
fn wifi_enabled_everything_else_is_false() {
    let cases: [&[u8]; 7] = [b"", &[0x00], b"0", b"f", b"yes", &[0x02], b"F"];
    for raw in cases {
        let mut srv = server();
        srv.handle_write(CHAR_WIFI_ENABLED, raw);
        assert!(!srv.settings().load().wifi_enabled, "{:?} should disable", raw);
        assert_eq!(srv.value(CHAR_WIFI_ENABLED), Some(&b"0"[..]));
    }
}

// ── Dropped writes ────────────────────────────────────────────

#[test]
fn unknown_identifier_changes_nothing() {
    let mut srv = server();
    srv.handle_write(CHAR_SENSOR_NAME, b"Kitchen");
    let before = srv.snapshot();
    let stored = srv.settings().load();

    let bogus = AttributeId(0x0000_0000_0000_0000_0000_0000_0000_beef);
    assert_eq!(srv.handle_write(bogus, b"Attic"), DispatchOutcome::UnknownAttribute);

    assert_eq!(srv.snapshot(), before);
    assert_eq!(srv.settings().load(), stored);
    assert!(srv.sink().contains(&AttributeEvent::WriteDropped(bogus)));
}

#[test]
fn malformed_identifier_is_dropped() {
    let mut srv = server();
    let before = srv.snapshot();
    assert_eq!(
        srv.handle_write_str("not-a-uuid", b"x"),
        DispatchOutcome::UnknownAttribute
    );
    assert_eq!(srv.snapshot(), before);
}

#[test]
fn read_only_attributes_reject_writes() {
    let mut srv = server();
    assert_eq!(srv.handle_write(CHAR_LIGHT_LEVEL, b"999 lux"), DispatchOutcome::NotWritable);
    assert_eq!(srv.handle_write(CHAR_WIFI_NETWORKS, b"Evil"), DispatchOutcome::NotWritable);
    assert_eq!(srv.text(CHAR_LIGHT_LEVEL), "-1");
    assert_eq!(srv.text(CHAR_WIFI_NETWORKS), "");
}

// ── Persistence failure ───────────────────────────────────────

#[test]
fn failed_persist_keeps_reflected_value() {
    let nvs = MockNvs {
        fail_writes: true,
        ..MockNvs::default()
    };
    let mut srv = server_with(nvs, MockScanner::default());
    srv.handle_write(CHAR_SENSOR_NAME, b"Kitchen");

    assert_eq!(srv.text(CHAR_SENSOR_NAME), "Kitchen");
    assert_eq!(srv.settings().load().name, "PhotonIQSensor");
    assert!(srv.sink().contains(&AttributeEvent::PersistFailed(CHAR_SENSOR_NAME)));

    // The next write goes through once storage recovers.
    srv.settings_mut().storage_mut().fail_writes = false;
    srv.handle_write(CHAR_SENSOR_NAME, b"Hall");
    assert_eq!(srv.settings().load().name, "Hall");
}

// ── Publisher ─────────────────────────────────────────────────

#[test]
fn publisher_formats_and_notifies() {
    let mut srv = server();
    let mut publisher = StatePublisher::new(MockSensor::new(Ok(250.5)));

    publisher.publish(&mut srv);
    assert_eq!(srv.text(CHAR_LIGHT_LEVEL), "250.50 lux");

    publisher.sensor_mut().reading = Err(SensorError::Overflow);
    publisher.publish(&mut srv);
    assert_eq!(srv.text(CHAR_LIGHT_LEVEL), "-- lux");

    publisher.sensor_mut().reading = Ok(0.0);
    publisher.publish(&mut srv);
    assert_eq!(srv.text(CHAR_LIGHT_LEVEL), "-- lux");

    // Every cycle notifies, even when the text did not change.
    assert_eq!(srv.sink().notifications(CHAR_LIGHT_LEVEL), 3);
    assert_eq!(publisher.sensor_mut().reads, 3);
}
