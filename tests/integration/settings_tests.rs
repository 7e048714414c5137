//! Integration tests for the settings store against recording storage,
//! plus the boot-time Wi-Fi join that consumes the loaded record.

use photoniq::adapters::wifi::{join_configured_network, WifiAdapter, WifiState};
use photoniq::app::ports::{SettingsPort, StorageError};
use photoniq::app::settings::SettingsStore;
use photoniq::config::{
    DeviceSettings, KEY_SCAN_INTERVAL, KEY_SENSOR_NAME, KEY_WIFI_ENABLED, KEY_WIFI_PASSWORD,
    KEY_WIFI_SSID, MAX_STORED_TEXT_LEN, SETTINGS_NAMESPACE, WIFI_CONNECT_ATTEMPTS,
};

use crate::mock_hw::MockNvs;

#[test]
fn persisted_layout_matches_field_encodings() {
    let mut store = SettingsStore::new(MockNvs::new());
    store
        .save(&DeviceSettings {
            name: "Porch".into(),
            scan_interval_secs: -2,
            wifi_ssid: "Home".into(),
            wifi_password: "hunter22".into(),
            wifi_enabled: true,
        })
        .unwrap();

    let nvs = store.storage();
    assert_eq!(nvs.raw(SETTINGS_NAMESPACE, KEY_SENSOR_NAME), Some(&b"Porch"[..]));
    assert_eq!(
        nvs.raw(SETTINGS_NAMESPACE, KEY_SCAN_INTERVAL),
        Some(&(-2i32).to_le_bytes()[..])
    );
    assert_eq!(nvs.raw(SETTINGS_NAMESPACE, KEY_WIFI_SSID), Some(&b"Home"[..]));
    assert_eq!(nvs.raw(SETTINGS_NAMESPACE, KEY_WIFI_PASSWORD), Some(&b"hunter22"[..]));
    assert_eq!(nvs.raw(SETTINGS_NAMESPACE, KEY_WIFI_ENABLED), Some(&[1u8][..]));
    assert_eq!(nvs.writes, 5);
}

#[test]
fn each_setter_rewrites_the_full_record() {
    let mut store = SettingsStore::new(MockNvs::new());
    store.set_name("Kitchen").unwrap();
    assert_eq!(store.storage().writes, 5);
    assert_eq!(
        store.storage().raw(SETTINGS_NAMESPACE, KEY_WIFI_ENABLED),
        Some(&[1u8][..])
    );
}

#[test]
fn failed_save_reports_error_and_leaves_storage_untouched() {
    let mut store = SettingsStore::new(MockNvs {
        fail_writes: true,
        ..MockNvs::default()
    });
    assert_eq!(store.set_name("Kitchen"), Err(StorageError::Full));
    assert_eq!(store.storage().raw(SETTINGS_NAMESPACE, KEY_SENSOR_NAME), None);
    assert_eq!(store.load(), DeviceSettings::default());
}

#[test]
fn oversized_stored_value_falls_back() {
    let mut nvs = MockNvs::new();
    nvs.put(SETTINGS_NAMESPACE, KEY_SENSOR_NAME, &[b'a'; MAX_STORED_TEXT_LEN + 1]);
    let store = SettingsStore::new(nvs);
    assert_eq!(store.load().name, DeviceSettings::default().name);
}

#[test]
fn long_credentials_round_trip_within_the_stored_limit() {
    let mut store = SettingsStore::new(MockNvs::new());
    let ssid = "s".repeat(MAX_STORED_TEXT_LEN + 40);
    let password = "\u{FFFD}".repeat(MAX_STORED_TEXT_LEN);
    store.set_wifi_credentials(&ssid, &password).unwrap();

    let loaded = store.load();
    assert_eq!(loaded.wifi_ssid, ssid[..MAX_STORED_TEXT_LEN]);
    assert_eq!(loaded.wifi_password.len(), MAX_STORED_TEXT_LEN);
    assert!(loaded.wifi_password.chars().all(|c| c == '\u{FFFD}'));

    // An unrelated setter keeps what was stored.
    store.set_scan_interval(30).unwrap();
    assert_eq!(store.load().wifi_ssid, loaded.wifi_ssid);
    assert_eq!(store.load().wifi_password, loaded.wifi_password);
}

#[test]
fn last_write_wins_per_field() {
    let mut store = SettingsStore::new(MockNvs::new());
    store.set_scan_interval(10).unwrap();
    store.set_name("A").unwrap();
    store.set_scan_interval(20).unwrap();
    store.set_name("B").unwrap();

    let loaded = store.load();
    assert_eq!(loaded.name, "B");
    assert_eq!(loaded.scan_interval_secs, 20);
}

// ── Boot-time join ────────────────────────────────────────────

fn joinable() -> DeviceSettings {
    DeviceSettings {
        wifi_ssid: "Home".into(),
        wifi_password: "hunter22".into(),
        ..DeviceSettings::default()
    }
}

#[test]
fn join_retries_until_connected() {
    let mut wifi = WifiAdapter::new();
    wifi.sim_fail_next_connects(3);
    let mut pauses = Vec::new();

    assert!(join_configured_network(&mut wifi, &joinable(), |ms| pauses.push(ms)));
    assert_eq!(wifi.state(), WifiState::Connected);
    assert_eq!(pauses, vec![1_000; 3]);
}

#[test]
fn join_gives_up_after_all_attempts() {
    let mut wifi = WifiAdapter::new();
    wifi.sim_fail_next_connects(WIFI_CONNECT_ATTEMPTS + 1);
    let mut pauses = 0;

    assert!(!join_configured_network(&mut wifi, &joinable(), |_| pauses += 1));
    assert_eq!(pauses, WIFI_CONNECT_ATTEMPTS - 1);
}

#[test]
fn join_skipped_when_disabled_or_unconfigured() {
    let mut wifi = WifiAdapter::new();
    let disabled = DeviceSettings {
        wifi_enabled: false,
        ..joinable()
    };
    assert!(!join_configured_network(&mut wifi, &disabled, |_| {}));
    assert!(!join_configured_network(&mut wifi, &DeviceSettings::default(), |_| {}));
    assert_eq!(wifi.state(), WifiState::Disconnected);
}
