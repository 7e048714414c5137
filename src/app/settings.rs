//! Settings store proxy.
//!
//! Maps [`DeviceSettings`] onto per-field keys in the `sensorSettings`
//! namespace of a [`StoragePort`].  Holds no state between calls: every
//! setter is load → mutate one field → save.
//!
//! Text fields are cut to [`MAX_STORED_TEXT_LEN`] bytes on a character
//! boundary before they are written, so everything saved can be read back.
//!
//! | Key              | Encoding               |
//! |------------------|------------------------|
//! | `sensorName`     | UTF-8                  |
//! | `updateInterval` | `i32` little-endian    |
//! | `wifiSSID`       | UTF-8                  |
//! | `wifiPassword`   | UTF-8                  |
//! | `wifiEnabled`    | one byte, `0` / `1`    |

use log::warn;

use crate::config::{
    DeviceSettings, KEY_SCAN_INTERVAL, KEY_SENSOR_NAME, KEY_WIFI_ENABLED, KEY_WIFI_PASSWORD,
    KEY_WIFI_SSID, MAX_STORED_TEXT_LEN, SETTINGS_NAMESPACE,
};

use super::ports::{SettingsPort, StorageError, StoragePort};

/// Longest prefix of `text` that fits in a stored text field.
fn bounded(text: &str) -> &str {
    let mut end = text.len().min(MAX_STORED_TEXT_LEN);
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

pub struct SettingsStore<S: StoragePort> {
    storage: S,
}

impl<S: StoragePort> SettingsStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    fn read_text(&self, key: &str) -> Option<String> {
        let mut buf = [0u8; MAX_STORED_TEXT_LEN];
        let len = self.storage.read(SETTINGS_NAMESPACE, key, &mut buf).ok()?;
        match core::str::from_utf8(&buf[..len]) {
            Ok(s) => Some(s.to_string()),
            Err(_) => {
                warn!("Settings: {} is not valid UTF-8, using default", key);
                None
            }
        }
    }

    fn read_i32(&self, key: &str) -> Option<i32> {
        let mut buf = [0u8; 4];
        match self.storage.read(SETTINGS_NAMESPACE, key, &mut buf) {
            Ok(4) => Some(i32::from_le_bytes(buf)),
            Ok(n) => {
                warn!("Settings: {} has {} bytes, expected 4", key, n);
                None
            }
            Err(_) => None,
        }
    }

    fn read_bool(&self, key: &str) -> Option<bool> {
        let mut buf = [0u8; 1];
        match self.storage.read(SETTINGS_NAMESPACE, key, &mut buf) {
            Ok(1) => Some(buf[0] != 0),
            Ok(n) => {
                warn!("Settings: {} has {} bytes, expected 1", key, n);
                None
            }
            Err(_) => None,
        }
    }

    fn update(&mut self, mutate: impl FnOnce(&mut DeviceSettings)) -> Result<(), StorageError> {
        let mut settings = self.load();
        mutate(&mut settings);
        self.save(&settings)
    }
}

impl<S: StoragePort> SettingsPort for SettingsStore<S> {
    fn load(&self) -> DeviceSettings {
        let defaults = DeviceSettings::default();
        DeviceSettings {
            name: self.read_text(KEY_SENSOR_NAME).unwrap_or(defaults.name),
            scan_interval_secs: self
                .read_i32(KEY_SCAN_INTERVAL)
                .unwrap_or(defaults.scan_interval_secs),
            wifi_ssid: self.read_text(KEY_WIFI_SSID).unwrap_or(defaults.wifi_ssid),
            wifi_password: self
                .read_text(KEY_WIFI_PASSWORD)
                .unwrap_or(defaults.wifi_password),
            wifi_enabled: self
                .read_bool(KEY_WIFI_ENABLED)
                .unwrap_or(defaults.wifi_enabled),
        }
    }

    /// Writes every field; stops at the first failing key.
    fn save(&mut self, settings: &DeviceSettings) -> Result<(), StorageError> {
        let ns = SETTINGS_NAMESPACE;
        self.storage
            .write(ns, KEY_SENSOR_NAME, bounded(&settings.name).as_bytes())?;
        self.storage.write(
            ns,
            KEY_SCAN_INTERVAL,
            &settings.scan_interval_secs.to_le_bytes(),
        )?;
        self.storage
            .write(ns, KEY_WIFI_SSID, bounded(&settings.wifi_ssid).as_bytes())?;
        self.storage.write(
            ns,
            KEY_WIFI_PASSWORD,
            bounded(&settings.wifi_password).as_bytes(),
        )?;
        self.storage
            .write(ns, KEY_WIFI_ENABLED, &[u8::from(settings.wifi_enabled)])
    }

    fn set_name(&mut self, name: &str) -> Result<(), StorageError> {
        self.update(|s| s.name = name.to_string())
    }

    fn set_scan_interval(&mut self, secs: i32) -> Result<(), StorageError> {
        self.update(|s| s.scan_interval_secs = secs)
    }

    fn set_wifi_credentials(&mut self, ssid: &str, password: &str) -> Result<(), StorageError> {
        self.update(|s| {
            s.wifi_ssid = ssid.to_string();
            s.wifi_password = password.to_string();
        })
    }

    fn set_wifi_enabled(&mut self, enabled: bool) -> Result<(), StorageError> {
        self.update(|s| s.wifi_enabled = enabled)
    }
}
