//! Device configuration
//!
//! The durable [`DeviceSettings`] record plus the fixed timing and sizing
//! parameters of the peripheral.  Settings are persisted by the
//! [`SettingsStore`](crate::app::settings::SettingsStore); everything else
//! here is compile-time.

/// Durable settings, one NVS key per field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceSettings {
    /// Human-readable sensor name shown by the central.
    pub name: String,
    /// Measurement/scan interval in seconds.  Stored as-is, including zero
    /// or negative values written by a central.
    pub scan_interval_secs: i32,
    /// Station-mode network name.
    pub wifi_ssid: String,
    /// Station-mode passphrase, stored in clear text.
    pub wifi_password: String,
    /// Whether the device should join `wifi_ssid` at boot.
    pub wifi_enabled: bool,
}

pub const DEFAULT_SENSOR_NAME: &str = "PhotonIQSensor";
pub const DEFAULT_SCAN_INTERVAL_SECS: i32 = 60;
pub const DEFAULT_WIFI_ENABLED: bool = true;

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            name: DEFAULT_SENSOR_NAME.to_owned(),
            scan_interval_secs: DEFAULT_SCAN_INTERVAL_SECS,
            wifi_ssid: String::new(),
            wifi_password: String::new(),
            wifi_enabled: DEFAULT_WIFI_ENABLED,
        }
    }
}

// --- Persisted record layout ---

/// NVS namespace holding the settings record (max 15 chars).
pub const SETTINGS_NAMESPACE: &str = "sensorSettings";
pub const KEY_SENSOR_NAME: &str = "sensorName";
pub const KEY_SCAN_INTERVAL: &str = "updateInterval";
pub const KEY_WIFI_SSID: &str = "wifiSSID";
pub const KEY_WIFI_PASSWORD: &str = "wifiPassword";
pub const KEY_WIFI_ENABLED: &str = "wifiEnabled";

// --- Radio ---

/// GAP device name used in advertising.
pub const ADVERTISED_NAME: &str = "LightSensor";
/// Upper bound on simultaneously tracked peers.
pub const MAX_PEERS: usize = 4;
/// Maximum length of any string attribute value (bytes).
pub const MAX_ATTRIBUTE_LEN: usize = 128;
/// Largest persisted text field.  Lossy decoding turns each invalid byte
/// of a full-length write into a 3-byte U+FFFD.
pub const MAX_STORED_TEXT_LEN: usize = MAX_ATTRIBUTE_LEN * 3;

// --- Timing ---

/// Period of the connected-peer enumeration safety net.
pub const PEER_SCAN_PERIOD_MS: u64 = 5_000;
/// Delay between main-cycle iterations.
pub const MAIN_CYCLE_PERIOD_MS: u32 = 100;
/// Station join attempts at boot, one per second.
pub const WIFI_CONNECT_ATTEMPTS: u32 = 20;
pub const WIFI_CONNECT_WAIT_MS: u32 = 1_000;
/// Upper bound on GATT table construction at boot.
pub const BLE_READY_TIMEOUT_MS: u32 = 5_000;

// --- Light sensor bus ---

/// I2C bus speed for the TSL2591.
pub const I2C_BAUDRATE_HZ: u32 = 100_000;
