//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements         | Connects to               |
//! |------------|--------------------|---------------------------|
//! | `ble`      | AdvertisingPort    | Bluedroid GATT server     |
//! |            | EventSink          | GATT value mirror/notify  |
//! | `log_sink` | EventSink          | Serial log output         |
//! | `nvs`      | StoragePort        | NVS / in-memory store     |
//! | `time`     | (clock only)       | ESP32 system timer        |
//! | `wifi`     | ScannerPort        | ESP-IDF WiFi STA scan     |
//! |            | ConnectivityPort   | ESP-IDF WiFi STA join     |

pub mod ble;
pub mod log_sink;
pub mod nvs;
pub mod time;
pub(super) mod utils;
pub mod wifi;

pub use utils::lock;
