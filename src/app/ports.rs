//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AttributeServer (domain)
//! ```
//!
//! Driven adapters (sensor, NVS, Wi-Fi, BLE radio, event sinks) implement
//! these traits.  The [`AttributeServer`](super::server::AttributeServer)
//! and its components consume them, so the domain core never touches
//! hardware directly.
//!
//! ## Security notes
//!
//! - Wi-Fi credentials travel and persist in clear text; there is no
//!   link-encryption or bonding policy at this layer.
//! - All port errors are typed; callers must handle every variant explicitly.

use core::fmt;

use crate::config::{DeviceSettings, MAX_PEERS};

use super::attributes::{AttributeId, PeerHandle};
use super::events::AttributeEvent;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the publisher calls this once per main cycle.
pub trait SensorPort {
    /// Current illuminance in lux.
    fn read_lux(&mut self) -> Result<f32, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Storage port (driven adapter: domain ↔ NVS / flash)
// ───────────────────────────────────────────────────────────────

/// Persistent key-value storage.
///
/// Every call opens the namespace, performs one operation and closes it
/// again; no handle is held between calls.  Writes are synchronous and
/// crash-only.
pub trait StoragePort {
    /// Read a value.  Returns the number of bytes written to `buf`.
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError>;

    /// Write and commit a value.
    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError>;
}

// ───────────────────────────────────────────────────────────────
// Settings port (domain ↔ durable settings record)
// ───────────────────────────────────────────────────────────────

/// Typed access to the durable [`DeviceSettings`] record.
///
/// `load` never fails.  Each setter commits the full record before it
/// returns; an `Err` means the write was lost and will not be retried.
pub trait SettingsPort {
    fn load(&self) -> DeviceSettings;
    fn save(&mut self, settings: &DeviceSettings) -> Result<(), StorageError>;
    fn set_name(&mut self, name: &str) -> Result<(), StorageError>;
    fn set_scan_interval(&mut self, secs: i32) -> Result<(), StorageError>;
    fn set_wifi_credentials(&mut self, ssid: &str, password: &str) -> Result<(), StorageError>;
    fn set_wifi_enabled(&mut self, enabled: bool) -> Result<(), StorageError>;
}

// ───────────────────────────────────────────────────────────────
// Network scan / join ports
// ───────────────────────────────────────────────────────────────

/// Blocking Wi-Fi scan.  Returns network names in driver order; may block
/// for several seconds and cannot be cancelled.
pub trait ScannerPort {
    fn scan(&mut self) -> Vec<String>;
}

/// Station-mode join.
pub trait ConnectivityPort {
    fn set_credentials(&mut self, ssid: &str, password: &str) -> Result<(), ConnectivityError>;
    fn connect(&mut self) -> Result<(), ConnectivityError>;
    fn disconnect(&mut self);
    fn is_connected(&self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Radio ports (driven adapter: domain → BLE stack)
// ───────────────────────────────────────────────────────────────

/// Advertising control and peer enumeration for the lifecycle manager.
pub trait AdvertisingPort {
    /// Start (or restart) advertising.  Must be idempotent.
    fn start_advertising(&mut self) -> Result<(), RadioError>;

    /// Whether the stack is currently advertising.
    fn is_advertising(&self) -> bool;

    /// Peers the stack currently holds a link to.
    fn connected_peers(&self) -> heapless::Vec<PeerHandle, MAX_PEERS>;
}

/// The domain emits [`AttributeEvent`]s through this port.  The radio
/// adapter mirrors values into the GATT table and pushes notifications;
/// the log adapter writes them to the console.
pub trait EventSink {
    fn emit(&mut self, event: &AttributeEvent);
}

/// Fan-out: every event goes to both sinks, left first.
impl<A: EventSink, B: EventSink> EventSink for (A, B) {
    fn emit(&mut self, event: &AttributeEvent) {
        self.0.emit(event);
        self.1.emit(event);
    }
}

/// Inbound write entry point, implemented by the attribute server and
/// captured by the radio's write callback.
pub trait WriteTarget {
    fn on_write(&mut self, id: AttributeId, value: &[u8]);
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`StoragePort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Requested key does not exist.
    NotFound,
    /// Storage partition is full.
    Full,
    /// Generic I/O error.
    IoError,
}

/// Errors from [`SensorPort`] reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// Sensor did not answer or reported the wrong ID.
    NotFound,
    /// Bus transaction failed.
    Bus,
    /// An ADC channel saturated; the light level is out of range.
    Overflow,
}

/// Errors from the radio adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadioError {
    /// Controller or host stack could not be brought up.
    StackInitFailed,
    /// Advertising could not be (re)started.
    AdvertisingFailed,
    /// GATT table construction failed.
    GattFailed,
}

/// Errors from [`ConnectivityPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityError {
    NoCredentials,
    InvalidSsid,
    InvalidPassword,
    ConnectionFailed,
    AlreadyConnected,
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::Full => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "sensor not found"),
            Self::Bus => write!(f, "bus transaction failed"),
            Self::Overflow => write!(f, "sensor overload"),
        }
    }
}

impl fmt::Display for RadioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StackInitFailed => write!(f, "BLE stack initialisation failed"),
            Self::AdvertisingFailed => write!(f, "advertising start failed"),
            Self::GattFailed => write!(f, "GATT table setup failed"),
        }
    }
}

impl fmt::Display for ConnectivityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCredentials => write!(f, "no WiFi credentials configured"),
            Self::InvalidSsid => write!(f, "SSID invalid (must be 1-32 printable ASCII bytes)"),
            Self::InvalidPassword => write!(f, "password invalid (must be 8-64 bytes for WPA2, or empty for open)"),
            Self::ConnectionFailed => write!(f, "WiFi connection failed"),
            Self::AlreadyConnected => write!(f, "already connected to AP"),
        }
    }
}
