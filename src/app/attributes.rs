//! Attribute identity and typing.
//!
//! ## GATT Layout
//!
//! | Service        | Characteristic      | UUID                                   | Access      |
//! |----------------|---------------------|----------------------------------------|-------------|
//! | Sensor         | Light level         | `646bd4e2-0927-45ac-bf41-fd9c69aa31dd` | Read+Notify |
//! | Network scan   | Wi-Fi network list  | `b30041a1-23df-473a-aeec-0c8514514b03` | Read+Notify |
//! | Network scan   | Wi-Fi scan command  | `5f8b1e42-1a56-4b5a-8026-8b15bc7ee5f3` | Write       |
//! | Configuration  | Sensor name         | `d2c1a3b2-7e2f-4f4c-9f1d-3a2b1c0d4e5f` | R+W+Notify  |
//! | Configuration  | Scan interval       | `e3f4b5c6-8d9e-4f0a-b1c2-d3e4f5a6b7c8` | R+W+Notify  |
//! | Configuration  | Wi-Fi SSID          | `b2c1a3b2-7e2f-4f4c-9f1d-3a2b1c0d4e5f` | R+W+Notify  |
//! | Configuration  | Wi-Fi password      | `c2c1a3b2-7e2f-4f4c-9f1d-3a2b1c0d4e5f` | R+W+Notify  |
//! | Configuration  | Wi-Fi enabled       | `d3c1a3b2-7e2f-4f4c-9f1d-3a2b1c0d4e5f` | R+W+Notify  |

use core::fmt;
use core::str::FromStr;

// ───────────────────────────────────────────────────────────────
// Identifiers
// ───────────────────────────────────────────────────────────────

/// Stable 128-bit attribute (or service) identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttributeId(pub u128);

impl AttributeId {
    pub const fn as_u128(self) -> u128 {
        self.0
    }
}

impl fmt::Display for AttributeId {
    /// Canonical lowercase `8-4-4-4-12` form.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = self.0;
        write!(
            f,
            "{:08x}-{:04x}-{:04x}-{:04x}-{:012x}",
            (v >> 96) as u32,
            (v >> 80) as u16,
            (v >> 64) as u16,
            (v >> 48) as u16,
            v & 0xffff_ffff_ffff,
        )
    }
}

/// Textual identifier that is not a 128-bit UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseIdError;

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid 128-bit UUID")
    }
}

impl FromStr for AttributeId {
    type Err = ParseIdError;

    /// Parses `8-4-4-4-12` UUID text.  Hex digits are case-insensitive, so
    /// `"B30041A1-..."` and `"b30041a1-..."` name the same attribute.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        const GROUPS: [usize; 5] = [8, 4, 4, 4, 12];
        let mut value: u128 = 0;
        let mut parts = s.split('-');
        for len in GROUPS {
            let part = parts.next().ok_or(ParseIdError)?;
            if part.len() != len || !part.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(ParseIdError);
            }
            let group = u128::from_str_radix(part, 16).map_err(|_| ParseIdError)?;
            value = (value << (len * 4)) | group;
        }
        if parts.next().is_some() {
            return Err(ParseIdError);
        }
        Ok(Self(value))
    }
}

// Service groupings (discoverability only, no behavioural contract).
pub const SERVICE_SENSOR: AttributeId = AttributeId(0x3d80c0aa_56b9_458f_82a1_12ce0310e076);
pub const SERVICE_NETWORK_SCAN: AttributeId = AttributeId(0x458800e6_fc10_46bd_8cda_7f0f74bb1dbf);
pub const SERVICE_CONFIGURATION: AttributeId = AttributeId(0xc1d5a3b2_7e2f_4f4c_9f1d_3a2b1c0d4e5f);

pub const CHAR_LIGHT_LEVEL: AttributeId = AttributeId(0x646bd4e2_0927_45ac_bf41_fd9c69aa31dd);
pub const CHAR_WIFI_NETWORKS: AttributeId = AttributeId(0xb30041a1_23df_473a_aeec_0c8514514b03);
pub const CHAR_WIFI_SCAN_CMD: AttributeId = AttributeId(0x5f8b1e42_1a56_4b5a_8026_8b15bc7ee5f3);
pub const CHAR_SENSOR_NAME: AttributeId = AttributeId(0xd2c1a3b2_7e2f_4f4c_9f1d_3a2b1c0d4e5f);
pub const CHAR_SCAN_INTERVAL: AttributeId = AttributeId(0xe3f4b5c6_8d9e_4f0a_b1c2_d3e4f5a6b7c8);
pub const CHAR_WIFI_SSID: AttributeId = AttributeId(0xb2c1a3b2_7e2f_4f4c_9f1d_3a2b1c0d4e5f);
pub const CHAR_WIFI_PASSWORD: AttributeId = AttributeId(0xc2c1a3b2_7e2f_4f4c_9f1d_3a2b1c0d4e5f);
pub const CHAR_WIFI_ENABLED: AttributeId = AttributeId(0xd3c1a3b2_7e2f_4f4c_9f1d_3a2b1c0d4e5f);

/// Logical service an attribute is advertised under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceGroup {
    Sensor,
    NetworkScan,
    Configuration,
}

impl ServiceGroup {
    pub const ALL: [ServiceGroup; 3] = [Self::Sensor, Self::NetworkScan, Self::Configuration];

    pub const fn id(self) -> AttributeId {
        match self {
            Self::Sensor => SERVICE_SENSOR,
            Self::NetworkScan => SERVICE_NETWORK_SCAN,
            Self::Configuration => SERVICE_CONFIGURATION,
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Access rights and value kinds
// ───────────────────────────────────────────────────────────────

/// Subset of {read, write, notify}.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Access {
    pub read: bool,
    pub write: bool,
    pub notify: bool,
}

impl Access {
    pub const READ_NOTIFY: Self = Self { read: true, write: false, notify: true };
    pub const WRITE: Self = Self { read: false, write: true, notify: false };
    pub const READ_WRITE_NOTIFY: Self = Self { read: true, write: true, notify: true };
}

/// How a raw payload is decoded before the handler sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// UTF-8 passthrough.
    Text,
    /// Decimal integer text.
    Integer,
    /// Single truthy/falsy byte or character.
    Flag,
}

/// A decoded attribute payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValue {
    Text(String),
    Integer(i32),
    Flag(bool),
}

impl AttributeValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i32> {
        match self {
            Self::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            Self::Flag(v) => Some(*v),
            _ => None,
        }
    }
}

/// Opaque link handle assigned by the radio stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PeerHandle(pub u16);
