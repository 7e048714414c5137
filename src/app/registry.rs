//! Table-driven attribute registry.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │  AttributeRegistry                                               │
//! │  ┌──────────────────┬─────────┬──────┬──────┬─────────────────┐  │
//! │  │ id               │ service │ kind │ init │ handler         │  │
//! │  ├──────────────────┼─────────┼──────┼──────┼─────────────────┤  │
//! │  │ CHAR_LIGHT_LEVEL │ Sensor  │ Text │ "-1" │ (none)          │  │
//! │  │ CHAR_WIFI_SCAN…  │ Scan    │ Flag │ 0x00 │ fn(ctx, value)  │  │
//! │  │ CHAR_SENSOR_NAME │ Config  │ Text │ ""   │ fn(ctx, value)  │  │
//! │  │ …                │         │      │      │                 │  │
//! │  └──────────────────┴─────────┴──────┴──────┴─────────────────┘  │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Built once at boot and never mutated.  Lookup is a linear scan over
//! the eight rows.

use super::attributes::{
    Access, AttributeId, ServiceGroup, ValueKind, CHAR_LIGHT_LEVEL, CHAR_SCAN_INTERVAL,
    CHAR_SENSOR_NAME, CHAR_WIFI_ENABLED, CHAR_WIFI_NETWORKS, CHAR_WIFI_PASSWORD,
    CHAR_WIFI_SCAN_CMD, CHAR_WIFI_SSID,
};
use super::attributes::AttributeValue;
use super::codec::FLAG_RESET;
use super::dispatcher::HandlerContext;
use super::handlers;

/// Write handler bound to a registry row.  Receives the decoded payload.
pub type WriteHandlerFn = fn(&mut HandlerContext<'_>, AttributeValue);

/// One row of the registry.
pub struct AttributeDescriptor {
    pub id: AttributeId,
    pub name: &'static str,
    pub service: ServiceGroup,
    pub access: Access,
    pub kind: ValueKind,
    /// Value the attribute holds before anything is written or loaded.
    pub initial: &'static [u8],
    pub handler: Option<WriteHandlerFn>,
}

pub struct AttributeRegistry {
    table: Vec<AttributeDescriptor>,
}

impl AttributeRegistry {
    /// Build the device's fixed attribute table.
    pub fn build() -> Self {
        let table = vec![
            AttributeDescriptor {
                id: CHAR_LIGHT_LEVEL,
                name: "light_level",
                service: ServiceGroup::Sensor,
                access: Access::READ_NOTIFY,
                kind: ValueKind::Text,
                initial: b"-1",
                handler: None,
            },
            AttributeDescriptor {
                id: CHAR_WIFI_NETWORKS,
                name: "wifi_networks",
                service: ServiceGroup::NetworkScan,
                access: Access::READ_NOTIFY,
                kind: ValueKind::Text,
                initial: b"",
                handler: None,
            },
            AttributeDescriptor {
                id: CHAR_WIFI_SCAN_CMD,
                name: "wifi_scan_cmd",
                service: ServiceGroup::NetworkScan,
                access: Access::WRITE,
                kind: ValueKind::Flag,
                initial: &FLAG_RESET,
                handler: Some(handlers::scan_command),
            },
            AttributeDescriptor {
                id: CHAR_SENSOR_NAME,
                name: "sensor_name",
                service: ServiceGroup::Configuration,
                access: Access::READ_WRITE_NOTIFY,
                kind: ValueKind::Text,
                initial: b"",
                handler: Some(handlers::sensor_name),
            },
            AttributeDescriptor {
                id: CHAR_SCAN_INTERVAL,
                name: "scan_interval",
                service: ServiceGroup::Configuration,
                access: Access::READ_WRITE_NOTIFY,
                kind: ValueKind::Integer,
                initial: b"",
                handler: Some(handlers::scan_interval),
            },
            AttributeDescriptor {
                id: CHAR_WIFI_SSID,
                name: "wifi_ssid",
                service: ServiceGroup::Configuration,
                access: Access::READ_WRITE_NOTIFY,
                kind: ValueKind::Text,
                initial: b"",
                handler: Some(handlers::wifi_ssid),
            },
            AttributeDescriptor {
                id: CHAR_WIFI_PASSWORD,
                name: "wifi_password",
                service: ServiceGroup::Configuration,
                access: Access::READ_WRITE_NOTIFY,
                kind: ValueKind::Text,
                initial: b"",
                handler: Some(handlers::wifi_password),
            },
            AttributeDescriptor {
                id: CHAR_WIFI_ENABLED,
                name: "wifi_enabled",
                service: ServiceGroup::Configuration,
                access: Access::READ_WRITE_NOTIFY,
                kind: ValueKind::Flag,
                initial: b"",
                handler: Some(handlers::wifi_enabled),
            },
        ];
        Self { table }
    }

    /// Find a row by identifier.
    pub fn lookup(&self, id: AttributeId) -> Option<&AttributeDescriptor> {
        self.table.iter().find(|d| d.id == id)
    }

    /// Find a row by textual UUID.  Case-insensitive; malformed text
    /// matches nothing.
    pub fn lookup_str(&self, id: &str) -> Option<&AttributeDescriptor> {
        id.parse().ok().and_then(|id| self.lookup(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &AttributeDescriptor> {
        self.table.iter()
    }

    /// Rows advertised under one service, in table order.
    pub fn in_service(&self, service: ServiceGroup) -> impl Iterator<Item = &AttributeDescriptor> {
        self.table.iter().filter(move |d| d.service == service)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}
