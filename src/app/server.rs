//! Attribute server: the explicit device context.
//!
//! Owns the registry, the reflected value table, the settings store, the
//! scanner and the scan orchestrator.  Radio callbacks capture an
//! `Arc<Mutex<AttributeServer<..>>>` when they are registered; the mutex
//! serializes radio-task writes against the main loop's publisher.
//!
//! ```text
//!   ┌──────────── AttributeServer ─────────────┐
//!   │  registry ─▶ dispatcher ─▶ handlers      │
//!   │                 │             │          │
//!   │             values        settings       │
//!   │                 │          scanner       │
//!   │                 ▼                        │
//!   │               sink ──▶ radio / log       │
//!   └──────────────────────────────────────────┘
//! ```

use log::{info, warn};

use crate::config::DeviceSettings;

use super::attributes::{
    AttributeId, CHAR_LIGHT_LEVEL, CHAR_SCAN_INTERVAL, CHAR_SENSOR_NAME, CHAR_WIFI_ENABLED,
    CHAR_WIFI_PASSWORD, CHAR_WIFI_SSID,
};
use super::codec;
use super::dispatcher::{self, DispatchOutcome, HandlerContext};
use super::events::AttributeEvent;
use super::ports::{EventSink, ScannerPort, SettingsPort, WriteTarget};
use super::registry::AttributeRegistry;
use super::scan::{ScanCommandState, ScanOrchestrator};
use super::values::AttributeValues;

pub struct AttributeServer<P, W, E>
where
    P: SettingsPort,
    W: ScannerPort,
    E: EventSink,
{
    registry: AttributeRegistry,
    values: AttributeValues,
    settings: P,
    scanner: W,
    scan: ScanOrchestrator,
    sink: E,
}

impl<P, W, E> AttributeServer<P, W, E>
where
    P: SettingsPort,
    W: ScannerPort,
    E: EventSink,
{
    /// Build the server and seed the configuration attributes from the
    /// persisted settings.
    pub fn new(settings: P, scanner: W, sink: E) -> Self {
        let registry = AttributeRegistry::build();
        let mut values = AttributeValues::seeded(&registry);

        let loaded = settings.load();
        seed_from_settings(&mut values, &loaded);
        info!(
            "Server: seeded from settings (name={:?}, interval={}s, wifi_enabled={})",
            loaded.name, loaded.scan_interval_secs, loaded.wifi_enabled
        );

        Self {
            registry,
            values,
            settings,
            scanner,
            scan: ScanOrchestrator::new(),
            sink,
        }
    }

    /// Route one inbound write.
    pub fn handle_write(&mut self, id: AttributeId, raw: &[u8]) -> DispatchOutcome {
        let mut ctx = HandlerContext {
            id,
            values: &mut self.values,
            settings: &mut self.settings,
            scan: &mut self.scan,
            scanner: &mut self.scanner,
            sink: &mut self.sink,
        };
        dispatcher::dispatch(&self.registry, &mut ctx, raw)
    }

    /// Route a write addressed by textual UUID.  Malformed identifiers are
    /// dropped like unknown ones.
    pub fn handle_write_str(&mut self, id: &str, raw: &[u8]) -> DispatchOutcome {
        match id.parse::<AttributeId>() {
            Ok(id) => self.handle_write(id, raw),
            Err(e) => {
                warn!("Server: write to {:?} dropped ({})", id, e);
                DispatchOutcome::UnknownAttribute
            }
        }
    }

    /// Replace the Light attribute and notify subscribers.
    pub fn publish_light(&mut self, text: &str) {
        self.values.set(CHAR_LIGHT_LEVEL, text.as_bytes());
        self.sink.emit(&AttributeEvent::ValueChanged {
            id: CHAR_LIGHT_LEVEL,
            value: text.as_bytes().to_vec(),
            notify: true,
        });
    }

    pub fn value(&self, id: AttributeId) -> Option<&[u8]> {
        self.values.get(id)
    }

    pub fn text(&self, id: AttributeId) -> String {
        self.values.text(id)
    }

    /// Every attribute's current value, in registry order.
    pub fn snapshot(&self) -> Vec<(AttributeId, Vec<u8>)> {
        self.values.iter().map(|(id, v)| (id, v.to_vec())).collect()
    }

    pub fn registry(&self) -> &AttributeRegistry {
        &self.registry
    }

    pub fn scan_state(&self) -> ScanCommandState {
        self.scan.state()
    }

    pub fn scans_completed(&self) -> u32 {
        self.scan.completed()
    }

    pub fn settings(&self) -> &P {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut P {
        &mut self.settings
    }

    pub fn scanner_mut(&mut self) -> &mut W {
        &mut self.scanner
    }

    pub fn sink(&self) -> &E {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut E {
        &mut self.sink
    }
}

impl<P, W, E> WriteTarget for AttributeServer<P, W, E>
where
    P: SettingsPort,
    W: ScannerPort,
    E: EventSink,
{
    fn on_write(&mut self, id: AttributeId, value: &[u8]) {
        self.handle_write(id, value);
    }
}

fn seed_from_settings(values: &mut AttributeValues, s: &DeviceSettings) {
    values.set(CHAR_SENSOR_NAME, s.name.as_bytes());
    values.set(
        CHAR_SCAN_INTERVAL,
        s.scan_interval_secs.to_string().as_bytes(),
    );
    values.set(CHAR_WIFI_SSID, s.wifi_ssid.as_bytes());
    values.set(CHAR_WIFI_PASSWORD, s.wifi_password.as_bytes());
    values.set(CHAR_WIFI_ENABLED, codec::encode_flag(s.wifi_enabled));
}
