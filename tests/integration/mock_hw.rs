//! Mock adapters for integration tests.
//!
//! Each mock records what the domain asked of it so tests can assert on
//! the full history without a radio, flash or sensor.

use std::collections::HashMap;

use photoniq::app::attributes::AttributeId;
use photoniq::app::events::AttributeEvent;
use photoniq::app::ports::{
    EventSink, ScannerPort, SensorError, SensorPort, StorageError, StoragePort,
};
use photoniq::app::server::AttributeServer;
use photoniq::app::settings::SettingsStore;

// ── MockNvs ───────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MockNvs {
    pub data: HashMap<(String, String), Vec<u8>>,
    /// When set, every write fails with `StorageError::Full`.
    pub fail_writes: bool,
    pub writes: u32,
}

#[allow(dead_code)]
impl MockNvs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store raw bytes, bypassing `fail_writes`.
    pub fn put(&mut self, namespace: &str, key: &str, data: &[u8]) {
        self.data
            .insert((namespace.to_string(), key.to_string()), data.to_vec());
    }

    pub fn raw(&self, namespace: &str, key: &str) -> Option<&[u8]> {
        self.data
            .get(&(namespace.to_string(), key.to_string()))
            .map(Vec::as_slice)
    }
}

impl StoragePort for MockNvs {
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        let value = self.raw(namespace, key).ok_or(StorageError::NotFound)?;
        if value.len() > buf.len() {
            return Err(StorageError::IoError);
        }
        buf[..value.len()].copy_from_slice(value);
        Ok(value.len())
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        if self.fail_writes {
            return Err(StorageError::Full);
        }
        self.writes += 1;
        self.put(namespace, key, data);
        Ok(())
    }
}

// ── MockScanner ───────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MockScanner {
    pub networks: Vec<String>,
    pub calls: u32,
}

#[allow(dead_code)]
impl MockScanner {
    pub fn with(names: &[&str]) -> Self {
        Self {
            networks: names.iter().map(|n| (*n).to_string()).collect(),
            calls: 0,
        }
    }
}

impl ScannerPort for MockScanner {
    fn scan(&mut self) -> Vec<String> {
        self.calls += 1;
        self.networks.clone()
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<AttributeEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value-change events for `id`, oldest first, as `(value, notify)`.
    pub fn changes(&self, id: AttributeId) -> Vec<(Vec<u8>, bool)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                AttributeEvent::ValueChanged { id: i, value, notify } if *i == id => {
                    Some((value.clone(), *notify))
                }
                _ => None,
            })
            .collect()
    }

    pub fn notifications(&self, id: AttributeId) -> usize {
        self.changes(id).iter().filter(|(_, n)| *n).count()
    }

    pub fn contains(&self, event: &AttributeEvent) -> bool {
        self.events.contains(event)
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AttributeEvent) {
        self.events.push(event.clone());
    }
}

// ── MockSensor ────────────────────────────────────────────────

#[derive(Debug)]
pub struct MockSensor {
    pub reading: Result<f32, SensorError>,
    pub reads: u32,
}

#[allow(dead_code)]
impl MockSensor {
    pub fn new(reading: Result<f32, SensorError>) -> Self {
        Self { reading, reads: 0 }
    }
}

impl SensorPort for MockSensor {
    fn read_lux(&mut self) -> Result<f32, SensorError> {
        self.reads += 1;
        self.reading
    }
}

// ── Fixtures ──────────────────────────────────────────────────

pub type TestServer = AttributeServer<SettingsStore<MockNvs>, MockScanner, RecordingSink>;

#[allow(dead_code)]
pub fn server() -> TestServer {
    server_with(MockNvs::new(), MockScanner::default())
}

#[allow(dead_code)]
pub fn server_with(nvs: MockNvs, scanner: MockScanner) -> TestServer {
    AttributeServer::new(SettingsStore::new(nvs), scanner, RecordingSink::new())
}
