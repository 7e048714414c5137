//! Wi-Fi scan command protocol.
//!
//! ```text
//!   Idle ──truthy write──▶ ScanRequested ──▶ ScanInFlight ──▶ ResultsReady ──▶ Idle
//!                                              (blocking)       publish +      reset
//!                                                               notify         cmd = 0x00
//! ```
//!
//! The whole cycle completes inside one dispatcher call.  Any write that
//! arrives while the state is not `Idle`, and any falsy write, is a no-op.

use log::info;

use super::attributes::{CHAR_WIFI_NETWORKS, CHAR_WIFI_SCAN_CMD};
use super::codec::{self, FLAG_RESET};
use super::events::AttributeEvent;
use super::ports::{EventSink, ScannerPort};
use super::values::AttributeValues;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanCommandState {
    Idle,
    ScanRequested,
    ScanInFlight,
    ResultsReady,
}

#[derive(Debug)]
pub struct ScanOrchestrator {
    state: ScanCommandState,
    completed: u32,
}

impl Default for ScanOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanOrchestrator {
    pub fn new() -> Self {
        Self {
            state: ScanCommandState::Idle,
            completed: 0,
        }
    }

    pub fn state(&self) -> ScanCommandState {
        self.state
    }

    /// Number of scan cycles run since boot.
    pub fn completed(&self) -> u32 {
        self.completed
    }

    /// Handle a decoded scan-command write.  Returns `true` if a scan ran.
    pub fn on_command(
        &mut self,
        requested: bool,
        scanner: &mut dyn ScannerPort,
        values: &mut AttributeValues,
        sink: &mut dyn EventSink,
    ) -> bool {
        if !requested || self.state != ScanCommandState::Idle {
            return false;
        }

        self.state = ScanCommandState::ScanRequested;
        info!("Scan: starting WiFi scan");

        self.state = ScanCommandState::ScanInFlight;
        let networks = scanner.scan();

        self.state = ScanCommandState::ResultsReady;
        let joined = codec::join_networks(&networks);
        info!("Scan: {} network(s) found", networks.len());
        sink.emit(&AttributeEvent::ScanCompleted(networks.len()));

        values.set(CHAR_WIFI_NETWORKS, joined.as_bytes());
        sink.emit(&AttributeEvent::ValueChanged {
            id: CHAR_WIFI_NETWORKS,
            value: joined.into_bytes(),
            notify: true,
        });

        values.set(CHAR_WIFI_SCAN_CMD, &FLAG_RESET);
        sink.emit(&AttributeEvent::ValueChanged {
            id: CHAR_WIFI_SCAN_CMD,
            value: FLAG_RESET.to_vec(),
            notify: false,
        });

        self.state = ScanCommandState::Idle;
        self.completed = self.completed.wrapping_add(1);
        true
    }
}
