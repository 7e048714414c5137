//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing every attribute event to the
//! ESP-IDF logger (UART / USB-CDC in production).  Password values are
//! never printed, only their length.  Light updates arrive every main
//! cycle and go to `debug`.

use log::{log, Level};

use crate::app::attributes::{CHAR_LIGHT_LEVEL, CHAR_WIFI_PASSWORD};
use crate::app::events::AttributeEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AttributeEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Console line for one event, with the level it is logged at.
fn render(event: &AttributeEvent) -> (Level, String) {
    match event {
        AttributeEvent::ValueChanged { id, value, .. } if *id == CHAR_LIGHT_LEVEL => (
            Level::Debug,
            format!("ATTR | {} | {:?}", id, String::from_utf8_lossy(value)),
        ),
        AttributeEvent::ValueChanged { id, value, notify } if *id == CHAR_WIFI_PASSWORD => (
            Level::Info,
            format!("ATTR | {} | <{} bytes> | notify={}", id, value.len(), notify),
        ),
        AttributeEvent::ValueChanged { id, value, notify } => (
            Level::Info,
            format!(
                "ATTR | {} | {:?} | notify={}",
                id,
                String::from_utf8_lossy(value),
                notify
            ),
        ),
        AttributeEvent::ScanCompleted(count) => {
            (Level::Info, format!("SCAN | {} network(s)", count))
        }
        AttributeEvent::WriteDropped(id) => (Level::Warn, format!("DROP | {}", id)),
        AttributeEvent::PersistFailed(id) => {
            (Level::Warn, format!("PERSIST | {} | write lost", id))
        }
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AttributeEvent) {
        let (level, line) = render(event);
        log!(level, "{}", line);
    }
}
