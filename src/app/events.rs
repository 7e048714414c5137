//! Outbound attribute events.
//!
//! The [`AttributeServer`](super::server::AttributeServer) emits these
//! through the [`EventSink`](super::ports::EventSink) port.  The radio
//! adapter mirrors them into the GATT table; the log sink prints them.

use super::attributes::AttributeId;

/// Structured events emitted by the attribute core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeEvent {
    /// The reflected value of an attribute changed.  When `notify` is set
    /// the radio pushes the new value to subscribed peers.
    ValueChanged {
        id: AttributeId,
        value: Vec<u8>,
        notify: bool,
    },

    /// A write addressed an identifier the registry does not know.
    WriteDropped(AttributeId),

    /// A Wi-Fi scan finished with this many networks.
    ScanCompleted(usize),

    /// A settings write could not be committed.
    PersistFailed(AttributeId),
}
