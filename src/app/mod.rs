//! Application core: pure domain logic, zero I/O.
//!
//! This module contains the attribute server for the PhotonIQ sensor:
//! the attribute registry and write dispatcher, the scan-command protocol,
//! the connection lifecycle and the state publisher.  All interaction with
//! the radio, flash and sensor happens through **port traits** defined in
//! [`ports`], keeping this layer fully testable without real peripherals.

pub mod attributes;
pub mod codec;
pub mod dispatcher;
pub mod events;
mod handlers;
pub mod lifecycle;
pub mod ports;
pub mod publisher;
pub mod registry;
pub mod scan;
pub mod server;
pub mod settings;
pub mod values;
