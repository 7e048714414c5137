//! Write dispatcher: the single entry point for inbound attribute writes.
//!
//! ```text
//!   radio write ──▶ lookup ──▶ access check ──▶ cap ──▶ reflect raw ──▶ decode ──▶ handler
//!                     │              │
//!                     └─ unknown ────┴─ not writable ──▶ log + drop
//! ```
//!
//! Runs synchronously on the caller's context (the radio task, holding
//! the server lock).  Handlers never call back into the dispatcher.

use log::warn;

use crate::config::MAX_ATTRIBUTE_LEN;

use super::attributes::AttributeId;
use super::codec;
use super::events::AttributeEvent;
use super::ports::{EventSink, ScannerPort, SettingsPort};
use super::registry::AttributeRegistry;
use super::scan::ScanOrchestrator;
use super::values::AttributeValues;

/// Everything a write handler may touch.  Borrowed from the
/// [`AttributeServer`](super::server::AttributeServer) for one dispatch.
pub struct HandlerContext<'a> {
    /// Attribute being written.
    pub id: AttributeId,
    pub values: &'a mut AttributeValues,
    pub settings: &'a mut dyn SettingsPort,
    pub scan: &'a mut ScanOrchestrator,
    pub scanner: &'a mut dyn ScannerPort,
    pub sink: &'a mut dyn EventSink,
}

impl HandlerContext<'_> {
    /// Replace the written attribute's reflected value and mirror it to the
    /// radio without notifying.
    pub fn reflect(&mut self, value: &[u8]) {
        let id = self.id;
        self.values.set(id, value);
        self.sink.emit(&AttributeEvent::ValueChanged {
            id,
            value: value.to_vec(),
            notify: false,
        });
    }
}

/// Outcome of a dispatch, mostly useful for tests and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Handled,
    UnknownAttribute,
    NotWritable,
}

/// Route one write.  `ctx.id` names the target attribute.
pub fn dispatch(
    registry: &AttributeRegistry,
    ctx: &mut HandlerContext<'_>,
    raw: &[u8],
) -> DispatchOutcome {
    let Some(descriptor) = registry.lookup(ctx.id) else {
        warn!("Dispatcher: write to unknown attribute {} dropped", ctx.id);
        ctx.sink.emit(&AttributeEvent::WriteDropped(ctx.id));
        return DispatchOutcome::UnknownAttribute;
    };

    let handler = match (descriptor.access.write, descriptor.handler) {
        (true, Some(handler)) => handler,
        _ => {
            warn!(
                "Dispatcher: write to read-only attribute {} dropped",
                descriptor.name
            );
            ctx.sink.emit(&AttributeEvent::WriteDropped(ctx.id));
            return DispatchOutcome::NotWritable;
        }
    };

    let raw = if raw.len() > MAX_ATTRIBUTE_LEN {
        warn!(
            "Dispatcher: {} byte write to {} cut to {}",
            raw.len(),
            descriptor.name,
            MAX_ATTRIBUTE_LEN
        );
        &raw[..MAX_ATTRIBUTE_LEN]
    } else {
        raw
    };

    // The stack stores the written bytes before the callback fires.
    ctx.values.set(ctx.id, raw);

    let value = codec::decode(descriptor.kind, raw);
    handler(ctx, value);
    DispatchOutcome::Handled
}
