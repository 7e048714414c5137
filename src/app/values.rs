//! Reflected attribute values.
//!
//! One slot per registry entry, in registry order.  This is the device's
//! view of every characteristic value; the radio adapter mirrors it into
//! the stack through [`AttributeEvent::ValueChanged`](super::events::AttributeEvent).

use super::attributes::AttributeId;
use super::registry::AttributeRegistry;

#[derive(Debug, Clone)]
pub struct AttributeValues {
    ids: Vec<AttributeId>,
    slots: Vec<Vec<u8>>,
}

impl AttributeValues {
    /// Seed every slot with the registry's initial value.
    pub fn seeded(registry: &AttributeRegistry) -> Self {
        let ids = registry.iter().map(|d| d.id).collect();
        let slots = registry.iter().map(|d| d.initial.to_vec()).collect();
        Self { ids, slots }
    }

    fn index(&self, id: AttributeId) -> Option<usize> {
        self.ids.iter().position(|candidate| *candidate == id)
    }

    pub fn get(&self, id: AttributeId) -> Option<&[u8]> {
        self.index(id).map(|i| self.slots[i].as_slice())
    }

    /// Lossy UTF-8 view of a value; empty for unknown ids.
    pub fn text(&self, id: AttributeId) -> String {
        self.get(id)
            .map(|v| String::from_utf8_lossy(v).into_owned())
            .unwrap_or_default()
    }

    /// Replace a value.  Returns `false` (and stores nothing) for ids not in
    /// the registry.
    pub fn set(&mut self, id: AttributeId, value: &[u8]) -> bool {
        match self.index(id) {
            Some(i) => {
                self.slots[i].clear();
                self.slots[i].extend_from_slice(value);
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (AttributeId, &[u8])> {
        self.ids
            .iter()
            .copied()
            .zip(self.slots.iter().map(Vec::as_slice))
    }
}
