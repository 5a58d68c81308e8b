//! One-way replication from the authoritative egg to its replicas.
//!
//! The authoritative side writes synced fields and broadcasts events
//! through the [`FieldSync`] / [`Replicator`] capabilities. Replicas
//! consume the resulting [`SyncMessage`] stream and never write back.

use serde::{Deserialize, Serialize};

use crate::error::{HatcheryError, Result};

/// A synced egg field with its new value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SyncedField {
    /// Current breed id.
    Breed(String),
    /// Pending transition breed id; empty means no transition.
    TransitionBreed(String),
}

/// Discrete egg event broadcast to replicas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EggEvent {
    /// The egg hatched and is gone.
    Hatch,
    /// The egg wiggled.
    Wiggle,
}

impl EggEvent {
    /// Wire byte of this event.
    #[must_use]
    pub const fn id(self) -> u8 {
        match self {
            Self::Hatch => 1,
            Self::Wiggle => 2,
        }
    }

    /// Event for a wire byte, if known.
    #[must_use]
    pub const fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Self::Hatch),
            2 => Some(Self::Wiggle),
            _ => None,
        }
    }
}

/// Everything that crosses from the authoritative side to a replica.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SyncMessage {
    /// A synced field changed (or was re-sent).
    Field(SyncedField),
    /// An event was broadcast.
    Event(EggEvent),
}

impl SyncMessage {
    /// Encode for the wire.
    pub fn encode(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| {
            HatcheryError::Serialization(format!("Failed to encode sync message: {}", e))
        })
    }

    /// Decode from the wire.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        bincode::deserialize(bytes).map_err(|e| {
            HatcheryError::Serialization(format!("Failed to decode sync message: {}", e))
        })
    }
}

/// Capability to write synced fields.
pub trait FieldSync {
    /// Publish a new field value to replicas.
    fn write_field(&mut self, field: SyncedField);
}

/// Capability to write synced fields and broadcast events.
pub trait Replicator: FieldSync {
    /// Broadcast a discrete event to replicas.
    fn broadcast(&mut self, event: EggEvent);
}

/// Buffers outgoing messages in emission order until the host drains them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncOutbox {
    messages: Vec<SyncMessage>,
}

impl SyncOutbox {
    /// Create an empty outbox.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pending messages.
    #[must_use]
    pub fn messages(&self) -> &[SyncMessage] {
        &self.messages
    }

    /// Take all pending messages.
    pub fn drain(&mut self) -> Vec<SyncMessage> {
        std::mem::take(&mut self.messages)
    }

    /// Whether nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl FieldSync for SyncOutbox {
    fn write_field(&mut self, field: SyncedField) {
        self.messages.push(SyncMessage::Field(field));
    }
}

impl Replicator for SyncOutbox {
    fn broadcast(&mut self, event: EggEvent) {
        self.messages.push(SyncMessage::Event(event));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outbox_preserves_order() {
        let mut outbox = SyncOutbox::new();
        outbox.write_field(SyncedField::TransitionBreed("ice".to_string()));
        outbox.broadcast(EggEvent::Wiggle);
        outbox.write_field(SyncedField::Breed("ice".to_string()));

        let drained = outbox.drain();
        assert_eq!(
            drained,
            vec![
                SyncMessage::Field(SyncedField::TransitionBreed("ice".to_string())),
                SyncMessage::Event(EggEvent::Wiggle),
                SyncMessage::Field(SyncedField::Breed("ice".to_string())),
            ]
        );
        assert!(outbox.is_empty());
    }

    #[test]
    fn test_event_ids() {
        assert_eq!(EggEvent::from_id(EggEvent::Hatch.id()), Some(EggEvent::Hatch));
        assert_eq!(EggEvent::from_id(EggEvent::Wiggle.id()), Some(EggEvent::Wiggle));
        assert_eq!(EggEvent::from_id(0), None);
    }

    #[test]
    fn test_wire_codec() {
        let msg = SyncMessage::Field(SyncedField::Breed("dragonmounts:fire".to_string()));
        let bytes = msg.encode().unwrap();
        assert_eq!(SyncMessage::decode(&bytes).unwrap(), msg);
        assert!(SyncMessage::decode(&[0xff, 0xff, 0xff, 0xff]).is_err());
    }
}
