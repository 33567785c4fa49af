//! Optional observability channel for functional-unit state changes.
//!
//! Units publish a [`UnitEvent`] after every state-changing operation. The
//! channel is write-only from the engine's side: nothing the engine does
//! depends on whether a receiver exists or keeps up.

use std::sync::mpsc::Sender;

/// Functional units that publish change notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum UnitId {
    /// Register block.
    RegisterBlock,
    /// Main memory.
    MainMemory,
    /// Instruction register.
    InstructionRegister,
    /// Control unit.
    ControlUnit,
    /// Load/store unit transport slot.
    LoadStoreUnit,
}

/// "This unit's state changed."
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct UnitEvent {
    /// Unit whose state changed.
    pub unit: UnitId,
    /// Instruction cycle during which the change happened.
    pub cycle: u64,
}

/// Sending half of the observability channel, possibly disconnected.
#[derive(Debug, Clone, Default)]
pub struct EventChannel {
    sender: Option<Sender<UnitEvent>>,
}

impl EventChannel {
    /// A channel that drops every event.
    #[must_use]
    pub const fn disconnected() -> Self {
        Self { sender: None }
    }

    /// A channel forwarding events to `sender`.
    #[must_use]
    pub const fn new(sender: Sender<UnitEvent>) -> Self {
        Self {
            sender: Some(sender),
        }
    }

    /// Returns true when a sender is attached.
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        self.sender.is_some()
    }

    /// Publishes an event. A hung-up receiver is ignored.
    pub fn emit(&self, unit: UnitId, cycle: u64) {
        if let Some(sender) = &self.sender {
            let _ = sender.send(UnitEvent { unit, cycle });
        }
    }
}
