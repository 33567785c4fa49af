//! Clocked CPU engine.
//!
//! Functional units exchange words only through the load/store unit. A
//! background clock grants one instruction cycle per interval; every unit
//! publishes a [`UnitEvent`] after it changes state.

/// Periodic clock and counting tick gate.
pub mod clock;
/// Engine lifecycle, sessions and run reports.
pub mod engine;
/// Unit change notifications.
pub mod events;
mod execute;
/// Address assignment and data loading.
pub mod layout;
/// Load/store unit.
pub mod lsu;
/// Byte-addressable main memory.
pub mod memory;
/// Register block.
pub mod registers;
/// Instruction register and control unit.
pub mod units;

pub use clock::{Clock, TickGate};
pub use engine::{Cpu, CpuSnapshot, HaltReason, RunReport, RunState, Session, StepOutcome};
pub use events::{EventChannel, UnitEvent, UnitId};
pub use layout::{MemoryLayout, TextSlot, STATEMENT_STRIDE};
pub use lsu::LoadStoreUnit;
pub use memory::MainMemory;
pub use registers::RegisterBlock;
pub use units::{ControlUnit, InstructionRegister};
