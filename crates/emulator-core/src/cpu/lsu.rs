//! Load/store unit: the only path to main memory and the register block.
//!
//! Every transfer is a `send`/`receive` pair through the unit's transport
//! slot, standing in for a shared data bus. Each operation completes before
//! it publishes its change notification.

use crate::cpu::events::{EventChannel, UnitId};
use crate::cpu::memory::MainMemory;
use crate::cpu::registers::RegisterBlock;
use crate::cpu::units::{ControlUnit, InstructionRegister};
use crate::{Register, RuntimeFault, Word};

/// Mediates all data movement between functional units.
#[derive(Debug, Clone)]
pub struct LoadStoreUnit {
    slot: Word,
    registers: RegisterBlock,
    memory: MainMemory,
    events: EventChannel,
    cycle: u64,
}

impl LoadStoreUnit {
    /// Creates a unit owning `registers` and `memory`.
    #[must_use]
    pub fn new(registers: RegisterBlock, memory: MainMemory, events: EventChannel) -> Self {
        Self {
            slot: Word::ZERO,
            registers,
            memory,
            events,
            cycle: 0,
        }
    }

    /// Current transport slot value.
    #[must_use]
    pub const fn data(&self) -> Word {
        self.slot
    }

    /// Read-only view of the register block.
    #[must_use]
    pub const fn registers(&self) -> &RegisterBlock {
        &self.registers
    }

    /// Read-only view of main memory.
    #[must_use]
    pub const fn memory(&self) -> &MainMemory {
        &self.memory
    }

    pub(crate) fn set_cycle(&mut self, cycle: u64) {
        self.cycle = cycle;
    }

    pub(crate) const fn events(&self) -> &EventChannel {
        &self.events
    }

    pub(crate) fn set_events(&mut self, events: EventChannel) {
        self.events = events;
    }

    fn publish(&self, unit: UnitId) {
        self.events.emit(unit, self.cycle);
    }

    /// Loads the instruction register's word into the transport slot.
    pub fn receive_instruction_register(&mut self, ir: &InstructionRegister) {
        self.slot = ir.data();
        self.publish(UnitId::LoadStoreUnit);
    }

    /// Delivers the transport slot into the instruction register.
    pub fn send_instruction_register(&self, ir: &mut InstructionRegister) {
        ir.set_data(self.slot);
        self.publish(UnitId::InstructionRegister);
    }

    /// Loads the control unit's data slot into the transport slot.
    pub fn receive_control_unit(&mut self, cu: &ControlUnit) {
        self.slot = cu.data();
        self.publish(UnitId::LoadStoreUnit);
    }

    /// Delivers the transport slot into the control unit's data slot.
    pub fn send_control_unit(&self, cu: &mut ControlUnit) {
        cu.set_data(self.slot);
        self.publish(UnitId::ControlUnit);
    }

    /// Reads a register into the transport slot and returns it.
    pub fn read_register(&mut self, register: Register) -> Word {
        self.slot = self.registers.get(register);
        self.publish(UnitId::LoadStoreUnit);
        self.slot
    }

    /// Writes `value` to a register.
    pub fn write_register(&mut self, register: Register, value: Word) {
        self.registers.set(register, value);
        self.publish(UnitId::RegisterBlock);
    }

    /// Reads `length` bytes at `address` into the transport slot,
    /// sign-extending when `signed`.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeFault::MemoryOutOfRange`] for accesses outside memory.
    pub fn read_memory(
        &mut self,
        address: u32,
        length: usize,
        signed: bool,
    ) -> Result<Word, RuntimeFault> {
        let word = if signed {
            self.memory.read(address, length)?
        } else {
            self.memory.read_unsigned(address, length)?
        };
        self.slot = word;
        self.publish(UnitId::LoadStoreUnit);
        Ok(word)
    }

    /// Stores the low `length` bytes of `value` at `address`.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeFault::MemoryOutOfRange`] for accesses outside memory.
    pub fn write_memory(
        &mut self,
        address: u32,
        value: Word,
        length: usize,
    ) -> Result<(), RuntimeFault> {
        self.slot = value;
        self.memory
            .write(address, &value.to_bytes_truncated(length))?;
        self.publish(UnitId::MainMemory);
        Ok(())
    }
}
