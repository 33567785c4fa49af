//! Instruction register and control unit.

use crate::Word;

/// Holds the word currently being decoded and the statement it selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InstructionRegister {
    data: Word,
    decoded: Option<usize>,
}

impl InstructionRegister {
    /// Word last delivered by the load/store unit.
    #[must_use]
    pub const fn data(&self) -> Word {
        self.data
    }

    /// Replaces the held word; any previous decode is discarded.
    pub fn set_data(&mut self, word: Word) {
        self.data = word;
        self.decoded = None;
    }

    /// Text-segment index selected by the last decode.
    #[must_use]
    pub const fn decoded(&self) -> Option<usize> {
        self.decoded
    }

    /// Records the outcome of decoding the held word.
    pub fn set_decoded(&mut self, index: Option<usize>) {
        self.decoded = index;
    }
}

/// Program counter plus the data slot the load/store unit delivers into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ControlUnit {
    pc: Word,
    data: Word,
}

impl ControlUnit {
    /// Creates a control unit starting at `pc`.
    #[must_use]
    pub const fn new(pc: Word) -> Self {
        Self {
            pc,
            data: Word::ZERO,
        }
    }

    /// Program counter.
    #[must_use]
    pub const fn pc(&self) -> Word {
        self.pc
    }

    /// Advances the program counter by one statement.
    pub fn advance(&mut self) {
        self.pc = self.pc.wrapping_add(Word::new(4));
    }

    /// Data slot.
    #[must_use]
    pub const fn data(&self) -> Word {
        self.data
    }

    /// Replaces the data slot.
    pub fn set_data(&mut self, word: Word) {
        self.data = word;
    }

    /// Copies the program counter into the data slot for transport.
    pub fn stage_pc(&mut self) {
        self.data = self.pc;
    }

    /// Jumps to the address held in the data slot.
    pub fn jump_to_data(&mut self) {
        self.pc = self.data;
    }
}
