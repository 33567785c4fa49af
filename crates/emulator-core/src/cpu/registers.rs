//! General-purpose register block.

use crate::{Register, Word, REGISTER_COUNT};

/// Named register slots; `$zero` always reads as zero.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RegisterBlock {
    values: [Word; REGISTER_COUNT],
}

impl RegisterBlock {
    /// Creates a block with every register cleared.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a register.
    #[must_use]
    pub const fn get(&self, register: Register) -> Word {
        self.values[register.index()]
    }

    /// Writes a register. Writes to `$zero` are discarded.
    pub fn set(&mut self, register: Register, value: Word) {
        if register != Register::Zero {
            self.values[register.index()] = value;
        }
    }

    /// All register values in hardware order.
    #[must_use]
    pub const fn values(&self) -> [Word; REGISTER_COUNT] {
        self.values
    }
}

#[cfg(test)]
mod tests {
    use super::RegisterBlock;
    use crate::{Register, Word};

    #[test]
    fn zero_register_is_hardwired() {
        let mut block = RegisterBlock::new();
        block.set(Register::Zero, Word::new(7));
        assert_eq!(block.get(Register::Zero), Word::ZERO);
    }

    #[test]
    fn writes_are_visible_to_reads() {
        let mut block = RegisterBlock::new();
        block.set(Register::T3, Word::new(-9));
        assert_eq!(block.get(Register::T3), Word::new(-9));
        assert_eq!(block.values()[Register::T3.index()], Word::new(-9));
    }
}
