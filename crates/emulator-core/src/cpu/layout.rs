//! Address assignment for both segments and data-segment loading.

use crate::cpu::memory::MainMemory;
use crate::{
    EngineConfig, LabelTarget, Operand, Program, RuntimeFault, Variable, VariableKind, Word,
    WORD_BYTES,
};

/// Bytes between consecutive text-segment statements.
pub const STATEMENT_STRIDE: u32 = WORD_BYTES as u32;

/// Where a fetch address lands in the text segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextSlot {
    /// A statement index.
    Statement(usize),
    /// One past the last statement.
    End,
}

/// Fixed address map derived from a program and an engine configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryLayout {
    text_base: u32,
    text_len: usize,
    data_base: u32,
    data_offsets: Vec<u32>,
    data_size: usize,
}

impl MemoryLayout {
    /// Assigns addresses: statements sit `STATEMENT_STRIDE` apart from
    /// `text_base`; variables are packed from `data_base` at their natural
    /// alignment.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeFault::DataSegmentTooLarge`] when the packed data
    /// segment does not fit in `config.memory_size` bytes.
    pub fn plan(program: &Program, config: &EngineConfig) -> Result<Self, RuntimeFault> {
        let capacity = config.memory_size as usize;
        let mut offsets = Vec::with_capacity(program.data().len());
        let mut cursor: usize = 0;
        for variable in program.data().entries() {
            let alignment = variable.kind.alignment() as usize;
            let start = cursor.div_ceil(alignment) * alignment;
            let end = start.saturating_add(variable.size);
            if end > capacity {
                return Err(RuntimeFault::DataSegmentTooLarge {
                    required: end,
                    capacity,
                });
            }
            offsets.push(u32::try_from(start).map_err(|_| {
                RuntimeFault::DataSegmentTooLarge {
                    required: end,
                    capacity,
                }
            })?);
            cursor = end;
        }
        Ok(Self {
            text_base: config.text_base,
            text_len: program.text().len(),
            data_base: config.data_base,
            data_offsets: offsets,
            data_size: cursor,
        })
    }

    /// Address of text statement `index`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn text_address(&self, index: usize) -> u32 {
        self.text_base
            .wrapping_add((index as u32).wrapping_mul(STATEMENT_STRIDE))
    }

    /// Maps a fetch address back to a statement, or `None` when it lies
    /// outside the text segment or is misaligned.
    #[must_use]
    pub fn text_slot(&self, address: u32) -> Option<TextSlot> {
        let offset = address.checked_sub(self.text_base)?;
        if offset % STATEMENT_STRIDE != 0 {
            return None;
        }
        let index = (offset / STATEMENT_STRIDE) as usize;
        match index.cmp(&self.text_len) {
            std::cmp::Ordering::Less => Some(TextSlot::Statement(index)),
            std::cmp::Ordering::Equal => Some(TextSlot::End),
            std::cmp::Ordering::Greater => None,
        }
    }

    /// Address of data variable `index`.
    #[must_use]
    pub fn data_address(&self, index: usize) -> Option<u32> {
        self.data_offsets
            .get(index)
            .map(|offset| self.data_base.wrapping_add(*offset))
    }

    /// Address a resolved label points to.
    #[must_use]
    pub fn target_address(&self, target: LabelTarget) -> Option<u32> {
        match target {
            LabelTarget::Text(index) => {
                (index < self.text_len).then(|| self.text_address(index))
            }
            LabelTarget::Data(index) => self.data_address(index),
        }
    }

    /// Bytes occupied by the packed data segment.
    #[must_use]
    pub const fn data_size(&self) -> usize {
        self.data_size
    }

    /// Writes every variable's initial bytes into `memory`.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeFault::MemoryOutOfRange`] when a variable does not
    /// fit, which only happens if `memory` is not the one the layout was
    /// planned for.
    pub fn load_data(&self, program: &Program, memory: &mut MainMemory) -> Result<(), RuntimeFault> {
        for (index, variable) in program.data().entries().iter().enumerate() {
            let Some(address) = self.data_address(index) else {
                continue;
            };
            let bytes = initial_bytes(variable);
            if !bytes.is_empty() {
                memory.write(address, &bytes)?;
            }
        }
        Ok(())
    }
}

fn initial_bytes(variable: &Variable) -> Vec<u8> {
    match (&variable.kind, &variable.initial) {
        (VariableKind::Ascii | VariableKind::Asciiz, Some(Operand::String(text))) => {
            let mut bytes = text.as_bytes().to_vec();
            bytes.resize(variable.size, 0);
            bytes
        }
        (
            VariableKind::Byte | VariableKind::Half | VariableKind::Word,
            Some(Operand::Integer(value)),
        ) => Word::truncate(*value).to_bytes_truncated(variable.size),
        _ => Vec::new(),
    }
}
