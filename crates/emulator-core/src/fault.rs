//! Runtime fault taxonomy.

use thiserror::Error;

use crate::{Problem, ProgramError};

/// Faults raised while executing a program.
///
/// A fault halts the current run only; it is reported through the problem
/// channel of the run report.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum RuntimeFault {
    /// Memory access outside the backing store.
    #[error("memory access of {length} byte(s) at 0x{address:08x} is out of range")]
    MemoryOutOfRange {
        /// First byte address.
        address: u32,
        /// Access width in bytes.
        length: usize,
    },
    /// An address operand referenced a label that was never resolved.
    #[error("label '{label}' could not be resolved")]
    UnresolvedLabel {
        /// Label name.
        label: String,
    },
    /// The program counter left the text segment.
    #[error("program counter 0x{pc:08x} does not address a statement")]
    InvalidProgramCounter {
        /// Offending program counter.
        pc: u32,
    },
    /// A statement reached execution with operands its instruction cannot use.
    #[error("malformed operands for '{mnemonic}'")]
    MalformedStatement {
        /// Instruction mnemonic.
        mnemonic: String,
    },
    /// `add`/`sub`/`addi` overflowed.
    #[error("arithmetic overflow")]
    ArithmeticOverflow,
    /// `syscall` with an unsupported service number in `$v0`.
    #[error("unsupported syscall service {service}")]
    UnsupportedSyscall {
        /// Value of `$v0`.
        service: i32,
    },
    /// Data segment does not fit in main memory.
    #[error("data segment needs {required} bytes but memory holds {capacity}")]
    DataSegmentTooLarge {
        /// Bytes required.
        required: usize,
        /// Bytes available.
        capacity: usize,
    },
    /// The program representation breaks its own invariants.
    #[error("invalid program: {0}")]
    InvalidProgram(#[from] ProgramError),
}

impl RuntimeFault {
    /// Converts the fault into a critical problem, tied to `line` when known.
    #[must_use]
    pub fn to_problem(&self, line: Option<usize>) -> Problem {
        Problem::maybe_at_line(format!("runtime fault: {self}"), line)
    }
}
