//! Core crate for the mipsim teaching simulator: the program representation
//! shared with the assembler, the problem log, and the clocked CPU engine.

/// Problems reported to the user, with optional source positions.
pub mod problem;
pub use problem::{Problem, ProblemLog, Severity, SourceSpan, NO_LINE_NUM, NO_RANGE};

/// 32-bit functional-unit word.
pub mod word;
pub use word::{Word, WORD_BYTES};

/// Register names and numbering.
pub mod register;
pub use register::{Register, REGISTER_COUNT};

/// Typed operands.
pub mod operand;
pub use operand::{AddressOperand, LabelTarget, Operand, OperandFormatType};

/// Instruction set and operand-format descriptors.
pub mod instruction;
pub use instruction::{Instruction, OperandFormat, INSTRUCTION_TABLE};

/// Two-segment program representation.
pub mod program;
pub use program::{Program, ProgramError, Segment, Statement, Variable, VariableKind};

/// Runtime fault taxonomy.
pub mod fault;
pub use fault::RuntimeFault;

/// Engine configuration.
pub mod config;
pub use config::{
    EngineConfig, DEFAULT_CLOCK_INTERVAL, DEFAULT_DATA_BASE, DEFAULT_MEMORY_SIZE,
    DEFAULT_TEXT_BASE,
};

/// Clocked CPU engine.
pub mod cpu;
pub use cpu::{
    Cpu, CpuSnapshot, HaltReason, RunReport, RunState, Session, StepOutcome, UnitEvent, UnitId,
};

#[cfg(test)]
use proptest as _;
#[cfg(test)]
use rstest as _;
#[cfg(test)]
use tracing_subscriber as _;
