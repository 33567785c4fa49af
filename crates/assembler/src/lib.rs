//! mipsim assembler: turns teaching-assembly source into a
//! [`mipsim_core::Program`] plus a log of every problem found.
//!
//! The pipeline is [`parser::parse_program`] to build a parse tree,
//! [`extractor::extract`] to walk it into a program, then
//! [`resolve::resolve_labels`] to point label references at their entries.
//! [`assemble`] runs all three.

/// Top-level pipeline.
pub mod assembler;
pub use assembler::{assemble, assemble_file};

/// Parse-tree node types and the listener interface.
pub mod ast;
/// Assembler directive table.
pub mod directive;
/// Parse-tree walker that builds the program.
pub mod extractor;
pub use extractor::{extract, Extraction, ProgramExtractor, SegmentState, ENTRY_LABEL};
/// Operand conversion from parse-tree nodes.
pub mod operands;
/// Line-oriented parser producing the parse tree.
pub mod parser;
/// Post-extraction label resolution.
pub mod resolve;
/// Source loading.
pub mod source;
pub use source::SourceError;

#[cfg(test)]
use proptest as _;
#[cfg(test)]
use rstest as _;
#[cfg(test)]
use tempfile as _;
