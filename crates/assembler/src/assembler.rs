//! Top-level pipeline: parse, extract, resolve labels.

use std::path::Path;
use std::sync::Arc;

use mipsim_core::{Program, ProblemLog};

use crate::extractor::{extract, Extraction};
use crate::parser::parse_program;
use crate::resolve::resolve_labels;
use crate::source::{read_source, SourceError};

/// Assembles source text into a resolved program and its problems.
#[must_use]
pub fn assemble(source: &str) -> Extraction {
    let tree = parse_program(source);
    let mut extraction = extract(&tree);
    resolve_labels(&mut extraction.program, &mut extraction.problems);
    tracing::debug!(
        problems = extraction.problems.len(),
        runnable = extraction.is_runnable(),
        "assembled"
    );
    extraction
}

/// Reads and assembles a source file.
///
/// # Errors
///
/// Returns [`SourceError`] when the file cannot be loaded. Problems in the
/// program itself are reported in the returned [`Extraction`].
pub fn assemble_file(path: &Path) -> Result<Extraction, SourceError> {
    read_source(path).map(|source| assemble(&source))
}

impl Extraction {
    /// Splits into a shareable program for the engine and the problem log.
    #[must_use]
    pub fn into_shared(self) -> (Arc<Program>, ProblemLog) {
        (Arc::new(self.program), self.problems)
    }
}
