//! Program representation produced by extraction and consumed by the engine.
//!
//! A [`Program`] holds two [`Segment`]s. Each segment is an ordered list of
//! entries plus a label map; label names are unique across both segments
//! combined, and a label is only ever bound to an entry that already exists.

use std::collections::HashMap;

use thiserror::Error;

use crate::{Instruction, LabelTarget, Operand};

/// Internal invariant violations of a program representation.
///
/// These indicate a bug in whatever built the program, never a problem with
/// user input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum ProgramError {
    /// A label was bound to an index past the end of its segment.
    #[error("label '{name}' bound to index {index} but the segment has {len} entries")]
    IndexOutOfRange {
        /// Label name.
        name: String,
        /// Requested index.
        index: usize,
        /// Current segment length.
        len: usize,
    },
    /// A label is bound in both segments.
    #[error("label '{0}' is bound in both segments")]
    AlreadyBound(String),
}

/// One text-segment entry.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Statement {
    /// Resolved instruction.
    pub instruction: Instruction,
    /// Operands in source order.
    pub operands: Vec<Operand>,
    /// 1-indexed source line, absent when the construct had no position.
    pub line: Option<usize>,
}

impl Statement {
    /// Creates a statement.
    #[must_use]
    pub const fn new(
        instruction: Instruction,
        operands: Vec<Operand>,
        line: Option<usize>,
    ) -> Self {
        Self {
            instruction,
            operands,
            line,
        }
    }
}

/// Storage kind of a data-segment entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[allow(missing_docs)]
pub enum VariableKind {
    Byte,
    Half,
    Word,
    Ascii,
    Asciiz,
    Space,
}

impl VariableKind {
    /// Natural alignment in bytes.
    #[must_use]
    pub const fn alignment(self) -> u32 {
        match self {
            Self::Half => 2,
            Self::Word => 4,
            Self::Byte | Self::Ascii | Self::Asciiz | Self::Space => 1,
        }
    }
}

/// One data-segment entry.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Variable {
    /// Storage kind.
    pub kind: VariableKind,
    /// Size in bytes.
    pub size: usize,
    /// Initialising operand; absent for `.space`.
    pub initial: Option<Operand>,
    /// 1-indexed source line, absent when the construct had no position.
    pub line: Option<usize>,
}

impl Variable {
    /// Creates a variable.
    #[must_use]
    pub const fn new(
        kind: VariableKind,
        size: usize,
        initial: Option<Operand>,
        line: Option<usize>,
    ) -> Self {
        Self {
            kind,
            size,
            initial,
            line,
        }
    }
}

/// Ordered entries plus a label-to-index map.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Segment<T> {
    entries: Vec<T>,
    labels: HashMap<String, usize>,
}

impl<T> Default for Segment<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            labels: HashMap::new(),
        }
    }
}

impl<T> Segment<T> {
    /// Entries in order.
    #[must_use]
    pub fn entries(&self) -> &[T] {
        &self.entries
    }

    /// Entry at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.entries.get(index)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the segment has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Label map.
    #[must_use]
    pub const fn labels(&self) -> &HashMap<String, usize> {
        &self.labels
    }

    /// Index bound to `name`.
    #[must_use]
    pub fn label_index(&self, name: &str) -> Option<usize> {
        self.labels.get(name).copied()
    }

    /// Returns true if `name` is bound in this segment.
    #[must_use]
    pub fn has_label(&self, name: &str) -> bool {
        self.labels.contains_key(name)
    }

    /// Labels bound to `index`, sorted by name.
    #[must_use]
    pub fn labels_at(&self, index: usize) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .labels
            .iter()
            .filter_map(|(name, bound)| (*bound == index).then_some(name.as_str()))
            .collect();
        names.sort_unstable();
        names
    }

    pub(crate) fn entries_mut(&mut self) -> &mut [T] {
        &mut self.entries
    }

    fn push(&mut self, entry: T) -> usize {
        self.entries.push(entry);
        self.entries.len() - 1
    }

    fn check_labels(&self) -> Result<(), ProgramError> {
        let len = self.entries.len();
        match self.labels.iter().find(|(_, index)| **index >= len) {
            Some((name, index)) => Err(ProgramError::IndexOutOfRange {
                name: name.clone(),
                index: *index,
                len,
            }),
            None => Ok(()),
        }
    }
}

/// Two-segment program representation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Program {
    text: Segment<Statement>,
    data: Segment<Variable>,
}

impl Program {
    /// Creates an empty program.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Text segment.
    #[must_use]
    pub const fn text(&self) -> &Segment<Statement> {
        &self.text
    }

    /// Data segment.
    #[must_use]
    pub const fn data(&self) -> &Segment<Variable> {
        &self.data
    }

    /// Mutable access to statements, for in-place operand resolution.
    pub fn statements_mut(&mut self) -> &mut [Statement] {
        self.text.entries_mut()
    }

    /// Returns true if `name` is bound in either segment.
    #[must_use]
    pub fn has_label(&self, name: &str) -> bool {
        self.text.has_label(name) || self.data.has_label(name)
    }

    /// Resolves `name` against both label maps.
    #[must_use]
    pub fn resolve_label(&self, name: &str) -> Option<LabelTarget> {
        self.text
            .label_index(name)
            .map(LabelTarget::Text)
            .or_else(|| self.data.label_index(name).map(LabelTarget::Data))
    }

    /// Pushes a statement and binds every name in `labels` to it.
    ///
    /// Names already bound in either segment keep their first binding.
    /// Returns the index of the new statement.
    pub fn push_statement<I, S>(&mut self, statement: Statement, labels: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let index = self.text.push(statement);
        for name in labels {
            let name = name.as_ref();
            if !self.has_label(name) {
                self.text.labels.insert(name.to_string(), index);
            }
        }
        index
    }

    /// Pushes a variable and binds every name in `labels` to it.
    ///
    /// Names already bound in either segment keep their first binding.
    /// Returns the index of the new variable.
    pub fn push_variable<I, S>(&mut self, variable: Variable, labels: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let index = self.data.push(variable);
        for name in labels {
            let name = name.as_ref();
            if !self.has_label(name) {
                self.data.labels.insert(name.to_string(), index);
            }
        }
        index
    }

    /// Checks that every label points at an existing entry and that no
    /// name is bound in both segments.
    ///
    /// Programs built only through [`Self::push_statement`] and
    /// [`Self::push_variable`] always pass.
    ///
    /// # Errors
    ///
    /// Returns the first [`ProgramError`] found.
    pub fn validate(&self) -> Result<(), ProgramError> {
        self.text.check_labels()?;
        self.data.check_labels()?;
        match self.text.labels.keys().find(|name| self.data.has_label(name)) {
            Some(name) => Err(ProgramError::AlreadyBound(name.clone())),
            None => Ok(()),
        }
    }
}
