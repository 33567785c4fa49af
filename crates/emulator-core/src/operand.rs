//! Typed operands of statements and directives.

use std::fmt;

use crate::Register;

/// Coarse operand shape used for arity and combination checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum OperandFormatType {
    /// Integer literal.
    Immediate,
    /// String literal.
    String,
    /// Label reference and/or base-register address.
    Address,
    /// Register reference.
    Register,
}

impl fmt::Display for OperandFormatType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Immediate => "IMMEDIATE",
            Self::String => "STRING",
            Self::Address => "ADDRESS",
            Self::Register => "REGISTER",
        };
        f.write_str(name)
    }
}

/// Segment entry a label resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum LabelTarget {
    /// Index into the text segment.
    Text(usize),
    /// Index into the data segment.
    Data(usize),
}

/// An address expression: `label`, `label+N`, `N($reg)`, `label($reg)` or
/// `($reg)`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct AddressOperand {
    /// Referenced label name.
    pub label: Option<String>,
    /// Constant byte offset.
    pub offset: Option<i64>,
    /// Base register added to the address.
    pub base: Option<Register>,
    /// Where `label` points, filled by the resolution phase.
    pub target: Option<LabelTarget>,
}

impl AddressOperand {
    /// Creates an unresolved reference to `label`.
    #[must_use]
    pub fn label(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            offset: None,
            base: None,
            target: None,
        }
    }

    /// Creates a base-register address with an optional offset.
    #[must_use]
    pub const fn based(offset: Option<i64>, base: Register) -> Self {
        Self {
            label: None,
            offset,
            base: Some(base),
            target: None,
        }
    }

    /// Returns `true` for a bare label with neither offset nor base.
    #[must_use]
    pub const fn is_label_only(&self) -> bool {
        self.label.is_some() && self.offset.is_none() && self.base.is_none()
    }

    /// Returns `true` when there is no label, or the label has a target.
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        self.label.is_none() || self.target.is_some()
    }
}

impl fmt::Display for AddressOperand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(label) = &self.label {
            f.write_str(label)?;
            if let Some(offset) = self.offset {
                write!(f, "{offset:+}")?;
            }
        } else if let Some(offset) = self.offset {
            write!(f, "{offset}")?;
        }
        if let Some(base) = self.base {
            write!(f, "({base})")?;
        }
        Ok(())
    }
}

/// A typed operand.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Operand {
    /// Integer literal, already range-checked to 32 bits.
    Integer(i64),
    /// Unescaped string literal.
    String(String),
    /// Address expression.
    Address(AddressOperand),
    /// Register reference.
    Register(Register),
}

impl Operand {
    /// Coarse shape of this operand.
    #[must_use]
    pub const fn format_type(&self) -> OperandFormatType {
        match self {
            Self::Integer(_) => OperandFormatType::Immediate,
            Self::String(_) => OperandFormatType::String,
            Self::Address(_) => OperandFormatType::Address,
            Self::Register(_) => OperandFormatType::Register,
        }
    }

    /// Integer value, if this is an integer operand.
    #[must_use]
    pub const fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(value) => Some(*value),
            _ => None,
        }
    }

    /// String value, if this is a string operand.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value),
            _ => None,
        }
    }

    /// Address, if this is an address operand.
    #[must_use]
    pub const fn as_address(&self) -> Option<&AddressOperand> {
        match self {
            Self::Address(address) => Some(address),
            _ => None,
        }
    }

    /// Register, if this is a register operand.
    #[must_use]
    pub const fn as_register(&self) -> Option<Register> {
        match self {
            Self::Register(register) => Some(*register),
            _ => None,
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(value) => write!(f, "{value}"),
            Self::String(value) => write!(f, "{value:?}"),
            Self::Address(address) => write!(f, "{address}"),
            Self::Register(register) => write!(f, "{register}"),
        }
    }
}
