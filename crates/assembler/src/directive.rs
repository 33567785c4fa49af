//! Data-segment directives and the operand shapes each one takes.

use std::fmt;

use mipsim_core::{AddressOperand, Operand, Severity, VariableKind};

/// Directives recognised inside a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Directive {
    /// `.globl LABEL(, LABEL)*`; accepted and otherwise ignored.
    Globl,
    /// `.align INT`; accepted and otherwise ignored.
    Align,
    /// `.ascii STRING`
    Ascii,
    /// `.asciiz STRING`, stored with a trailing `\0`.
    Asciiz,
    /// `.byte INT(, INT)*`
    Byte,
    /// `.half INT(, INT)*`
    Half,
    /// `.word INT(, INT)*`
    Word,
    /// `.space INT`
    Space,
}

/// Name lookup table.
pub const DIRECTIVE_TABLE: &[(&str, Directive)] = &[
    (".globl", Directive::Globl),
    (".align", Directive::Align),
    (".ascii", Directive::Ascii),
    (".asciiz", Directive::Asciiz),
    (".byte", Directive::Byte),
    (".half", Directive::Half),
    (".word", Directive::Word),
    (".space", Directive::Space),
];

/// Accepted operand shape of a directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandRule {
    /// One or more label-only addresses.
    LabelList,
    /// Exactly one integer.
    SingleInteger,
    /// Exactly one string.
    SingleString,
    /// One or more integers.
    IntegerList,
}

impl OperandRule {
    /// Returns `true` when `operands` has the required shape.
    #[must_use]
    pub fn accepts(self, operands: &[Operand]) -> bool {
        match self {
            Self::LabelList => {
                !operands.is_empty()
                    && operands
                        .iter()
                        .all(|op| op.as_address().is_some_and(AddressOperand::is_label_only))
            }
            Self::SingleInteger => {
                matches!(operands, [only] if only.as_integer().is_some())
            }
            Self::SingleString => matches!(operands, [only] if only.as_str().is_some()),
            Self::IntegerList => {
                !operands.is_empty() && operands.iter().all(|op| op.as_integer().is_some())
            }
        }
    }

    /// Human-readable operand format.
    #[must_use]
    pub const fn format(self) -> &'static str {
        match self {
            Self::LabelList => "LABEL(, LABEL)*",
            Self::SingleInteger => "INT",
            Self::SingleString => "STRING",
            Self::IntegerList => "INT(, INT)*",
        }
    }
}

impl Directive {
    /// Looks a directive up by name, leading dot included.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        DIRECTIVE_TABLE
            .iter()
            .find_map(|(entry, directive)| entry.eq_ignore_ascii_case(name).then_some(*directive))
    }

    /// Canonical name with the leading dot.
    #[must_use]
    pub fn name(self) -> &'static str {
        DIRECTIVE_TABLE
            .iter()
            .find_map(|(name, directive)| (*directive == self).then_some(*name))
            .unwrap_or(".?")
    }

    /// Operand shape this directive takes.
    #[must_use]
    pub const fn rule(self) -> OperandRule {
        match self {
            Self::Globl => OperandRule::LabelList,
            Self::Align | Self::Space => OperandRule::SingleInteger,
            Self::Ascii | Self::Asciiz => OperandRule::SingleString,
            Self::Byte | Self::Half | Self::Word => OperandRule::IntegerList,
        }
    }

    /// Storage kind of the variables this directive declares, if any.
    #[must_use]
    pub const fn variable_kind(self) -> Option<VariableKind> {
        match self {
            Self::Globl | Self::Align => None,
            Self::Ascii => Some(VariableKind::Ascii),
            Self::Asciiz => Some(VariableKind::Asciiz),
            Self::Byte => Some(VariableKind::Byte),
            Self::Half => Some(VariableKind::Half),
            Self::Word => Some(VariableKind::Word),
            Self::Space => Some(VariableKind::Space),
        }
    }

    /// Severity of a malformed use; directives that declare nothing only
    /// warn.
    #[must_use]
    pub const fn misuse_severity(self) -> Severity {
        match self.variable_kind() {
            Some(_) => Severity::Critical,
            None => Severity::NonCritical,
        }
    }

    /// Problem text for operands that break [`Self::rule`].
    #[must_use]
    pub fn misuse_message(self) -> String {
        let name = self.name();
        format!(
            "invalid operand(s) to {name} directive. format: {name} {}",
            self.rule().format()
        )
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
