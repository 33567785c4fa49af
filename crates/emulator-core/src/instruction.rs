//! Instruction set of the teaching language and the operand shapes each
//! instruction accepts.

use std::fmt;

use crate::OperandFormatType::{self, Address as A, Immediate as I, Register as R};

/// Operand-format descriptor: required arity plus the accepted combinations
/// of operand-format types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperandFormat {
    arity: usize,
    combinations: &'static [&'static [OperandFormatType]],
}

impl OperandFormat {
    /// No operands.
    pub const NOTHING: Self = Self::new(0, &[&[]]);
    /// `rd, rs, rt`.
    pub const DEST_SRC_SRC: Self = Self::new(3, &[&[R, R, R]]);
    /// `rd, rs, rt` or `rd, rs, imm`.
    pub const DEST_SRC_SRC_OR_IMM: Self = Self::new(3, &[&[R, R, R], &[R, R, I]]);
    /// `rd, rs, imm`.
    pub const DEST_SRC_IMM: Self = Self::new(3, &[&[R, R, I]]);
    /// `rd, rs`.
    pub const DEST_SRC: Self = Self::new(2, &[&[R, R]]);
    /// `rd, imm`.
    pub const DEST_IMM: Self = Self::new(2, &[&[R, I]]);
    /// `rd, address`.
    pub const DEST_ADDR: Self = Self::new(2, &[&[R, A]]);
    /// `rs, rt, label` or `rs, imm, label`.
    pub const CMP_CMP_LABEL: Self = Self::new(3, &[&[R, R, A], &[R, I, A]]);
    /// `rs, label`.
    pub const CMP_LABEL: Self = Self::new(2, &[&[R, A]]);
    /// `label`.
    pub const LABEL: Self = Self::new(1, &[&[A]]);
    /// `rs`.
    pub const SRC: Self = Self::new(1, &[&[R]]);

    const fn new(arity: usize, combinations: &'static [&'static [OperandFormatType]]) -> Self {
        Self {
            arity,
            combinations,
        }
    }

    /// Required number of operands.
    #[must_use]
    pub const fn arity(&self) -> usize {
        self.arity
    }

    /// Accepted operand-type combinations, each of length [`Self::arity`].
    #[must_use]
    pub const fn combinations(&self) -> &'static [&'static [OperandFormatType]] {
        self.combinations
    }

    /// Returns `true` when `types` matches one of the accepted combinations.
    #[must_use]
    pub fn accepts(&self, types: &[OperandFormatType]) -> bool {
        self.combinations.iter().any(|combo| *combo == types)
    }
}

impl fmt::Display for OperandFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.arity == 0 {
            return f.write_str("(no operands)");
        }
        for (i, combo) in self.combinations.iter().enumerate() {
            if i > 0 {
                f.write_str(" | ")?;
            }
            let names: Vec<String> = combo.iter().map(ToString::to_string).collect();
            f.write_str(&names.join(", "))?;
        }
        Ok(())
    }
}

/// Executable instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[allow(missing_docs)]
pub enum Instruction {
    Nop,
    Syscall,
    Add,
    Addu,
    Sub,
    Subu,
    And,
    Or,
    Xor,
    Nor,
    Slt,
    Sltu,
    Mul,
    Addi,
    Addiu,
    Andi,
    Ori,
    Xori,
    Slti,
    Sll,
    Srl,
    Sra,
    Li,
    Lui,
    La,
    Move,
    Lw,
    Lh,
    Lb,
    Lbu,
    Sw,
    Sh,
    Sb,
    Beq,
    Bne,
    Blt,
    Bgt,
    Ble,
    Bge,
    Beqz,
    Bnez,
    J,
    B,
    Jal,
    Jr,
}

/// Single source-of-truth mnemonic table.
pub const INSTRUCTION_TABLE: &[(&str, Instruction)] = &[
    ("nop", Instruction::Nop),
    ("syscall", Instruction::Syscall),
    ("add", Instruction::Add),
    ("addu", Instruction::Addu),
    ("sub", Instruction::Sub),
    ("subu", Instruction::Subu),
    ("and", Instruction::And),
    ("or", Instruction::Or),
    ("xor", Instruction::Xor),
    ("nor", Instruction::Nor),
    ("slt", Instruction::Slt),
    ("sltu", Instruction::Sltu),
    ("mul", Instruction::Mul),
    ("addi", Instruction::Addi),
    ("addiu", Instruction::Addiu),
    ("andi", Instruction::Andi),
    ("ori", Instruction::Ori),
    ("xori", Instruction::Xori),
    ("slti", Instruction::Slti),
    ("sll", Instruction::Sll),
    ("srl", Instruction::Srl),
    ("sra", Instruction::Sra),
    ("li", Instruction::Li),
    ("lui", Instruction::Lui),
    ("la", Instruction::La),
    ("move", Instruction::Move),
    ("lw", Instruction::Lw),
    ("lh", Instruction::Lh),
    ("lb", Instruction::Lb),
    ("lbu", Instruction::Lbu),
    ("sw", Instruction::Sw),
    ("sh", Instruction::Sh),
    ("sb", Instruction::Sb),
    ("beq", Instruction::Beq),
    ("bne", Instruction::Bne),
    ("blt", Instruction::Blt),
    ("bgt", Instruction::Bgt),
    ("ble", Instruction::Ble),
    ("bge", Instruction::Bge),
    ("beqz", Instruction::Beqz),
    ("bnez", Instruction::Bnez),
    ("j", Instruction::J),
    ("b", Instruction::B),
    ("jal", Instruction::Jal),
    ("jr", Instruction::Jr),
];

impl Instruction {
    /// Resolves a mnemonic, case-insensitively.
    #[must_use]
    pub fn from_mnemonic(name: &str) -> Option<Self> {
        INSTRUCTION_TABLE
            .iter()
            .find_map(|(entry, instruction)| {
                entry.eq_ignore_ascii_case(name).then_some(*instruction)
            })
    }

    /// Canonical lower-case mnemonic.
    #[must_use]
    pub fn mnemonic(self) -> &'static str {
        INSTRUCTION_TABLE
            .iter()
            .find_map(|(name, instruction)| (*instruction == self).then_some(*name))
            .unwrap_or("?")
    }

    /// Operand shapes this instruction accepts.
    #[must_use]
    pub const fn operand_format(self) -> OperandFormat {
        match self {
            Self::Nop | Self::Syscall => OperandFormat::NOTHING,
            Self::Add
            | Self::Addu
            | Self::Sub
            | Self::Subu
            | Self::And
            | Self::Or
            | Self::Xor
            | Self::Slt
            | Self::Sltu
            | Self::Mul => OperandFormat::DEST_SRC_SRC_OR_IMM,
            Self::Nor => OperandFormat::DEST_SRC_SRC,
            Self::Addi
            | Self::Addiu
            | Self::Andi
            | Self::Ori
            | Self::Xori
            | Self::Slti
            | Self::Sll
            | Self::Srl
            | Self::Sra => OperandFormat::DEST_SRC_IMM,
            Self::Li | Self::Lui => OperandFormat::DEST_IMM,
            Self::Move => OperandFormat::DEST_SRC,
            Self::La
            | Self::Lw
            | Self::Lh
            | Self::Lb
            | Self::Lbu
            | Self::Sw
            | Self::Sh
            | Self::Sb => OperandFormat::DEST_ADDR,
            Self::Beq | Self::Bne | Self::Blt | Self::Bgt | Self::Ble | Self::Bge => {
                OperandFormat::CMP_CMP_LABEL
            }
            Self::Beqz | Self::Bnez => OperandFormat::CMP_LABEL,
            Self::J | Self::B | Self::Jal => OperandFormat::LABEL,
            Self::Jr => OperandFormat::SRC,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}
