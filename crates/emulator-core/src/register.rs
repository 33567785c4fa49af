//! Register names of the teaching ISA.

use std::fmt;

/// Number of architecturally visible general-purpose registers.
pub const REGISTER_COUNT: usize = 32;

/// A general-purpose register, in hardware numbering order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
#[allow(missing_docs)]
pub enum Register {
    Zero = 0,
    At,
    V0,
    V1,
    A0,
    A1,
    A2,
    A3,
    T0,
    T1,
    T2,
    T3,
    T4,
    T5,
    T6,
    T7,
    S0,
    S1,
    S2,
    S3,
    S4,
    S5,
    S6,
    S7,
    T8,
    T9,
    K0,
    K1,
    Gp,
    Sp,
    Fp,
    Ra,
}

const REGISTER_NAMES: [&str; REGISTER_COUNT] = [
    "zero", "at", "v0", "v1", "a0", "a1", "a2", "a3", "t0", "t1", "t2", "t3", "t4", "t5", "t6",
    "t7", "s0", "s1", "s2", "s3", "s4", "s5", "s6", "s7", "t8", "t9", "k0", "k1", "gp", "sp",
    "fp", "ra",
];

impl Register {
    /// All registers in hardware numbering order.
    pub const ALL: [Self; REGISTER_COUNT] = [
        Self::Zero,
        Self::At,
        Self::V0,
        Self::V1,
        Self::A0,
        Self::A1,
        Self::A2,
        Self::A3,
        Self::T0,
        Self::T1,
        Self::T2,
        Self::T3,
        Self::T4,
        Self::T5,
        Self::T6,
        Self::T7,
        Self::S0,
        Self::S1,
        Self::S2,
        Self::S3,
        Self::S4,
        Self::S5,
        Self::S6,
        Self::S7,
        Self::T8,
        Self::T9,
        Self::K0,
        Self::K1,
        Self::Gp,
        Self::Sp,
        Self::Fp,
        Self::Ra,
    ];

    /// Hardware register number (`0..=31`).
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Conventional name without the `$` sigil.
    #[must_use]
    pub const fn name(self) -> &'static str {
        REGISTER_NAMES[self.index()]
    }

    /// Looks up a register by number.
    #[must_use]
    pub const fn from_index(index: usize) -> Option<Self> {
        if index < REGISTER_COUNT {
            Some(Self::ALL[index])
        } else {
            None
        }
    }

    /// Parses `name`, `$name`, `N` or `$N` (`s8` is accepted as `fp`).
    #[must_use]
    pub fn from_name(text: &str) -> Option<Self> {
        let name = text.strip_prefix('$').unwrap_or(text);
        if let Ok(number) = name.parse::<usize>() {
            return Self::from_index(number);
        }
        let lower = name.to_ascii_lowercase();
        if lower == "s8" {
            return Some(Self::Fp);
        }
        REGISTER_NAMES
            .iter()
            .position(|candidate| *candidate == lower)
            .and_then(Self::from_index)
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}", self.name())
    }
}
