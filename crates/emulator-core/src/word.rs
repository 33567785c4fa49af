//! Fixed-width 32-bit functional-unit word.

use std::fmt;

/// Number of bytes in a canonical word.
pub const WORD_BYTES: usize = 4;

/// A 32-bit two's-complement value exchanged between functional units.
///
/// Every constructor from a wider integer truncates to the low 32 bits, so a
/// `Word` can never hold an out-of-range value. The byte representation is
/// big-endian everywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Word(i32);

impl Word {
    /// The all-zero word.
    pub const ZERO: Self = Self(0);

    /// Wraps a signed 32-bit value.
    #[must_use]
    pub const fn new(value: i32) -> Self {
        Self(value)
    }

    /// Wraps an unsigned 32-bit value, reinterpreting its bits.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub const fn from_u32(value: u32) -> Self {
        Self(value as i32)
    }

    /// Truncates an arbitrary 64-bit value to its low 32 bits.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn truncate(value: i64) -> Self {
        Self(value as i32)
    }

    /// Signed value.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self.0
    }

    /// Unsigned reinterpretation of the bits.
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub const fn as_u32(self) -> u32 {
        self.0 as u32
    }

    /// Sign-extended 64-bit value.
    #[must_use]
    pub const fn as_i64(self) -> i64 {
        self.0 as i64
    }

    /// Canonical big-endian byte representation.
    #[must_use]
    pub const fn to_bytes(self) -> [u8; WORD_BYTES] {
        self.0.to_be_bytes()
    }

    /// Low `len` bytes of the canonical representation, most significant
    /// first. `len` is clamped to `1..=4`.
    #[must_use]
    pub fn to_bytes_truncated(self, len: usize) -> Vec<u8> {
        let len = len.clamp(1, WORD_BYTES);
        self.to_bytes()[WORD_BYTES - len..].to_vec()
    }

    /// Rebuilds a word from up to four big-endian bytes, sign-extending from
    /// the most significant byte. Extra leading bytes beyond four are dropped.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let fill = match bytes.first() {
            Some(first) if first & 0x80 != 0 => 0xFF,
            _ => 0x00,
        };
        Self::assemble(bytes, fill)
    }

    /// Rebuilds a word from up to four big-endian bytes, zero-extending.
    #[must_use]
    pub fn from_bytes_unsigned(bytes: &[u8]) -> Self {
        Self::assemble(bytes, 0x00)
    }

    fn assemble(bytes: &[u8], fill: u8) -> Self {
        let mut raw = [fill; WORD_BYTES];
        let tail = &bytes[bytes.len().saturating_sub(WORD_BYTES)..];
        raw[WORD_BYTES - tail.len()..].copy_from_slice(tail);
        Self(i32::from_be_bytes(raw))
    }

    /// Wrapping addition.
    #[must_use]
    pub const fn wrapping_add(self, other: Self) -> Self {
        Self(self.0.wrapping_add(other.0))
    }

    /// Wrapping subtraction.
    #[must_use]
    pub const fn wrapping_sub(self, other: Self) -> Self {
        Self(self.0.wrapping_sub(other.0))
    }

    /// Wrapping multiplication keeping the low 32 bits.
    #[must_use]
    pub const fn wrapping_mul(self, other: Self) -> Self {
        Self(self.0.wrapping_mul(other.0))
    }

    /// Signed addition that reports overflow.
    #[must_use]
    pub const fn checked_add(self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(value) => Some(Self(value)),
            None => None,
        }
    }

    /// Signed subtraction that reports overflow.
    #[must_use]
    pub const fn checked_sub(self, other: Self) -> Option<Self> {
        match self.0.checked_sub(other.0) {
            Some(value) => Some(Self(value)),
            None => None,
        }
    }
}

impl From<i32> for Word {
    fn from(value: i32) -> Self {
        Self(value)
    }
}

impl From<u32> for Word {
    fn from(value: u32) -> Self {
        Self::from_u32(value)
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::LowerHex for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.as_u32(), f)
    }
}

#[cfg(test)]
mod tests {
    use super::Word;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case(0x1_0000_0005, 5)]
    #[case(0xFFFF_FFFF, -1)]
    #[case(-1, -1)]
    #[case(i64::from(i32::MIN) - 1, i32::MAX)]
    fn truncate_keeps_low_32_bits(#[case] input: i64, #[case] expected: i32) {
        assert_eq!(Word::truncate(input).as_i32(), expected);
    }

    #[test]
    fn bytes_are_big_endian() {
        assert_eq!(Word::new(0x0102_0304).to_bytes(), [1, 2, 3, 4]);
        assert_eq!(Word::new(-2).to_bytes(), [0xFF, 0xFF, 0xFF, 0xFE]);
    }

    #[rstest]
    #[case(&[0x80], -128)]
    #[case(&[0x7F], 127)]
    #[case(&[0xFF, 0xFE], -2)]
    #[case(&[0x01, 0x00], 256)]
    #[case(&[], 0)]
    fn short_reads_sign_extend(#[case] bytes: &[u8], #[case] expected: i32) {
        assert_eq!(Word::from_bytes(bytes).as_i32(), expected);
    }

    #[test]
    fn unsigned_reads_zero_extend() {
        assert_eq!(Word::from_bytes_unsigned(&[0x80]).as_i32(), 128);
        assert_eq!(Word::from_bytes_unsigned(&[0xFF, 0xFF]).as_i32(), 0xFFFF);
    }

    #[test]
    fn truncated_bytes_take_low_end() {
        assert_eq!(Word::new(0x1234_5678).to_bytes_truncated(1), vec![0x78]);
        assert_eq!(
            Word::new(0x1234_5678).to_bytes_truncated(2),
            vec![0x56, 0x78]
        );
    }

    #[test]
    fn arithmetic_wraps() {
        assert_eq!(
            Word::new(i32::MAX).wrapping_add(Word::new(1)),
            Word::new(i32::MIN)
        );
        assert!(Word::new(i32::MAX).checked_add(Word::new(1)).is_none());
        assert!(Word::new(i32::MIN).checked_sub(Word::new(1)).is_none());
    }

    proptest! {
        #[test]
        fn byte_round_trip_is_identity(value in any::<i32>()) {
            let word = Word::new(value);
            prop_assert_eq!(Word::from_bytes(&word.to_bytes()), word);
        }

        #[test]
        fn truncation_matches_modular_arithmetic(value in any::<i64>()) {
            let word = Word::truncate(value);
            prop_assert_eq!(i64::from(word.as_u32()), value.rem_euclid(1 << 32));
        }
    }
}
