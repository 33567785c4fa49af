//! Operand extraction: turns operand-list nodes into typed [`Operand`]s.
//!
//! A malformed operand is reported as a problem spanning that operand and
//! left out of the result; the remaining operands are still extracted.
//! Labels are never resolved here.

use mipsim_core::{AddressOperand, Operand, Problem, ProblemLog, Register};

use crate::ast::{OperandListNode, OperandNode, OperandNodeKind};

/// Smallest accepted integer literal.
pub const INTEGER_MIN: i64 = -(1 << 31);
/// Largest accepted integer literal.
pub const INTEGER_MAX: i64 = (1 << 32) - 1;

/// Extracts every well-formed operand of `list`, logging the rest.
pub fn extract_operands(list: Option<&OperandListNode>, problems: &mut ProblemLog) -> Vec<Operand> {
    let Some(list) = list else {
        return Vec::new();
    };
    list.operands
        .iter()
        .filter_map(|node| match extract_operand(node) {
            Ok(operand) => Some(operand),
            Err(message) => {
                problems.log(Problem::maybe_at(message, node.span));
                None
            }
        })
        .collect()
}

fn extract_operand(node: &OperandNode) -> Result<Operand, String> {
    if let Some(reason) = &node.parse_error {
        return Err(format!("malformed operand \"{}\": {reason}", node.text));
    }
    match &node.kind {
        OperandNodeKind::Integer(text) => parse_integer(text).map(Operand::Integer),
        OperandNodeKind::String(raw) => unescape(raw).map(Operand::String),
        OperandNodeKind::Register(text) => parse_register(text).map(Operand::Register),
        OperandNodeKind::Address {
            label,
            offset,
            base,
        } => Ok(Operand::Address(AddressOperand {
            label: label.clone(),
            offset: offset.as_deref().map(parse_integer).transpose()?,
            base: base.as_deref().map(parse_register).transpose()?,
            target: None,
        })),
        OperandNodeKind::Unrecognised => Err(format!("unrecognised operand \"{}\"", node.text)),
    }
}

fn parse_register(text: &str) -> Result<Register, String> {
    if !text.starts_with('$') {
        return Err(format!("invalid register \"{text}\": expected '$'"));
    }
    Register::from_name(text).ok_or_else(|| format!("invalid register \"{text}\""))
}

/// Parses a decimal, `0x`, `0b` or character literal, optionally signed.
///
/// # Errors
///
/// Returns a problem message when the literal is malformed or lies outside
/// `INTEGER_MIN..=INTEGER_MAX`.
pub fn parse_integer(text: &str) -> Result<i64, String> {
    let invalid = || format!("invalid integer literal \"{text}\"");
    let trimmed = text.trim();
    if let Some(quoted) = trimmed.strip_prefix('\'') {
        let inner = quoted.strip_suffix('\'').ok_or_else(invalid)?;
        let unescaped = unescape(inner)?;
        let mut chars = unescaped.chars();
        return match (chars.next(), chars.next()) {
            (Some(ch), None) => Ok(i64::from(u32::from(ch))),
            _ => Err(format!("character literal {text} must hold exactly one character")),
        };
    }

    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let (radix, body) = if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        (16, hex)
    } else if let Some(bin) = digits
        .strip_prefix("0b")
        .or_else(|| digits.strip_prefix("0B"))
    {
        (2, bin)
    } else {
        (10, digits)
    };
    if body.is_empty() || !body.chars().all(|ch| ch.is_digit(radix)) {
        return Err(invalid());
    }
    let out_of_range = || format!("integer literal \"{text}\" does not fit in 32 bits");
    let magnitude = i64::from_str_radix(body, radix).map_err(|_| out_of_range())?;
    let value = if negative { -magnitude } else { magnitude };
    if (INTEGER_MIN..=INTEGER_MAX).contains(&value) {
        Ok(value)
    } else {
        Err(out_of_range())
    }
}

/// Applies `\n \t \r \0 \\ \" \'` escapes.
///
/// # Errors
///
/// Returns a problem message naming the first unknown or dangling escape.
pub fn unescape(raw: &str) -> Result<String, String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        let escaped = match chars.next() {
            Some('n') => '\n',
            Some('t') => '\t',
            Some('r') => '\r',
            Some('0') => '\0',
            Some('\\') => '\\',
            Some('"') => '"',
            Some('\'') => '\'',
            Some(other) => return Err(format!("unknown escape sequence \"\\{other}\"")),
            None => return Err("dangling '\\' at end of literal".to_string()),
        };
        out.push(escaped);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use mipsim_core::{Operand, ProblemLog, Register, SourceSpan};
    use proptest::prelude::*;
    use rstest::rstest;

    use super::{extract_operands, parse_integer, unescape, INTEGER_MAX, INTEGER_MIN};
    use crate::ast::{OperandListNode, OperandNode, OperandNodeKind};

    #[rstest]
    #[case("42", 42)]
    #[case("-42", -42)]
    #[case("+7", 7)]
    #[case("0x1F", 31)]
    #[case("-0x10", -16)]
    #[case("0b101", 5)]
    #[case("'a'", 97)]
    #[case("'\\n'", 10)]
    #[case("4294967295", INTEGER_MAX)]
    #[case("-2147483648", INTEGER_MIN)]
    fn integers_parse(#[case] text: &str, #[case] expected: i64) {
        assert_eq!(parse_integer(text), Ok(expected));
    }

    #[rstest]
    #[case("4294967296")]
    #[case("-2147483649")]
    #[case("0x")]
    #[case("12ab")]
    #[case("'ab'")]
    #[case("'a")]
    #[case("99999999999999999999999")]
    fn bad_integers_are_rejected(#[case] text: &str) {
        assert!(parse_integer(text).is_err(), "{text}");
    }

    #[test]
    fn escapes_are_applied() {
        assert_eq!(unescape(r#"a\tb\n\"q\"\\\0"#), Ok("a\tb\n\"q\"\\\0".to_string()));
        assert!(unescape(r"\q").is_err());
        assert!(unescape("trailing\\").is_err());
    }

    #[test]
    fn malformed_operands_are_logged_and_skipped() {
        let span = SourceSpan::new(3, 10, 13);
        let list = OperandListNode {
            operands: vec![
                OperandNode::new(OperandNodeKind::Register("$t0".into()), "$t0", None),
                OperandNode::new(OperandNodeKind::Register("$t99".into()), "$t99", Some(span)),
                OperandNode::new(
                    OperandNodeKind::Address {
                        label: None,
                        offset: Some("-8".into()),
                        base: Some("$sp".into()),
                    },
                    "-8($sp)",
                    None,
                ),
            ],
            span: None,
        };
        let mut problems = ProblemLog::new();
        let operands = extract_operands(Some(&list), &mut problems);

        assert_eq!(operands.len(), 2);
        assert_eq!(operands[0], Operand::Register(Register::T0));
        let address = operands[1].as_address().expect("address");
        assert_eq!(address.offset, Some(-8));
        assert_eq!(address.base, Some(Register::Sp));

        assert_eq!(problems.len(), 1);
        assert_eq!(problems.as_slice()[0].range(), (10, 13));
    }

    proptest! {
        #[test]
        fn in_range_decimals_parse_to_themselves(value in INTEGER_MIN..=INTEGER_MAX) {
            prop_assert_eq!(parse_integer(&value.to_string()), Ok(value));
        }

        #[test]
        fn hex_and_decimal_agree(value in 0..=INTEGER_MAX) {
            prop_assert_eq!(parse_integer(&format!("0x{value:X}")), Ok(value));
        }

        #[test]
        fn out_of_range_values_are_rejected(excess in 1_i64..1 << 40) {
            prop_assert!(parse_integer(&(INTEGER_MAX + excess).to_string()).is_err());
            prop_assert!(parse_integer(&(INTEGER_MIN - excess).to_string()).is_err());
        }
    }

    #[test]
    fn absent_list_yields_nothing() {
        let mut problems = ProblemLog::new();
        assert!(extract_operands(None, &mut problems).is_empty());
        assert!(problems.is_empty());
    }
}
