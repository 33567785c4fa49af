//! Line-oriented front end producing the parse tree.
//!
//! Each source line holds any number of `label:` declarations followed by at
//! most one directive or statement. `#` starts a comment outside quotes.
//! Spans are absolute byte offsets into the whole source, inclusive at both
//! ends. The parser never fails: text it cannot recognise becomes an
//! [`ItemNode::Error`] or a node carrying a `parse_error`.

use mipsim_core::SourceSpan;

use crate::ast::{
    DirectiveNode, ErrorNode, ItemNode, LabelNode, OperandListNode, OperandNode,
    OperandNodeKind, ProgramNode, SegmentKind, SegmentMarkerNode, StatementNode,
};

/// One physical line and where it starts in the source.
#[derive(Debug, Clone, Copy)]
struct Line<'a> {
    text: &'a str,
    number: usize,
    offset: usize,
}

impl Line<'_> {
    /// Span of `text[start..end]`, or `None` for an empty range.
    fn span(&self, start: usize, end: usize) -> Option<SourceSpan> {
        (end > start).then(|| {
            SourceSpan::new(self.number, self.offset + start, self.offset + end - 1)
        })
    }
}

/// Parses a whole program.
#[must_use]
pub fn parse_program(source: &str) -> ProgramNode {
    let mut items = Vec::new();
    let mut offset = 0;
    for (index, raw) in source.split('\n').enumerate() {
        let text = raw.strip_suffix('\r').unwrap_or(raw);
        let line = Line {
            text,
            number: index + 1,
            offset,
        };
        parse_line(line, &mut items);
        offset += raw.len() + 1;
    }
    tracing::trace!(items = items.len(), "parsed program");
    ProgramNode { items }
}

fn parse_line(line: Line<'_>, items: &mut Vec<ItemNode>) {
    let code = strip_comment(line.text);
    let mut pos = skip_whitespace(code, 0);

    while let Some(colon) = label_at(code, pos) {
        let name = &code[pos..colon];
        items.push(ItemNode::Label(LabelNode {
            name: name.to_string(),
            span: line.span(pos, colon + 1),
            parse_error: (!is_valid_label(name))
                .then(|| format!("invalid label name \"{name}\"")),
        }));
        pos = skip_whitespace(code, colon + 1);
    }

    if pos >= code.len() {
        return;
    }
    let end = code.trim_end().len();
    let head_end = code[pos..]
        .find(char::is_whitespace)
        .map_or(end, |found| pos + found)
        .min(end);
    let head = &code[pos..head_end];
    let operands = parse_operand_list(line, code, head_end, end);
    let span = line.span(pos, end);

    if head.starts_with('.') {
        let segment = match head.to_ascii_lowercase().as_str() {
            ".data" => Some(SegmentKind::Data),
            ".text" => Some(SegmentKind::Text),
            _ => None,
        };
        let parse_error = (head.len() == 1).then(|| "missing directive name".to_string());
        items.push(match segment {
            Some(segment) => ItemNode::SegmentMarker(SegmentMarkerNode {
                segment,
                text: head.to_string(),
                span,
                operands,
                parse_error,
            }),
            None => ItemNode::Directive(DirectiveNode {
                name: head.to_string(),
                span,
                operands,
                parse_error,
            }),
        });
    } else if is_valid_label(head) {
        items.push(ItemNode::Statement(StatementNode {
            mnemonic: head.to_string(),
            mnemonic_span: line.span(pos, head_end),
            span,
            operands,
            parse_error: None,
        }));
    } else {
        items.push(ItemNode::Error(ErrorNode {
            text: code[pos..end].to_string(),
            span,
        }));
    }
}

/// Cuts the line at the first `#` outside a string or character literal.
fn strip_comment(text: &str) -> &str {
    let mut quote = None;
    let mut escaped = false;
    for (index, ch) in text.char_indices() {
        match quote {
            Some(_) if escaped => escaped = false,
            Some(_) if ch == '\\' => escaped = true,
            Some(open) if ch == open => quote = None,
            Some(_) => {}
            None if ch == '"' || ch == '\'' => quote = Some(ch),
            None if ch == '#' => return &text[..index],
            None => {}
        }
    }
    text
}

fn skip_whitespace(text: &str, from: usize) -> usize {
    text[from..]
        .find(|ch: char| !ch.is_whitespace())
        .map_or(text.len(), |found| from + found)
}

/// Finds a `name:` declaration starting at `pos` and returns the index of
/// its colon.
fn label_at(text: &str, pos: usize) -> Option<usize> {
    let rest = &text[pos..];
    let token_len = rest
        .find(|ch: char| ch.is_whitespace() || matches!(ch, ':' | ',' | '"' | '\'' | '(' | ')'))
        .unwrap_or(rest.len());
    if token_len == 0 || !rest[token_len..].starts_with(':') {
        return None;
    }
    Some(pos + token_len)
}

/// `[A-Za-z_][A-Za-z0-9_.]*`
pub(crate) fn is_valid_label(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '.')
}

fn parse_operand_list(
    line: Line<'_>,
    code: &str,
    from: usize,
    end: usize,
) -> Option<OperandListNode> {
    let start = skip_whitespace(code, from);
    if start >= end {
        return None;
    }
    let mut operands = Vec::new();
    for (piece_start, piece_end) in split_operands(code, start, end) {
        let trimmed_start = skip_whitespace(code, piece_start).min(piece_end);
        let trimmed_end = trimmed_start + code[trimmed_start..piece_end].trim_end().len();
        let text = &code[trimmed_start..trimmed_end];
        let span = line
            .span(trimmed_start, trimmed_end)
            .or_else(|| line.span(piece_start, piece_start + 1));
        operands.push(classify_operand(text, span));
    }
    Some(OperandListNode {
        operands,
        span: line.span(start, end),
    })
}

/// Splits `code[start..end]` at commas outside quotes and parentheses.
fn split_operands(code: &str, start: usize, end: usize) -> Vec<(usize, usize)> {
    let mut pieces = Vec::new();
    let mut piece_start = start;
    let mut quote = None;
    let mut escaped = false;
    let mut depth = 0_usize;
    for (index, ch) in code[start..end].char_indices() {
        let index = start + index;
        match quote {
            Some(_) if escaped => escaped = false,
            Some(_) if ch == '\\' => escaped = true,
            Some(open) if ch == open => quote = None,
            Some(_) => {}
            None => match ch {
                '"' | '\'' => quote = Some(ch),
                '(' => depth += 1,
                ')' => depth = depth.saturating_sub(1),
                ',' if depth == 0 => {
                    pieces.push((piece_start, index));
                    piece_start = index + 1;
                }
                _ => {}
            },
        }
    }
    pieces.push((piece_start, end));
    pieces
}

fn starts_numeric(text: &str) -> bool {
    let unsigned = text.strip_prefix(['+', '-']).unwrap_or(text);
    unsigned.starts_with(|ch: char| ch.is_ascii_digit())
}

fn invalid(text: &str, span: Option<SourceSpan>, reason: impl Into<String>) -> OperandNode {
    OperandNode {
        parse_error: Some(reason.into()),
        ..OperandNode::new(OperandNodeKind::Unrecognised, text, span)
    }
}

/// Splits `label+N` / `label-N` into its label and signed offset.
fn label_with_offset(text: &str) -> (&str, Option<&str>) {
    text.find(['+', '-']).map_or((text, None), |sign| {
        (text[..sign].trim_end(), Some(text[sign..].trim()))
    })
}

fn classify_operand(text: &str, span: Option<SourceSpan>) -> OperandNode {
    if text.is_empty() {
        return invalid(text, span, "missing operand");
    }
    if let Some(body) = text.strip_prefix('"') {
        return match body.strip_suffix('"') {
            Some(inner) if !inner.ends_with('\\') || inner.ends_with("\\\\") => {
                OperandNode::new(OperandNodeKind::String(inner.to_string()), text, span)
            }
            _ => invalid(text, span, "unterminated string literal"),
        };
    }
    if text.starts_with('\'') {
        return OperandNode::new(OperandNodeKind::Integer(text.to_string()), text, span);
    }
    if text.starts_with('$') {
        return OperandNode::new(OperandNodeKind::Register(text.to_string()), text, span);
    }
    if let Some(open) = text.find('(') {
        let Some(inner) = text[open + 1..].strip_suffix(')') else {
            return invalid(text, span, "expected ')' after base register");
        };
        let prefix = text[..open].trim();
        let base = Some(inner.trim().to_string());
        let (label, offset) = if prefix.is_empty() {
            (None, None)
        } else if starts_numeric(prefix) {
            (None, Some(prefix.to_string()))
        } else {
            let (label, offset) = label_with_offset(prefix);
            if !is_valid_label(label) {
                return invalid(text, span, format!("invalid label name \"{label}\""));
            }
            (Some(label.to_string()), offset.map(str::to_string))
        };
        return OperandNode::new(OperandNodeKind::Address { label, offset, base }, text, span);
    }
    if starts_numeric(text) {
        return OperandNode::new(OperandNodeKind::Integer(text.to_string()), text, span);
    }
    let (label, offset) = label_with_offset(text);
    if is_valid_label(label) {
        return OperandNode::new(
            OperandNodeKind::Address {
                label: Some(label.to_string()),
                offset: offset.map(str::to_string),
                base: None,
            },
            text,
            span,
        );
    }
    invalid(text, span, format!("unrecognised operand \"{text}\""))
}
