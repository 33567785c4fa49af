//! Parse-tree node API consumed by the extractor.
//!
//! The tree is flat: a program is an ordered list of items, each carrying its
//! source text, an optional [`SourceSpan`] and, where the construct takes
//! them, an optional operand list. Any node may carry a `parse_error`
//! describing why the front end could not fully recognise it.
//!
//! [`walk`] drives a [`ParseTreeListener`] over the items in document order.

use mipsim_core::SourceSpan;

/// Syntactic shape of an operand, with its raw source pieces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperandNodeKind {
    /// Integer literal: decimal, `0x`, `0b`, optionally signed, or a
    /// character literal such as `'a'`.
    Integer(String),
    /// String literal contents between the quotes, escapes not yet applied.
    String(String),
    /// Register reference such as `$t0` or `$8`.
    Register(String),
    /// `label`, `label+N`, `label-N`, `N($reg)`, `label($reg)` or `($reg)`.
    Address {
        /// Label text.
        label: Option<String>,
        /// Signed offset text, including any sign.
        offset: Option<String>,
        /// Base register text.
        base: Option<String>,
    },
    /// Text that matches no operand shape; the node's `parse_error` says why.
    Unrecognised,
}

/// One operand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperandNode {
    /// Shape and raw pieces.
    pub kind: OperandNodeKind,
    /// Operand text as written.
    pub text: String,
    /// Position of the operand.
    pub span: Option<SourceSpan>,
    /// Reason the operand could not be recognised.
    pub parse_error: Option<String>,
}

impl OperandNode {
    /// Creates a well-formed operand node.
    #[must_use]
    pub fn new(kind: OperandNodeKind, text: impl Into<String>, span: Option<SourceSpan>) -> Self {
        Self {
            kind,
            text: text.into(),
            span,
            parse_error: None,
        }
    }
}

/// Comma-separated operands of a directive or statement.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OperandListNode {
    /// Operands in source order.
    pub operands: Vec<OperandNode>,
    /// Position of the whole list.
    pub span: Option<SourceSpan>,
}

/// Which segment a marker opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    /// `.data`
    Data,
    /// `.text`
    Text,
}

/// `.data` or `.text`, with an optional address operand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentMarkerNode {
    /// Segment opened.
    pub segment: SegmentKind,
    /// Marker text as written.
    pub text: String,
    /// Position of the marker.
    pub span: Option<SourceSpan>,
    /// Operands after the marker.
    pub operands: Option<OperandListNode>,
    /// Parse failure, if any.
    pub parse_error: Option<String>,
}

/// `name:`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelNode {
    /// Label name without the colon.
    pub name: String,
    /// Position of the declaration.
    pub span: Option<SourceSpan>,
    /// Parse failure, if any.
    pub parse_error: Option<String>,
}

/// Any directive other than a segment marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectiveNode {
    /// Directive name including the leading dot.
    pub name: String,
    /// Position of the whole directive.
    pub span: Option<SourceSpan>,
    /// Operands after the name.
    pub operands: Option<OperandListNode>,
    /// Parse failure, if any.
    pub parse_error: Option<String>,
}

/// An instruction statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementNode {
    /// Mnemonic as written.
    pub mnemonic: String,
    /// Position of the mnemonic.
    pub mnemonic_span: Option<SourceSpan>,
    /// Position of the whole statement.
    pub span: Option<SourceSpan>,
    /// Operands after the mnemonic.
    pub operands: Option<OperandListNode>,
    /// Parse failure, if any.
    pub parse_error: Option<String>,
}

/// Text the front end could not recognise at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorNode {
    /// Offending text.
    pub text: String,
    /// Position, when known.
    pub span: Option<SourceSpan>,
}

/// One top-level construct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemNode {
    /// `.data` / `.text`.
    SegmentMarker(SegmentMarkerNode),
    /// Label declaration.
    Label(LabelNode),
    /// Directive.
    Directive(DirectiveNode),
    /// Instruction statement.
    Statement(StatementNode),
    /// Unrecognised text.
    Error(ErrorNode),
}

/// Root of the parse tree.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProgramNode {
    /// Items in document order.
    pub items: Vec<ItemNode>,
}

/// Callbacks invoked by [`walk`]. Every method defaults to doing nothing.
pub trait ParseTreeListener {
    /// A segment marker.
    fn enter_segment_marker(&mut self, _node: &SegmentMarkerNode) {}
    /// A label declaration.
    fn enter_label(&mut self, _node: &LabelNode) {}
    /// A directive.
    fn enter_directive(&mut self, _node: &DirectiveNode) {}
    /// An instruction statement.
    fn enter_statement(&mut self, _node: &StatementNode) {}
    /// Unrecognised text.
    fn visit_error(&mut self, _node: &ErrorNode) {}
    /// After the last item.
    fn exit_program(&mut self) {}
}

/// Visits every item of `program` in order, then calls
/// [`ParseTreeListener::exit_program`].
pub fn walk<L: ParseTreeListener + ?Sized>(program: &ProgramNode, listener: &mut L) {
    for item in &program.items {
        match item {
            ItemNode::SegmentMarker(node) => listener.enter_segment_marker(node),
            ItemNode::Label(node) => listener.enter_label(node),
            ItemNode::Directive(node) => listener.enter_directive(node),
            ItemNode::Statement(node) => listener.enter_statement(node),
            ItemNode::Error(node) => listener.visit_error(node),
        }
    }
    listener.exit_program();
}
