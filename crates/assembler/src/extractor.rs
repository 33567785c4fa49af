//! Program extractor: walks the parse tree and builds a validated
//! [`Program`], collecting every problem instead of stopping at the first.

use mipsim_core::{
    Instruction, Operand, OperandFormatType, Problem, ProblemLog, Program, SourceSpan, Statement,
    Variable, VariableKind,
};

use crate::ast::{
    walk, DirectiveNode, ErrorNode, LabelNode, OperandListNode, ParseTreeListener, ProgramNode,
    SegmentKind, SegmentMarkerNode, StatementNode,
};
use crate::directive::Directive;
use crate::operands::extract_operands;

/// Label every runnable program must define in its text segment.
pub const ENTRY_LABEL: &str = "main";

/// Which segment subsequent items belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SegmentState {
    /// Before the first segment marker.
    #[default]
    Outside,
    /// After `.data`.
    DataSegment,
    /// After `.text`.
    TextSegment,
}

/// Extracted program plus every problem found while building it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    /// The program, complete even when problems were found.
    pub program: Program,
    /// Problems in discovery order.
    pub problems: ProblemLog,
}

impl Extraction {
    /// Returns `true` when no critical problem was found.
    #[must_use]
    pub fn is_runnable(&self) -> bool {
        !self.problems.has_critical()
    }
}

/// Listener that builds a [`Program`] from parse-tree callbacks.
#[derive(Debug, Default)]
pub struct ProgramExtractor {
    state: SegmentState,
    program: Program,
    problems: ProblemLog,
    outstanding: Vec<String>,
}

impl ProgramExtractor {
    /// Creates an extractor outside any segment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current segment state.
    #[must_use]
    pub const fn state(&self) -> SegmentState {
        self.state
    }

    /// Labels declared but not yet attached to an entry.
    #[must_use]
    pub fn outstanding(&self) -> &[String] {
        &self.outstanding
    }

    /// Consumes the extractor.
    #[must_use]
    pub fn finish(self) -> Extraction {
        Extraction {
            program: self.program,
            problems: self.problems,
        }
    }

    fn problem(&mut self, message: impl Into<String>, span: Option<SourceSpan>) {
        self.problems.log(Problem::maybe_at(message, span));
    }

    fn parse_error(&mut self, construct: &str, reason: &str, span: Option<SourceSpan>) {
        self.problem(format!("parse error in {construct}: {reason}"), span);
    }

    fn push_statement(&mut self, statement: Statement) {
        let labels = std::mem::take(&mut self.outstanding);
        self.program.push_statement(statement, labels);
    }

    fn push_variable(&mut self, variable: Variable) {
        let labels = std::mem::take(&mut self.outstanding);
        self.program.push_variable(variable, labels);
    }

    fn operands(&mut self, list: Option<&OperandListNode>) -> Vec<Operand> {
        extract_operands(list, &mut self.problems)
    }

    fn data_directive(&mut self, directive: Directive, node: &DirectiveNode) {
        let operands = self.operands(node.operands.as_ref());
        let line = node.span.map(|span| span.line);
        let list_span = node.operands.as_ref().and_then(|list| list.span).or(node.span);

        if !directive.rule().accepts(&operands) {
            let span = match directive.variable_kind() {
                Some(_) => list_span,
                None => node.span,
            };
            self.problems.log(
                Problem::maybe_at(directive.misuse_message(), span)
                    .with_severity(directive.misuse_severity()),
            );
            return;
        }
        let Some(kind) = directive.variable_kind() else {
            return;
        };

        match kind {
            VariableKind::Ascii | VariableKind::Asciiz => {
                let Some(mut text) = operands.into_iter().next().and_then(|op| match op {
                    Operand::String(text) => Some(text),
                    _ => None,
                }) else {
                    return;
                };
                if kind == VariableKind::Asciiz {
                    text.push('\0');
                }
                let size = text.len();
                self.push_variable(Variable::new(kind, size, Some(Operand::String(text)), line));
            }
            VariableKind::Space => {
                let count = operands.first().and_then(Operand::as_integer).unwrap_or(0);
                match usize::try_from(count) {
                    Ok(size) => self.push_variable(Variable::new(kind, size, None, line)),
                    Err(_) => self.problem(
                        format!("negative size {count} for .space directive"),
                        list_span,
                    ),
                }
            }
            VariableKind::Byte | VariableKind::Half | VariableKind::Word => {
                let width = kind.alignment() as usize;
                for operand in operands {
                    self.push_variable(Variable::new(kind, width, Some(operand), line));
                }
            }
        }
    }

    fn check_segment_operands(&mut self, node: &SegmentMarkerNode) {
        let Some(list) = node.operands.as_ref() else {
            return;
        };
        let operands = self.operands(Some(list));
        let valid = matches!(operands.as_slice(), [Operand::Integer(address)] if *address > 0);
        if !valid {
            let name = match node.segment {
                SegmentKind::Data => ".data",
                SegmentKind::Text => ".text",
            };
            self.problem(
                format!("invalid operand(s) to {name} directive. format: {name} ADDRESS?"),
                node.span,
            );
        }
    }
}

impl ParseTreeListener for ProgramExtractor {
    fn enter_segment_marker(&mut self, node: &SegmentMarkerNode) {
        self.state = match node.segment {
            SegmentKind::Data => SegmentState::DataSegment,
            SegmentKind::Text => SegmentState::TextSegment,
        };
        match &node.parse_error {
            Some(reason) => self.parse_error("segment directive", reason, node.span),
            None => self.check_segment_operands(node),
        }
    }

    fn enter_label(&mut self, node: &LabelNode) {
        if let Some(reason) = &node.parse_error {
            self.parse_error("label", reason, node.span);
            return;
        }
        let name = node.name.as_str();
        if self.program.has_label(name) || self.outstanding.iter().any(|queued| queued == name) {
            self.problem(format!("the label name: \"{name}\" is taken"), node.span);
        } else if name == ENTRY_LABEL && self.state != SegmentState::TextSegment {
            self.problem(
                format!("The '{ENTRY_LABEL}' label must be inside the .text segment"),
                node.span,
            );
        }
        self.outstanding.push(node.name.clone());
    }

    fn enter_directive(&mut self, node: &DirectiveNode) {
        if let Some(reason) = &node.parse_error {
            self.parse_error("directive", reason, node.span);
            return;
        }
        let directive = Directive::from_name(&node.name);
        match (self.state, directive) {
            (SegmentState::DataSegment, Some(directive)) => self.data_directive(directive, node),
            (SegmentState::DataSegment, None) => {
                let reason = format!("unknown directive \"{}\"", node.name);
                self.parse_error("directive", &reason, node.span);
            }
            (SegmentState::TextSegment, Some(Directive::Globl)) => {
                self.data_directive(Directive::Globl, node);
            }
            (SegmentState::TextSegment, _) => self.problem(
                "only .globl directives should be placed inside the .text segment",
                node.span,
            ),
            (SegmentState::Outside, _) => self.problem(
                "Assembler directives should only be placed inside either the .data or .text segment",
                node.span,
            ),
        }
    }

    fn enter_statement(&mut self, node: &StatementNode) {
        if let Some(reason) = &node.parse_error {
            self.parse_error("statement", reason, node.span);
            return;
        }
        if self.state != SegmentState::TextSegment {
            self.problem(
                "Statements should only be placed inside the .text segment",
                node.span,
            );
            return;
        }
        let Some(instruction) = Instruction::from_mnemonic(&node.mnemonic) else {
            self.problem(
                format!("Unknown instruction: \"{}\"", node.mnemonic),
                node.mnemonic_span.or(node.span),
            );
            return;
        };

        let operands = self.operands(node.operands.as_ref());
        let format = instruction.operand_format();
        let list_span = node.operands.as_ref().and_then(|list| list.span).or(node.span);
        if operands.len() == format.arity() {
            let types: Vec<OperandFormatType> = operands.iter().map(Operand::format_type).collect();
            if !format.accepts(&types) {
                self.problem(
                    format!(
                        "Operands invalid for {} instruction. Correct format: {format}",
                        node.mnemonic
                    ),
                    list_span,
                );
            }
        } else {
            self.problem(
                format!(
                    "Wrong number of operands for {} instruction ({} required)",
                    node.mnemonic,
                    format.arity()
                ),
                list_span,
            );
        }

        let line = node.span.map(|span| span.line);
        self.push_statement(Statement::new(instruction, operands, line));
    }

    fn visit_error(&mut self, node: &ErrorNode) {
        let message = match node.span {
            Some(_) => format!("unrecognised input: \"{}\"", node.text),
            None => format!("unrecognised input with no position information: \"{}\"", node.text),
        };
        self.problem(message, node.span);
    }

    fn exit_program(&mut self) {
        if !self.program.text().has_label(ENTRY_LABEL) {
            self.problems.log(Problem::unlocated(format!(
                "The program has no '{ENTRY_LABEL}' label"
            )));
        }
        if !self.outstanding.is_empty() {
            let names = self.outstanding.join("\", \"");
            self.problems.log(Problem::unlocated(format!(
                "These labels could not be assigned to addresses because the end of the program was reached: \"{names}\""
            )));
            self.outstanding.clear();
        }
        tracing::debug!(
            statements = self.program.text().len(),
            variables = self.program.data().len(),
            problems = self.problems.len(),
            "extraction finished"
        );
    }
}

/// Runs the extractor over a parse tree.
#[must_use]
pub fn extract(tree: &ProgramNode) -> Extraction {
    let mut extractor = ProgramExtractor::new();
    walk(tree, &mut extractor);
    extractor.finish()
}
