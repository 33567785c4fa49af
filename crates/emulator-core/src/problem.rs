//! Ordered diagnostics shared by the extractor and the engine.
//!
//! A [`Problem`] is a human-readable message with a severity and an optional
//! source position. Positions follow the editor contract: a 1-indexed line
//! number and an inclusive character range, with `-1` standing in for "not
//! localizable".

use std::fmt;

/// Sentinel line number for problems that cannot be tied to a line.
pub const NO_LINE_NUM: isize = -1;

/// Sentinel range bound for problems that cannot be tied to a character range.
pub const NO_RANGE: isize = -1;

/// Whether a problem can safely be ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Severity {
    /// The program can still be meaningfully executed.
    NonCritical,
    /// The program representation is incomplete or wrong.
    #[default]
    Critical,
}

/// Location of a construct in the source text.
///
/// `start` and `end` are absolute offsets into the whole program string and
/// the range is inclusive at both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct SourceSpan {
    /// 1-indexed line number of the first character.
    pub line: usize,
    /// Offset of the first character.
    pub start: usize,
    /// Offset of the last character.
    pub end: usize,
}

impl SourceSpan {
    /// Creates a span covering `start..=end` on `line`.
    #[must_use]
    pub const fn new(line: usize, start: usize, end: usize) -> Self {
        Self { line, start, end }
    }
}

/// A single diagnostic. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Problem {
    message: String,
    severity: Severity,
    line: Option<usize>,
    range: Option<(usize, usize)>,
}

impl Problem {
    /// Creates a critical problem with no associated position.
    #[must_use]
    pub fn unlocated(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: Severity::Critical,
            line: None,
            range: None,
        }
    }

    /// Creates a critical problem tied to a whole line.
    #[must_use]
    pub fn at_line(message: impl Into<String>, line: usize) -> Self {
        Self {
            line: Some(line),
            ..Self::unlocated(message)
        }
    }

    /// Creates a critical problem tied to `line` when known, position-free
    /// otherwise.
    #[must_use]
    pub fn maybe_at_line(message: impl Into<String>, line: Option<usize>) -> Self {
        Self {
            line,
            ..Self::unlocated(message)
        }
    }

    /// Creates a critical problem spanning a construct.
    #[must_use]
    pub fn at(message: impl Into<String>, span: SourceSpan) -> Self {
        Self {
            line: Some(span.line),
            range: Some((span.start, span.end)),
            ..Self::unlocated(message)
        }
    }

    /// Creates a critical problem spanning `span` when present, position-free
    /// otherwise.
    #[must_use]
    pub fn maybe_at(message: impl Into<String>, span: Option<SourceSpan>) -> Self {
        match span {
            Some(span) => Self::at(message, span),
            None => Self::unlocated(message),
        }
    }

    /// Replaces the severity.
    #[must_use]
    pub const fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Human-readable description.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Severity of the problem.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        self.severity
    }

    /// Line number, or [`NO_LINE_NUM`].
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub fn line_num(&self) -> isize {
        self.line.map_or(NO_LINE_NUM, |line| line as isize)
    }

    /// Inclusive character range, or `(NO_RANGE, NO_RANGE)`.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub fn range(&self) -> (isize, isize) {
        self.range.map_or((NO_RANGE, NO_RANGE), |(start, end)| {
            (start as isize, end as isize)
        })
    }

    /// Returns `true` when the problem carries neither a line nor a range.
    #[must_use]
    pub const fn is_position_free(&self) -> bool {
        self.line.is_none() && self.range.is_none()
    }

    /// Returns `true` for [`Severity::Critical`] problems.
    #[must_use]
    pub fn is_critical(&self) -> bool {
        self.severity == Severity::Critical
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "line {line}: {}", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

/// Ordered, append-only collection of problems.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct ProblemLog {
    problems: Vec<Problem>,
}

impl ProblemLog {
    /// Creates an empty log.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            problems: Vec::new(),
        }
    }

    /// Appends a problem.
    pub fn log(&mut self, problem: Problem) {
        tracing::trace!(line = problem.line_num(), message = %problem.message, "problem logged");
        self.problems.push(problem);
    }

    /// Returns true if nothing has been logged.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.problems.is_empty()
    }

    /// Number of logged problems.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.problems.len()
    }

    /// Iterates over problems in logging order.
    pub fn iter(&self) -> std::slice::Iter<'_, Problem> {
        self.problems.iter()
    }

    /// Returns true if any problem is critical.
    #[must_use]
    pub fn has_critical(&self) -> bool {
        self.problems.iter().any(Problem::is_critical)
    }

    /// Borrowed view of all problems.
    #[must_use]
    pub fn as_slice(&self) -> &[Problem] {
        &self.problems
    }

    /// Consumes the log, returning the problems in order.
    #[must_use]
    pub fn into_vec(self) -> Vec<Problem> {
        self.problems
    }

    /// Formats all problems for stderr output, one per line.
    #[must_use]
    pub fn format_for_stderr(&self) -> String {
        self.problems
            .iter()
            .map(|problem| match problem.severity {
                Severity::Critical => format!("error: {problem}"),
                Severity::NonCritical => format!("warning: {problem}"),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl<'a> IntoIterator for &'a ProblemLog {
    type Item = &'a Problem;
    type IntoIter = std::slice::Iter<'a, Problem>;

    fn into_iter(self) -> Self::IntoIter {
        self.problems.iter()
    }
}

impl fmt::Display for ProblemLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, problem) in self.problems.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{problem}")?;
        }
        Ok(())
    }
}
