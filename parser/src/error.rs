//! Parse errors and the collector that bounds them.

use std::fmt;

use docopt_grammar_core::{Ast, NodeKind, Span, TokenKind};
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use crate::lexer::LexError;

/// Top-level construction step that produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ParseStep {
    Prologue,
    Usage,
    FreeSection,
    Options,
}

impl fmt::Display for ParseStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParseStep::Prologue => "prologue",
            ParseStep::Usage => "usage",
            ParseStep::FreeSection => "free section",
            ParseStep::Options => "options",
        };
        f.write_str(name)
    }
}

/// Errors raised while building the syntax tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Input the tokenizer could not classify; one character was discarded.
    #[error("lexical error: {0}")]
    Lexical(#[from] LexError),

    #[error("no usage section found")]
    UsageNotFound,

    #[error("usage section with no program name (at {span})")]
    MissingProgName { span: Span },

    #[error("program name `{found}` at {span} differs from `{expected}`")]
    ProgNameMismatch {
        expected: String,
        found: String,
        span: Span,
    },

    #[error("second usage heading at {span}")]
    DuplicateUsage { span: Span },

    #[error("second options heading at {span}")]
    DuplicateOptions { span: Span },

    #[error("missing closing `{closer}` for {group}, found {found} at {span}")]
    UnclosedGroup {
        group: NodeKind,
        closer: char,
        found: TokenKind,
        span: Span,
    },

    #[error("{group} closed by `{found}` at {span}, expected `{expected}`")]
    UnexpectedClosing {
        group: NodeKind,
        expected: char,
        found: String,
        span: Span,
    },

    #[error("unmatched punctuation `{value}` at {span}")]
    UnmatchedPunct { value: String, span: Span },

    #[error("unexpected {found} `{value}` in {context} at {span}")]
    UnexpectedToken {
        context: &'static str,
        found: TokenKind,
        value: String,
        span: Span,
    },

    #[error("ellipsis at {span} follows nothing in {node}")]
    EllipsisWithoutOperand { node: NodeKind, span: Span },

    #[error("`=` at {span} cannot follow {previous}")]
    InvalidAssignment { previous: NodeKind, span: Span },

    #[error("`=` at {span} has no preceding element")]
    AssignmentWithoutTarget { span: Span },

    #[error("`=` at {span} must be followed by an argument, found {found}")]
    AssignmentWithoutArgument { found: TokenKind, span: Span },

    #[error("empty option line at {span}")]
    EmptyOption { span: Span },

    #[error("empty alternative before `|` at {span}")]
    EmptyAlternative { span: Span },

    #[error("too many errors (limit {limit}), parsing stopped")]
    TooManyErrors { limit: usize },

    /// Returned by every routine once the collector has stopped the parse.
    #[error("parsing stopped")]
    Stopped,

    /// A grammar routine left the tree in a state its caller cannot continue from.
    #[error("internal parser error: {0}")]
    Internal(String),
}

impl ParseError {
    /// Whether this error halts the whole parse.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ParseError::TooManyErrors { .. } | ParseError::Stopped | ParseError::Internal(_)
        )
    }
}

/// An error attributed to the step that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseErrorRecord {
    pub step: ParseStep,
    pub error: ParseError,
}

impl fmt::Display for ParseErrorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.step, self.error)
    }
}

/// Accumulates recoverable errors and stops the parse at the limit.
#[derive(Debug)]
pub struct ErrorCollector {
    records: Vec<ParseErrorRecord>,
    max_errors: usize,
    stopped: bool,
    step: ParseStep,
}

impl ErrorCollector {
    pub fn new(max_errors: usize) -> Self {
        Self {
            records: Vec::new(),
            max_errors: max_errors.max(1),
            stopped: false,
            step: ParseStep::Prologue,
        }
    }

    /// Attributes subsequent errors to `step`.
    pub fn enter(&mut self, step: ParseStep) {
        self.step = step;
    }

    pub fn step(&self) -> ParseStep {
        self.step
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn records(&self) -> &[ParseErrorRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<ParseErrorRecord> {
        self.records
    }

    /// Records `error`; a fatal error or the `max_errors`-th recoverable one
    /// stops the parse. `Stopped` itself is never stored.
    pub fn record(&mut self, error: ParseError) {
        if self.stopped || error == ParseError::Stopped {
            return;
        }

        warn!(step = %self.step, error = %error, "parse error");
        let fatal = error.is_fatal();
        self.records.push(ParseErrorRecord {
            step: self.step,
            error,
        });
        if fatal {
            self.stopped = true;
            return;
        }

        let recoverable = self.records.iter().filter(|r| !r.error.is_fatal()).count();
        if recoverable >= self.max_errors {
            warn!(limit = self.max_errors, "error limit reached, stopping");
            self.records.push(ParseErrorRecord {
                step: self.step,
                error: ParseError::TooManyErrors {
                    limit: self.max_errors,
                },
            });
            self.stopped = true;
        }
    }
}

/// Everything a parse produced, successful or not.
#[derive(Debug)]
pub struct ParseOutcome {
    pub ast: Ast,
    pub errors: Vec<ParseErrorRecord>,
    /// Set when the parse was halted by a fatal error.
    pub stopped: bool,
    /// Tokens in the order the parser consumed them, when recording was enabled.
    pub tokens: Vec<docopt_grammar_core::Token>,
}

impl ParseOutcome {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn into_result(self) -> Result<Ast, ParseFailure> {
        if self.errors.is_empty() {
            Ok(self.ast)
        } else {
            Err(ParseFailure {
                ast: self.ast,
                errors: self.errors,
            })
        }
    }
}

/// A parse that recorded at least one error; the partial tree is kept.
#[derive(Debug)]
pub struct ParseFailure {
    pub ast: Ast,
    pub errors: Vec<ParseErrorRecord>,
}

impl fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} parse error(s)", self.errors.len())?;
        if let Some(first) = self.errors.first() {
            write!(f, "; first: {first}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseFailure {}

#[cfg(test)]
mod tests {
    use super::*;

    fn mismatch() -> ParseError {
        ParseError::ProgNameMismatch {
            expected: "prog".to_string(),
            found: "other".to_string(),
            span: Span::new(3, 8),
        }
    }

    #[test]
    fn test_records_carry_step() {
        let mut collector = ErrorCollector::new(10);
        collector.enter(ParseStep::Usage);
        collector.record(mismatch());

        assert_eq!(collector.records().len(), 1);
        assert_eq!(collector.records()[0].step, ParseStep::Usage);
        assert!(!collector.is_stopped());
    }

    #[test]
    fn test_limit_stops_with_distinct_fatal_error() {
        let mut collector = ErrorCollector::new(2);
        collector.record(mismatch());
        collector.record(ParseError::UsageNotFound);

        assert!(collector.is_stopped());
        let last = &collector.records().last().expect("records").error;
        assert_eq!(last, &ParseError::TooManyErrors { limit: 2 });
        assert!(last.is_fatal());

        collector.record(mismatch());
        assert_eq!(collector.records().len(), 3);
    }

    #[test]
    fn test_stopped_is_not_recorded() {
        let mut collector = ErrorCollector::new(10);
        collector.record(ParseError::Stopped);
        assert!(collector.records().is_empty());
        assert!(!collector.is_stopped());
    }

    #[test]
    fn test_internal_error_is_fatal() {
        let mut collector = ErrorCollector::new(10);
        collector.record(ParseError::Internal("lost current node".to_string()));
        assert!(collector.is_stopped());
    }

    #[test]
    fn test_record_display_names_step() {
        let record = ParseErrorRecord {
            step: ParseStep::Options,
            error: ParseError::EmptyOption {
                span: Span::new(4, 5),
            },
        };
        assert_eq!(record.to_string(), "options: empty option line at 4..5");
    }
}
