//! Recursive-descent parser building the docopt syntax tree.
//!
//! The driver runs the top-level steps in order (prologue, usage, free
//! section, options, free section). Each step consumes tokens through the
//! shared [`TokenCursor`] and attaches nodes below a single insertion point,
//! `current`. Every routine returns a [`Step`]; once the error collector has
//! stopped the parse, the cursor refuses to advance and
//! [`ParseError::Stopped`] unwinds every frame.

mod options;
mod sections;
mod usage;

use docopt_grammar_core::{Ast, NodeId, NodeKind, Token, TokenKind};
use tracing::{debug, warn};

use crate::config::ParserConfig;
use crate::cursor::TokenCursor;
use crate::error::{ErrorCollector, ParseError, ParseOutcome, ParseStep};
use crate::lexer::Tokenizer;

type Step<T = ()> = Result<T, ParseError>;

/// Why a consumption loop handed control back to its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Exit {
    /// The construct ended; the caller keeps reading.
    Continue,
    /// Two consecutive NEWLINE tokens, both consumed.
    TwoNewlines,
    /// NEWLINE, indentation, then the program name: a new usage line.
    ProgNameSequence,
    EndOfInput,
    /// A column-0 heading is the current token.
    SectionHeading,
}

const TOP_LEVEL_STEPS: [ParseStep; 5] = [
    ParseStep::Prologue,
    ParseStep::Usage,
    ParseStep::FreeSection,
    ParseStep::Options,
    ParseStep::FreeSection,
];

/// Parser state for one help text.
pub struct DocoptParser<T: Tokenizer> {
    cursor: TokenCursor<T>,
    errors: ErrorCollector,
    ast: Ast,
    /// Insertion point for new nodes.
    current: NodeId,
    usage_section: Option<NodeId>,
    options_section: Option<NodeId>,
    prog_name: Option<String>,
    stop_on_error: bool,
}

impl<T: Tokenizer> DocoptParser<T> {
    pub fn new(lexer: T, config: &ParserConfig) -> Self {
        let mut cursor = TokenCursor::new(lexer);
        if config.record_tokens {
            cursor = cursor.with_trace();
        }
        let ast = Ast::new(NodeKind::Root);
        let root = ast.root();
        Self {
            cursor,
            errors: ErrorCollector::new(config.max_errors),
            ast,
            current: root,
            usage_section: None,
            options_section: None,
            prog_name: None,
            stop_on_error: config.stop_on_error,
        }
    }

    /// Runs every top-level step and returns the tree with all recorded errors.
    pub fn parse(mut self) -> ParseOutcome {
        for step in TOP_LEVEL_STEPS {
            self.errors.enter(step);
            debug!(step = %step, state = %self.cursor.state(), "entering step");
            self.current = self.ast.root();

            let result = match step {
                ParseStep::Prologue => self.parse_prologue(),
                ParseStep::Usage => self.parse_usage(),
                ParseStep::FreeSection => self.parse_free_section(),
                ParseStep::Options => self.parse_options(),
            };

            if let Err(err) = result {
                let abort = matches!(err, ParseError::UsageNotFound) || self.stop_on_error;
                self.errors.record(err);
                if abort {
                    break;
                }
            }
            if self.errors.is_stopped() {
                warn!(step = %step, "parsing stopped");
                break;
            }
        }

        let stopped = self.errors.is_stopped();
        ParseOutcome {
            ast: self.ast,
            errors: self.errors.into_records(),
            stopped,
            tokens: self.cursor.into_trace(),
        }
    }

    fn advance(&mut self) -> Step<Token> {
        self.cursor.advance(&mut self.errors)?;
        Ok(self.cursor.current().clone())
    }

    fn peek_kind(&mut self) -> Step<TokenKind> {
        Ok(self.cursor.peek(&mut self.errors)?.kind)
    }

    /// Consumes the lookahead when it is a second NEWLINE.
    fn second_newline(&mut self) -> Step<bool> {
        if self.peek_kind()? == TokenKind::Newline {
            self.advance()?;
            return Ok(true);
        }
        Ok(false)
    }

    fn lookback_is(&self, n: usize, kind: TokenKind) -> bool {
        self.cursor.lookback(n).is_some_and(|t| t.is(kind))
    }

    /// Sets the repeat flag on the last child of the current expression.
    fn apply_ellipsis(&mut self, token: &Token) -> Step {
        let node = self.current;
        let operand = match self.ast.kind(node) {
            NodeKind::UsageExpr => self.ast.last_child(node),
            _ => None,
        };
        let Some(operand) = operand else {
            return Err(ParseError::EllipsisWithoutOperand {
                node: self.ast.kind(node),
                span: token.span,
            });
        };
        self.ast.set_repeat(operand);
        Ok(())
    }

    /// Handles `=`: the lookahead must be an ARGUMENT, attached to the
    /// preceding sibling.
    fn apply_assignment(&mut self, equals: &Token) -> Step {
        self.assignment_target(equals)?;
        let next = self.peek_kind()?;
        if next != TokenKind::Argument {
            return Err(ParseError::AssignmentWithoutArgument {
                found: next,
                span: equals.span,
            });
        }
        let argument = self.advance()?;
        self.attach_argument(argument)
    }

    /// Attaches an ARGUMENT to the preceding option name.
    fn attach_argument(&mut self, argument: Token) -> Step {
        let target = self.assignment_target(&argument)?;
        let kind = match self.ast.kind(target) {
            NodeKind::UsageLongOption => NodeKind::UsageArgument,
            _ => NodeKind::OptionArgument,
        };
        self.ast.add_child(target, kind, Some(argument));
        Ok(())
    }

    fn assignment_target(&self, token: &Token) -> Step<NodeId> {
        let Some(previous) = self.ast.last_child(self.current) else {
            return Err(ParseError::AssignmentWithoutTarget { span: token.span });
        };
        let kind = self.ast.kind(previous);
        if !kind.accepts_assignment() {
            return Err(ParseError::InvalidAssignment {
                previous: kind,
                span: token.span,
            });
        }
        Ok(previous)
    }
}

/// Case-insensitive heading comparison (`Options:` against `options:`).
fn heading_is(token: &Token, name: &str) -> bool {
    token.is(TokenKind::Section) && token.value.trim().eq_ignore_ascii_case(name)
}
