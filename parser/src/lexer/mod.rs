//! Stateful tokenizer for the docopt usage language.
//!
//! The grammar parsers consume tokens only through the [`Tokenizer`] trait.
//! Which rules apply depends on the current [`LexerState`]: the program name,
//! for example, is matched by a generic pattern until it is known and by its
//! literal text afterwards. [`StateLexer`] is the regex-driven implementation
//! used by [`parse_docopt`](crate::parse_docopt).

mod rules;
mod state_lexer;

use std::fmt;

use docopt_grammar_core::{Span, Token, TokenKind};
use thiserror::Error;

pub use state_lexer::StateLexer;

/// Named rule sets of the tokenizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LexerState {
    /// Free text ahead of the `Usage:` heading.
    Prologue,
    /// Between `Usage:` and the first program name.
    FirstProgramUsage,
    /// Usage expressions, once the program name is known.
    UsageLine,
    /// Unnamed or named sections outside usage and options.
    Free,
    /// Option definitions and their descriptions.
    Options,
}

impl LexerState {
    pub const fn name(self) -> &'static str {
        match self {
            LexerState::Prologue => "Prologue",
            LexerState::FirstProgramUsage => "FirstProgramUsage",
            LexerState::UsageLine => "UsageLine",
            LexerState::Free => "Free",
            LexerState::Options => "Options",
        }
    }
}

impl fmt::Display for LexerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Tokenizer failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    /// No rule of the current state matches at `offset`.
    #[error("no {state} rule matches {found:?} at offset {offset}")]
    NoMatch {
        offset: usize,
        state: LexerState,
        found: char,
    },
    /// The token was already handed back, or was never produced.
    #[error("cannot reject token {value:?} at {span}")]
    InvalidReject { value: String, span: Span },
    /// The rule name is not in the symbol table.
    #[error("unknown symbol {name:?}")]
    UnknownSymbol { name: String },
    /// A literal rule could not be compiled.
    #[error("invalid literal rule for {kind}: {reason}")]
    InvalidRule { kind: TokenKind, reason: String },
}

/// Token source driven by the grammar parsers.
pub trait Tokenizer {
    /// Pulls the next token under the current state's rules.
    ///
    /// A lexical error does not advance the input; callers recover with
    /// [`discard`](Tokenizer::discard). End of input yields `EOF` forever.
    fn next_token(&mut self) -> Result<Token, LexError>;

    /// Skips `n` characters of unrecognized input.
    fn discard(&mut self, n: usize);

    /// Pushes a previously returned token back so it is produced again.
    fn reject(&mut self, token: &Token) -> Result<(), LexError>;

    /// Switches the rule set used for subsequent tokens.
    fn change_state(&mut self, state: LexerState);

    fn state(&self) -> LexerState;

    /// Makes every rule named `rule` (a symbol-table name such as
    /// `"PROG_NAME"`) that awaits a literal match exactly `literal`.
    ///
    /// The literal is expected to be the text of the token just consumed.
    fn install_literal_rule(&mut self, rule: &str, literal: &str) -> Result<(), LexError>;

    /// Resolves a symbol-table name such as `"LONG_BLANK"` to its kind.
    fn symbol(&self, name: &str) -> Option<TokenKind> {
        TokenKind::from_name(name)
    }
}
