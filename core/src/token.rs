//! Token model shared by the tokenizer and the grammar parsers.
//!
//! A [`Token`] is immutable once produced: it records the terminal
//! [`TokenKind`], the literal text it matched, the lexer state that produced
//! it, and its byte [`Span`] in the source. The span doubles as the token's
//! identity when it is handed back to the tokenizer for re-emission.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Terminal symbol kinds of the docopt usage language.
///
/// This enum is the symbol table: every lexer state draws its token kinds
/// from it, and [`TokenKind::from_name`] resolves the conventional
/// upper-case names (`"PROG_NAME"`, `"LONG_BLANK"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenKind {
    /// A physical line break.
    Newline,
    /// A section heading such as `Options:` at column 0.
    Section,
    /// The program name of a usage line.
    ProgName,
    /// The `Usage:` heading (case-insensitive).
    Usage,
    /// A short option, e.g. `-h`.
    Short,
    /// A long option, e.g. `--help`.
    Long,
    /// A positional placeholder, `<file>` or `FILE`.
    Argument,
    /// Grammar punctuation: `[ ] ( ) | = ... ,`.
    Punct,
    /// A bare word inside a usage expression (a command).
    Ident,
    /// Two or more blanks, or a tab: column separator and indentation.
    LongBlank,
    /// Ordinary inter-word spacing.
    Blank,
    /// An embedded `[default: ...]` marker in an option description.
    Default,
    /// Free text outside the usage grammar.
    Word,
    /// End of input.
    Eof,
}

impl TokenKind {
    /// Every kind, in declaration order.
    pub const ALL: [TokenKind; 14] = [
        TokenKind::Newline,
        TokenKind::Section,
        TokenKind::ProgName,
        TokenKind::Usage,
        TokenKind::Short,
        TokenKind::Long,
        TokenKind::Argument,
        TokenKind::Punct,
        TokenKind::Ident,
        TokenKind::LongBlank,
        TokenKind::Blank,
        TokenKind::Default,
        TokenKind::Word,
        TokenKind::Eof,
    ];

    /// Returns the conventional symbol name of this kind.
    ///
    /// # Examples
    ///
    /// ```
    /// use docopt_grammar_core::TokenKind;
    ///
    /// assert_eq!(TokenKind::LongBlank.name(), "LONG_BLANK");
    /// ```
    pub const fn name(self) -> &'static str {
        match self {
            TokenKind::Newline => "NEWLINE",
            TokenKind::Section => "SECTION",
            TokenKind::ProgName => "PROG_NAME",
            TokenKind::Usage => "USAGE",
            TokenKind::Short => "SHORT",
            TokenKind::Long => "LONG",
            TokenKind::Argument => "ARGUMENT",
            TokenKind::Punct => "PUNCT",
            TokenKind::Ident => "IDENT",
            TokenKind::LongBlank => "LONG_BLANK",
            TokenKind::Blank => "BLANK",
            TokenKind::Default => "DEFAULT",
            TokenKind::Word => "WORD",
            TokenKind::Eof => "EOF",
        }
    }

    /// Resolves a symbol name back to its kind.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Half-open byte range `[start, end)` in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Zero-width span at `offset`.
    pub const fn empty(offset: usize) -> Self {
        Self {
            start: offset,
            end: offset,
        }
    }

    pub const fn len(&self) -> usize {
        self.end - self.start
    }

    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// A terminal produced by the tokenizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    /// Name of the lexer state whose rules matched this token.
    pub state: &'static str,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, value: impl Into<String>, state: &'static str, span: Span) -> Self {
        Self {
            kind,
            value: value.into(),
            state,
            span,
        }
    }

    /// End-of-input marker positioned at `offset`.
    pub fn eof(state: &'static str, offset: usize) -> Self {
        Self::new(TokenKind::Eof, "", state, Span::empty(offset))
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }

    /// Returns `true` for a `PUNCT` token with exactly this literal.
    pub fn is_punct(&self, literal: &str) -> bool {
        self.kind == TokenKind::Punct && self.value == literal
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:?}@{}", self.kind, self.value, self.span)
    }
}
