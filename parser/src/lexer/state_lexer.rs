use std::collections::HashMap;

use docopt_grammar_core::{Span, Token, TokenKind};
use regex::Regex;
use tracing::debug;

use super::rules::{Anchor, Matcher, RULES, Rule, literal_pattern};
use super::{LexError, LexerState, Tokenizer};

/// Regex-driven [`Tokenizer`] over an in-memory help text.
///
/// Rules of the active state are tried in order and the first non-empty match
/// wins. Rejection rewinds the input position, so a rejected token is
/// re-lexed under whatever state is active when it is pulled again.
#[derive(Debug)]
pub struct StateLexer<'a> {
    source: &'a str,
    pos: usize,
    state: LexerState,
    installed: HashMap<TokenKind, InstalledLiteral>,
}

#[derive(Debug)]
struct InstalledLiteral {
    regex: Regex,
    /// Column of the literal's first occurrence; deeper line heads are
    /// continuation lines.
    column: Option<usize>,
}

impl<'a> StateLexer<'a> {
    /// Creates a lexer positioned at the start of `source` in the `Prologue` state.
    pub fn new(source: &'a str) -> Self {
        Self::with_state(source, LexerState::Prologue)
    }

    pub fn with_state(source: &'a str, state: LexerState) -> Self {
        Self {
            source,
            pos: 0,
            state,
            installed: HashMap::new(),
        }
    }

    /// Byte offset of the next unread character.
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    fn at_line_start(&self) -> bool {
        self.pos == 0 || self.source.as_bytes()[self.pos - 1] == b'\n'
    }

    /// Indentation width when the position is the first word of an
    /// indented line.
    fn line_head_indent(&self) -> Option<usize> {
        let before = &self.source.as_bytes()[..self.pos];
        let indent = before
            .iter()
            .rev()
            .take_while(|byte| matches!(byte, b' ' | b'\t'))
            .count();
        if indent == 0 {
            return None;
        }
        let line_start = self.pos - indent;
        (line_start == 0 || before[line_start - 1] == b'\n').then_some(indent)
    }

    fn anchored(&self, rule: &Rule) -> bool {
        match rule.anchor {
            Anchor::Anywhere => true,
            Anchor::LineStart => self.at_line_start(),
            Anchor::IndentedLineHead => self.line_head_indent().is_some_and(|indent| {
                self.installed
                    .get(&rule.kind)
                    .and_then(|literal| literal.column)
                    .is_none_or(|column| indent <= column)
            }),
        }
    }

    /// Column of the last occurrence of `literal` before the position.
    fn literal_column(&self, literal: &str) -> Option<usize> {
        let consumed = &self.source[..self.pos];
        let start = consumed.rfind(literal)?;
        let line_start = consumed[..start].rfind('\n').map_or(0, |newline| newline + 1);
        Some(start - line_start)
    }

    /// First rule of the current state matching at the position, as
    /// `(kind, skip, length)`.
    fn match_rule(&self) -> Option<(TokenKind, bool, usize)> {
        let rest = &self.source[self.pos..];
        for rule in RULES.for_state(self.state) {
            if !self.anchored(rule) {
                continue;
            }
            let regex = match &rule.matcher {
                Matcher::Pattern(regex) => regex,
                Matcher::Literal => match self.installed.get(&rule.kind) {
                    Some(literal) => &literal.regex,
                    None => continue,
                },
            };
            let Some(text) = regex.captures(rest).and_then(|caps| caps.get(1)) else {
                continue;
            };
            if text.is_empty() {
                continue;
            }
            return Some((rule.kind, rule.skip, text.end()));
        }
        None
    }
}

impl Tokenizer for StateLexer<'_> {
    fn next_token(&mut self) -> Result<Token, LexError> {
        loop {
            let Some(found) = self.source[self.pos..].chars().next() else {
                return Ok(Token::eof(self.state.name(), self.pos));
            };
            let Some((kind, skip, len)) = self.match_rule() else {
                return Err(LexError::NoMatch {
                    offset: self.pos,
                    state: self.state,
                    found,
                });
            };

            let start = self.pos;
            self.pos += len;
            if skip {
                continue;
            }
            return Ok(Token::new(
                kind,
                &self.source[start..self.pos],
                self.state.name(),
                Span::new(start, self.pos),
            ));
        }
    }

    fn discard(&mut self, n: usize) {
        let skipped: usize = self.source[self.pos..]
            .chars()
            .take(n)
            .map(char::len_utf8)
            .sum();
        self.pos += skipped;
    }

    fn reject(&mut self, token: &Token) -> Result<(), LexError> {
        if token.span.end > self.pos || token.span.start > token.span.end {
            return Err(LexError::InvalidReject {
                value: token.value.clone(),
                span: token.span,
            });
        }
        self.pos = token.span.start;
        Ok(())
    }

    fn change_state(&mut self, state: LexerState) {
        if self.state != state {
            debug!(from = %self.state, to = %state, offset = self.pos, "lexer state change");
        }
        self.state = state;
    }

    fn state(&self) -> LexerState {
        self.state
    }

    fn install_literal_rule(&mut self, rule: &str, literal: &str) -> Result<(), LexError> {
        let kind = self.symbol(rule).ok_or_else(|| LexError::UnknownSymbol {
            name: rule.to_string(),
        })?;
        let regex = literal_pattern(literal).map_err(|err| LexError::InvalidRule {
            kind,
            reason: err.to_string(),
        })?;
        let column = self.literal_column(literal);
        debug!(kind = %kind, literal, ?column, "installed literal rule");
        self.installed.insert(kind, InstalledLiteral { regex, column });
        Ok(())
    }
}
