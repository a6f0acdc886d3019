//! Token cursor between the tokenizer and the grammar parsers.

use std::collections::VecDeque;

use docopt_grammar_core::{Token, TokenKind};
use tracing::{debug, warn};

use crate::error::{ErrorCollector, ParseError};
use crate::lexer::{LexerState, Tokenizer};

/// Number of consumed tokens kept for lookback checks.
pub const HISTORY_DEPTH: usize = 8;

/// Current token, lazily filled one-token lookahead, and a bounded history.
///
/// The lookahead is only pulled when [`peek`](TokenCursor::peek) asks for it,
/// so a section can end without lexing past its boundary under the wrong
/// rules. A lookahead still pending when the state changes is handed back to
/// the tokenizer and re-lexed under the new state.
pub struct TokenCursor<T: Tokenizer> {
    lexer: T,
    current: Token,
    next: Option<Token>,
    history: VecDeque<Token>,
    trace: Option<Vec<Token>>,
}

impl<T: Tokenizer> TokenCursor<T> {
    pub fn new(lexer: T) -> Self {
        let state = lexer.state().name();
        Self {
            lexer,
            current: Token::eof(state, 0),
            next: None,
            history: VecDeque::with_capacity(HISTORY_DEPTH),
            trace: None,
        }
    }

    /// Keeps a copy of every token that becomes current.
    pub fn with_trace(mut self) -> Self {
        self.trace = Some(Vec::new());
        self
    }

    pub fn current(&self) -> &Token {
        &self.current
    }

    pub fn state(&self) -> LexerState {
        self.lexer.state()
    }

    /// Token consumed `n` steps ago; `lookback(0)` is the current token.
    pub fn lookback(&self, n: usize) -> Option<&Token> {
        self.history.len().checked_sub(n + 1).and_then(|i| self.history.get(i))
    }

    /// Moves to the next token.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Stopped`] once the collector has stopped, including
    /// when the error limit is reached while skipping unlexable input.
    pub fn advance(&mut self, errors: &mut ErrorCollector) -> Result<(), ParseError> {
        if errors.is_stopped() {
            return Err(ParseError::Stopped);
        }

        let token = match self.next.take() {
            Some(token) => token,
            None => self.pull(errors)?,
        };

        if self.history.len() == HISTORY_DEPTH {
            self.history.pop_front();
        }
        self.history.push_back(token.clone());
        if let Some(trace) = self.trace.as_mut() {
            trace.push(token.clone());
        }
        self.current = token;
        Ok(())
    }

    /// The token after the current one, lexed under the current state.
    pub fn peek(&mut self, errors: &mut ErrorCollector) -> Result<&Token, ParseError> {
        if errors.is_stopped() {
            return Err(ParseError::Stopped);
        }
        if self.next.is_none() {
            let token = self.pull(errors)?;
            self.next = Some(token);
        }
        self.next
            .as_ref()
            .ok_or_else(|| ParseError::Internal("lookahead vanished".to_string()))
    }

    /// Whether the lookahead has `kind`.
    pub fn peek_is(
        &mut self,
        errors: &mut ErrorCollector,
        kind: TokenKind,
    ) -> Result<bool, ParseError> {
        Ok(self.peek(errors)?.is(kind))
    }

    /// Hands the current token back so the next [`advance`](Self::advance)
    /// yields it again.
    pub fn reject_current(&mut self) -> Result<(), ParseError> {
        self.reject_lookahead()?;
        self.lexer
            .reject(&self.current)
            .map_err(|err| ParseError::Internal(err.to_string()))?;
        debug!(token = %self.current, "rejected current token");

        self.history.pop_back();
        if let Some(trace) = self.trace.as_mut() {
            trace.pop();
        }
        let state = self.lexer.state().name();
        self.current = self
            .history
            .back()
            .cloned()
            .unwrap_or_else(|| Token::eof(state, 0));
        Ok(())
    }

    pub fn change_state(&mut self, state: LexerState) -> Result<(), ParseError> {
        if self.lexer.state() == state {
            return Ok(());
        }
        self.reject_lookahead()?;
        self.lexer.change_state(state);
        Ok(())
    }

    pub fn install_literal_rule(&mut self, rule: &str, literal: &str) -> Result<(), ParseError> {
        self.reject_lookahead()?;
        self.lexer.install_literal_rule(rule, literal)?;
        Ok(())
    }

    /// Tokens recorded since [`with_trace`](Self::with_trace); empty otherwise.
    pub fn into_trace(self) -> Vec<Token> {
        self.trace.unwrap_or_default()
    }

    fn reject_lookahead(&mut self) -> Result<(), ParseError> {
        if let Some(next) = self.next.take() {
            self.lexer
                .reject(&next)
                .map_err(|err| ParseError::Internal(err.to_string()))?;
        }
        Ok(())
    }

    /// Pulls from the tokenizer, recording and skipping unlexable characters.
    fn pull(&mut self, errors: &mut ErrorCollector) -> Result<Token, ParseError> {
        loop {
            match self.lexer.next_token() {
                Ok(token) => return Ok(token),
                Err(err) => {
                    warn!(state = %self.lexer.state(), error = %err, "discarding unlexable input");
                    errors.record(ParseError::Lexical(err));
                    if errors.is_stopped() {
                        return Err(ParseError::Stopped);
                    }
                    self.lexer.discard(1);
                }
            }
        }
    }
}
