use docopt_grammar_core::{NodeId, NodeKind, Token, TokenKind};
use tracing::debug;

use super::{DocoptParser, Exit, Step};
use crate::error::ParseError;
use crate::lexer::{LexerState, Tokenizer};

impl<T: Tokenizer> DocoptParser<T> {
    /// Parses the usage section: the first program name, then usage lines
    /// until a blank line or EOF.
    pub(super) fn parse_usage(&mut self) -> Step {
        let section = self
            .usage_section
            .ok_or_else(|| ParseError::Internal("usage step without usage section".to_string()))?;

        let mut line = self.parse_first_program(section)?;
        self.cursor.change_state(LexerState::UsageLine)?;

        loop {
            self.current = line;
            match self.consume_usage_expr(line)? {
                Exit::ProgNameSequence => {
                    let prog = self.cursor.current().clone();
                    line = self.ast.add_child(section, NodeKind::UsageLine, None);
                    self.ast.add_child(line, NodeKind::ProgName, Some(prog));
                }
                exit => {
                    debug!(?exit, lines = self.ast.children(section).len() - 1, "usage section done");
                    return Ok(());
                }
            }
        }
    }

    /// Finds the program name, installs it as a literal rule and opens the
    /// first usage line.
    fn parse_first_program(&mut self, section: NodeId) -> Step<NodeId> {
        self.cursor.change_state(LexerState::FirstProgramUsage)?;

        loop {
            let token = self.advance()?;
            match token.kind {
                TokenKind::Blank => {}
                TokenKind::Newline => {
                    if self.peek_kind()? == TokenKind::Newline {
                        return Err(ParseError::MissingProgName { span: token.span });
                    }
                }
                TokenKind::Eof => return Err(ParseError::MissingProgName { span: token.span }),
                TokenKind::ProgName => {
                    debug!(prog_name = %token.value, "program name discovered");
                    self.cursor
                        .install_literal_rule(TokenKind::ProgName.name(), &token.value)?;
                    self.prog_name = Some(token.value.clone());

                    let line = self.ast.add_child(section, NodeKind::UsageLine, None);
                    self.ast.add_child(line, NodeKind::ProgName, Some(token));
                    return Ok(line);
                }
                found => {
                    return Err(ParseError::UnexpectedToken {
                        context: "usage section",
                        found,
                        value: token.value,
                        span: token.span,
                    });
                }
            }
        }
    }

    /// Consumes one usage line below `line`.
    fn consume_usage_expr(&mut self, line: NodeId) -> Step<Exit> {
        loop {
            let token = self.advance()?;
            match token.kind {
                TokenKind::Eof => return Ok(Exit::EndOfInput),
                TokenKind::Newline => {
                    if self.second_newline()? {
                        return Ok(Exit::TwoNewlines);
                    }
                }
                TokenKind::LongBlank => {}
                TokenKind::ProgName => {
                    self.check_prog_name(&token)?;
                    if self.at_usage_line_head() {
                        return Ok(Exit::ProgNameSequence);
                    }
                    self.add_usage_leaf(NodeKind::UsageCommand, token);
                }
                TokenKind::Usage => return Err(ParseError::DuplicateUsage { span: token.span }),
                TokenKind::Punct => self.consume_usage_punct(line, token)?,
                kind => self.add_usage_operand(kind, token)?,
            }
        }
    }

    fn consume_usage_punct(&mut self, line: NodeId, token: Token) -> Step {
        match token.value.as_str() {
            "[" => self.consume_group(NodeKind::UsageOptionalGroup, ']'),
            "(" => self.consume_group(NodeKind::UsageRequiredGroup, ')'),
            "..." => self.apply_ellipsis(&token),
            "=" => self.apply_assignment(&token),
            "|" => self.split_line_alternative(line, &token),
            _ => {
                let expr = self.ensure_expr();
                self.ast.add_child(expr, NodeKind::UsageUnmatchedPunct, Some(token.clone()));
                Err(ParseError::UnmatchedPunct {
                    value: token.value,
                    span: token.span,
                })
            }
        }
    }

    /// Parses a bracketed group; `[` or `(` is the current token.
    fn consume_group(&mut self, kind: NodeKind, closer: char) -> Step {
        let outer = self.ensure_expr();
        let group = self.ast.add_child(outer, kind, None);
        self.current = group;

        loop {
            let token = self.advance()?;
            match token.kind {
                TokenKind::Eof | TokenKind::ProgName | TokenKind::Usage => {
                    return Err(unclosed(kind, closer, &token));
                }
                TokenKind::Newline => {
                    if self.peek_kind()? == TokenKind::Newline {
                        return Err(unclosed(kind, closer, &token));
                    }
                }
                TokenKind::LongBlank => {}
                TokenKind::Punct => match token.value.as_str() {
                    "[" => self.consume_group(NodeKind::UsageOptionalGroup, ']')?,
                    "(" => self.consume_group(NodeKind::UsageRequiredGroup, ')')?,
                    "..." => self.apply_ellipsis(&token)?,
                    "=" => self.apply_assignment(&token)?,
                    "|" => self.split_group_alternative(group, &token)?,
                    "]" | ")" if token.value.starts_with(closer) => {
                        self.current = outer;
                        return Ok(());
                    }
                    "]" | ")" => {
                        return Err(ParseError::UnexpectedClosing {
                            group: kind,
                            expected: closer,
                            found: token.value,
                            span: token.span,
                        });
                    }
                    _ => {
                        let expr = self.ensure_expr();
                        self.ast.add_child(expr, NodeKind::UsageUnmatchedPunct, Some(token));
                    }
                },
                other => self.add_usage_operand(other, token)?,
            }
        }
    }

    /// `|` at the top of a usage line: everything after the program name
    /// becomes the first branch.
    fn split_line_alternative(&mut self, line: NodeId, bar: &Token) -> Step {
        let branch = self.current_branch(bar)?;
        let alternative = match self.ast.parent(branch) {
            Some(parent) if parent == line => {
                debug!(line = %line, "restructuring usage line into alternatives");
                self.ast.replace_children_with_group_from(line, NodeKind::GroupAlternative, 1)
            }
            Some(parent) if self.ast.kind(parent) == NodeKind::GroupAlternative => parent,
            _ => {
                return Err(ParseError::Internal(format!(
                    "usage branch {branch} is not below line {line}"
                )));
            }
        };
        self.current = self.ast.add_child(alternative, NodeKind::UsageExpr, None);
        Ok(())
    }

    /// `|` directly inside a group.
    fn split_group_alternative(&mut self, group: NodeId, bar: &Token) -> Step {
        let branch = self.current_branch(bar)?;
        let alternative = match self.ast.parent(branch) {
            Some(parent) if parent == group => {
                debug!(group = %group, "restructuring group into alternatives");
                self.ast.replace_children_with_group(group, NodeKind::GroupAlternative)
            }
            Some(parent) if self.ast.kind(parent) == NodeKind::GroupAlternative => parent,
            _ => {
                return Err(ParseError::Internal(format!(
                    "group branch {branch} is not below group {group}"
                )));
            }
        };
        self.current = self.ast.add_child(alternative, NodeKind::UsageExpr, None);
        Ok(())
    }

    /// The expression a `|` closes; it must hold at least one element.
    fn current_branch(&self, bar: &Token) -> Step<NodeId> {
        let node = self.current;
        if self.ast.kind(node) != NodeKind::UsageExpr || self.ast.children(node).is_empty() {
            return Err(ParseError::EmptyAlternative { span: bar.span });
        }
        Ok(node)
    }

    fn add_usage_operand(&mut self, kind: TokenKind, token: Token) -> Step {
        let node_kind = match kind {
            TokenKind::Short => NodeKind::UsageShortOption,
            TokenKind::Long => NodeKind::UsageLongOption,
            TokenKind::Argument => NodeKind::UsageArgument,
            TokenKind::Ident => NodeKind::UsageCommand,
            found => {
                return Err(ParseError::UnexpectedToken {
                    context: "usage expression",
                    found,
                    value: token.value,
                    span: token.span,
                });
            }
        };
        self.add_usage_leaf(node_kind, token);
        Ok(())
    }

    fn add_usage_leaf(&mut self, kind: NodeKind, token: Token) {
        let expr = self.ensure_expr();
        self.ast.add_child(expr, kind, Some(token));
    }

    /// Returns the current expression, opening one below the insertion
    /// point if needed.
    fn ensure_expr(&mut self) -> NodeId {
        if self.ast.kind(self.current) != NodeKind::UsageExpr {
            self.current = self.ast.add_child(self.current, NodeKind::UsageExpr, None);
        }
        self.current
    }

    fn check_prog_name(&self, token: &Token) -> Step {
        match &self.prog_name {
            Some(expected) if *expected != token.value => Err(ParseError::ProgNameMismatch {
                expected: expected.clone(),
                found: token.value.clone(),
                span: token.span,
            }),
            _ => Ok(()),
        }
    }

    /// NEWLINE, optional indentation, then the program name.
    fn at_usage_line_head(&self) -> bool {
        self.lookback_is(1, TokenKind::Newline)
            || (self.lookback_is(1, TokenKind::LongBlank) && self.lookback_is(2, TokenKind::Newline))
    }
}

fn unclosed(group: NodeKind, closer: char, token: &Token) -> ParseError {
    ParseError::UnclosedGroup {
        group,
        closer,
        found: token.kind,
        span: token.span,
    }
}
