use docopt_grammar_core::{NodeId, NodeKind, TokenKind};
use tracing::debug;

use super::{DocoptParser, Exit, Step, heading_is};
use crate::error::ParseError;
use crate::lexer::{LexerState, Tokenizer};

impl<T: Tokenizer> DocoptParser<T> {
    /// Parses the options section when the current token is its heading.
    pub(super) fn parse_options(&mut self) -> Step {
        let heading = self.cursor.current().clone();
        if !heading_is(&heading, "options:") {
            debug!("no options section");
            return Ok(());
        }

        self.cursor.change_state(LexerState::Options)?;
        let section = self.ast.add_child(self.ast.root(), NodeKind::OptionsSection, None);
        self.ast.add_child(section, NodeKind::SectionName, Some(heading));
        self.options_section = Some(section);

        loop {
            self.current = section;
            let token = self.advance()?;
            match token.kind {
                TokenKind::Eof | TokenKind::Section => return Ok(()),
                TokenKind::Newline => {
                    if self.second_newline()? {
                        return Ok(());
                    }
                }
                TokenKind::LongBlank => {
                    if matches!(self.peek_kind()?, TokenKind::Short | TokenKind::Long) {
                        match self.parse_option_line(section)? {
                            Exit::Continue => {}
                            _ => return Ok(()),
                        }
                    }
                }
                _ => {
                    self.ast.add_child(section, NodeKind::OptionsNode, Some(token));
                }
            }
        }
    }

    /// Parses option names and their arguments, then the description.
    fn parse_option_line(&mut self, section: NodeId) -> Step<Exit> {
        let line = self.ast.add_child(section, NodeKind::OptionLine, None);
        self.current = line;
        let mut names = 0usize;

        loop {
            let token = self.advance()?;
            match token.kind {
                TokenKind::Short | TokenKind::Long => {
                    if names == 1 {
                        debug!(line = %line, "restructuring option names into alternatives");
                        self.current = self
                            .ast
                            .replace_children_with_group(line, NodeKind::OptionAlternativeGroup);
                    }
                    let kind = match token.kind {
                        TokenKind::Short => NodeKind::OptionShort,
                        _ => NodeKind::OptionLong,
                    };
                    self.ast.add_child(self.current, kind, Some(token));
                    names += 1;
                }
                TokenKind::Argument => self.attach_argument(token)?,
                TokenKind::Punct if token.value == "," => {
                    if names == 0 {
                        return Err(ParseError::EmptyAlternative { span: token.span });
                    }
                }
                TokenKind::Punct if token.value == "=" => self.apply_assignment(&token)?,
                TokenKind::Punct => {
                    return Err(ParseError::UnmatchedPunct {
                        value: token.value,
                        span: token.span,
                    });
                }
                TokenKind::LongBlank if names > 0 => {
                    return self.parse_option_description(line);
                }
                TokenKind::Newline | TokenKind::Eof if names == 0 => {
                    return Err(ParseError::EmptyOption { span: token.span });
                }
                TokenKind::Newline => {
                    if self.second_newline()? {
                        return Ok(Exit::TwoNewlines);
                    }
                    return Ok(Exit::Continue);
                }
                TokenKind::Eof => return Ok(Exit::EndOfInput),
                found => {
                    return Err(ParseError::UnexpectedToken {
                        context: "option line",
                        found,
                        value: token.value,
                        span: token.span,
                    });
                }
            }
        }
    }

    /// Collects description text, possibly over several lines.
    fn parse_option_description(&mut self, line: NodeId) -> Step<Exit> {
        let description = self.ast.add_child(line, NodeKind::OptionDescription, None);

        loop {
            let token = self.advance()?;
            match token.kind {
                TokenKind::Eof => return Ok(Exit::EndOfInput),
                TokenKind::Section => return Ok(Exit::SectionHeading),
                TokenKind::Newline => {
                    if self.second_newline()? {
                        return Ok(Exit::TwoNewlines);
                    }
                }
                TokenKind::LongBlank => {
                    let line_head = self.lookback_is(1, TokenKind::Newline);
                    if line_head && matches!(self.peek_kind()?, TokenKind::Short | TokenKind::Long) {
                        // Leave the indentation for the next option line.
                        self.cursor.reject_current()?;
                        return Ok(Exit::Continue);
                    }
                }
                TokenKind::Default => {
                    debug!(marker = %token.value, "option default");
                    self.ast.add_child(description, NodeKind::OptionDefault, Some(token));
                }
                _ => {
                    self.ast.add_child(description, NodeKind::DescriptionNode, Some(token));
                }
            }
        }
    }
}
