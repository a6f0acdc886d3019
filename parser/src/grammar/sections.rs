use docopt_grammar_core::{NodeId, NodeKind, TokenKind};
use tracing::debug;

use super::{DocoptParser, Step, heading_is};
use crate::error::ParseError;
use crate::lexer::{LexerState, Tokenizer};

impl<T: Tokenizer> DocoptParser<T> {
    /// Collects leading text up to the `Usage:` heading.
    pub(super) fn parse_prologue(&mut self) -> Step {
        self.cursor.change_state(LexerState::Prologue)?;
        let mut prologue: Option<NodeId> = None;

        loop {
            let token = self.advance()?;
            match token.kind {
                TokenKind::Usage => {
                    let section = self.ast.add_child(self.ast.root(), NodeKind::UsageSection, None);
                    self.ast.add_child(section, NodeKind::SectionName, Some(token));
                    self.usage_section = Some(section);
                    return Ok(());
                }
                TokenKind::Eof => return Err(ParseError::UsageNotFound),
                TokenKind::Newline => {}
                _ => {
                    let root = self.ast.root();
                    let node = *prologue
                        .get_or_insert_with(|| self.ast.add_child(root, NodeKind::Prologue, None));
                    self.ast.add_child(node, NodeKind::PrologueNode, Some(token));
                }
            }
        }
    }

    /// Collects text after the usage or options section.
    ///
    /// Starts from the current token (the one that ended the previous step)
    /// and returns with an `Options:` heading or EOF as the current token.
    /// Once the options section exists, another `Options:` heading is an
    /// error.
    pub(super) fn parse_free_section(&mut self) -> Step {
        self.cursor.change_state(LexerState::Free)?;
        let mut section: Option<NodeId> = None;
        let mut has_content = false;

        loop {
            let token = self.cursor.current().clone();
            match token.kind {
                TokenKind::Eof => return Ok(()),
                TokenKind::Section if heading_is(&token, "options:") => {
                    if self.options_section.is_none() {
                        return Ok(());
                    }
                    self.advance()?;
                    return Err(ParseError::DuplicateOptions { span: token.span });
                }
                TokenKind::Section if heading_is(&token, "usage:") => {
                    // Step past the heading so a later step does not report it again.
                    self.advance()?;
                    return Err(ParseError::DuplicateUsage { span: token.span });
                }
                TokenKind::Section => {
                    let node = match section {
                        Some(node) if !has_content => node,
                        _ => {
                            debug!(heading = %token.value, "opening free section");
                            self.open_free_section()
                        }
                    };
                    self.ast.add_child(node, NodeKind::SectionName, Some(token));
                    section = Some(node);
                    has_content = false;
                }
                TokenKind::Newline => {}
                _ => {
                    let node = match section {
                        Some(node) => node,
                        None => self.open_free_section(),
                    };
                    self.ast.add_child(node, NodeKind::SectionNode, Some(token));
                    section = Some(node);
                    has_content = true;
                }
            }
            self.advance()?;
        }
    }

    fn open_free_section(&mut self) -> NodeId {
        let root = self.ast.root();
        self.ast.add_child(root, NodeKind::FreeSection, None)
    }
}
