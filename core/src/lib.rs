//! Core types for the docopt usage-language syntax tree.
//!
//! This crate defines the data model shared by the tokenizer, the grammar
//! parsers, and any consumer of a parsed help text:
//!
//! - [`Token`], [`TokenKind`], [`Span`]: terminals produced by the stateful
//!   tokenizer.
//! - [`Ast`], [`NodeId`], [`NodeKind`], [`AstNode`]: the arena-backed tree
//!   covering the prologue, the usage section, the options section and any
//!   free sections of a help text.
//!
//! Validation ([`validate_ast`]) re-checks the structural invariants of a
//! finished tree: single root, consistent parent links, one program name.
//!
//! # Example
//!
//! ```
//! use docopt_grammar_core::*;
//!
//! let mut ast = Ast::new(NodeKind::Root);
//! let section = ast.add_child(ast.root(), NodeKind::UsageSection, None);
//! let line = ast.add_child(section, NodeKind::UsageLine, None);
//! let prog = Token::new(TokenKind::ProgName, "prog", "FirstProgramUsage", Span::new(9, 13));
//! ast.add_child(line, NodeKind::ProgName, Some(prog));
//!
//! assert_eq!(ast.prog_name(), Some("prog"));
//! assert!(validate_ast(&ast).is_empty());
//! ```

mod ast;
mod token;
mod validate;

pub use ast::{Ast, AstNode, NodeId, NodeKind, default_value};
pub use token::{Span, Token, TokenKind};
pub use validate::{AstValidationError, validate_ast};
