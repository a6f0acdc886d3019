//! Structural validation of a finished syntax tree.
//!
//! The parser maintains these invariants while it builds the tree; the
//! validator re-checks them on any [`Ast`] so downstream consumers (and tests)
//! can assert them without trusting the builder.
//!
//! # Examples
//!
//! ```
//! use docopt_grammar_core::*;
//!
//! let mut ast = Ast::new(NodeKind::Root);
//! let section = ast.add_child(ast.root(), NodeKind::UsageSection, None);
//! let line = ast.add_child(section, NodeKind::UsageLine, None);
//! assert!(!validate_ast(&ast).is_empty()); // usage line without ProgName
//!
//! let token = Token::new(TokenKind::ProgName, "prog", "FirstProgramUsage", Span::new(7, 11));
//! ast.add_child(line, NodeKind::ProgName, Some(token));
//! assert!(validate_ast(&ast).is_empty());
//! ```

use std::collections::HashSet;

use thiserror::Error;

use crate::ast::{Ast, NodeId, NodeKind};

/// Tree validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AstValidationError {
    /// The node at the root position is not a `Root`.
    #[error("root node has kind {0}, expected Root")]
    InvalidRoot(NodeKind),
    /// A child's parent index does not point back at the node listing it.
    #[error("node {child} is listed under {listed_under} but its parent is {recorded:?}")]
    ParentMismatch {
        child: NodeId,
        listed_under: NodeId,
        recorded: Option<NodeId>,
    },
    /// The same node appears in two child lists.
    #[error("node {0} has more than one parent")]
    MultipleParents(NodeId),
    /// The node cannot be reached from the root (detached or cyclic).
    #[error("node {0} is not reachable from the root")]
    Unreachable(NodeId),
    /// A usage line whose first child is not its program name.
    #[error("usage line {0} does not start with ProgName")]
    UsageLineWithoutProgName(NodeId),
    /// A program name differing from the first one in the document.
    #[error("program name `{found}` differs from `{expected}`")]
    ProgNameMismatch { expected: String, found: String },
    /// An ellipsis flag on a node outside usage expressions.
    #[error("node {node} of kind {kind} cannot repeat")]
    RepeatOnNonExpression { node: NodeId, kind: NodeKind },
    /// An argument node hanging under a node that cannot take `=ARGUMENT`.
    #[error("argument {node} is attached to {parent_kind}")]
    MisplacedArgument { node: NodeId, parent_kind: NodeKind },
}

/// Validates the invariants of a syntax tree.
///
/// Returns every violation found; an empty list means the tree is well formed.
pub fn validate_ast(ast: &Ast) -> Vec<AstValidationError> {
    let mut errors = Vec::new();

    let root = ast.root();
    if ast.kind(root) != NodeKind::Root {
        errors.push(AstValidationError::InvalidRoot(ast.kind(root)));
    }

    let mut seen = HashSet::new();
    seen.insert(root);
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        for &child in ast.children(id) {
            if ast.get(child).is_none() {
                continue;
            }
            if ast.parent(child) != Some(id) {
                errors.push(AstValidationError::ParentMismatch {
                    child,
                    listed_under: id,
                    recorded: ast.parent(child),
                });
            }
            if !seen.insert(child) {
                errors.push(AstValidationError::MultipleParents(child));
                continue;
            }
            stack.push(child);
        }
    }

    for id in ast.ids() {
        if !seen.contains(&id) {
            errors.push(AstValidationError::Unreachable(id));
        }
    }

    validate_usage_lines(ast, &mut errors);

    for id in ast.ids() {
        let node = ast.node(id);
        if node.repeat && !node.kind.is_usage_expression() {
            errors.push(AstValidationError::RepeatOnNonExpression { node: id, kind: node.kind });
        }
        if matches!(node.kind, NodeKind::UsageArgument | NodeKind::OptionArgument) {
            if let Some(parent) = node.parent {
                let parent_kind = ast.kind(parent);
                let allowed = match node.kind {
                    NodeKind::UsageArgument => {
                        parent_kind == NodeKind::UsageExpr || parent_kind.accepts_assignment()
                    }
                    _ => parent_kind.accepts_assignment(),
                };
                if !allowed {
                    errors.push(AstValidationError::MisplacedArgument { node: id, parent_kind });
                }
            }
        }
    }

    errors
}

fn validate_usage_lines(ast: &Ast, errors: &mut Vec<AstValidationError>) {
    let mut expected: Option<&str> = None;

    for line in ast.usage_lines() {
        let first = ast.children(line).first().copied();
        let Some(prog) = first.filter(|id| ast.kind(*id) == NodeKind::ProgName) else {
            errors.push(AstValidationError::UsageLineWithoutProgName(line));
            continue;
        };

        let found = ast.text(prog).unwrap_or_default();
        match expected {
            None => expected = Some(found),
            Some(name) if name != found => {
                errors.push(AstValidationError::ProgNameMismatch {
                    expected: name.to_string(),
                    found: found.to_string(),
                });
            }
            Some(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::{Span, Token, TokenKind};

    fn prog(value: &str) -> Option<Token> {
        Some(Token::new(TokenKind::ProgName, value, "UsageLine", Span::empty(0)))
    }

    #[test]
    fn test_well_formed_tree_has_no_errors() {
        let mut ast = Ast::new(NodeKind::Root);
        let section = ast.add_child(ast.root(), NodeKind::UsageSection, None);
        let line = ast.add_child(section, NodeKind::UsageLine, None);
        ast.add_child(line, NodeKind::ProgName, prog("naval_fate"));
        let expr = ast.add_child(line, NodeKind::UsageExpr, None);
        let long = ast.add_child(expr, NodeKind::UsageLongOption, None);
        ast.add_child(long, NodeKind::UsageArgument, None);
        let file = ast.add_child(expr, NodeKind::UsageArgument, None);
        ast.set_repeat(file);

        assert!(validate_ast(&ast).is_empty());
    }

    #[test]
    fn test_detects_prog_name_mismatch() {
        let mut ast = Ast::new(NodeKind::Root);
        let section = ast.add_child(ast.root(), NodeKind::UsageSection, None);
        for name in ["prog", "other"] {
            let line = ast.add_child(section, NodeKind::UsageLine, None);
            ast.add_child(line, NodeKind::ProgName, prog(name));
        }

        let errors = validate_ast(&ast);
        assert_eq!(
            errors,
            vec![AstValidationError::ProgNameMismatch {
                expected: "prog".to_string(),
                found: "other".to_string(),
            }]
        );
    }

    #[test]
    fn test_detects_repeat_outside_usage() {
        let mut ast = Ast::new(NodeKind::Root);
        let section = ast.add_child(ast.root(), NodeKind::OptionsSection, None);
        ast.set_repeat(section);

        let errors = validate_ast(&ast);
        assert!(matches!(
            errors.as_slice(),
            [AstValidationError::RepeatOnNonExpression {
                kind: NodeKind::OptionsSection,
                ..
            }]
        ));
    }

    #[test]
    fn test_detects_misplaced_option_argument() {
        let mut ast = Ast::new(NodeKind::Root);
        let line = ast.add_child(ast.root(), NodeKind::OptionLine, None);
        ast.add_child(line, NodeKind::OptionArgument, None);

        let errors = validate_ast(&ast);
        assert!(matches!(
            errors.as_slice(),
            [AstValidationError::MisplacedArgument {
                parent_kind: NodeKind::OptionLine,
                ..
            }]
        ));
    }
}
