//! Rendering of parse results.

use docopt_grammar_core::{Ast, NodeId, Token};
use serde::Serialize;

use crate::error::{ParseErrorRecord, ParseOutcome, ParseStep};

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum OutputFormat {
    /// Indented outline, one node per line.
    Tree,
    Json,
    Yaml,
}

#[derive(Serialize)]
struct ErrorView {
    step: ParseStep,
    message: String,
}

#[derive(Serialize)]
struct OutcomeView<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    prog_name: Option<&'a str>,
    ast: &'a Ast,
    errors: Vec<ErrorView>,
    stopped: bool,
}

fn error_views(errors: &[ParseErrorRecord]) -> Vec<ErrorView> {
    errors
        .iter()
        .map(|record| ErrorView {
            step: record.step,
            message: record.error.to_string(),
        })
        .collect()
}

/// Formats a parse outcome in the requested output format.
///
/// `Tree` renders only the syntax tree; the structured formats also carry the
/// program name, the recorded errors and the stop flag.
pub fn format_outcome(outcome: &ParseOutcome, format: OutputFormat) -> Result<String, String> {
    let view = OutcomeView {
        prog_name: outcome.ast.prog_name(),
        ast: &outcome.ast,
        errors: error_views(&outcome.errors),
        stopped: outcome.stopped,
    };
    match format {
        OutputFormat::Tree => Ok(render_tree(&outcome.ast)),
        OutputFormat::Json => serde_json::to_string_pretty(&view)
            .map_err(|e| format!("JSON serialization failed: {e}")),
        OutputFormat::Yaml => {
            serde_yaml::to_string(&view).map_err(|e| format!("YAML serialization failed: {e}"))
        }
    }
}

pub fn render_json(ast: &Ast) -> Result<String, String> {
    serde_json::to_string_pretty(ast).map_err(|e| format!("JSON serialization failed: {e}"))
}

pub fn render_yaml(ast: &Ast) -> Result<String, String> {
    serde_yaml::to_string(ast).map_err(|e| format!("YAML serialization failed: {e}"))
}

/// Indented outline of the tree: `Kind "text"`, with ` ...` on repeated nodes.
///
/// ```
/// use docopt_grammar_parser::{parse_docopt, render_tree};
///
/// let outcome = parse_docopt("Usage: prog FILE...\n");
/// let tree = render_tree(&outcome.ast);
/// assert!(tree.contains("UsageArgument \"FILE\" ..."));
/// ```
pub fn render_tree(ast: &Ast) -> String {
    let mut out = String::new();
    write_node(ast, ast.root(), 0, &mut out);
    out
}

fn write_node(ast: &Ast, id: NodeId, depth: usize, out: &mut String) {
    let node = ast.node(id);
    out.push_str(&"  ".repeat(depth));
    out.push_str(&node.kind.to_string());
    if let Some(text) = node.text() {
        out.push_str(&format!(" {text:?}"));
    }
    if node.repeat {
        out.push_str(" ...");
    }
    out.push('\n');
    for child in &node.children {
        write_node(ast, *child, depth + 1, out);
    }
}

/// One `KIND:"literal"` line per token.
pub fn render_tokens(tokens: &[Token]) -> String {
    let mut out = String::new();
    for token in tokens {
        out.push_str(&format!("{}:{:?}\n", token.kind, token.value));
    }
    out
}

/// One `step: message` line per recorded error.
pub fn render_errors(errors: &[ParseErrorRecord]) -> String {
    let mut out = String::new();
    for record in errors {
        out.push_str(&format!("{record}\n"));
    }
    out
}
