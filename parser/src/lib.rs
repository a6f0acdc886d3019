//! Grammar-driven parsing of docopt help texts.
//!
//! A help text is split into tokens by a stateful tokenizer whose rules
//! depend on the section being read, and a recursive-descent parser turns
//! the token stream into an [`Ast`](docopt_grammar_core::Ast) covering the
//! prologue, the usage section, the options section and any free sections.
//!
//! # Main entry points
//!
//! - [`parse_docopt`] parses with the default [`ParserConfig`].
//! - [`parse_docopt_with_config`] takes an explicit configuration (error
//!   limit, early stop, token recording).
//! - [`DocoptParser`] runs over any [`Tokenizer`] implementation.
//!
//! # Example
//!
//! ```
//! use docopt_grammar_core::NodeKind;
//! use docopt_grammar_parser::parse_docopt;
//!
//! let help = "\
//! Naval Fate.
//!
//! Usage:
//!   naval_fate ship <name> move <x> <y> [--speed=<kn>]
//!   naval_fate -h | --help
//!
//! Options:
//!   -h, --help     Show this screen.
//!   --speed=<kn>   Speed in knots [default: 10].
//! ";
//!
//! let ast = parse_docopt(help).into_result().unwrap();
//! assert_eq!(ast.prog_name(), Some("naval_fate"));
//! assert_eq!(ast.usage_lines().len(), 2);
//!
//! let speed = ast.option_lines()[1];
//! assert_eq!(ast.option_names(speed), vec!["--speed"]);
//! assert_eq!(ast.option_default(speed), Some("10"));
//! assert!(ast.find_first(NodeKind::GroupAlternative).is_some());
//! ```

pub mod config;
pub mod cursor;
pub mod error;
mod grammar;
pub mod lexer;
pub mod output;

pub use config::{ConfigError, DEFAULT_MAX_ERRORS, ParserConfig};
pub use cursor::{HISTORY_DEPTH, TokenCursor};
pub use error::{
    ErrorCollector, ParseError, ParseErrorRecord, ParseFailure, ParseOutcome, ParseStep,
};
pub use grammar::DocoptParser;
pub use lexer::{LexError, LexerState, StateLexer, Tokenizer};
pub use output::{
    OutputFormat, format_outcome, render_errors, render_json, render_tokens, render_tree,
    render_yaml,
};

/// Parses a help text with the default configuration.
pub fn parse_docopt(source: &str) -> ParseOutcome {
    parse_docopt_with_config(source, &ParserConfig::default())
}

/// Parses a help text with an explicit configuration.
pub fn parse_docopt_with_config(source: &str, config: &ParserConfig) -> ParseOutcome {
    DocoptParser::new(StateLexer::new(source), config).parse()
}

/// Tokens in the order the parser consumed them, each lexed under the state
/// the grammar had selected at that point.
pub fn tokenize(source: &str) -> Vec<docopt_grammar_core::Token> {
    let config = ParserConfig {
        record_tokens: true,
        ..ParserConfig::default()
    };
    parse_docopt_with_config(source, &config).tokens
}
