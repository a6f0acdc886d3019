//! Per-state rule tables.
//!
//! Every pattern is anchored at the lexer position and captures the token
//! text in group 1; anything after the group is a terminator that must be
//! present but is not consumed.

use std::sync::LazyLock;

use docopt_grammar_core::TokenKind;
use regex::Regex;

use super::LexerState;

/// Where a rule is allowed to match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Anchor {
    Anywhere,
    /// Column 0 of a physical line.
    LineStart,
    /// First word of a line that starts with indentation, no deeper than
    /// the column of the installed literal of the same kind.
    IndentedLineHead,
}

pub(super) enum Matcher {
    Pattern(Regex),
    /// Matches the literal installed at run time; inert until then.
    Literal,
}

pub(super) struct Rule {
    pub(super) kind: TokenKind,
    pub(super) matcher: Matcher,
    pub(super) anchor: Anchor,
    /// Consumed silently instead of producing a token.
    pub(super) skip: bool,
}

impl Rule {
    fn new(kind: TokenKind, pattern: &str) -> Self {
        Self {
            kind,
            // Patterns are compile-time constants; a failure is a programmer error.
            matcher: Matcher::Pattern(Regex::new(pattern).expect("static regex must compile")),
            anchor: Anchor::Anywhere,
            skip: false,
        }
    }

    fn literal(kind: TokenKind) -> Self {
        Self {
            kind,
            matcher: Matcher::Literal,
            anchor: Anchor::Anywhere,
            skip: false,
        }
    }

    fn at(mut self, anchor: Anchor) -> Self {
        self.anchor = anchor;
        self
    }

    fn skipped(mut self) -> Self {
        self.skip = true;
        self
    }
}

pub(super) static RULES: LazyLock<RuleSet> = LazyLock::new(RuleSet::new);

const NEWLINE: &str = r"^(\r?\n)";
const USAGE: &str = r"^((?i:usage:))";
const BLANKS: &str = r"^([ \t]+)";
const SINGLE_BLANK: &str = r"^([ \t])";
const LONG_BLANK: &str = r"^([ \t]*\t[ \t]*|[ \t]{2,})";
const WORD: &str = r"^(\S+)";
const SECTION: &str = r"^([A-Za-z][A-Za-z0-9 _-]*:)(?:\s|$)";

const USAGE_PUNCT: &str = r"^(\.\.\.|[\[\]()|=])";
const USAGE_LINE_HEAD: &str = r"^([^\s\[\]()|<>=\-][^\s\[\]()|]*)";
const USAGE_LONG: &str = r"^(--[A-Za-z0-9?][\w?-]*)(?:[\s\[\]()|=.]|$)";
const USAGE_SHORT: &str = r"^(-[A-Za-z0-9?]+)(?:[\s\[\]()|=.]|$)";
const USAGE_ARGUMENT: &str = r"^(<[^<>\s]+>|[A-Z][A-Z0-9_-]*)(?:[\s\[\]()|=.]|$)";
const USAGE_IDENT: &str = r"^([^\s\[\]()|=.]+(?:\.[^\s\[\]()|=.]+)*)";

const OPTIONS_DEFAULT: &str = r"^(\[(?i:default):[^\]\n]*\])";
const OPTIONS_LONG: &str = r"^(--[A-Za-z0-9?][\w?-]*)(?:[\s,=]|$)";
const OPTIONS_SHORT: &str = r"^(-[A-Za-z0-9?])(?:[\s,=]|$)";
const OPTIONS_ARGUMENT: &str = r"^(<[^<>\s]+>|[A-Z][A-Z0-9_-]*)(?:[\s,=]|$)";
const OPTIONS_PUNCT: &str = r"^([,=])";

pub(super) struct RuleSet {
    prologue: Vec<Rule>,
    first_program_usage: Vec<Rule>,
    usage_line: Vec<Rule>,
    free: Vec<Rule>,
    options: Vec<Rule>,
}

impl RuleSet {
    fn new() -> Self {
        use TokenKind::*;

        Self {
            prologue: vec![
                Rule::new(Newline, NEWLINE),
                Rule::new(Usage, USAGE),
                Rule::new(Blank, BLANKS).skipped(),
                Rule::new(Word, WORD),
            ],
            first_program_usage: vec![
                Rule::new(Newline, NEWLINE),
                Rule::new(Blank, BLANKS),
                Rule::new(ProgName, WORD),
            ],
            usage_line: vec![
                Rule::new(Newline, NEWLINE),
                Rule::new(LongBlank, BLANKS).at(Anchor::LineStart),
                Rule::new(LongBlank, LONG_BLANK),
                Rule::new(Blank, SINGLE_BLANK).skipped(),
                Rule::new(Usage, USAGE),
                Rule::literal(ProgName),
                Rule::new(Punct, USAGE_PUNCT),
                Rule::new(ProgName, USAGE_LINE_HEAD).at(Anchor::IndentedLineHead),
                Rule::new(Long, USAGE_LONG),
                Rule::new(Short, USAGE_SHORT),
                Rule::new(Argument, USAGE_ARGUMENT),
                Rule::new(Ident, USAGE_IDENT),
            ],
            free: vec![
                Rule::new(Newline, NEWLINE),
                Rule::new(Section, SECTION).at(Anchor::LineStart),
                Rule::new(Blank, BLANKS).skipped(),
                Rule::new(Word, WORD),
            ],
            options: vec![
                Rule::new(Newline, NEWLINE),
                Rule::new(Section, SECTION).at(Anchor::LineStart),
                Rule::new(LongBlank, BLANKS).at(Anchor::LineStart),
                Rule::new(LongBlank, LONG_BLANK),
                Rule::new(Blank, SINGLE_BLANK).skipped(),
                Rule::new(Default, OPTIONS_DEFAULT),
                Rule::new(Long, OPTIONS_LONG),
                Rule::new(Short, OPTIONS_SHORT),
                Rule::new(Argument, OPTIONS_ARGUMENT),
                Rule::new(Punct, OPTIONS_PUNCT),
                Rule::new(Word, WORD),
            ],
        }
    }

    pub(super) fn for_state(&self, state: LexerState) -> &[Rule] {
        match state {
            LexerState::Prologue => &self.prologue,
            LexerState::FirstProgramUsage => &self.first_program_usage,
            LexerState::UsageLine => &self.usage_line,
            LexerState::Free => &self.free,
            LexerState::Options => &self.options,
        }
    }
}

/// Builds the matcher installed for a [`Matcher::Literal`] rule.
pub(super) fn literal_pattern(literal: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!(r"^({})(?:[\s\[\]()|]|$)", regex::escape(literal)))
}
