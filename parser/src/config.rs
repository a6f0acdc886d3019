//! Parser settings, loadable from YAML.
//!
//! # Example YAML
//!
//! ```yaml
//! max_errors: 5
//! stop_on_error: true
//! record_tokens: false
//! ```

use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default number of recoverable errors after which parsing stops.
pub const DEFAULT_MAX_ERRORS: usize = 10;

/// Errors reading or writing a [`ParserConfig`] file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Settings for one parse.
///
/// # Examples
///
/// ```
/// # use docopt_grammar_parser::ParserConfig;
/// let config: ParserConfig = serde_yaml::from_str("max_errors: 3").unwrap();
/// assert_eq!(config.max_errors, 3);
/// assert!(!config.stop_on_error);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Recoverable errors (lexical or syntactic) tolerated before the parse is
    /// halted. Values below 1 are treated as 1.
    pub max_errors: usize,
    /// Skip the remaining top-level steps after the first step that fails.
    pub stop_on_error: bool,
    /// Keep every consumed token in [`ParseOutcome::tokens`](crate::ParseOutcome::tokens).
    pub record_tokens: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_errors: DEFAULT_MAX_ERRORS,
            stop_on_error: false,
            record_tokens: false,
        }
    }
}

impl ParserConfig {
    /// Loads a configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if it is not a valid configuration.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config = serde_yaml::from_reader(reader)?;
        Ok(config)
    }

    /// Saves the configuration as YAML.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }
}
