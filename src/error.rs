//! Error types for the framework core.

use thiserror::Error;

/// Configuration errors. Fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required option was absent or empty.
    #[error("missing required option: {0}")]
    MissingOption(&'static str),

    /// The config file could not be read.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// The config file could not be parsed.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Errors building a handler unit's match table.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A pattern failed to compile to a regular expression.
    #[error("invalid pattern {pattern:?}: {source}")]
    Pattern {
        /// The offending pattern text.
        pattern: String,
        /// The underlying regex error.
        #[source]
        source: regex::Error,
    },

    /// A `:name(regex)` placeholder was missing its closing parenthesis.
    #[error("unterminated placeholder in pattern {0:?}")]
    UnterminatedPlaceholder(String),

    /// A unit declared two groups for the same command.
    #[error("unit {unit:?} declares command group {command:?} twice")]
    DuplicateGroup {
        /// Unit name.
        unit: String,
        /// The command declared twice.
        command: String,
    },
}

/// An outbound send failed because the connection manager is gone.
#[derive(Debug, Error)]
#[error("connection closed")]
pub struct SendError;
