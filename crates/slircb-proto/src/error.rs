//! Error types for the wire protocol layer.

use thiserror::Error;

/// Convenience type alias for Results using [`ProtocolError`].
pub type Result<T, E = ProtocolError> = std::result::Result<T, E>;

/// Errors produced while framing, parsing, or writing IRC lines.
///
/// Parse failures are recoverable by contract: callers drop the offending
/// line and keep the connection alive.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProtocolError {
    /// I/O error during reading or writing.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Line was not valid UTF-8.
    #[error("invalid utf-8 in line: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    /// Line exceeded the maximum allowed length.
    #[error("message too long: {actual} bytes (limit: {limit})")]
    MessageTooLong {
        /// Actual line length.
        actual: usize,
        /// Maximum allowed length.
        limit: usize,
    },

    /// Line was empty after stripping whitespace.
    #[error("empty message")]
    EmptyMessage,

    /// Line had a prefix but no command after it.
    #[error("missing command in line {0:?}")]
    MissingCommand(String),

    /// Line started with `:` but had no body following the prefix.
    #[error("malformed prefix in line {0:?}")]
    MalformedPrefix(String),
}
