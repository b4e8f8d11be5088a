//! # Error Types
//!
//! Errors of the text command parser and the response formatter.
//!
//! The two never mix. Command errors are reported to the user as-is and no
//! request is produced. Formatting errors never leave the formatter: they are
//! rendered into the response text instead.

use mirage_core::MirrorError;
use thiserror::Error;

/// A malformed or incomplete text command
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError
{
    #[error("Unknown command \"{0}\"")]
    UnknownCommand(String),

    /// A required argument is absent (e.g. `print` without an expression)
    #[error("Missing {what} for '{command}'")]
    MissingArgument
    {
        command: &'static str,
        what: &'static str,
    },

    /// An argument that does not parse (non-numeric count, unknown step
    /// action, ...)
    #[error("Invalid {what} argument \"{value}\"")]
    InvalidArgument
    {
        what: &'static str,
        value: String,
    },

    #[error("Invalid range: start frame {from} cannot be larger than end frame {to}")]
    InvalidRange
    {
        from: u32,
        to: u32,
    },

    #[error("Too many arguments for '{0}'")]
    TooManyArguments(&'static str),
}

/// Convenience type alias for `Result<T, CommandError>`
pub type CommandResult<T> = std::result::Result<T, CommandError>;

/// Failure while rendering a protocol response or event
#[derive(Error, Debug)]
pub enum FormatError
{
    /// Response text is not valid JSON or does not match the expected shape
    #[error("{0}")]
    Json(#[from] serde_json::Error),

    #[error("response to '{0}' has no body")]
    MissingBody(String),

    /// The engine rejected a query while rendering (e.g. a stale break id)
    #[error("{0}")]
    Mirror(#[from] MirrorError),
}
