//! Error types for AT command exchanges.

use thiserror::Error;

/// Errors that can occur while validating, issuing or parsing an AT command.
///
/// The `Display` output is the diagnostic text reported to callers, so each
/// variant names the command and field it concerns.
#[derive(Debug, Error)]
pub enum CommandError {
    /// A numeric value (or a text length) is outside its legal range.
    #[error("{command} {field} has value '{value}' but must be between {min} and {max} [{hint}]")]
    OutOfRange {
        /// Command name without the `AT+` prefix.
        command: &'static str,
        /// Which part of the request or response was checked.
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
        /// Human readable list of legal values.
        hint: &'static str,
    },

    /// Hexadecimal data with an odd number of digits.
    #[error("{command} {field} has length '{length}' that is not even (for hexadecimal pairs)")]
    OddLength {
        command: &'static str,
        field: &'static str,
        length: usize,
    },

    /// Data that should be hexadecimal contains other characters.
    #[error("{command} {field} has non hexadecimal characters")]
    NotHexadecimal {
        command: &'static str,
        field: &'static str,
    },

    /// A boolean field that is neither `0` nor `1`.
    #[error("{command} {field} has value '{value}' but must be value 0 or 1")]
    NotBoolean {
        command: &'static str,
        field: &'static str,
        value: String,
    },

    /// The response line does not have the expected shape.
    #[error("{command} response '{response}' does not start with '{expected}'")]
    UnexpectedResponse {
        command: &'static str,
        response: String,
        expected: String,
    },

    /// The response had the right prefix but its value could not be parsed.
    #[error("{command} response '{response}' is malformed: {reason}")]
    MalformedResponse {
        command: &'static str,
        response: String,
        reason: String,
    },

    /// The module kept answering `AT_BUSY_ERROR`.
    #[error("{command} rejected, module busy after {attempts} attempts")]
    Busy { command: &'static str, attempts: u32 },

    /// No response line arrived before the transport timeout.
    #[error("{command} timed out waiting for a response")]
    Timeout { command: &'static str },

    /// The underlying transport failed.
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),
}

impl CommandError {
    /// Whether this error was raised before anything was sent to the module.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            CommandError::OutOfRange { .. }
                | CommandError::OddLength { .. }
                | CommandError::NotHexadecimal { .. }
                | CommandError::NotBoolean { .. }
        )
    }

    /// Whether the module rejected the request as busy.
    pub fn is_busy(&self) -> bool {
        matches!(self, CommandError::Busy { .. })
    }
}

/// Result type alias for command operations.
pub type CommandResult<T = ()> = Result<T, CommandError>;
