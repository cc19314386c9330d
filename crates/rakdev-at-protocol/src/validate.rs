//! Validation helpers shared by every command.
//!
//! Each helper names the command (without the `AT+` prefix) and the field it
//! checks so the resulting [`CommandError`] reads as a complete diagnostic.

use crate::{CommandError, CommandResult};

/// Check that `value` lies in `min..=max`.
pub fn within_range(
    value: i64,
    command: &'static str,
    field: &'static str,
    min: i64,
    max: i64,
    hint: &'static str,
) -> CommandResult {
    if value < min || value > max {
        return Err(CommandError::OutOfRange {
            command,
            field,
            value,
            min,
            max,
            hint,
        });
    }
    Ok(())
}

/// Check that the length of `candidate` lies in `min..=max`.
pub fn length_within(
    candidate: &str,
    command: &'static str,
    field: &'static str,
    min: i64,
    max: i64,
    hint: &'static str,
) -> CommandResult {
    let length = i64::try_from(candidate.len()).unwrap_or(i64::MAX);
    within_range(length, command, field, min, max, hint)
}

/// Check that `candidate` is an even-length string of hexadecimal digits.
pub fn hexadecimal(candidate: &str, command: &'static str, field: &'static str) -> CommandResult {
    if candidate.len() % 2 != 0 {
        return Err(CommandError::OddLength {
            command,
            field,
            length: candidate.len(),
        });
    }
    if !candidate.bytes().all(|byte| byte.is_ascii_hexdigit()) {
        return Err(CommandError::NotHexadecimal { command, field });
    }
    Ok(())
}

/// Parse a `0`/`1` flag.
pub fn zero_or_one(candidate: &str, command: &'static str, field: &'static str) -> CommandResult<bool> {
    match candidate {
        "0" => Ok(false),
        "1" => Ok(true),
        other => Err(CommandError::NotBoolean {
            command,
            field,
            value: other.to_string(),
        }),
    }
}

/// Parse a signed integer field of a response.
pub fn integer(candidate: &str, command: &'static str, response: &str) -> CommandResult<i64> {
    candidate
        .trim()
        .parse::<i64>()
        .map_err(|_| CommandError::MalformedResponse {
            command,
            response: response.to_string(),
            reason: format!("'{}' is not an integer", candidate),
        })
}

/// Strip the echoed `AT+<command>=` prefix from a query response.
pub fn response_value<'a>(response: &'a str, command: &'static str) -> CommandResult<&'a str> {
    let expected = format!("AT+{}=", command);
    response
        .strip_prefix(expected.as_str())
        .ok_or_else(|| CommandError::UnexpectedResponse {
            command,
            response: response.to_string(),
            expected,
        })
}

/// Require a bare `OK`.
pub fn acknowledged(response: &str, command: &'static str) -> CommandResult {
    if response == crate::OK_INDICATOR {
        Ok(())
    } else {
        Err(CommandError::UnexpectedResponse {
            command,
            response: response.to_string(),
            expected: crate::OK_INDICATOR.to_string(),
        })
    }
}
