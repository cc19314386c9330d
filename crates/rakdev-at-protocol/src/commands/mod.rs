//! AT command definitions.
//!
//! Every request the driver can make implements [`Command`]. The generic
//! families cover most of the catalogue; the few commands with structured
//! responses or asynchronous outcomes have their own types.

mod attribute;
pub mod catalog;
mod class;
mod operations;
mod query;

pub use attribute::*;
pub use class::*;
pub use operations::*;
pub use query::*;

use crate::{validate, CommandResult};

/// Capability shared by every AT command.
///
/// A command is built, validated, sent as [`build_request`](Command::build_request)
/// and then handed each candidate response line until one parses.
pub trait Command {
    /// Command name without the `AT+` prefix, e.g. `BAND`.
    fn name(&self) -> &'static str;

    /// The request line, without terminator.
    fn build_request(&self) -> String;

    /// Check request parameters before anything is sent.
    fn validate_request(&self) -> CommandResult {
        Ok(())
    }

    /// Parse a response line, storing any decoded value.
    fn parse_response(&mut self, response: &str) -> CommandResult;

    /// Whether the real outcome arrives later as an unsolicited event.
    fn is_asynchronous(&self) -> bool {
        false
    }
}

/// A parameterless action acknowledged with `OK`, such as `AT+SLEEP`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    name: &'static str,
}

impl Action {
    pub const fn new(name: &'static str) -> Self {
        Action { name }
    }

    /// `AT+SLEEP`
    pub const fn sleep() -> Self {
        Action::new(catalog::SLEEP)
    }

    /// `AT+RESET`
    pub const fn reset() -> Self {
        Action::new(catalog::RESET)
    }
}

impl Command for Action {
    fn name(&self) -> &'static str {
        self.name
    }

    fn build_request(&self) -> String {
        format!("AT+{}", self.name)
    }

    fn parse_response(&mut self, response: &str) -> CommandResult {
        validate::acknowledged(response, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action() {
        let mut sleep = Action::sleep();
        assert_eq!(sleep.build_request(), "AT+SLEEP");
        assert!(sleep.validate_request().is_ok());
        assert!(!sleep.is_asynchronous());
        assert!(sleep.parse_response("OK").is_ok());
        assert!(sleep.parse_response("AT_ERROR").is_err());

        assert_eq!(Action::reset().build_request(), "AT+RESET");
    }
}
