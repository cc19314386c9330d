//! `AT+CLASS`: device class with the class B beacon sub-status.

use super::{catalog, Command, TextCommand};
use crate::{ClassBStatus, CommandError, CommandResult, DeviceClass};

/// Query or set the LoRaWAN device class.
///
/// A class B query answers `B:S<n>` while the beacon is being acquired; the
/// digit is decoded into a [`ClassBStatus`].
#[derive(Debug, Clone)]
pub struct ClassCommand {
    inner: TextCommand,
    class: Option<DeviceClass>,
    beacon_status: Option<ClassBStatus>,
}

impl ClassCommand {
    pub fn query() -> Self {
        ClassCommand {
            inner: TextCommand::query(&catalog::CLASS),
            class: None,
            beacon_status: None,
        }
    }

    pub fn set(class: DeviceClass) -> Self {
        ClassCommand {
            inner: TextCommand::set(&catalog::CLASS, class.as_char().to_string()),
            class: Some(class),
            beacon_status: None,
        }
    }

    pub fn class(&self) -> Option<DeviceClass> {
        self.class
    }

    pub fn beacon_status(&self) -> Option<ClassBStatus> {
        self.beacon_status
    }
}

impl Command for ClassCommand {
    fn name(&self) -> &'static str {
        catalog::CLASS.name
    }

    fn build_request(&self) -> String {
        self.inner.build_request()
    }

    fn validate_request(&self) -> CommandResult {
        self.inner.validate_request()
    }

    fn parse_response(&mut self, response: &str) -> CommandResult {
        if !self.inner.is_query() {
            return self.inner.parse_response(response);
        }

        let raw = crate::validate::response_value(response, catalog::CLASS.name)?;
        let malformed = |reason: &str| CommandError::MalformedResponse {
            command: catalog::CLASS.name,
            response: response.to_string(),
            reason: reason.to_string(),
        };

        let mut chars = raw.chars();
        let class = chars
            .next()
            .and_then(DeviceClass::from_char)
            .ok_or_else(|| malformed("unknown class"))?;

        let rest = chars.as_str();
        let beacon_status = if rest.is_empty() {
            None
        } else {
            let digit = rest
                .strip_prefix(":S")
                .and_then(|status| status.chars().next())
                .and_then(|c| c.to_digit(10))
                .ok_or_else(|| malformed("unknown class B status"))?;
            Some(ClassBStatus::from_digit(digit).ok_or_else(|| malformed("unknown class B status"))?)
        };

        self.class = Some(class);
        self.beacon_status = beacon_status;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_class() {
        let mut cmd = ClassCommand::set(DeviceClass::C);
        assert_eq!(cmd.build_request(), "AT+CLASS=C");
        assert!(cmd.validate_request().is_ok());
        assert!(cmd.parse_response("OK").is_ok());
    }

    #[test]
    fn test_query_class_a() {
        let mut cmd = ClassCommand::query();
        assert_eq!(cmd.build_request(), "AT+CLASS=?");
        cmd.parse_response("AT+CLASS=A").unwrap();
        assert_eq!(cmd.class(), Some(DeviceClass::A));
        assert_eq!(cmd.beacon_status(), None);
    }

    #[test]
    fn test_query_class_b_status() {
        let mut cmd = ClassCommand::query();
        cmd.parse_response("AT+CLASS=B:S2").unwrap();
        assert_eq!(cmd.class(), Some(DeviceClass::B));
        assert_eq!(cmd.beacon_status(), Some(ClassBStatus::BeaconLocked));
    }

    #[test]
    fn test_query_class_malformed() {
        let mut cmd = ClassCommand::query();
        assert!(cmd.parse_response("AT+CLASS=X").is_err());
        assert!(cmd.parse_response("AT+CLASS=B:S9").is_err());
        assert!(cmd.parse_response("AT+CLASS=").is_err());
    }
}
