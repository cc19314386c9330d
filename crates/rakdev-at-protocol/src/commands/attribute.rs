//! Queryable / settable module attributes.

use super::Command;
use crate::{validate, CommandError, CommandResult};

/// Static description of an attribute: its name and legal range.
///
/// For integers the range bounds the value; for text and hex attributes it
/// bounds the length in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attribute {
    pub name: &'static str,
    pub min: i64,
    pub max: i64,
    /// Human readable list of legal values.
    pub hint: &'static str,
}

impl Attribute {
    pub const fn new(name: &'static str, min: i64, max: i64, hint: &'static str) -> Self {
        Attribute {
            name,
            min,
            max,
            hint,
        }
    }

    /// An on/off attribute.
    pub const fn flag(name: &'static str) -> Self {
        Attribute::new(name, 0, 1, "0 = off, 1 = on")
    }

    /// Check a numeric value against the range.
    pub fn check_value(&self, value: i64) -> CommandResult {
        validate::within_range(value, self.name, "value", self.min, self.max, self.hint)
    }

    /// Check a text length against the range.
    pub fn check_length(&self, text: &str) -> CommandResult {
        validate::length_within(text, self.name, "length", self.min, self.max, self.hint)
    }
}

/// A value type that can be carried by an attribute command.
pub trait AttributeValue: Sized + Default {
    /// Wire form used in a set request.
    fn encode(&self) -> String;

    /// Check the value before it is sent.
    fn validate(&self, attribute: &Attribute) -> CommandResult;

    /// Decode the value part of a query response.
    fn decode(raw: &str, attribute: &Attribute) -> CommandResult<Self>;
}

impl AttributeValue for bool {
    fn encode(&self) -> String {
        let flag = if *self { "1" } else { "0" };
        flag.to_string()
    }

    fn validate(&self, _attribute: &Attribute) -> CommandResult {
        Ok(())
    }

    fn decode(raw: &str, attribute: &Attribute) -> CommandResult<Self> {
        validate::zero_or_one(raw, attribute.name, "value")
    }
}

impl AttributeValue for i64 {
    fn encode(&self) -> String {
        self.to_string()
    }

    fn validate(&self, attribute: &Attribute) -> CommandResult {
        attribute.check_value(*self)
    }

    fn decode(raw: &str, attribute: &Attribute) -> CommandResult<Self> {
        let value = raw.parse::<i64>().map_err(|_| CommandError::MalformedResponse {
            command: attribute.name,
            response: raw.to_string(),
            reason: "value is not an integer".to_string(),
        })?;
        attribute.check_value(value)?;
        Ok(value)
    }
}

impl AttributeValue for String {
    fn encode(&self) -> String {
        self.clone()
    }

    fn validate(&self, attribute: &Attribute) -> CommandResult {
        attribute.check_length(self)
    }

    fn decode(raw: &str, attribute: &Attribute) -> CommandResult<Self> {
        attribute.check_length(raw)?;
        Ok(raw.to_string())
    }
}

/// A string of hexadecimal digit pairs, such as a EUI or key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct HexString(String);

impl HexString {
    pub fn new(value: impl Into<String>) -> Self {
        HexString(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for HexString {
    fn from(value: &str) -> Self {
        HexString::new(value)
    }
}

impl From<String> for HexString {
    fn from(value: String) -> Self {
        HexString(value)
    }
}

impl std::fmt::Display for HexString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AttributeValue for HexString {
    fn encode(&self) -> String {
        self.0.clone()
    }

    fn validate(&self, attribute: &Attribute) -> CommandResult {
        validate::hexadecimal(&self.0, attribute.name, "data")?;
        attribute.check_length(&self.0)
    }

    fn decode(raw: &str, attribute: &Attribute) -> CommandResult<Self> {
        let value = HexString::new(raw);
        value.validate(attribute)?;
        Ok(value)
    }
}

/// Query or set one attribute.
///
/// Set requests succeed on a bare `OK`; query responses must echo
/// `AT+<NAME>=` and the remainder is decoded and range-checked.
#[derive(Debug, Clone)]
pub struct AttributeCommand<V> {
    attribute: &'static Attribute,
    query: bool,
    value: V,
    response: String,
}

/// An on/off attribute command.
pub type BooleanCommand = AttributeCommand<bool>;
/// A numeric attribute command.
pub type IntegerCommand = AttributeCommand<i64>;
/// A free text attribute command.
pub type TextCommand = AttributeCommand<String>;
/// A hexadecimal attribute command.
pub type HexCommand = AttributeCommand<HexString>;

impl<V: AttributeValue> AttributeCommand<V> {
    /// Read the current value.
    pub fn query(attribute: &'static Attribute) -> Self {
        AttributeCommand {
            attribute,
            query: true,
            value: V::default(),
            response: String::new(),
        }
    }

    /// Write a new value.
    pub fn set(attribute: &'static Attribute, value: impl Into<V>) -> Self {
        AttributeCommand {
            attribute,
            query: false,
            value: value.into(),
            response: String::new(),
        }
    }

    pub fn attribute(&self) -> &'static Attribute {
        self.attribute
    }

    pub fn is_query(&self) -> bool {
        self.query
    }

    /// The value that was set, or the one decoded from a query response.
    pub fn value(&self) -> &V {
        &self.value
    }

    pub fn into_value(self) -> V {
        self.value
    }

    /// Raw text of the last parsed query response, after the prefix.
    pub fn response(&self) -> &str {
        &self.response
    }
}

impl<V: AttributeValue> Command for AttributeCommand<V> {
    fn name(&self) -> &'static str {
        self.attribute.name
    }

    fn build_request(&self) -> String {
        if self.query {
            format!("AT+{}=?", self.attribute.name)
        } else {
            format!("AT+{}={}", self.attribute.name, self.value.encode())
        }
    }

    fn validate_request(&self) -> CommandResult {
        if self.query {
            Ok(())
        } else {
            self.value.validate(self.attribute)
        }
    }

    fn parse_response(&mut self, response: &str) -> CommandResult {
        if !self.query {
            return validate::acknowledged(response, self.attribute.name);
        }
        let raw = validate::response_value(response, self.attribute.name)?;
        self.value = V::decode(raw, self.attribute)?;
        self.response = raw.to_string();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;

    #[test]
    fn test_integer_set() {
        let mut band = IntegerCommand::set(&catalog::BAND, 4);
        assert_eq!(band.build_request(), "AT+BAND=4");
        assert!(band.validate_request().is_ok());
        assert!(band.parse_response("OK").is_ok());
        assert!(band.parse_response("AT+BAND=4").is_err());
    }

    #[test]
    fn test_integer_out_of_range() {
        let band = IntegerCommand::set(&catalog::BAND, 13);
        let err = band.validate_request().unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().starts_with("BAND value has value '13' but must be between 0 and 12 [0 = EU433"));

        let txp = IntegerCommand::set(&catalog::TX_POWER, 8);
        assert!(txp.validate_request().is_err());
    }

    #[test]
    fn test_integer_query() {
        let mut dr = IntegerCommand::query(&catalog::DATA_RATE);
        assert_eq!(dr.build_request(), "AT+DR=?");
        dr.parse_response("AT+DR=3").unwrap();
        assert_eq!(*dr.value(), 3);
        assert_eq!(dr.response(), "3");

        assert!(matches!(
            dr.parse_response("AT+DR=9"),
            Err(CommandError::OutOfRange { value: 9, .. })
        ));
        assert!(matches!(
            dr.parse_response("AT+DR=x"),
            Err(CommandError::MalformedResponse { .. })
        ));
        assert!(matches!(
            dr.parse_response("AT+TXP=3"),
            Err(CommandError::UnexpectedResponse { .. })
        ));
    }

    #[test]
    fn test_boolean() {
        let adr = BooleanCommand::set(&catalog::ADAPTIVE_DATA_RATE, true);
        assert_eq!(adr.build_request(), "AT+ADR=1");
        let cfm = BooleanCommand::set(&catalog::CONFIRM_MODE, false);
        assert_eq!(cfm.build_request(), "AT+CFM=0");

        let mut query = BooleanCommand::query(&catalog::DUTY_CYCLE);
        query.parse_response("AT+DCS=1").unwrap();
        assert!(*query.value());
        assert!(matches!(
            query.parse_response("AT+DCS=2"),
            Err(CommandError::NotBoolean { .. })
        ));
    }

    #[test]
    fn test_hex_identifiers() {
        let eui = HexCommand::set(&catalog::DEV_EUI, "70B3D57ED0000001");
        assert_eq!(eui.build_request(), "AT+DEVEUI=70B3D57ED0000001");
        assert!(eui.validate_request().is_ok());

        let short = HexCommand::set(&catalog::DEV_EUI, "70B3D57E");
        assert!(matches!(
            short.validate_request(),
            Err(CommandError::OutOfRange { value: 8, min: 16, .. })
        ));

        let odd = HexCommand::set(&catalog::APP_KEY, "ABC");
        assert!(matches!(odd.validate_request(), Err(CommandError::OddLength { .. })));

        let bad = HexCommand::set(&catalog::DEV_ADDR, "2601XY2C");
        assert!(matches!(bad.validate_request(), Err(CommandError::NotHexadecimal { .. })));

        let mut addr = HexCommand::query(&catalog::DEV_ADDR);
        addr.parse_response("AT+DEVADDR=26011B2C").unwrap();
        assert_eq!(addr.value().as_str(), "26011B2C");
    }

    #[test]
    fn test_text_length() {
        let class = TextCommand::set(&catalog::CLASS, "AB");
        assert!(class.validate_request().is_err());
        let class = TextCommand::set(&catalog::CLASS, "C");
        assert!(class.validate_request().is_ok());
    }
}
