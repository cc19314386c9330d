//! Asynchronous operations.
//!
//! These requests are acknowledged with `OK` straight away; the module reports
//! the real outcome later with a `+EVT:` line. Each type can therefore be
//! built two ways: as a request to issue, and from the [`Event`] carrying the
//! outcome.

use super::{catalog, BooleanCommand, Command, IntegerCommand};
use crate::{validate, CommandResult, Event, LinkCheckMode, LinkStatus, Port};

// ============================================================================
// Join
// ============================================================================

const EVENT_JOINED: &str = "JOINED";
const EVENT_JOIN_FAILED: &str = "JOIN_FAILED";

/// Outcome of a join attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome {
    Joined,
    /// The reason suffix of `JOIN_FAILED_<reason>`, e.g. `RX_TIMEOUT`.
    Failed(String),
}

/// `AT+JOIN=<join>:<auto>:<reattempt delay>:<attempts>`
#[derive(Debug, Clone)]
pub struct JoinCommand {
    join: bool,
    auto_join: bool,
    reattempt_delay: i64,
    attempts: i64,
    outcome: Option<JoinOutcome>,
}

impl JoinCommand {
    /// Default seconds between join attempts.
    pub const DEFAULT_REATTEMPT_DELAY: i64 = 8;
    /// Default number of attempts (0 lets the module decide).
    pub const DEFAULT_ATTEMPTS: i64 = 0;

    /// Start joining the network.
    pub fn join(auto_join: bool, reattempt_delay: i64, attempts: i64) -> Self {
        JoinCommand {
            join: true,
            auto_join,
            reattempt_delay,
            attempts,
            outcome: None,
        }
    }

    /// Stop an ongoing join.
    pub fn stop() -> Self {
        JoinCommand {
            join: false,
            auto_join: false,
            reattempt_delay: Self::DEFAULT_REATTEMPT_DELAY,
            attempts: Self::DEFAULT_ATTEMPTS,
            outcome: None,
        }
    }

    /// Rebuild the outcome from a `JOINED` / `JOIN_FAILED_*` event.
    pub fn from_event(event: &Event) -> Option<Self> {
        let outcome = if event.kind() == EVENT_JOINED {
            JoinOutcome::Joined
        } else {
            let reason = event.kind().strip_prefix(EVENT_JOIN_FAILED)?;
            JoinOutcome::Failed(reason.trim_start_matches('_').to_string())
        };
        Some(JoinCommand {
            outcome: Some(outcome),
            ..JoinCommand::stop()
        })
    }

    pub fn outcome(&self) -> Option<&JoinOutcome> {
        self.outcome.as_ref()
    }

    pub fn is_joined(&self) -> bool {
        self.outcome == Some(JoinOutcome::Joined)
    }
}

impl Command for JoinCommand {
    fn name(&self) -> &'static str {
        catalog::JOIN
    }

    fn build_request(&self) -> String {
        format!(
            "AT+{}={}:{}:{}:{}",
            catalog::JOIN,
            u8::from(self.join),
            u8::from(self.auto_join),
            self.reattempt_delay,
            self.attempts
        )
    }

    fn validate_request(&self) -> CommandResult {
        let delay = &catalog::JOIN_REATTEMPT_DELAY;
        validate::within_range(
            self.reattempt_delay,
            catalog::JOIN,
            "reattempt delay",
            delay.min,
            delay.max,
            delay.hint,
        )?;
        let attempts = &catalog::JOIN_ATTEMPTS;
        validate::within_range(
            self.attempts,
            catalog::JOIN,
            "attempts",
            attempts.min,
            attempts.max,
            attempts.hint,
        )
    }

    fn parse_response(&mut self, response: &str) -> CommandResult {
        validate::acknowledged(response, catalog::JOIN)
    }

    fn is_asynchronous(&self) -> bool {
        true
    }
}

// ============================================================================
// Send
// ============================================================================

const EVENT_SEND_CONFIRMED_OK: &str = "SEND_CONFIRMED_OK";
const EVENT_SEND_CONFIRMED_FAILED: &str = "SEND_CONFIRMED_FAILED";

/// `AT+SEND=<port>:<hex payload>`
#[derive(Debug, Clone)]
pub struct SendCommand {
    port: Port,
    payload: String,
    confirmed: Option<bool>,
}

impl SendCommand {
    /// Send an already hex-encoded payload.
    pub fn new(port: Port, payload_hex: impl Into<String>) -> Self {
        SendCommand {
            port,
            payload: payload_hex.into(),
            confirmed: None,
        }
    }

    /// Send raw bytes, encoded as uppercase hexadecimal.
    pub fn from_bytes(port: Port, payload: &[u8]) -> Self {
        SendCommand::new(port, hex::encode_upper(payload))
    }

    /// Rebuild the confirmation outcome from a `SEND_CONFIRMED_*` event.
    ///
    /// Some firmware appends a status code, e.g. `SEND_CONFIRMED_FAILED(4)`.
    pub fn from_event(event: &Event) -> Option<Self> {
        let kind = event.kind();
        let kind = kind.split_once('(').map_or(kind, |(name, _)| name);
        let confirmed = match kind {
            EVENT_SEND_CONFIRMED_OK => true,
            EVENT_SEND_CONFIRMED_FAILED => false,
            _ => return None,
        };
        Some(SendCommand {
            port: 0,
            payload: String::new(),
            confirmed: Some(confirmed),
        })
    }

    pub fn port(&self) -> Port {
        self.port
    }

    pub fn payload_hex(&self) -> &str {
        &self.payload
    }

    /// `Some(true)` once the network acknowledged the uplink.
    pub fn confirmed(&self) -> Option<bool> {
        self.confirmed
    }
}

impl Command for SendCommand {
    fn name(&self) -> &'static str {
        catalog::SEND
    }

    fn build_request(&self) -> String {
        format!("AT+{}={}:{}", catalog::SEND, self.port, self.payload)
    }

    fn validate_request(&self) -> CommandResult {
        let port = &catalog::SEND_PORT;
        validate::within_range(
            i64::from(self.port),
            catalog::SEND,
            "port",
            port.min,
            port.max,
            port.hint,
        )?;
        validate::hexadecimal(&self.payload, catalog::SEND, "data")?;
        let payload = &catalog::SEND_PAYLOAD;
        validate::length_within(
            &self.payload,
            catalog::SEND,
            "data length",
            payload.min,
            payload.max,
            payload.hint,
        )
    }

    fn parse_response(&mut self, response: &str) -> CommandResult {
        validate::acknowledged(response, catalog::SEND)
    }

    fn is_asynchronous(&self) -> bool {
        true
    }
}

// ============================================================================
// Link check
// ============================================================================

/// `AT+LINKCHECK=<mode>`; answered by `+EVT:LINKCHECK:<code>:<margin>:<gateways>:<rssi>:<snr>`.
#[derive(Debug, Clone)]
pub struct LinkCheckCommand {
    inner: IntegerCommand,
    status: Option<LinkStatus>,
}

impl LinkCheckCommand {
    pub fn new(mode: LinkCheckMode) -> Self {
        LinkCheckCommand {
            inner: IntegerCommand::set(&catalog::LINK_CHECK, mode.code()),
            status: None,
        }
    }

    /// Rebuild the result from a `LINKCHECK` event.
    ///
    /// Anything other than five integers with a zero leading result code is a
    /// failed check.
    pub fn from_event(event: &Event) -> Self {
        LinkCheckCommand {
            inner: IntegerCommand::set(&catalog::LINK_CHECK, LinkCheckMode::Once.code()),
            status: parse_link_check(event.args()),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.status.is_some()
    }

    pub fn status(&self) -> Option<&LinkStatus> {
        self.status.as_ref()
    }
}

fn parse_link_check(args: &str) -> Option<LinkStatus> {
    let values = args
        .split(|c| c == ':' || c == ',')
        .map(|value| value.trim().parse::<i32>())
        .collect::<Result<Vec<_>, _>>()
        .ok()?;
    match values.as_slice() {
        [0, demod_margin, gateways, rssi, snr] => Some(LinkStatus {
            demod_margin: *demod_margin,
            gateways: *gateways,
            rssi: *rssi,
            snr: *snr,
        }),
        _ => None,
    }
}

impl Command for LinkCheckCommand {
    fn name(&self) -> &'static str {
        catalog::LINK_CHECK.name
    }

    fn build_request(&self) -> String {
        self.inner.build_request()
    }

    fn validate_request(&self) -> CommandResult {
        self.inner.validate_request()
    }

    fn parse_response(&mut self, response: &str) -> CommandResult {
        self.inner.parse_response(response)
    }

    fn is_asynchronous(&self) -> bool {
        true
    }
}

// ============================================================================
// Network time request
// ============================================================================

const EVENT_TIMEREQ_OK: &str = "TIMEREQ_OK";
const EVENT_TIMEREQ_FAILED: &str = "TIMEREQ_FAILED";

/// `AT+TIMEREQ=1`; the time can be read with `AT+LTIME` after `TIMEREQ_OK`.
#[derive(Debug, Clone)]
pub struct TimeRequestCommand {
    inner: BooleanCommand,
    succeeded: Option<bool>,
}

impl TimeRequestCommand {
    pub fn new() -> Self {
        TimeRequestCommand {
            inner: BooleanCommand::set(&catalog::TIME_REQUEST, true),
            succeeded: None,
        }
    }

    pub fn from_event(event: &Event) -> Option<Self> {
        let succeeded = match event.kind() {
            EVENT_TIMEREQ_OK => true,
            EVENT_TIMEREQ_FAILED => false,
            _ => return None,
        };
        Some(TimeRequestCommand {
            succeeded: Some(succeeded),
            ..TimeRequestCommand::new()
        })
    }

    pub fn succeeded(&self) -> Option<bool> {
        self.succeeded
    }
}

impl Default for TimeRequestCommand {
    fn default() -> Self {
        Self::new()
    }
}

impl Command for TimeRequestCommand {
    fn name(&self) -> &'static str {
        catalog::TIME_REQUEST.name
    }

    fn build_request(&self) -> String {
        self.inner.build_request()
    }

    fn parse_response(&mut self, response: &str) -> CommandResult {
        self.inner.parse_response(response)
    }

    fn is_asynchronous(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CommandError;

    #[test]
    fn test_join_request() {
        let mut join = JoinCommand::join(false, 10, 8);
        assert_eq!(join.build_request(), "AT+JOIN=1:0:10:8");
        assert!(join.validate_request().is_ok());
        assert!(join.is_asynchronous());
        assert!(join.parse_response("OK").is_ok());

        assert_eq!(JoinCommand::stop().build_request(), "AT+JOIN=0:0:8:0");
    }

    #[test]
    fn test_join_validation() {
        let err = JoinCommand::join(true, 6, 8).validate_request().unwrap_err();
        assert!(matches!(
            err,
            CommandError::OutOfRange { field: "reattempt delay", min: 7, max: 255, .. }
        ));
        assert!(JoinCommand::join(true, 7, 256).validate_request().is_err());
        assert!(JoinCommand::join(true, 255, 0).validate_request().is_ok());
    }

    #[test]
    fn test_join_from_event() {
        let joined = JoinCommand::from_event(&Event::new("JOINED", "")).unwrap();
        assert!(joined.is_joined());

        let failed = JoinCommand::from_event(&Event::new("JOIN_FAILED_RX_TIMEOUT", "")).unwrap();
        assert_eq!(
            failed.outcome(),
            Some(&JoinOutcome::Failed("RX_TIMEOUT".to_string()))
        );
        assert!(!failed.is_joined());

        assert!(JoinCommand::from_event(&Event::new("JOIN", "")).is_none());
    }

    #[test]
    fn test_send_request() {
        let mut send = SendCommand::from_bytes(2, b"{\"a\":1}");
        assert_eq!(send.build_request(), "AT+SEND=2:7B2261223A317D");
        assert!(send.validate_request().is_ok());
        assert!(send.is_asynchronous());
        assert!(send.parse_response("OK").is_ok());
        assert!(send.parse_response("AT_ERROR").is_err());
    }

    #[test]
    fn test_send_validation() {
        assert!(SendCommand::new(0, "AB").validate_request().is_err());
        assert!(SendCommand::new(234, "AB").validate_request().is_err());
        assert!(SendCommand::new(233, "AB").validate_request().is_ok());
        assert!(SendCommand::new(1, "").validate_request().is_err());
        assert!(matches!(
            SendCommand::new(1, "ABC").validate_request(),
            Err(CommandError::OddLength { .. })
        ));
        assert!(SendCommand::new(1, "A".repeat(2500)).validate_request().is_ok());
        assert!(SendCommand::new(1, "A".repeat(2502)).validate_request().is_err());
    }

    #[test]
    fn test_send_from_event() {
        let ok = SendCommand::from_event(&Event::new("SEND_CONFIRMED_OK", "")).unwrap();
        assert_eq!(ok.confirmed(), Some(true));
        let failed = SendCommand::from_event(&Event::new("SEND_CONFIRMED_FAILED", "")).unwrap();
        assert_eq!(failed.confirmed(), Some(false));
        let coded = SendCommand::from_event(&Event::new("SEND_CONFIRMED_FAILED(4)", "")).unwrap();
        assert_eq!(coded.confirmed(), Some(false));
        assert!(SendCommand::from_event(&Event::new("TX_DONE", "")).is_none());
    }

    #[test]
    fn test_link_check() {
        let cmd = LinkCheckCommand::new(LinkCheckMode::Once);
        assert_eq!(cmd.build_request(), "AT+LINKCHECK=1");
        assert!(cmd.is_asynchronous());

        let ok = LinkCheckCommand::from_event(&Event::new("LINKCHECK", "0:20:1:-62:9"));
        assert_eq!(
            ok.status(),
            Some(&LinkStatus { demod_margin: 20, gateways: 1, rssi: -62, snr: 9 })
        );

        let commas = LinkCheckCommand::from_event(&Event::new("LINKCHECK", "0,5,2,-100,-3"));
        assert!(commas.succeeded());

        let failed = LinkCheckCommand::from_event(&Event::new("LINKCHECK", "1:0:0:0:0"));
        assert!(!failed.succeeded());
        let short = LinkCheckCommand::from_event(&Event::new("LINKCHECK", "0:20:1"));
        assert!(!short.succeeded());
    }

    #[test]
    fn test_time_request() {
        let mut cmd = TimeRequestCommand::new();
        assert_eq!(cmd.build_request(), "AT+TIMEREQ=1");
        assert!(cmd.parse_response("OK").is_ok());
        assert!(cmd.is_asynchronous());

        let ok = TimeRequestCommand::from_event(&Event::new("TIMEREQ_OK", "")).unwrap();
        assert_eq!(ok.succeeded(), Some(true));
        let failed = TimeRequestCommand::from_event(&Event::new("TIMEREQ_FAILED", "")).unwrap();
        assert_eq!(failed.succeeded(), Some(false));
    }
}
