//! Read-only queries.
//!
//! Each query is a marker type implementing [`QueryKind`]; [`Query`] handles
//! the request shape and prefix check and delegates decoding to the marker.

use std::marker::PhantomData;

use chrono::NaiveDateTime;
use tracing::debug;

use super::{catalog, Command};
use crate::{validate, ChannelRssi, CommandError, CommandResult, Port, MAX_CHANNEL};

/// Format of the `AT+LTIME` response, e.g. `04h36m00s on 11/27/2023`.
pub const LOCAL_TIME_FORMAT: &str = "%Hh%Mm%Ss on %m/%d/%Y";

/// Describes one read-only value and how to decode it.
pub trait QueryKind {
    /// Command name without the `AT+` prefix.
    const NAME: &'static str;
    type Output: std::fmt::Debug;

    /// Decode the text after `AT+<NAME>=`.
    fn decode(raw: &str, response: &str) -> CommandResult<Self::Output>;
}

/// An `AT+<NAME>=?` query.
#[derive(Debug)]
pub struct Query<K: QueryKind> {
    output: Option<K::Output>,
    response: String,
    kind: PhantomData<K>,
}

impl<K: QueryKind> Query<K> {
    pub fn new() -> Self {
        Query {
            output: None,
            response: String::new(),
            kind: PhantomData,
        }
    }

    /// The decoded value, once a response has parsed.
    pub fn output(&self) -> Option<&K::Output> {
        self.output.as_ref()
    }

    pub fn into_output(self) -> Option<K::Output> {
        self.output
    }

    /// Raw text of the last parsed response, after the prefix.
    pub fn response(&self) -> &str {
        &self.response
    }
}

impl<K: QueryKind> Default for Query<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: QueryKind> Command for Query<K> {
    fn name(&self) -> &'static str {
        K::NAME
    }

    fn build_request(&self) -> String {
        format!("AT+{}=?", K::NAME)
    }

    fn parse_response(&mut self, response: &str) -> CommandResult {
        let raw = validate::response_value(response, K::NAME)?;
        self.output = Some(K::decode(raw, response)?);
        self.response = raw.to_string();
        Ok(())
    }
}

fn malformed(command: &'static str, response: &str, reason: impl Into<String>) -> CommandError {
    CommandError::MalformedResponse {
        command,
        response: response.to_string(),
        reason: reason.into(),
    }
}

// ============================================================================
// Identity strings
// ============================================================================

macro_rules! text_query {
    ($(#[$doc:meta])* $marker:ident, $alias:ident, $name:expr) => {
        $(#[$doc])*
        #[derive(Debug)]
        pub struct $marker;

        impl QueryKind for $marker {
            const NAME: &'static str = $name;
            type Output = String;

            fn decode(raw: &str, _response: &str) -> CommandResult<String> {
                Ok(raw.to_string())
            }
        }

        pub type $alias = Query<$marker>;
    };
}

text_query!(
    /// Firmware version (`AT+VER`).
    Version, VersionQuery, catalog::VERSION
);
text_query!(
    /// Hardware model (`AT+HWMODEL`).
    HardwareModel, HardwareModelQuery, catalog::HARDWARE_MODEL
);
text_query!(
    /// Hardware identifier (`AT+HWID`).
    HardwareId, HardwareIdQuery, catalog::HARDWARE_ID
);
text_query!(
    /// Serial number (`AT+SN`).
    SerialNumber, SerialNumberQuery, catalog::SERIAL_NUMBER
);
text_query!(
    /// AT API version (`AT+APIVER`).
    ApiVersion, ApiVersionQuery, catalog::API_VERSION
);

// ============================================================================
// Network state
// ============================================================================

/// Network time (`AT+LTIME`), valid after a successful `AT+TIMEREQ`.
#[derive(Debug)]
pub struct LocalTime;

impl QueryKind for LocalTime {
    const NAME: &'static str = catalog::LOCAL_TIME;
    type Output = NaiveDateTime;

    fn decode(raw: &str, response: &str) -> CommandResult<NaiveDateTime> {
        parse_local_time(raw).ok_or_else(|| malformed(Self::NAME, response, "unrecognised time format"))
    }
}

pub type LocalTimeQuery = Query<LocalTime>;

/// Parse an `AT+LTIME` value such as `04h36m00s on 11/27/2023`.
pub fn parse_local_time(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw.trim(), LOCAL_TIME_FORMAT).ok()
}

/// Render a time as `yyyy-mm-ddThh:mm:ssZ`.
pub fn iso8601(time: &NaiveDateTime) -> String {
    time.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Whether the device has joined (`AT+NJS`).
#[derive(Debug)]
pub struct JoinStatus;

impl QueryKind for JoinStatus {
    const NAME: &'static str = catalog::JOIN_STATUS;
    type Output = bool;

    fn decode(raw: &str, _response: &str) -> CommandResult<bool> {
        validate::zero_or_one(raw, Self::NAME, "value")
    }
}

pub type JoinStatusQuery = Query<JoinStatus>;

/// Whether the last confirmed uplink was acknowledged (`AT+CFS`).
#[derive(Debug)]
pub struct SendStatus;

impl QueryKind for SendStatus {
    const NAME: &'static str = catalog::SEND_STATUS;
    type Output = bool;

    fn decode(raw: &str, _response: &str) -> CommandResult<bool> {
        validate::zero_or_one(raw, Self::NAME, "value")
    }
}

pub type SendStatusQuery = Query<SendStatus>;

/// RSSI of the last downlink (`AT+RSSI`).
#[derive(Debug)]
pub struct LastRssi;

impl QueryKind for LastRssi {
    const NAME: &'static str = catalog::RSSI;
    type Output = i32;

    fn decode(raw: &str, response: &str) -> CommandResult<i32> {
        raw.trim()
            .parse()
            .map_err(|_| malformed(Self::NAME, response, "value is not an integer"))
    }
}

pub type RssiQuery = Query<LastRssi>;

/// SNR of the last downlink (`AT+SNR`).
#[derive(Debug)]
pub struct LastSnr;

impl QueryKind for LastSnr {
    const NAME: &'static str = catalog::SNR;
    type Output = i32;

    fn decode(raw: &str, response: &str) -> CommandResult<i32> {
        raw.trim()
            .parse()
            .map_err(|_| malformed(Self::NAME, response, "value is not an integer"))
    }
}

pub type SnrQuery = Query<LastSnr>;

/// RX2 window frequency in Hz (`AT+RX2FQ`).
#[derive(Debug)]
pub struct Rx2Frequency;

impl QueryKind for Rx2Frequency {
    const NAME: &'static str = catalog::RX2_FREQUENCY;
    type Output = u64;

    fn decode(raw: &str, response: &str) -> CommandResult<u64> {
        raw.trim()
            .parse()
            .map_err(|_| malformed(Self::NAME, response, "frequency is not an integer"))
    }
}

pub type Rx2FrequencyQuery = Query<Rx2Frequency>;

/// Per-channel RSSI (`AT+ARSSI`).
#[derive(Debug)]
pub struct AllChannelRssi;

impl QueryKind for AllChannelRssi {
    const NAME: &'static str = catalog::ALL_CHANNEL_RSSI;
    type Output = Vec<ChannelRssi>;

    fn decode(raw: &str, _response: &str) -> CommandResult<Vec<ChannelRssi>> {
        Ok(parse_channel_rssi(raw))
    }
}

pub type ChannelRssiQuery = Query<AllChannelRssi>;

/// Parse `ch:rssi` pairs separated by commas.
///
/// Malformed entries and channels above [`MAX_CHANNEL`] are dropped.
pub fn parse_channel_rssi(raw: &str) -> Vec<ChannelRssi> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .filter_map(|entry| {
            let parsed = entry.split_once(':').and_then(|(channel, rssi)| {
                Some(ChannelRssi {
                    channel: channel.trim().parse().ok()?,
                    rssi: rssi.trim().parse().ok()?,
                })
            });
            match parsed {
                Some(reading) if reading.channel <= MAX_CHANNEL => Some(reading),
                _ => {
                    debug!("ARSSI: dropping entry '{}'", entry);
                    None
                }
            }
        })
        .collect()
}

// ============================================================================
// Downlink polling
// ============================================================================

/// Data held by the module from the last downlink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Downlink {
    pub port: Port,
    /// Hexadecimal payload as reported by the module.
    pub payload_hex: String,
}

/// Last received data (`AT+RECV`); `None` when nothing is pending.
#[derive(Debug)]
pub struct Receive;

impl QueryKind for Receive {
    const NAME: &'static str = catalog::RECEIVE;
    type Output = Option<Downlink>;

    fn decode(raw: &str, response: &str) -> CommandResult<Option<Downlink>> {
        if raw == "0" || raw.is_empty() {
            return Ok(None);
        }
        let (port, payload) = raw
            .split_once(':')
            .ok_or_else(|| malformed(Self::NAME, response, "expected <port>:<data>"))?;
        let port: Port = port
            .parse()
            .map_err(|_| malformed(Self::NAME, response, "port is not a number"))?;
        if port == 0 {
            return Ok(None);
        }
        validate::hexadecimal(payload, Self::NAME, "data")?;
        Ok(Some(Downlink {
            port,
            payload_hex: payload.to_string(),
        }))
    }
}

pub type ReceiveQuery = Query<Receive>;
