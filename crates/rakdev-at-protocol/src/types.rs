//! Protocol value types and limits.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Highest channel number reported by `AT+ARSSI`.
pub const MAX_CHANNEL: u8 = 16;
/// Lowest application port accepted by `AT+SEND`.
pub const MIN_PORT: u8 = 1;
/// Highest application port accepted by `AT+SEND`.
pub const MAX_PORT: u8 = 233;
/// Longest hexadecimal payload accepted by `AT+SEND`, in characters.
pub const MAX_PAYLOAD_HEX: usize = 2500;

/// LoRa frequency port.
pub type Port = u8;

/// Network work mode (`AT+NWM`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Mode {
    #[serde(rename = "P2P_LORA")]
    P2pLora,
    #[default]
    #[serde(rename = "LORAWAN")]
    LoRaWan,
    #[serde(rename = "P2P_FSK")]
    P2pFsk,
}

impl Mode {
    /// Numeric code used on the wire.
    pub fn code(self) -> i64 {
        match self {
            Mode::P2pLora => 0,
            Mode::LoRaWan => 1,
            Mode::P2pFsk => 2,
        }
    }

    /// Decode a wire code.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Mode::P2pLora),
            1 => Some(Mode::LoRaWan),
            2 => Some(Mode::P2pFsk),
            _ => None,
        }
    }

    /// Decode the name printed in `Current Work Mode: <name>.` banners.
    pub fn from_banner_name(name: &str) -> Option<Self> {
        match name {
            "LoRaWAN" => Some(Mode::LoRaWan),
            "P2PLoRa" => Some(Mode::P2pLora),
            "P2PFSK" => Some(Mode::P2pFsk),
            _ => None,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Mode::P2pLora => "P2P_LORA",
            Mode::LoRaWan => "LORAWAN",
            Mode::P2pFsk => "P2P_FSK",
        };
        f.write_str(name)
    }
}

/// Regional frequency plan (`AT+BAND`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Band {
    Eu433,
    Cn470,
    Ru864,
    In865,
    #[default]
    Eu868,
    Us915,
    Au915,
    Kr920,
    #[serde(rename = "AS923-1")]
    As923_1,
    #[serde(rename = "AS923-2")]
    As923_2,
    #[serde(rename = "AS923-3")]
    As923_3,
    #[serde(rename = "AS923-4")]
    As923_4,
    La915,
}

impl Band {
    /// All bands in wire-code order.
    pub const ALL: [Band; 13] = [
        Band::Eu433,
        Band::Cn470,
        Band::Ru864,
        Band::In865,
        Band::Eu868,
        Band::Us915,
        Band::Au915,
        Band::Kr920,
        Band::As923_1,
        Band::As923_2,
        Band::As923_3,
        Band::As923_4,
        Band::La915,
    ];

    /// Numeric code used on the wire.
    pub fn code(self) -> i64 {
        Band::ALL
            .iter()
            .position(|band| *band == self)
            .map_or(0, |index| index as i64)
    }

    /// Decode a wire code.
    pub fn from_code(code: i64) -> Option<Self> {
        usize::try_from(code)
            .ok()
            .and_then(|index| Band::ALL.get(index).copied())
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Band::Eu433 => "EU433",
            Band::Cn470 => "CN470",
            Band::Ru864 => "RU864",
            Band::In865 => "IN865",
            Band::Eu868 => "EU868",
            Band::Us915 => "US915",
            Band::Au915 => "AU915",
            Band::Kr920 => "KR920",
            Band::As923_1 => "AS923-1",
            Band::As923_2 => "AS923-2",
            Band::As923_3 => "AS923-3",
            Band::As923_4 => "AS923-4",
            Band::La915 => "LA915",
        };
        f.write_str(name)
    }
}

/// LoRaWAN device class (`AT+CLASS`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DeviceClass {
    #[default]
    A,
    B,
    C,
}

impl DeviceClass {
    /// Single-letter wire form.
    pub fn as_char(self) -> char {
        match self {
            DeviceClass::A => 'A',
            DeviceClass::B => 'B',
            DeviceClass::C => 'C',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'A' => Some(DeviceClass::A),
            'B' => Some(DeviceClass::B),
            'C' => Some(DeviceClass::C),
            _ => None,
        }
    }
}

impl fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Class B beacon acquisition status, reported as `B:S<n>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassBStatus {
    DeviceTimeRequest,
    BeaconSearching,
    BeaconLocked,
    BeaconFailed,
}

impl ClassBStatus {
    pub fn from_digit(digit: u32) -> Option<Self> {
        match digit {
            0 => Some(ClassBStatus::DeviceTimeRequest),
            1 => Some(ClassBStatus::BeaconSearching),
            2 => Some(ClassBStatus::BeaconLocked),
            3 => Some(ClassBStatus::BeaconFailed),
            _ => None,
        }
    }
}

/// Network join method (`AT+NJM`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JoinMode {
    Abp,
    #[default]
    Otaa,
}

impl JoinMode {
    pub fn code(self) -> i64 {
        match self {
            JoinMode::Abp => 0,
            JoinMode::Otaa => 1,
        }
    }
}

impl fmt::Display for JoinMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinMode::Abp => f.write_str("ABP"),
            JoinMode::Otaa => f.write_str("OTAA"),
        }
    }
}

/// Data rate index (`AT+DR`, `AT+RX2DR`), named by the EU868 spreading factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DataRate {
    #[default]
    Sf12,
    Sf11,
    Sf10,
    Sf9,
    Sf8,
    Sf7,
}

impl DataRate {
    pub fn code(self) -> i64 {
        match self {
            DataRate::Sf12 => 0,
            DataRate::Sf11 => 1,
            DataRate::Sf10 => 2,
            DataRate::Sf9 => 3,
            DataRate::Sf8 => 4,
            DataRate::Sf7 => 5,
        }
    }
}

/// Transmit power index (`AT+TXP`); 0 is the highest power, 7 the lowest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxPower(pub u8);

impl TxPower {
    pub const HIGHEST: TxPower = TxPower(0);
    pub const LOWEST: TxPower = TxPower(7);

    pub fn code(self) -> i64 {
        i64::from(self.0)
    }
}

/// Link check request mode (`AT+LINKCHECK`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkCheckMode {
    Disabled,
    Once,
    Everytime,
}

impl LinkCheckMode {
    pub fn code(self) -> i64 {
        match self {
            LinkCheckMode::Disabled => 0,
            LinkCheckMode::Once => 1,
            LinkCheckMode::Everytime => 2,
        }
    }
}

/// Result of a successful link check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LinkStatus {
    /// Demodulation margin in dB.
    pub demod_margin: i32,
    /// Number of gateways that received the check.
    pub gateways: i32,
    pub rssi: i32,
    pub snr: i32,
}

impl fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "margin={}, gateways={}, rssi={}, snr={}",
            self.demod_margin, self.gateways, self.rssi, self.snr
        )
    }
}

/// Signal quality of the most recent downlink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReceiveStatus {
    pub rssi: i32,
    pub snr: i32,
}

impl fmt::Display for ReceiveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rssi={}, snr={}", self.rssi, self.snr)
    }
}

/// Per-channel RSSI reading from `AT+ARSSI`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelRssi {
    pub channel: u8,
    pub rssi: i32,
}

/// Render channel readings as `ch:rssi` pairs.
pub fn format_channels(channels: &[ChannelRssi]) -> String {
    channels
        .iter()
        .map(|reading| format!("{}:{}", reading.channel, reading.rssi))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_codes() {
        assert_eq!(Band::Eu433.code(), 0);
        assert_eq!(Band::Eu868.code(), 4);
        assert_eq!(Band::La915.code(), 12);
        assert_eq!(Band::from_code(8), Some(Band::As923_1));
        assert_eq!(Band::from_code(13), None);
        assert_eq!(Band::from_code(-1), None);
        assert_eq!(Band::As923_2.to_string(), "AS923-2");
    }

    #[test]
    fn test_mode_banner_names() {
        assert_eq!(Mode::from_banner_name("LoRaWAN"), Some(Mode::LoRaWan));
        assert_eq!(Mode::from_banner_name("P2PLoRa"), Some(Mode::P2pLora));
        assert_eq!(Mode::from_banner_name("P2PFSK"), Some(Mode::P2pFsk));
        assert_eq!(Mode::from_banner_name("lorawan"), None);
        assert_eq!(Mode::from_code(Mode::P2pFsk.code()), Some(Mode::P2pFsk));
    }

    #[test]
    fn test_class_chars() {
        for class in [DeviceClass::A, DeviceClass::B, DeviceClass::C] {
            assert_eq!(DeviceClass::from_char(class.as_char()), Some(class));
        }
        assert_eq!(DeviceClass::from_char('D'), None);
    }

    #[test]
    fn test_format_channels() {
        let channels = [
            ChannelRssi { channel: 0, rssi: -91 },
            ChannelRssi { channel: 3, rssi: -104 },
        ];
        assert_eq!(format_channels(&channels), "0:-91, 3:-104");
        assert_eq!(format_channels(&[]), "");
    }
}
