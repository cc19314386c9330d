//! The fixed catalogue of module commands and their legal ranges.

use super::Attribute;
use crate::MAX_PAYLOAD_HEX;

// ============================================================================
// Identity and system
// ============================================================================

pub const VERSION: &str = "VER";
pub const HARDWARE_MODEL: &str = "HWMODEL";
pub const HARDWARE_ID: &str = "HWID";
pub const SERIAL_NUMBER: &str = "SN";
pub const API_VERSION: &str = "APIVER";
pub const LOCAL_TIME: &str = "LTIME";
pub const SLEEP: &str = "SLEEP";
pub const RESET: &str = "RESET";

pub const LOW_POWER_MODE: Attribute = Attribute::flag("LPM");
pub const DEBUG: Attribute = Attribute::flag("DEBUG");

// ============================================================================
// Radio and network configuration
// ============================================================================

pub const NETWORK_MODE: Attribute =
    Attribute::new("NWM", 0, 2, "0 = P2P_LORA, 1 = LoRaWAN, 2 = P2P_FSK");
pub const JOIN_MODE: Attribute = Attribute::new("NJM", 0, 2, "0 = ABP, 1 = OTAA");
pub const BAND: Attribute = Attribute::new(
    "BAND",
    0,
    12,
    "0 = EU433, 1 = CN470, 2 = RU864, 3 = IN865, 4 = EU868, 5 = US915, 6 = AU915, \
     7 = KR920, 8 = AS923-1, 9 = AS923-2, 10 = AS923-3, 11 = AS923-4, 12 = LA915",
);
pub const CLASS: Attribute = Attribute::new("CLASS", 1, 1, "A, B or C");
pub const DATA_RATE: Attribute = Attribute::new(
    "DR",
    0,
    5,
    "EU868: 0 = SF12, 1 = SF11, 2 = SF10, 3 = SF9, 4 = SF8, 5 = SF7",
);
pub const TX_POWER: Attribute = Attribute::new("TXP", 0, 7, "0 = Highest, 7 = Lowest");
pub const ADAPTIVE_DATA_RATE: Attribute = Attribute::flag("ADR");
pub const DUTY_CYCLE: Attribute = Attribute::flag("DCS");
pub const PUBLIC_NETWORK: Attribute = Attribute::flag("PNM");
pub const CONFIRM_MODE: Attribute = Attribute::flag("CFM");
pub const RETRIES: Attribute = Attribute::new("RETY", 0, 7, "0 to 7 retransmissions");

// ============================================================================
// Receive and join windows
// ============================================================================

pub const RX1_DELAY: Attribute = Attribute::new("RX1DL", 1, 15, "1 to 15 seconds");
pub const RX2_DELAY: Attribute = Attribute::new("RX2DL", 2, 15, "2 to 15 seconds");
pub const RX2_DATA_RATE: Attribute = Attribute::new(
    "RX2DR",
    0,
    5,
    "EU868: 0 = SF12, 1 = SF11, 2 = SF10, 3 = SF9, 4 = SF8, 5 = SF7",
);
pub const JOIN1_DELAY: Attribute = Attribute::new("JN1DL", 1, 14, "1 to 14 seconds");
pub const JOIN2_DELAY: Attribute = Attribute::new("JN2DL", 2, 15, "2 to 15 seconds");
pub const RX2_FREQUENCY: &str = "RX2FQ";

// ============================================================================
// Identifiers
// ============================================================================

pub const DEV_EUI: Attribute = Attribute::new("DEVEUI", 16, 16, "8 bytes as 16 hexadecimal digits");
pub const APP_EUI: Attribute = Attribute::new("APPEUI", 16, 16, "8 bytes as 16 hexadecimal digits");
pub const APP_KEY: Attribute = Attribute::new("APPKEY", 32, 32, "16 bytes as 32 hexadecimal digits");
pub const DEV_ADDR: Attribute = Attribute::new("DEVADDR", 8, 8, "4 bytes as 8 hexadecimal digits");

// ============================================================================
// Join, link and data
// ============================================================================

pub const JOIN: &str = "JOIN";
pub const JOIN_STATUS: &str = "NJS";
pub const JOIN_REATTEMPT_DELAY: Attribute =
    Attribute::new("JOIN", 7, 255, "7 to 255 seconds");
pub const JOIN_ATTEMPTS: Attribute = Attribute::new("JOIN", 0, 255, "0 to 255 attempts");
pub const LINK_CHECK: Attribute = Attribute::new(
    "LINKCHECK",
    0,
    2,
    "0 = disabled, 1 = once, 2 = everytime",
);
pub const TIME_REQUEST: Attribute = Attribute::flag("TIMEREQ");
pub const RSSI: &str = "RSSI";
pub const SNR: &str = "SNR";
pub const ALL_CHANNEL_RSSI: &str = "ARSSI";
pub const SEND_STATUS: &str = "CFS";
pub const RECEIVE: &str = "RECV";
pub const SEND: &str = "SEND";
pub const SEND_PORT: Attribute = Attribute::new("SEND", 1, 233, "1 to 233");
pub const SEND_PAYLOAD: Attribute = Attribute::new(
    "SEND",
    1,
    MAX_PAYLOAD_HEX as i64,
    "1 to 2500 hexadecimal characters",
);
