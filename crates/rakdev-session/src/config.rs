//! Session configuration.
//!
//! Values are checked by the command validators when bring-up applies them,
//! not when the configuration is loaded.

use std::path::Path;
use std::time::Duration;

use rakdev_at_protocol::{Band, DataRate, DeviceClass, JoinMode, Mode, TxPower};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Complete configuration applied by [`Session::setup`](crate::Session::setup).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub operation: OperationConfig,
    pub identifiers: IdentifierConfig,
    pub parameters: RadioParameters,
    pub intervals: IntervalConfig,
}

impl SessionConfig {
    /// Parse a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Read and parse a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }
}

/// Network mode, region, class and join method.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperationConfig {
    pub mode: Mode,
    pub band: Band,
    pub class: DeviceClass,
    pub join: JoinMode,
}

/// LoRaWAN identifiers as hexadecimal strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentifierConfig {
    pub dev_eui: String,
    pub app_eui: String,
    pub app_key: String,
    /// Only applied for ABP.
    pub dev_addr: Option<String>,
}

/// Radio and MAC parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadioParameters {
    /// Let the module rejoin on its own after reset.
    pub auto_join: bool,
    /// Request network acknowledgement of every uplink.
    pub confirm_mode: bool,
    pub duty_cycle: bool,
    pub adaptive_data_rate: bool,
    pub public_network: bool,
    pub data_rate: DataRate,
    pub tx_power: TxPower,
    pub rx1_delay_secs: i64,
    pub rx2_delay_secs: i64,
    pub rx2_data_rate: DataRate,
    pub join_reattempt_delay_secs: i64,
    pub join_attempts: i64,
}

impl Default for RadioParameters {
    fn default() -> Self {
        RadioParameters {
            auto_join: false,
            confirm_mode: true,
            duty_cycle: true,
            adaptive_data_rate: true,
            public_network: true,
            data_rate: DataRate::Sf12,
            tx_power: TxPower::HIGHEST,
            rx1_delay_secs: 5,
            rx2_delay_secs: 6,
            rx2_data_rate: DataRate::Sf12,
            join_reattempt_delay_secs: 10,
            join_attempts: 8,
        }
    }
}

/// Periods of the session's recurring work, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntervalConfig {
    /// Join status polling while pending, and retry backoff after a failure.
    pub rejoin_ms: u64,
    /// Signal quality and channel refresh while joined.
    pub status_ms: u64,
    pub link_check_ms: u64,
    /// Network time refresh while joined.
    pub network_time_ms: u64,
}

impl Default for IntervalConfig {
    fn default() -> Self {
        IntervalConfig {
            rejoin_ms: 4 * 60 * 1000,
            status_ms: 60 * 1000,
            link_check_ms: 2 * 60 * 1000,
            network_time_ms: 30 * 60 * 1000,
        }
    }
}

impl IntervalConfig {
    pub fn rejoin(&self) -> Duration {
        Duration::from_millis(self.rejoin_ms)
    }

    pub fn status(&self) -> Duration {
        Duration::from_millis(self.status_ms)
    }

    pub fn link_check(&self) -> Duration {
        Duration::from_millis(self.link_check_ms)
    }

    pub fn network_time(&self) -> Duration {
        Duration::from_millis(self.network_time_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.operation.mode, Mode::LoRaWan);
        assert_eq!(config.operation.band, Band::Eu868);
        assert_eq!(config.operation.class, DeviceClass::A);
        assert_eq!(config.operation.join, JoinMode::Otaa);
        assert!(config.parameters.confirm_mode);
        assert!(!config.parameters.auto_join);
        assert_eq!(config.parameters.rx1_delay_secs, 5);
        assert_eq!(config.parameters.join_attempts, 8);
        assert_eq!(config.intervals.rejoin(), Duration::from_secs(240));
        assert_eq!(config.intervals.network_time(), Duration::from_secs(1800));
    }

    #[test]
    fn test_from_yaml_partial() {
        let yaml = r#"
operation:
  band: US915
  class: C
identifiers:
  dev_eui: "70B3D57ED0000001"
  app_eui: "0000000000000000"
  app_key: "00112233445566778899AABBCCDDEEFF"
parameters:
  confirm_mode: false
  data_rate: SF7
  tx_power: 3
intervals:
  status_ms: 5000
"#;
        let config = SessionConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.operation.band, Band::Us915);
        assert_eq!(config.operation.class, DeviceClass::C);
        assert_eq!(config.operation.mode, Mode::LoRaWan);
        assert_eq!(config.identifiers.dev_eui, "70B3D57ED0000001");
        assert_eq!(config.identifiers.dev_addr, None);
        assert!(!config.parameters.confirm_mode);
        assert!(config.parameters.duty_cycle);
        assert_eq!(config.parameters.data_rate, DataRate::Sf7);
        assert_eq!(config.parameters.tx_power, TxPower(3));
        assert_eq!(config.intervals.status(), Duration::from_secs(5));
        assert_eq!(config.intervals.rejoin_ms, 240_000);
    }

    #[test]
    fn test_from_yaml_band_names() {
        let config = SessionConfig::from_yaml_str("operation:\n  band: AS923-2\n  join: ABP\n").unwrap();
        assert_eq!(config.operation.band, Band::As923_2);
        assert_eq!(config.operation.join, JoinMode::Abp);
    }

    #[test]
    fn test_from_yaml_invalid() {
        assert!(matches!(
            SessionConfig::from_yaml_str("operation:\n  band: MARS\n"),
            Err(ConfigError::Yaml(_))
        ));
    }

    #[test]
    fn test_from_missing_file() {
        assert!(matches!(
            SessionConfig::from_yaml_file("/nonexistent/rakdev.yaml"),
            Err(ConfigError::Io(_))
        ));
    }
}
