use log::info;
use std::env;
use std::num::NonZeroUsize;
use std::str::FromStr;
use std::time::Duration;

use crate::engine::{EngineConfig, DEFAULT_WINDOW_SIZE};
use crate::errors::ConfigError;

const DEFAULT_POLLING_INTERVAL_MS: u64 = 500;
const DEFAULT_SCAN_TIMEOUT_SECS: u64 = 20;

/// Sensor sets of the firmware launchers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    Cor,
    Bol,
    Tipop,
    NewTipop,
}

impl Preset {
    pub fn enable(self) -> &'static [&'static str] {
        match self {
            Preset::Cor => &["CorUI"],
            Preset::Bol => &["BolUI"],
            Preset::Tipop => &["TipopSwitch", "TipopPressure", "TipopJoystick"],
            Preset::NewTipop => &["NewTipopSwitch", "NewTipopPressure", "NewTipopJoystick"],
        }
    }
}

impl FromStr for Preset {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cor" => Ok(Preset::Cor),
            "bol" => Ok(Preset::Bol),
            "tipop" => Ok(Preset::Tipop),
            "newtipop" => Ok(Preset::NewTipop),
            other => Err(ConfigError::UnknownPreset(other.to_string())),
        }
    }
}

/// Transport timing used by the BLE collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportConfig {
    /// Period between reads of read-capable characteristics
    pub polling_interval: Duration,
    /// How long to look for the peripheral before giving up
    pub scan_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            polling_interval: Duration::from_millis(DEFAULT_POLLING_INTERVAL_MS),
            scan_timeout: Duration::from_secs(DEFAULT_SCAN_TIMEOUT_SECS),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SensorConfig {
    pub enable: Vec<String>,
    pub engine: EngineConfig,
    pub transport: TransportConfig,
}

impl SensorConfig {
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        // Load environment variables
        dotenv::dotenv().ok();

        let config = Self::from_lookup(|key| env::var(key).ok())?;

        info!("Enabled sensors: {}", config.enable.join(", "));
        info!(
            "Window size {}, mean {}, stddev {}, polling every {} ms",
            config.engine.window_size,
            config.engine.mean,
            config.engine.stddev,
            config.transport.polling_interval.as_millis()
        );

        Ok(config)
    }

    /// Build the configuration from a key lookup
    ///
    /// A preset provides an enable list and turns both statistics on;
    /// `NANO33_ENABLE`, `NANO33_MEAN` and `NANO33_STDDEV` override it.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let preset = get("NANO33_PRESET").map(|p| p.parse::<Preset>()).transpose()?;

        let enable: Vec<String> = match get("NANO33_ENABLE") {
            Some(list) => list
                .split(',')
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(str::to_string)
                .collect(),
            None => preset
                .map(|p| p.enable().iter().map(|id| id.to_string()).collect())
                .unwrap_or_default(),
        };

        if enable.is_empty() {
            return Err(ConfigError::NothingEnabled);
        }

        let stats_default = preset.is_some();
        let mean = parse_bool("NANO33_MEAN", get("NANO33_MEAN"))?.unwrap_or(stats_default);
        let stddev = parse_bool("NANO33_STDDEV", get("NANO33_STDDEV"))?.unwrap_or(stats_default);

        let window_size = match get("NANO33_WINDOW_SIZE") {
            Some(v) => {
                let size = v.trim().parse::<usize>().map_err(|_| ConfigError::InvalidNumber {
                    key: "NANO33_WINDOW_SIZE",
                    value: v.clone(),
                })?;
                NonZeroUsize::new(size).ok_or(ConfigError::Zero("NANO33_WINDOW_SIZE"))?
            }
            None => DEFAULT_WINDOW_SIZE,
        };

        let polling_ms = parse_number(
            "NANO33_POLLING_INTERVAL_MS",
            get("NANO33_POLLING_INTERVAL_MS"),
        )?
        .unwrap_or(DEFAULT_POLLING_INTERVAL_MS);
        if polling_ms == 0 {
            return Err(ConfigError::Zero("NANO33_POLLING_INTERVAL_MS"));
        }

        let scan_secs = parse_number("NANO33_SCAN_TIMEOUT_SECS", get("NANO33_SCAN_TIMEOUT_SECS"))?
            .unwrap_or(DEFAULT_SCAN_TIMEOUT_SECS);

        Ok(SensorConfig {
            enable,
            engine: EngineConfig {
                window_size,
                mean,
                stddev,
            },
            transport: TransportConfig {
                polling_interval: Duration::from_millis(polling_ms),
                scan_timeout: Duration::from_secs(scan_secs),
            },
        })
    }
}

fn parse_number(key: &'static str, value: Option<String>) -> Result<Option<u64>, ConfigError> {
    value
        .map(|v| {
            v.trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidNumber { key, value: v.clone() })
        })
        .transpose()
}

fn parse_bool(key: &'static str, value: Option<String>) -> Result<Option<bool>, ConfigError> {
    value
        .map(|v| match v.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::InvalidBool { key, value: v.clone() }),
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Result<SensorConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        SensorConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn preset_enables_sensors_and_statistics() {
        let config = config(&[("NANO33_PRESET", "Cor")]).unwrap();
        assert_eq!(config.enable, ["CorUI"]);
        assert!(config.engine.mean && config.engine.stddev);
        assert_eq!(config.engine.window_size.get(), 64);
        assert_eq!(config.transport, TransportConfig::default());
    }

    #[test]
    fn tipop_presets_list_their_sensors() {
        let config = config(&[("NANO33_PRESET", "newtipop")]).unwrap();
        assert_eq!(
            config.enable,
            ["NewTipopSwitch", "NewTipopPressure", "NewTipopJoystick"]
        );
    }

    #[test]
    fn explicit_values_override_preset() {
        let config = config(&[
            ("NANO33_PRESET", "bol"),
            ("NANO33_ENABLE", " BolAccelerometer, BolLed ,"),
            ("NANO33_STDDEV", "off"),
            ("NANO33_WINDOW_SIZE", "16"),
            ("NANO33_POLLING_INTERVAL_MS", "250"),
        ])
        .unwrap();
        assert_eq!(config.enable, ["BolAccelerometer", "BolLed"]);
        assert!(config.engine.mean);
        assert!(!config.engine.stddev);
        assert_eq!(config.engine.window_size.get(), 16);
        assert_eq!(config.transport.polling_interval, Duration::from_millis(250));
    }

    #[test]
    fn statistics_default_off_without_preset() {
        let config = config(&[("NANO33_ENABLE", "CorUI")]).unwrap();
        assert!(!config.engine.mean);
        assert!(!config.engine.stddev);
    }

    #[test]
    fn rejects_invalid_values() {
        assert_eq!(config(&[]).unwrap_err(), ConfigError::NothingEnabled);
        assert_eq!(
            config(&[("NANO33_PRESET", "foo")]).unwrap_err(),
            ConfigError::UnknownPreset("foo".into())
        );
        assert_eq!(
            config(&[("NANO33_PRESET", "cor"), ("NANO33_WINDOW_SIZE", "0")]).unwrap_err(),
            ConfigError::Zero("NANO33_WINDOW_SIZE")
        );
        assert!(matches!(
            config(&[("NANO33_PRESET", "cor"), ("NANO33_MEAN", "maybe")]),
            Err(ConfigError::InvalidBool { key: "NANO33_MEAN", .. })
        ));
        assert!(matches!(
            config(&[("NANO33_PRESET", "cor"), ("NANO33_WINDOW_SIZE", "-3")]),
            Err(ConfigError::InvalidNumber { .. })
        ));
    }
}
