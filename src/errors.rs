/// Error types reported by the engine and the configuration layer
use thiserror::Error;

use crate::codec::BufferTooShort;

/// Non-fatal conditions raised while processing packets
///
/// None of these stop the engine; they are surfaced to the sink as
/// `EngineEvent::Error` and processing continues with the next packet.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("Packet for {sensor} too short at field {field}: {source}")]
    BufferTooShort {
        sensor: String,
        field: &'static str,
        #[source]
        source: BufferTooShort,
    },

    #[error("Unknown sensor {0}")]
    UnknownSensor(String),

    #[error("Characteristic {sensor} is enabled, but {reason}")]
    ConfigurationWarning { sensor: String, reason: String },

    #[error("Insufficient samples: need {required}, have {available}")]
    InsufficientSamples { required: usize, available: usize },

    #[error("{0}")]
    Transport(String),
}

impl EngineError {
    /// Warning for a sensor id that the catalog does not define
    pub fn not_in_catalog(sensor: &str) -> Self {
        EngineError::ConfigurationWarning {
            sensor: sensor.to_string(),
            reason: "not defined in the sensor catalog".to_string(),
        }
    }

    /// Warning for a characteristic the connected peripheral does not expose
    pub fn not_in_service(sensor: &str) -> Self {
        EngineError::ConfigurationWarning {
            sensor: sensor.to_string(),
            reason: "not available in the BLE service".to_string(),
        }
    }
}

/// Invalid startup configuration; fatal
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{key} must be a non-negative integer, got '{value}'")]
    InvalidNumber { key: &'static str, value: String },

    #[error("{key} must be a boolean (true/false/1/0/yes/no/on/off), got '{value}'")]
    InvalidBool { key: &'static str, value: String },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("Unknown preset '{0}', expected one of: cor, bol, tipop, newtipop")]
    UnknownPreset(String),

    #[error("No sensors enabled. Please set NANO33_PRESET or NANO33_ENABLE")]
    NothingEnabled,
}
