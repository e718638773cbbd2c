//! Decoding and rolling statistics for Arduino Nano 33 BLE sensor characteristics
//!
//! A transport hands raw GATT packets to [`Engine::on_packet`]; the engine
//! decodes them against the characteristic's field layout, keeps a bounded
//! window per field and pushes values, means and standard deviations to an
//! [`EventSink`].

pub mod bluetooth;
pub mod codec;
pub mod config;
pub mod engine;
pub mod errors;
pub mod events;
pub mod models;
pub mod outlet;
pub mod registry;
pub mod schema;
pub mod series;
pub mod stats;
pub mod utils;

pub use codec::{BufferTooShort, FieldType};
pub use engine::{Engine, EngineConfig};
pub use errors::{ConfigError, EngineError};
pub use events::{ChannelSink, DecodedRecord, EngineEvent, EventSink, FieldValues, StatSnapshot};
pub use models::TransportEvent;
pub use registry::SensorRegistry;
pub use schema::{Capability, CharacteristicSchema, FieldSpec};
pub use series::WindowedSeries;
