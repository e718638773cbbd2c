/// Packet decoding and windowed statistics for one peripheral connection
use log::debug;
use std::collections::HashMap;
use std::num::NonZeroUsize;

use crate::errors::EngineError;
use crate::events::{DecodedRecord, EngineEvent, EventSink, StatSnapshot};
use crate::models::TransportEvent;
use crate::registry::SensorRegistry;
use crate::schema::CharacteristicSchema;
use crate::series::WindowedSeries;
use crate::stats;

pub const DEFAULT_WINDOW_SIZE: NonZeroUsize = match NonZeroUsize::new(64) {
    Some(size) => size,
    None => panic!("window size must be non-zero"),
};

/// Engine options fixed at construction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Samples kept per field
    pub window_size: NonZeroUsize,
    /// Emit `<sensor>_mean` after every packet
    pub mean: bool,
    /// Emit `<sensor>_stddev` after every packet
    pub stddev: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            mean: false,
            stddev: false,
        }
    }
}

/// Windows of one enabled sensor, one per schema field in schema order
#[derive(Debug)]
struct SensorState {
    schema: &'static CharacteristicSchema,
    series: Vec<WindowedSeries>,
    available: bool,
    // InsufficientSamples already reported
    stddev_warned: bool,
}

/// Output of one successfully decoded packet
struct Decoded {
    record: DecodedRecord,
    means: Option<StatSnapshot>,
    stddevs: Option<StatSnapshot>,
    insufficient: Option<EngineError>,
}

/// Decoding engine for one connected peripheral
///
/// Owns the per-field windows of every enabled sensor and pushes its output
/// into `sink`. Packets are processed one at a time to completion, so the
/// order of events for a sensor matches the order its packets arrived in.
///
/// Logging of reported conditions is left to the sink; the engine itself
/// only traces at debug level.
pub struct Engine<S: EventSink> {
    config: EngineConfig,
    registry: SensorRegistry,
    sensors: HashMap<&'static str, SensorState>,
    sink: S,
}

impl<S: EventSink> Engine<S> {
    /// Build an engine for the sensors in `enable`
    ///
    /// Enable entries missing from the catalog are reported to `sink` as
    /// `ConfigurationWarning`s right away; the remaining sensors start with
    /// empty windows.
    pub fn new<E: AsRef<str>>(config: EngineConfig, enable: &[E], mut sink: S) -> Self {
        let (registry, warnings) = SensorRegistry::new(enable);
        for warning in warnings {
            sink.emit(EngineEvent::Error(warning));
        }

        let sensors = registry
            .active()
            .iter()
            .map(|&schema| {
                let series = schema
                    .fields
                    .iter()
                    .map(|_| WindowedSeries::new(config.window_size))
                    .collect();
                (
                    schema.id,
                    SensorState {
                        schema,
                        series,
                        available: true,
                        stddev_warned: false,
                    },
                )
            })
            .collect();

        Engine {
            config,
            registry,
            sensors,
            sink,
        }
    }

    pub fn registry(&self) -> &SensorRegistry {
        &self.registry
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Window of one field of an enabled sensor
    pub fn series(&self, sensor_id: &str, field: &str) -> Option<&WindowedSeries> {
        let state = self.sensors.get(sensor_id)?;
        let index = state.schema.fields.iter().position(|f| f.name == field)?;
        state.series.get(index)
    }

    /// Decode one packet of `sensor_id` and emit its events
    ///
    /// Emits the value record, then the mean snapshot and the stddev snapshot
    /// when enabled. The first time a stddev cannot be computed for a sensor
    /// an `InsufficientSamples` error follows. Other failures are emitted as
    /// `EngineEvent::Error` and the packet is dropped.
    pub fn on_packet(&mut self, sensor_id: &str, data: &[u8]) {
        let schema = match self.registry.lookup(sensor_id) {
            Ok(schema) => schema,
            Err(e) => {
                debug!("Dropping packet: {}", e);
                self.sink.emit(EngineEvent::Error(e));
                return;
            }
        };

        let state = match self.sensors.get_mut(schema.id) {
            Some(state) if state.available => state,
            _ => {
                debug!("Ignoring packet for unavailable sensor {}", schema.id);
                return;
            }
        };

        let decoded = match decode_packet(state, &self.config, data) {
            Ok(decoded) => decoded,
            Err(e) => {
                debug!("Error decoding packet: {}", e);
                self.sink.emit(EngineEvent::Error(e));
                return;
            }
        };

        let insufficient = match decoded.insufficient {
            Some(e) if !state.stddev_warned => {
                state.stddev_warned = true;
                Some(e)
            }
            _ => None,
        };

        debug!("{}: {}", schema.id, decoded.record);
        self.sink.emit(EngineEvent::Values {
            sensor: schema.id,
            record: decoded.record,
        });
        if let Some(snapshot) = decoded.means {
            self.sink.emit(EngineEvent::Mean {
                sensor: schema.id,
                snapshot,
            });
        }
        if let Some(snapshot) = decoded.stddevs {
            self.sink.emit(EngineEvent::StdDev {
                sensor: schema.id,
                snapshot,
            });
        }
        if let Some(e) = insufficient {
            self.sink.emit(EngineEvent::Error(e));
        }
    }

    /// Mark an enabled sensor as missing from the peripheral
    ///
    /// Reported once per sensor; the sensor produces no further events while
    /// every other sensor keeps decoding.
    pub fn on_unavailable(&mut self, sensor_id: &str) {
        match self.sensors.get_mut(sensor_id) {
            Some(state) if state.available => {
                state.available = false;
                let warning = EngineError::not_in_service(state.schema.id);
                self.sink.emit(EngineEvent::Error(warning));
            }
            Some(_) => {}
            None => debug!("Unavailable sensor {} was never enabled", sensor_id),
        }
    }

    pub fn on_connected(&mut self, device_id: &str) {
        self.sink.emit(EngineEvent::Connected(device_id.to_string()));
    }

    pub fn on_disconnected(&mut self, device_id: &str) {
        self.sink
            .emit(EngineEvent::Disconnected(device_id.to_string()));
    }

    pub fn on_transport_error(&mut self, message: &str) {
        self.sink
            .emit(EngineEvent::Error(EngineError::Transport(message.to_string())));
    }

    /// Route one transport message to its handler
    pub fn dispatch(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Packet { sensor, data } => self.on_packet(sensor, &data),
            TransportEvent::Unavailable { sensor } => self.on_unavailable(sensor),
            TransportEvent::Connected(id) => self.on_connected(&id),
            TransportEvent::Disconnected(id) => self.on_disconnected(&id),
            TransportEvent::Error(message) => self.on_transport_error(&message),
        }
    }
}

/// Single forward pass over the schema fields
///
/// Windows of fields decoded before a `BufferTooShort` keep their new sample;
/// there is no rollback.
fn decode_packet(
    state: &mut SensorState,
    config: &EngineConfig,
    data: &[u8],
) -> Result<Decoded, EngineError> {
    let fields = state.schema.fields;
    let mut record = DecodedRecord::with_capacity(fields.len());
    let mut means = config.mean.then(|| StatSnapshot::with_capacity(fields.len()));
    let mut stddevs = config
        .stddev
        .then(|| StatSnapshot::with_capacity(fields.len()));
    let mut insufficient = None;

    let mut offset = 0;
    for (field, series) in fields.iter().zip(state.series.iter_mut()) {
        let (value, consumed) =
            field
                .field_type
                .decode(data, offset)
                .map_err(|source| EngineError::BufferTooShort {
                    sensor: state.schema.id.to_string(),
                    field: field.name,
                    source,
                })?;
        offset += consumed;

        series.push(value);
        record.insert(field.name, value);

        if let Some(means) = means.as_mut() {
            if let Some(m) = stats::mean(series) {
                means.insert(field.name, m);
            }
        }

        if let Some(stddevs) = stddevs.as_mut() {
            match stats::stddev(series) {
                Ok(s) => stddevs.insert(field.name, s),
                Err(e) => {
                    debug!("{} {}: {}", state.schema.id, field.name, e);
                    insufficient.get_or_insert(e);
                }
            }
        }
    }

    let expected = state.schema.packet_len();
    if data.len() > expected {
        debug!(
            "{}: ignoring {} trailing bytes",
            state.schema.id,
            data.len() - expected
        );
    }

    Ok(Decoded {
        record,
        means,
        stddevs: stddevs.filter(|s| !s.is_empty()),
        insufficient,
    })
}
