/// Events emitted by the engine and the sinks that receive them
use log::debug;
use std::fmt;

use tokio::sync::mpsc::UnboundedSender;

use crate::errors::EngineError;

const SUFFIX_MEAN: &str = "_mean";
const SUFFIX_STDDEV: &str = "_stddev";

/// Ordered field name -> value pairs for one packet
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldValues {
    entries: Vec<(&'static str, f64)>,
}

impl FieldValues {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    pub fn insert(&mut self, name: &'static str, value: f64) {
        self.entries.push((name, value));
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(field, _)| *field == name)
            .map(|&(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        self.entries.iter().copied()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|&(name, _)| name)
    }
}

impl fmt::Display for FieldValues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, value)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{} {}", name, value)?;
        }
        Ok(())
    }
}

/// Newly decoded values of one packet
pub type DecodedRecord = FieldValues;

/// Per-field mean or standard deviation after one packet
pub type StatSnapshot = FieldValues;

/// Everything the engine reports to its sink
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    Values {
        sensor: &'static str,
        record: DecodedRecord,
    },
    Mean {
        sensor: &'static str,
        snapshot: StatSnapshot,
    },
    StdDev {
        sensor: &'static str,
        snapshot: StatSnapshot,
    },
    Error(EngineError),
    Connected(String),
    Disconnected(String),
}

impl EngineEvent {
    /// String key for hosts that route events by name
    ///
    /// Values use the sensor id, statistics append `_mean` / `_stddev`.
    pub fn name(&self) -> String {
        match self {
            EngineEvent::Values { sensor, .. } => sensor.to_string(),
            EngineEvent::Mean { sensor, .. } => format!("{}{}", sensor, SUFFIX_MEAN),
            EngineEvent::StdDev { sensor, .. } => format!("{}{}", sensor, SUFFIX_STDDEV),
            EngineEvent::Error(_) => "error".to_string(),
            EngineEvent::Connected(_) => "connected".to_string(),
            EngineEvent::Disconnected(_) => "disconnected".to_string(),
        }
    }
}

/// Receiver of engine output
pub trait EventSink {
    fn emit(&mut self, event: EngineEvent);
}

/// Collects events in memory
impl EventSink for Vec<EngineEvent> {
    fn emit(&mut self, event: EngineEvent) {
        self.push(event);
    }
}

/// Forwards events to an async consumer
///
/// Once the receiver is gone events are discarded; that is logged once.
#[derive(Debug)]
pub struct ChannelSink {
    tx: UnboundedSender<EngineEvent>,
    closed: bool,
}

impl ChannelSink {
    pub fn new(tx: UnboundedSender<EngineEvent>) -> Self {
        Self { tx, closed: false }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl EventSink for ChannelSink {
    fn emit(&mut self, event: EngineEvent) {
        if self.tx.send(event).is_err() && !self.closed {
            debug!("Event receiver closed, discarding further events");
            self.closed = true;
        }
    }
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    fn emit(&mut self, event: EngineEvent) {
        (**self).emit(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values() -> FieldValues {
        let mut v = FieldValues::with_capacity(2);
        v.insert("cax", 1.0);
        v.insert("cay", -2.5);
        v
    }

    #[test]
    fn event_names_follow_suffix_convention() {
        let sensor = "CorAccelerometer";
        assert_eq!(
            EngineEvent::Values { sensor, record: values() }.name(),
            "CorAccelerometer"
        );
        assert_eq!(
            EngineEvent::Mean { sensor, snapshot: values() }.name(),
            "CorAccelerometer_mean"
        );
        assert_eq!(
            EngineEvent::StdDev { sensor, snapshot: values() }.name(),
            "CorAccelerometer_stddev"
        );
        assert_eq!(EngineEvent::Connected("aa".into()).name(), "connected");
        assert_eq!(EngineEvent::Disconnected("aa".into()).name(), "disconnected");
    }

    #[test]
    fn field_values_keep_insertion_order() {
        let v = values();
        assert_eq!(v.names().collect::<Vec<_>>(), ["cax", "cay"]);
        assert_eq!(v.get("cay"), Some(-2.5));
        assert_eq!(v.get("caz"), None);
        assert_eq!(v.to_string(), "cax 1 cay -2.5");
    }

    #[tokio::test]
    async fn channel_sink_forwards_events() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<EngineEvent>();
        let mut sink = ChannelSink::new(tx);
        sink.emit(EngineEvent::Connected("dev".into()));
        assert_eq!(rx.recv().await, Some(EngineEvent::Connected("dev".into())));
        assert!(!sink.is_closed());
    }

    #[test]
    fn channel_sink_notes_closed_receiver() {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel::<EngineEvent>();
        drop(rx);
        let mut sink = ChannelSink::new(tx);
        sink.emit(EngineEvent::Connected("dev".into()));
        sink.emit(EngineEvent::Disconnected("dev".into()));
        assert!(sink.is_closed());
    }
}
