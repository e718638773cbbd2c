/// Line-oriented output of decoded values for a host process
use log::{error, info, warn};
use std::io::Write;
use time::OffsetDateTime;

use crate::errors::EngineError;
use crate::events::{EngineEvent, EventSink};
use crate::utils::format_datetime;

/// Writes value and statistics events as `<name> <field> <value> ...` lines
///
/// Lifecycle and error events go to the log instead of the data stream.
pub struct Outlet<W: Write> {
    out: W,
}

pub type StdoutOutlet = Outlet<std::io::Stdout>;

impl StdoutOutlet {
    pub fn stdout() -> Self {
        Outlet::new(std::io::stdout())
    }
}

impl<W: Write> Outlet<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> EventSink for Outlet<W> {
    fn emit(&mut self, event: EngineEvent) {
        let line = match &event {
            EngineEvent::Values { record: values, .. }
            | EngineEvent::Mean { snapshot: values, .. }
            | EngineEvent::StdDev { snapshot: values, .. } => {
                format!("{} {}", event.name(), values)
            }
            EngineEvent::Error(
                e @ (EngineError::ConfigurationWarning { .. }
                | EngineError::InsufficientSamples { .. }),
            ) => {
                warn!("{}", e);
                return;
            }
            EngineEvent::Error(e) => {
                error!("{}", e);
                return;
            }
            EngineEvent::Connected(id) => {
                info!(
                    "Connected to {} at {}",
                    id,
                    format_datetime(&OffsetDateTime::now_utc())
                );
                return;
            }
            EngineEvent::Disconnected(id) => {
                info!(
                    "Disconnected from {} at {}",
                    id,
                    format_datetime(&OffsetDateTime::now_utc())
                );
                return;
            }
        };

        if let Err(e) = writeln!(self.out, "{}", line).and_then(|_| self.out.flush()) {
            error!("Failed to write {}: {}", event.name(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::FieldValues;

    #[test]
    fn writes_one_line_per_data_event() {
        let mut record = FieldValues::default();
        record.insert("ca0", 12.0);
        record.insert("cb", 1.0);

        let mut outlet = Outlet::new(Vec::new());
        outlet.emit(EngineEvent::Values {
            sensor: "CorUI",
            record: record.clone(),
        });
        outlet.emit(EngineEvent::Connected("AA:BB".into()));
        outlet.emit(EngineEvent::Mean {
            sensor: "CorUI",
            snapshot: record,
        });

        let text = String::from_utf8(outlet.into_inner()).unwrap();
        assert_eq!(text, "CorUI ca0 12 cb 1\nCorUI_mean ca0 12 cb 1\n");
    }
}
