/// GATT connection, characteristic resolution and packet streams
use bluer::gatt::remote::Characteristic;
use bluer::{Device, DeviceEvent, DeviceProperty, Session, Uuid};
use futures_util::future;
use futures_util::stream::{self, LocalBoxStream, StreamExt};
use log::{debug, error, info, warn};
use std::collections::HashMap;
use tokio::time::{interval_at, Duration, Instant, MissedTickBehavior};

use crate::bluetooth::scanner::find_peripheral;
use crate::config::TransportConfig;
use crate::models::TransportEvent;
use crate::registry::SERVICE_UUID;
use crate::schema::{Capability, CharacteristicSchema};

/// An open connection to one peripheral
pub struct Connection {
    _session: Session,
    device: Device,
    id: String,
    characteristics: Vec<(&'static CharacteristicSchema, Characteristic)>,
}

impl Connection {
    /// Find the peripheral and connect to it
    ///
    /// # Returns
    /// Ok(None) if no device advertising the service was found in time
    pub async fn open(
        transport: &TransportConfig,
    ) -> Result<Option<Self>, Box<dyn std::error::Error>> {
        // Initialize Bluetooth session
        let session = match bluer::Session::new().await {
            Ok(session) => session,
            Err(e) => {
                error!("Failed to create Bluetooth session: {}", e);
                return Err(e.into());
            }
        };

        // Get the default Bluetooth adapter
        let adapter = match session.default_adapter().await {
            Ok(adapter) => adapter,
            Err(e) => {
                error!("Failed to get default Bluetooth adapter: {}", e);
                return Err(e.into());
            }
        };

        // Ensure Bluetooth adapter is powered on
        if let Err(e) = adapter.set_powered(true).await {
            error!("Failed to power on adapter: {}", e);
            return Err(e.into());
        }

        let service = Uuid::parse_str(SERVICE_UUID)?;
        let device = match find_peripheral(&adapter, service, transport.scan_timeout).await? {
            Some(device) => device,
            None => return Ok(None),
        };

        if !device.is_connected().await? {
            if let Err(e) = device.connect().await {
                error!("Failed to connect to {}: {}", device.address(), e);
                return Err(e.into());
            }
        }

        Ok(Some(Connection {
            _session: session,
            id: device.address().to_string(),
            device,
            characteristics: Vec::new(),
        }))
    }

    /// Device identifier reported in lifecycle events
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Look up the characteristics of the enabled sensors
    ///
    /// # Returns
    /// An `Unavailable` event for every schema the service does not expose
    pub async fn resolve(
        &mut self,
        schemas: &[&'static CharacteristicSchema],
    ) -> Result<Vec<TransportEvent>, Box<dyn std::error::Error>> {
        let service_uuid = Uuid::parse_str(SERVICE_UUID)?;

        let mut service = None;
        for candidate in self.device.services().await? {
            if candidate.uuid().await? == service_uuid {
                service = Some(candidate);
                break;
            }
        }
        let service = service.ok_or("Nano 33 BLE service not found on device")?;

        let mut available = HashMap::new();
        for characteristic in service.characteristics().await? {
            available.insert(characteristic.uuid().await?, characteristic);
        }

        let mut events = Vec::new();
        for &schema in schemas {
            let found = Uuid::parse_str(schema.uuid)
                .ok()
                .and_then(|uuid| available.remove(&uuid));

            match found {
                Some(characteristic) => {
                    debug!("Resolved {} ({})", schema.id, schema.uuid);
                    self.characteristics.push((schema, characteristic));
                }
                None => events.push(TransportEvent::Unavailable { sensor: schema.id }),
            }
        }

        Ok(events)
    }

    /// Subscribe to every resolved characteristic
    ///
    /// Notifying characteristics stream their notifications, readable ones
    /// are read every `polling_interval`. The stream starts with any setup
    /// failures followed by `Connected`, and yields `Disconnected` once the
    /// device drops the link. Dropping the stream stops all subscriptions
    /// and polling.
    pub async fn subscribe(
        &self,
        polling_interval: Duration,
    ) -> Result<LocalBoxStream<'_, TransportEvent>, Box<dyn std::error::Error>> {
        let mut setup = Vec::new();
        let mut live: Vec<LocalBoxStream<'_, TransportEvent>> = Vec::new();

        for (schema, characteristic) in &self.characteristics {
            let sensor = schema.id;

            if schema.has(Capability::Notify) {
                match characteristic.notify().await {
                    Ok(notifications) => {
                        info!("Subscribed to {}", sensor);
                        live.push(
                            notifications
                                .map(move |data| TransportEvent::Packet { sensor, data })
                                .boxed_local(),
                        );
                    }
                    Err(e) => {
                        warn!("Failed to subscribe to {}: {}", sensor, e);
                        setup.push(TransportEvent::Unavailable { sensor });
                        continue;
                    }
                }
            }

            if schema.has(Capability::Read) {
                info!("Polling {} every {} ms", sensor, polling_interval.as_millis());
                live.push(poll_reads(sensor, characteristic, polling_interval));
            }

            if !schema.has(Capability::Notify) && !schema.has(Capability::Read) {
                debug!("{} is write-only; writes are not supported", sensor);
            }
        }

        let address = self.id.clone();
        let device_events = self.device.events().await?;
        live.push(
            device_events
                .filter_map(move |event| {
                    future::ready(match event {
                        DeviceEvent::PropertyChanged(DeviceProperty::Connected(false)) => {
                            Some(TransportEvent::Disconnected(address.clone()))
                        }
                        _ => None,
                    })
                })
                .boxed_local(),
        );

        setup.push(TransportEvent::Connected(self.id.clone()));

        Ok(stream::iter(setup)
            .chain(stream::select_all(live))
            .boxed_local())
    }

    pub async fn disconnect(&self) {
        if let Err(e) = self.device.disconnect().await {
            warn!("Failed to disconnect from {}: {}", self.id, e);
        }
    }
}

/// Read `characteristic` once per `period`, first read one period from now
fn poll_reads<'a>(
    sensor: &'static str,
    characteristic: &'a Characteristic,
    period: Duration,
) -> LocalBoxStream<'a, TransportEvent> {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    stream::unfold(ticker, move |mut ticker| async move {
        ticker.tick().await;
        let event = match characteristic.read().await {
            Ok(data) => TransportEvent::Packet { sensor, data },
            Err(e) => TransportEvent::Error(format!("Failed to read {}: {}", sensor, e)),
        };
        Some((event, ticker))
    })
    .boxed_local()
}
