/// Messages the BLE transport hands to the engine
///
/// Sensor ids are the catalog's `'static` ids so packets can be tagged
/// without allocating per notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// Raw notification or read value of one characteristic
    Packet { sensor: &'static str, data: Vec<u8> },
    /// Enabled characteristic could not be resolved on the peripheral
    Unavailable { sensor: &'static str },
    Connected(String),
    Disconnected(String),
    /// Any other transport failure, forwarded as-is
    Error(String),
}
