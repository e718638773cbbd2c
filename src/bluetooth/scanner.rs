/// Bluetooth Low Energy discovery of the Nano 33 BLE peripheral
use bluer::{Adapter, AdapterEvent, Device, Uuid};
use futures_util::{pin_mut, StreamExt};
use log::{debug, error, info, warn};
use std::collections::HashSet;
use tokio::time::{timeout, Duration};

/// Scan until a device advertising `service` shows up
///
/// Discovery runs only while this function is waiting; it stops as soon as a
/// matching device is found or `scan_timeout` expires.
///
/// # Arguments
/// * `adapter` - Powered Bluetooth adapter to scan with
/// * `service` - Primary service UUID the peripheral advertises
/// * `scan_timeout` - Upper bound for the whole scan
///
/// # Returns
/// Result containing the first matching device, or None if none was found in time
pub async fn find_peripheral(
    adapter: &Adapter,
    service: Uuid,
    scan_timeout: Duration,
) -> Result<Option<Device>, Box<dyn std::error::Error>> {
    // Configure discovery filter for Low Energy devices advertising our service
    let filter = bluer::DiscoveryFilter {
        uuids: HashSet::from([service]),
        transport: bluer::DiscoveryTransport::Le, // Bluetooth Low Energy only
        duplicate_data: false,                    // Filter out duplicate advertisements
        ..Default::default()
    };

    // Apply the discovery filter (warn if it fails, but continue)
    if let Err(e) = adapter.set_discovery_filter(filter).await {
        warn!("Failed to set discovery filter: {}", e);
    }

    let discovery = match adapter.discover_devices().await {
        Ok(discovery) => discovery,
        Err(e) => {
            error!("Failed to start device discovery: {}", e);
            return Err(e.into());
        }
    };
    pin_mut!(discovery);

    info!("Scanning for service {} ({}s)", service, scan_timeout.as_secs());

    let search = async {
        while let Some(event) = discovery.next().await {
            let addr = match event {
                AdapterEvent::DeviceAdded(addr) => addr,
                other => {
                    debug!("Discovery event: {:?}", other);
                    continue;
                }
            };

            let device = match adapter.device(addr) {
                Ok(device) => device,
                Err(_) => continue,
            };

            match device.uuids().await {
                Ok(Some(uuids)) if uuids.contains(&service) => {
                    info!("Found peripheral {}", addr);
                    return Some(device);
                }
                Ok(_) => debug!("Skipping {}: service not advertised", addr),
                Err(e) => debug!("Failed to get UUIDs for {}: {}", addr, e),
            }
        }
        None
    };

    Ok(timeout(scan_timeout, search).await.unwrap_or(None))
}
