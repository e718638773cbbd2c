use futures_util::StreamExt;
use log::{error, info, warn};

use nano33_ble_stats::bluetooth::Connection;
use nano33_ble_stats::config::SensorConfig;
use nano33_ble_stats::outlet::StdoutOutlet;
use nano33_ble_stats::{Engine, TransportEvent};

async fn run(config: SensorConfig) -> Result<(), Box<dyn std::error::Error>> {
    let mut engine = Engine::new(config.engine, &config.enable, StdoutOutlet::stdout());

    if engine.registry().is_empty() {
        warn!("None of the enabled sensors are defined for this peripheral");
    }

    info!("Connecting...");
    let mut connection = match Connection::open(&config.transport).await? {
        Some(connection) => connection,
        None => return Err("Unable to connect to Nano 33 BLE service".into()),
    };
    info!("Session started with {}", connection.id());

    let schemas = engine.registry().active().to_vec();
    for event in connection.resolve(&schemas).await? {
        engine.dispatch(event);
    }

    {
        let mut events = connection
            .subscribe(config.transport.polling_interval)
            .await?;

        // One event at a time, so each packet is fully processed before the next
        while let Some(event) = events.next().await {
            let disconnected = matches!(event, TransportEvent::Disconnected(_));
            engine.dispatch(event);
            if disconnected {
                break;
            }
        }
    }

    connection.disconnect().await;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .format_timestamp_secs()
        .init();

    // Load configuration
    let config = match SensorConfig::new() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e);
        }
    };

    // Handle Ctrl+C gracefully
    let (tx, mut rx) = tokio::sync::oneshot::channel();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = tx.send(());
        }
    });

    // Run until the peripheral disconnects or a shutdown signal arrives
    tokio::select! {
        result = run(config) => {
            match result {
                Ok(_) => info!("Session ended"),
                Err(e) => {
                    error!("Fatal error: {}", e);
                    std::process::exit(1);
                }
            }
        }
        _ = &mut rx => {
            info!("Program terminated by user. Exiting gracefully.");
        }
    }

    Ok(())
}
