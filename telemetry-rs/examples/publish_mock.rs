use log::{error, info};
use std::process;

use telemetry_rs::constants::DEFAULT_PERIOD_MILLIS;
use telemetry_rs::{run_mock_service, EndpointConfig};

const RUN_FOR_MILLIS: u64 = 30_000;

// Publishes synthetic readings to the endpoint configured through TELEMETRY_* variables.
#[tokio::main]
async fn main() {
    env_logger::init();

    let destination = match EndpointConfig::from_env() {
        Ok(destination) => destination,
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    };

    let (handle, service) =
        match run_mock_service(destination, DEFAULT_PERIOD_MILLIS, true, RUN_FOR_MILLIS) {
            Ok(running) => running,
            Err(e) => {
                error!("Could not start telemetry service: {}", e);
                process::exit(1);
            }
        };

    if let Err(e) = handle.await {
        error!("Telemetry service task failed: {}", e);
    }
    info!(
        "Done. succeeded: {}, failed: {}, retried: {}",
        service.stats().succeeded(),
        service.stats().failed(),
        service.stats().retried()
    );
}
