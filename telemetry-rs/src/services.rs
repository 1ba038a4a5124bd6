use log::{debug, error, info, warn};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Notify};
use tokio::task::{JoinHandle, JoinSet};

use crate::adapters::{mock::MockReadingSource, production::HttpTelemetryPublisher};
use crate::encoder::TelemetryEncoder;
use crate::models::config::EndpointConfig;
use crate::models::errors::TelemetryError;
use crate::models::outcome::{FailureKind, PublishOutcome};
use crate::models::shutdown;
use crate::ports::TelemetryPort;
use common::Reading;

/// Counters of the outcomes seen by a [`TelemetryService`].
#[derive(Debug, Default)]
pub struct PublishStats {
    succeeded: AtomicU64,
    failed: AtomicU64,
    retried: AtomicU64,
}

impl PublishStats {
    pub fn succeeded(&self) -> u64 {
        self.succeeded.load(Ordering::SeqCst)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::SeqCst)
    }

    /// Publishes repeated after the token was rejected.
    pub fn retried(&self) -> u64 {
        self.retried.load(Ordering::SeqCst)
    }

    fn record(&self, outcome: &PublishOutcome) {
        if outcome.is_success() {
            self.succeeded.fetch_add(1, Ordering::SeqCst);
        } else {
            self.failed.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Publishes `reading`, retrying exactly once if the token was rejected.
///
/// Publishers discard a rejected token before reporting `AuthError`, so the
/// second attempt is signed with a fresh one.
async fn publish_with_retry<C>(
    client: &C,
    reading: &Reading,
    destination: &EndpointConfig,
    stats: &PublishStats,
) -> PublishOutcome
where
    C: TelemetryPort + ?Sized,
{
    let mut outcome = client.publish(reading, destination).await;
    if outcome.failure_kind() == Some(FailureKind::AuthError) {
        info!(
            "Token rejected for reading #{}. Retrying with a fresh token",
            reading.sequence()
        );
        stats.retried.fetch_add(1, Ordering::SeqCst);
        outcome = client.publish(reading, destination).await;
    }
    stats.record(&outcome);
    outcome
}

/// Spawns a single publish onto the runtime. The caller may await the handle or drop it.
pub fn publish_detached<C>(
    client: Arc<C>,
    reading: Reading,
    destination: EndpointConfig,
) -> JoinHandle<PublishOutcome>
where
    C: TelemetryPort + 'static,
{
    tokio::spawn(async move { client.publish(&reading, &destination).await })
}

/// Publishes every reading received on a channel to one destination.
pub struct TelemetryService<C>
where
    C: TelemetryPort + 'static,
{
    client: Arc<C>,
    destination: EndpointConfig,
    abort_signal: Arc<Notify>,
    stats: Arc<PublishStats>,
}

impl<C> TelemetryService<C>
where
    C: TelemetryPort + 'static,
{
    pub fn new(client: Arc<C>, destination: EndpointConfig) -> Self {
        TelemetryService {
            client,
            destination,
            abort_signal: Arc::new(Notify::new()),
            stats: Arc::new(PublishStats::default()),
        }
    }

    pub fn client(&self) -> Arc<C> {
        Arc::clone(&self.client)
    }

    pub fn destination(&self) -> &EndpointConfig {
        &self.destination
    }

    pub fn stats(&self) -> &PublishStats {
        &self.stats
    }

    /// Publishes one reading with the service retry policy and counts its outcome.
    pub async fn publish(&self, reading: &Reading) -> PublishOutcome {
        publish_with_retry(self.client.as_ref(), reading, &self.destination, &self.stats).await
    }

    /// Asks a running `start` loop to stop. In-flight publishes still complete.
    pub fn stop(&self) {
        self.abort_signal.notify_one();
    }

    fn spawn_publish(&self, in_flight: &mut JoinSet<PublishOutcome>, reading: Reading) {
        let client = Arc::clone(&self.client);
        let destination = self.destination.clone();
        let stats = Arc::clone(&self.stats);
        in_flight.spawn(async move {
            publish_with_retry(client.as_ref(), &reading, &destination, &stats).await
        });
    }

    /// Publishes readings until the channel closes, `stop` is called, Ctrl+C is
    /// pressed, or `run_for_millis` elapses. Each reading is published on its own
    /// task. On a stop the channel is closed and the readings still queued in it are
    /// published too. All publishes are awaited before returning.
    pub async fn start(&self, mut readings: mpsc::Receiver<Reading>, run_for_millis: Option<u64>) {
        let shutdown = shutdown::listen_for_shutdown(Arc::clone(&self.abort_signal), run_for_millis);
        let mut in_flight = JoinSet::new();
        info!(
            "Telemetry service started for device {}",
            self.destination.device_id()
        );

        loop {
            tokio::select! {
                _ = self.abort_signal.notified() => {
                    info!("Stop signal received");
                    break;
                }
                next = readings.recv() => match next {
                    Some(reading) => self.spawn_publish(&mut in_flight, reading),
                    None => {
                        info!("Reading source closed");
                        break;
                    }
                },
                Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                    log_joined(joined);
                }
            }
        }

        // Readings already queued are still published, none are dropped.
        readings.close();
        let mut queued = 0;
        while let Some(reading) = readings.recv().await {
            self.spawn_publish(&mut in_flight, reading);
            queued += 1;
        }
        if queued > 0 {
            info!("Publishing {} readings queued before the stop", queued);
        }

        debug!("Waiting for {} in-flight publishes", in_flight.len());
        while let Some(joined) = in_flight.join_next().await {
            log_joined(joined);
        }
        shutdown.abort();

        info!(
            "Telemetry service stopped. succeeded: {}, failed: {}, retried: {}",
            self.stats.succeeded(),
            self.stats.failed(),
            self.stats.retried()
        );
    }
}

fn log_joined(joined: Result<PublishOutcome, tokio::task::JoinError>) {
    match joined {
        Ok(PublishOutcome::Failure(failure)) if failure.kind.is_retryable() => {
            warn!("Transient publish failure: {:?}", failure.kind);
        }
        Ok(_) => {}
        Err(e) => error!("Publish task aborted: {}", e),
    }
}

/// Starts a service publishing `readings` to `destination` over HTTPS until Ctrl+C.
///
/// Returns a ClientBuild error if the http client cannot be created.
pub fn run_service(
    destination: EndpointConfig,
    encoder: TelemetryEncoder,
    readings: mpsc::Receiver<Reading>,
) -> Result<(JoinHandle<()>, Arc<TelemetryService<HttpTelemetryPublisher>>), TelemetryError> {
    let publisher = Arc::new(HttpTelemetryPublisher::new(encoder)?);
    let service = Arc::new(TelemetryService::new(publisher, destination));

    let handle = tokio::spawn({
        let service = Arc::clone(&service);
        async move {
            service.start(readings, None).await;
        }
    });
    Ok((handle, service))
}

/// Starts a service that publishes synthetic readings from a [`MockReadingSource`]
/// to `destination` for `run_for_millis`.
pub fn run_mock_service(
    destination: EndpointConfig,
    update_period_millis: u64,
    add_sensor_noise: bool,
    run_for_millis: u64,
) -> Result<(JoinHandle<()>, Arc<TelemetryService<HttpTelemetryPublisher>>), TelemetryError> {
    let source = MockReadingSource::new(update_period_millis, add_sensor_noise)?;
    let publisher = Arc::new(HttpTelemetryPublisher::new(
        TelemetryEncoder::vibration_monitor(),
    )?);
    let service = Arc::new(TelemetryService::new(publisher, destination));

    let (source_handle, readings) = source.spawn(Some(run_for_millis));
    let handle = tokio::spawn({
        let service = Arc::clone(&service);
        async move {
            service.start(readings, Some(run_for_millis)).await;
            if let Err(e) = source_handle.await {
                error!("Mock source task failed: {}", e);
            }
        }
    });
    Ok((handle, service))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::TelemetryPublisherMock;
    use crate::models::config::SigningKey;
    use crate::models::outcome::PublishFailure;
    use common::SensorType;
    use std::time::Duration;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn destination(uri: &str) -> EndpointConfig {
        EndpointConfig::new(uri, "iPhone", "device", SigningKey::from_bytes("testkey")).unwrap()
    }

    fn reading(sequence: u64) -> Reading {
        Reading::new(sequence, sequence as f64 * 0.1)
            .with(SensorType::Accelerometer, [-0.2, 0.1, 9.8])
    }

    fn failure(kind: FailureKind, status: u16) -> PublishOutcome {
        PublishFailure::new(kind, Some(status), "").into()
    }

    #[tokio::test]
    async fn test_publish_retries_once_on_auth_error() {
        let client = Arc::new(
            TelemetryPublisherMock::accepting().with_script(vec![failure(FailureKind::AuthError, 401)]),
        );
        let service = TelemetryService::new(client.clone(), destination("https://hub"));

        assert!(service.publish(&reading(1)).await.is_success());
        assert_eq!(client.received().len(), 2);
        assert_eq!(service.stats().retried(), 1);
        assert_eq!(service.stats().succeeded(), 1);
    }

    #[tokio::test]
    async fn test_publish_does_not_retry_twice() {
        let rejected = failure(FailureKind::AuthError, 403);
        let client = Arc::new(TelemetryPublisherMock::new(rejected.clone()));
        let service = TelemetryService::new(client.clone(), destination("https://hub"));

        assert_eq!(service.publish(&reading(1)).await, rejected);
        assert_eq!(client.received().len(), 2);
        assert_eq!(service.stats().failed(), 1);
    }

    #[tokio::test]
    async fn test_publish_does_not_retry_server_errors() {
        let client = Arc::new(TelemetryPublisherMock::new(failure(FailureKind::ServerError, 503)));
        let service = TelemetryService::new(client.clone(), destination("https://hub"));

        let outcome = service.publish(&reading(1)).await;
        assert_eq!(outcome.failure_kind(), Some(FailureKind::ServerError));
        assert_eq!(client.received().len(), 1);
        assert_eq!(service.stats().retried(), 0);
    }

    #[tokio::test]
    async fn test_publish_detached() {
        let client = Arc::new(TelemetryPublisherMock::accepting());
        let handle = publish_detached(client.clone(), reading(7), destination("https://hub"));
        assert!(handle.await.unwrap().is_success());
        assert_eq!(client.received()[0].sequence(), 7);
    }

    #[tokio::test]
    async fn test_start_drains_channel() {
        let client = Arc::new(TelemetryPublisherMock::accepting());
        let service = TelemetryService::new(client.clone(), destination("https://hub"));

        let (tx, rx) = mpsc::channel(16);
        for sequence in 1..=10 {
            tx.send(reading(sequence)).await.unwrap();
        }
        drop(tx);
        service.start(rx, None).await;

        let mut sequences: Vec<u64> = client.received().iter().map(|r| r.sequence()).collect();
        sequences.sort_unstable();
        assert_eq!(sequences, (1..=10).collect::<Vec<_>>());
        assert_eq!(service.stats().succeeded(), 10);
        assert_eq!(service.stats().failed(), 0);
    }

    #[tokio::test]
    async fn test_stop() {
        let service = Arc::new(TelemetryService::new(
            Arc::new(TelemetryPublisherMock::accepting()),
            destination("https://hub"),
        ));
        let (_tx, rx) = mpsc::channel::<Reading>(1);

        let handle = tokio::spawn({
            let service = service.clone();
            async move { service.start(rx, None).await }
        });
        service.stop();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("Service did not stop")
            .unwrap();
    }

    #[tokio::test]
    async fn test_stop_publishes_queued_readings() {
        let client = Arc::new(TelemetryPublisherMock::accepting());
        let service = TelemetryService::new(client.clone(), destination("https://hub"));

        let (tx, rx) = mpsc::channel(16);
        for sequence in 1..=5 {
            tx.send(reading(sequence)).await.unwrap();
        }
        service.stop();
        service.start(rx, None).await;

        assert_eq!(client.received().len(), 5);
        assert_eq!(service.stats().succeeded(), 5);
        // the channel is closed once the service stops
        assert!(tx.send(reading(6)).await.is_err());
    }

    #[tokio::test]
    async fn test_run_mock_service() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&mock_server)
            .await;

        let (handle, service) =
            run_mock_service(destination(&mock_server.uri()), 50, true, 400).unwrap();
        handle.await.unwrap();

        assert!(service.stats().succeeded() > 0);
        assert_eq!(service.stats().failed(), 0);
        assert_eq!(service.client().token_refreshes(), 1);
    }
}
