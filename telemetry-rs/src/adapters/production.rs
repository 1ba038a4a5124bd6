// Publishes readings over HTTPS to an IoT-hub style ingestion endpoint, authorized
// with a shared access signature kept in a token cache.

use async_trait::async_trait;
use log::{debug, warn};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use common::Reading;

use crate::encoder::TelemetryEncoder;
use crate::models::attempt::{PublishAttempt, PublishState};
use crate::models::config::EndpointConfig;
use crate::models::errors::TelemetryError;
use crate::models::http_client::HttpClient;
use crate::models::outcome::{FailureKind, PublishFailure, PublishOutcome};
use crate::ports::{Clock, TelemetryPort};
use crate::token::{AccessToken, TokenCache};

/// Wall clock backed by `SystemTime`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_epoch_secs(&self) -> Result<u64, TelemetryError> {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .map_err(|e| TelemetryError::Config(format!("System clock is before 1970: {e}")))
    }
}

/// Telemetry publisher talking to the real endpoint.
pub struct HttpTelemetryPublisher {
    client: HttpClient,
    encoder: TelemetryEncoder,
    tokens: TokenCache,
    clock: Arc<dyn Clock>,
}

impl HttpTelemetryPublisher {
    /// Returns a ClientBuild error if the http client cannot be created.
    pub fn new(encoder: TelemetryEncoder) -> Result<Self, TelemetryError> {
        Ok(Self {
            client: HttpClient::new()?,
            encoder,
            tokens: TokenCache::new(),
            clock: Arc::new(SystemClock),
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Token that the next publish to `destination` would attach, issuing it if needed.
    pub async fn current_token(
        &self,
        destination: &EndpointConfig,
    ) -> Result<AccessToken, TelemetryError> {
        self.tokens.get(destination, self.clock.as_ref()).await
    }

    /// Forces the next publish to `destination` to sign a new token.
    pub async fn invalidate_token(&self, destination: &EndpointConfig) {
        self.tokens.invalidate(destination).await
    }

    /// Number of tokens signed so far.
    pub fn token_refreshes(&self) -> u64 {
        self.tokens.refresh_count()
    }

    async fn send(
        &self,
        attempt: &mut PublishAttempt,
        body: Vec<u8>,
        token: &AccessToken,
        destination: &EndpointConfig,
    ) -> PublishOutcome {
        attempt.advance(PublishState::Sending);
        let response = match self
            .client
            .post_json(
                &destination.events_url(),
                &token.to_header_value(),
                body,
                destination.timeout(),
            )
            .await
        {
            Ok(response) => response,
            Err(e) => {
                let detail = if e.is_timeout() {
                    format!("Request timed out: {e}")
                } else {
                    e.to_string()
                };
                return PublishFailure::new(FailureKind::NetworkError, None, &detail).into();
            }
        };

        match FailureKind::from_status(response.status) {
            None => PublishOutcome::Success {
                status: response.status,
                body: response.body,
            },
            Some(kind) => {
                if kind == FailureKind::AuthError {
                    self.tokens.discard(destination, token).await;
                }
                PublishFailure::new(kind, Some(response.status), &response.body).into()
            }
        }
    }
}

#[async_trait]
impl TelemetryPort for HttpTelemetryPublisher {
    async fn publish(&self, reading: &Reading, destination: &EndpointConfig) -> PublishOutcome {
        let mut attempt = PublishAttempt::new();
        debug!(
            "[{}] Publishing reading #{} to {}",
            attempt.id(),
            reading.sequence(),
            destination.device_id()
        );

        let body = match self
            .encoder
            .encode(reading)
            .and_then(|payload| payload.to_json())
        {
            Ok(body) => body,
            Err(e) => {
                warn!("[{}] Reading #{} not encoded: {}", attempt.id(), reading.sequence(), e);
                return attempt.fail(e.into());
            }
        };

        let token = match self.tokens.get(destination, self.clock.as_ref()).await {
            Ok(token) => token,
            Err(e) => {
                warn!("[{}] No token for {}: {}", attempt.id(), destination.device_id(), e);
                return attempt.fail(e.into());
            }
        };
        attempt.advance(PublishState::TokenReady);

        let outcome = self.send(&mut attempt, body, &token, destination).await;
        if let PublishOutcome::Failure(failure) = &outcome {
            warn!(
                "[{}] Reading #{} failed: {:?} {:?} {}",
                attempt.id(),
                reading.sequence(),
                failure.kind,
                failure.status,
                failure.detail
            );
        }
        attempt.finish(outcome)
    }
}
