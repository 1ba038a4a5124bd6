use async_trait::async_trait;

use common::Reading;

use crate::models::config::EndpointConfig;
use crate::models::errors::TelemetryError;
use crate::models::outcome::PublishOutcome;

/// Publishes readings to an ingestion endpoint.
#[async_trait]
pub trait TelemetryPort: Send + Sync {
    /// Encodes `reading`, authorizes and sends it to `destination`.
    /// Never panics and never drops a reading: every call resolves to one outcome.
    ///
    /// An implementation that receives AuthError must not reuse the rejected token
    /// on the next call, so a caller retrying once gets a freshly signed one.
    async fn publish(&self, reading: &Reading, destination: &EndpointConfig) -> PublishOutcome;
}

/// Source of wall-clock time in seconds since the unix epoch.
pub trait Clock: Send + Sync {
    /// Fails with a Config error if the time cannot be expressed as epoch seconds.
    fn now_epoch_secs(&self) -> Result<u64, TelemetryError>;
}
