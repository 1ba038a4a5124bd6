use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use common::Reading;

use crate::encoder::TelemetryEncoder;
use crate::models::config::EndpointConfig;
use crate::models::outcome::{PublishFailure, PublishOutcome};
use crate::ports::TelemetryPort;

/// Records every published reading and answers with scripted outcomes.
///
/// Readings are encoded first, so encoding failures surface exactly as they would
/// against the real endpoint. Once the script runs out, `default_outcome` is returned.
pub struct TelemetryPublisherMock {
    encoder: TelemetryEncoder,
    script: Mutex<VecDeque<PublishOutcome>>,
    default_outcome: PublishOutcome,
    received: Mutex<Vec<Reading>>,
}

impl TelemetryPublisherMock {
    pub fn new(default_outcome: PublishOutcome) -> Self {
        Self {
            encoder: TelemetryEncoder::vibration_monitor(),
            script: Mutex::new(VecDeque::new()),
            default_outcome,
            received: Mutex::new(Vec::new()),
        }
    }

    /// Mock that accepts everything with a 200.
    pub fn accepting() -> Self {
        Self::new(PublishOutcome::Success {
            status: 200,
            body: String::new(),
        })
    }

    /// Outcomes returned, in order, before falling back to the default one.
    pub fn with_script(self, outcomes: Vec<PublishOutcome>) -> Self {
        if let Ok(mut script) = self.script.lock() {
            script.extend(outcomes);
        }
        self
    }

    /// Readings received so far, in call order.
    pub fn received(&self) -> Vec<Reading> {
        self.received
            .lock()
            .map(|received| received.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl TelemetryPort for TelemetryPublisherMock {
    async fn publish(&self, reading: &Reading, _destination: &EndpointConfig) -> PublishOutcome {
        if let Ok(mut received) = self.received.lock() {
            received.push(reading.clone());
        }
        if let Err(e) = self.encoder.encode(reading) {
            return PublishFailure::from(e).into();
        }
        self.script
            .lock()
            .ok()
            .and_then(|mut script| script.pop_front())
            .unwrap_or_else(|| self.default_outcome.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::SigningKey;
    use crate::models::outcome::FailureKind;
    use common::SensorType;

    fn destination() -> EndpointConfig {
        EndpointConfig::new("https://hub", "d", "device", SigningKey::from_bytes("k")).unwrap()
    }

    #[tokio::test]
    async fn test_mock_follows_script() {
        let auth_error = PublishOutcome::Failure(PublishFailure::new(
            FailureKind::AuthError,
            Some(401),
            "",
        ));
        let mock = TelemetryPublisherMock::accepting().with_script(vec![auth_error.clone()]);
        let reading = Reading::new(1, 0.1).with(SensorType::Gyroscope, [0.0, 0.0, 0.1]);

        assert_eq!(mock.publish(&reading, &destination()).await, auth_error);
        assert!(mock.publish(&reading, &destination()).await.is_success());
        assert_eq!(mock.received().len(), 2);
    }

    #[tokio::test]
    async fn test_mock_reports_encoding_failures() {
        let mock = TelemetryPublisherMock::accepting();
        let outcome = mock.publish(&Reading::new(1, 0.1), &destination()).await;
        assert_eq!(outcome.failure_kind(), Some(FailureKind::InvalidInput));
    }
}
