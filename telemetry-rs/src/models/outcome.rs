use crate::helpers;
use crate::models::errors::TelemetryError;

/// Classification of a failed publish, used by callers to pick a retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Local programming or configuration defect. Never retried.
    InvalidInput,
    /// Empty or invalid key. Retrying with the same key cannot succeed.
    SigningError,
    /// Timeout, DNS failure or connection reset.
    NetworkError,
    /// Token rejected with 401/403.
    AuthError,
    /// 5xx response.
    ServerError,
    /// Payload serialization failed.
    EncodingError,
    /// Any other non-2xx response, such as 400, 404 or 429.
    Rejected,
}

impl FailureKind {
    /// True for transient failures a caller may retry with backoff.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FailureKind::NetworkError | FailureKind::ServerError)
    }

    /// Maps an http status to a failure kind. Returns None for 2xx.
    pub fn from_status(status: u16) -> Option<Self> {
        match status {
            200..=299 => None,
            401 | 403 => Some(FailureKind::AuthError),
            500..=599 => Some(FailureKind::ServerError),
            _ => Some(FailureKind::Rejected),
        }
    }
}

impl From<&TelemetryError> for FailureKind {
    fn from(value: &TelemetryError) -> Self {
        match value {
            TelemetryError::InvalidInput(_) | TelemetryError::Config(_) => FailureKind::InvalidInput,
            TelemetryError::SigningError(_) => FailureKind::SigningError,
            TelemetryError::EncodingError(_) => FailureKind::EncodingError,
            TelemetryError::ClientBuild(_) => FailureKind::NetworkError,
        }
    }
}

/// Structured description of a failed publish.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishFailure {
    pub kind: FailureKind,
    pub status: Option<u16>,
    pub detail: String,
}

impl PublishFailure {
    pub fn new(kind: FailureKind, status: Option<u16>, detail: &str) -> Self {
        Self {
            kind,
            status,
            detail: helpers::body_snippet(detail),
        }
    }
}

impl From<TelemetryError> for PublishFailure {
    fn from(value: TelemetryError) -> Self {
        PublishFailure::new(FailureKind::from(&value), None, &value.to_string())
    }
}

/// Result of a single publish call. Every call resolves to exactly one outcome.
#[derive(Debug, Clone, PartialEq)]
pub enum PublishOutcome {
    Success { status: u16, body: String },
    Failure(PublishFailure),
}

impl PublishOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, PublishOutcome::Success { .. })
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            PublishOutcome::Success { .. } => None,
            PublishOutcome::Failure(failure) => Some(failure.kind),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            PublishOutcome::Success { status, .. } => Some(*status),
            PublishOutcome::Failure(failure) => failure.status,
        }
    }
}

impl From<PublishFailure> for PublishOutcome {
    fn from(value: PublishFailure) -> Self {
        PublishOutcome::Failure(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status() {
        assert_eq!(FailureKind::from_status(200), None);
        assert_eq!(FailureKind::from_status(204), None);
        assert_eq!(FailureKind::from_status(401), Some(FailureKind::AuthError));
        assert_eq!(FailureKind::from_status(403), Some(FailureKind::AuthError));
        assert_eq!(FailureKind::from_status(500), Some(FailureKind::ServerError));
        assert_eq!(FailureKind::from_status(503), Some(FailureKind::ServerError));
        assert_eq!(FailureKind::from_status(429), Some(FailureKind::Rejected));
        assert_eq!(FailureKind::from_status(302), Some(FailureKind::Rejected));
    }

    #[test]
    fn test_retryable_kinds() {
        assert!(FailureKind::NetworkError.is_retryable());
        assert!(FailureKind::ServerError.is_retryable());
        assert!(!FailureKind::AuthError.is_retryable());
        assert!(!FailureKind::InvalidInput.is_retryable());
        assert!(!FailureKind::SigningError.is_retryable());
        assert!(!FailureKind::EncodingError.is_retryable());
    }

    #[test]
    fn test_failure_from_error() {
        let failure = PublishFailure::from(TelemetryError::SigningError("empty key".into()));
        assert_eq!(failure.kind, FailureKind::SigningError);
        assert_eq!(failure.status, None);
        assert!(failure.detail.contains("empty key"));

        let outcome = PublishOutcome::from(failure);
        assert!(!outcome.is_success());
        assert_eq!(outcome.failure_kind(), Some(FailureKind::SigningError));
    }
}
