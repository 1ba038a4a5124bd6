//! Destination and credential configuration.
//!
//! Loaded once at startup and shared read-only with the publisher.

use base64::{engine::general_purpose::STANDARD, Engine};
use sha2::{Digest, Sha256};
use std::env;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::constants::{CLIENT_TIMEOUT_DEFAULT_MILLIS, DEFAULT_API_VERSION, DEFAULT_TTL_SECS};
use crate::helpers;
use crate::models::errors::TelemetryError;

pub const ENV_ENDPOINT: &str = "TELEMETRY_ENDPOINT";
pub const ENV_DEVICE_ID: &str = "TELEMETRY_DEVICE_ID";
pub const ENV_KEY_NAME: &str = "TELEMETRY_KEY_NAME";
pub const ENV_SIGNING_KEY: &str = "TELEMETRY_SIGNING_KEY";
pub const ENV_API_VERSION: &str = "TELEMETRY_API_VERSION";
pub const ENV_TTL_SECS: &str = "TELEMETRY_TTL_SECS";
pub const ENV_TIMEOUT_MILLIS: &str = "TELEMETRY_TIMEOUT_MILLIS";

/// Secret used to sign access tokens. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct SigningKey(Vec<u8>);

impl SigningKey {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Decodes a standard base64 key, as found in IoT hub connection strings.
    pub fn from_base64(encoded: &str) -> Result<Self, TelemetryError> {
        STANDARD
            .decode(encoded.trim())
            .map(Self)
            .map_err(|e| TelemetryError::Config(format!("Signing key is not valid base64: {e}")))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn expose(&self) -> &[u8] {
        &self.0
    }

    /// SHA-256 of the key bytes. Tells keys apart without keeping the secret around.
    pub(crate) fn fingerprint(&self) -> [u8; 32] {
        Sha256::digest(&self.0).into()
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningKey(<redacted>)")
    }
}

/// Where and how readings are published.
#[derive(Clone, Debug)]
pub struct EndpointConfig {
    endpoint_base: String,
    device_id: String,
    key_name: String,
    key: Arc<SigningKey>,
    api_version: String,
    ttl_secs: i64,
    timeout: Duration,
}

impl EndpointConfig {
    /// Returns a Config error if the endpoint is not an http(s) URI or the device id is empty.
    pub fn new(
        endpoint_base: &str,
        device_id: &str,
        key_name: &str,
        key: SigningKey,
    ) -> Result<Self, TelemetryError> {
        let endpoint_base = endpoint_base.trim().trim_end_matches('/');
        if !endpoint_base.starts_with("https://") && !endpoint_base.starts_with("http://") {
            return Err(TelemetryError::Config(format!(
                "Endpoint must be an http(s) URI, got '{endpoint_base}'"
            )));
        }
        if device_id.trim().is_empty() {
            return Err(TelemetryError::Config("Device id is empty".to_string()));
        }

        Ok(Self {
            endpoint_base: endpoint_base.to_string(),
            device_id: device_id.trim().to_string(),
            key_name: key_name.to_string(),
            key: Arc::new(key),
            api_version: DEFAULT_API_VERSION.to_string(),
            ttl_secs: DEFAULT_TTL_SECS,
            timeout: Duration::from_millis(CLIENT_TIMEOUT_DEFAULT_MILLIS),
        })
    }

    pub fn with_api_version(mut self, api_version: &str) -> Self {
        self.api_version = api_version.to_string();
        self
    }

    /// Token lifetime. Non-positive values are rejected when a token is issued.
    pub fn with_ttl_secs(mut self, ttl_secs: i64) -> Self {
        self.ttl_secs = ttl_secs;
        self
    }

    /// Upper bound for a single network call.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builds the configuration from `TELEMETRY_*` environment variables.
    ///
    /// `TELEMETRY_ENDPOINT`, `TELEMETRY_DEVICE_ID`, `TELEMETRY_KEY_NAME` and
    /// `TELEMETRY_SIGNING_KEY` (base64) are required.
    pub fn from_env() -> Result<Self, TelemetryError> {
        let key = SigningKey::from_base64(&required_var(ENV_SIGNING_KEY)?)?;
        let mut config = Self::new(
            &required_var(ENV_ENDPOINT)?,
            &required_var(ENV_DEVICE_ID)?,
            &required_var(ENV_KEY_NAME)?,
            key,
        )?;
        if let Ok(api_version) = env::var(ENV_API_VERSION) {
            config = config.with_api_version(&api_version);
        }
        if let Ok(ttl) = env::var(ENV_TTL_SECS) {
            config = config.with_ttl_secs(parse_var(ENV_TTL_SECS, &ttl)?);
        }
        if let Ok(timeout) = env::var(ENV_TIMEOUT_MILLIS) {
            config =
                config.with_timeout(Duration::from_millis(parse_var(ENV_TIMEOUT_MILLIS, &timeout)?));
        }
        Ok(config)
    }

    /// Parses `HostName=..;DeviceId=..;SharedAccessKey=..[;SharedAccessKeyName=..]`.
    ///
    /// The key name defaults to the device id when `SharedAccessKeyName` is absent.
    pub fn from_connection_string(connection_string: &str) -> Result<Self, TelemetryError> {
        let mut host_name = None;
        let mut device_id = None;
        let mut key_name = None;
        let mut key = None;

        for part in connection_string.split(';').filter(|p| !p.trim().is_empty()) {
            let (name, value) = part.split_once('=').ok_or_else(|| {
                TelemetryError::Config(format!("Malformed connection string entry '{part}'"))
            })?;
            match name.trim() {
                "HostName" => host_name = Some(value.trim()),
                "DeviceId" => device_id = Some(value.trim()),
                "SharedAccessKeyName" => key_name = Some(value.trim()),
                "SharedAccessKey" => key = Some(value.trim()),
                _ => {}
            }
        }

        let host_name = host_name
            .ok_or_else(|| TelemetryError::Config("Connection string lacks HostName".to_string()))?;
        let device_id = device_id
            .ok_or_else(|| TelemetryError::Config("Connection string lacks DeviceId".to_string()))?;
        let key = key.ok_or_else(|| {
            TelemetryError::Config("Connection string lacks SharedAccessKey".to_string())
        })?;

        Self::new(
            &format!("https://{host_name}"),
            device_id,
            key_name.unwrap_or(device_id),
            SigningKey::from_base64(key)?,
        )
    }

    pub fn endpoint_base(&self) -> &str {
        &self.endpoint_base
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn key_name(&self) -> &str {
        &self.key_name
    }

    pub fn key(&self) -> &SigningKey {
        &self.key
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    pub fn ttl_secs(&self) -> i64 {
        self.ttl_secs
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Resource the access token is scoped to: `<base>/devices/<deviceId>/messages/events`.
    pub fn resource_uri(&self) -> String {
        format!(
            "{}/devices/{}/messages/events",
            self.endpoint_base,
            helpers::encode_component(&self.device_id)
        )
    }

    /// Target of the POST request, the resource uri plus the api version.
    pub fn events_url(&self) -> String {
        format!(
            "{}?api-version={}",
            self.resource_uri(),
            helpers::encode_component(&self.api_version)
        )
    }
}

fn required_var(name: &str) -> Result<String, TelemetryError> {
    env::var(name).map_err(|_| TelemetryError::Config(format!("{name} is not set")))
}

fn parse_var<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, TelemetryError> {
    value
        .trim()
        .parse()
        .map_err(|_| TelemetryError::Config(format!("{name} has an invalid value '{value}'")))
}
