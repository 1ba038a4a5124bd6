use std::fmt;

use crate::constants::SAS_PREFIX;
use crate::helpers;
use crate::models::config::SigningKey;
use crate::models::errors::TelemetryError;
use crate::token::{canonical, signer};

/// Signed, time-bounded capability for a single resource.
///
/// Immutable once issued. `Debug` omits the signature so tokens can be logged.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    resource_uri: String,
    signature: String,
    expiry: u64,
    key_name: String,
}

impl AccessToken {
    pub fn resource_uri(&self) -> &str {
        &self.resource_uri
    }

    /// Base64 signature, before percent-encoding.
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Expiry in seconds since the unix epoch.
    pub fn expiry(&self) -> u64 {
        self.expiry
    }

    pub fn key_name(&self) -> &str {
        &self.key_name
    }

    pub fn is_valid_at(&self, now: u64) -> bool {
        self.expiry > now
    }

    pub fn remaining_secs(&self, now: u64) -> u64 {
        self.expiry.saturating_sub(now)
    }

    /// `SharedAccessSignature sr=<uri>&sig=<sig>&se=<expiry>&skn=<name>`, every field percent-encoded.
    pub fn to_header_value(&self) -> String {
        format!(
            "{SAS_PREFIX} sr={}&sig={}&se={}&skn={}",
            helpers::encode_component(&self.resource_uri),
            helpers::encode_component(&self.signature),
            self.expiry,
            helpers::encode_component(&self.key_name)
        )
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("resource_uri", &self.resource_uri)
            .field("expiry", &self.expiry)
            .field("key_name", &self.key_name)
            .finish_non_exhaustive()
    }
}

/// Issues a token for `resource_uri` valid until `now + ttl_secs`.
///
/// # Errors
/// - InvalidInput if `ttl_secs <= 0`, the key name is empty or the uri path is unusable
/// - SigningError if the key is empty
pub fn issue(
    resource_uri: &str,
    key_name: &str,
    key: &SigningKey,
    ttl_secs: i64,
    now: u64,
) -> Result<AccessToken, TelemetryError> {
    if ttl_secs <= 0 {
        return Err(TelemetryError::InvalidInput(format!(
            "Token ttl must be positive, got {ttl_secs}"
        )));
    }
    if key_name.is_empty() {
        return Err(TelemetryError::InvalidInput("Key name is empty".to_string()));
    }
    let expiry = now
        .checked_add(ttl_secs as u64)
        .ok_or_else(|| TelemetryError::InvalidInput("Token expiry overflows".to_string()))?;

    let path = canonical::resource_path(resource_uri)?;
    let message = canonical::canonicalize(&path, expiry)?;
    let signature = signer::encode(&signer::sign(message.as_bytes(), key.expose())?);

    Ok(AccessToken {
        resource_uri: resource_uri.to_string(),
        signature,
        expiry,
        key_name: key_name.to_string(),
    })
}
