use dashmap::DashMap;
use log::debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::constants::REFRESH_MARGIN_DIVISOR;
use crate::models::config::EndpointConfig;
use crate::models::errors::TelemetryError;
use crate::ports::Clock;
use crate::token::issuer::{self, AccessToken};

type TokenSlot = Arc<Mutex<Option<AccessToken>>>;

/// Identifies the credentials a token was signed for. The key is held as a
/// fingerprint so rotating it, or changing the ttl, never reuses an old token.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct SlotKey {
    resource_uri: String,
    key_name: String,
    key_fingerprint: [u8; 32],
    ttl_secs: i64,
}

impl SlotKey {
    fn new(destination: &EndpointConfig) -> Self {
        Self {
            resource_uri: destination.resource_uri(),
            key_name: destination.key_name().to_string(),
            key_fingerprint: destination.key().fingerprint(),
            ttl_secs: destination.ttl_secs(),
        }
    }
}

/// Keeps one live token per `(resource uri, key name, key, ttl)`.
///
/// Each slot is guarded by an async mutex held across a refresh, so callers that
/// find the slot stale while a refresh is running wait for it and reuse its token
/// instead of signing again.
///
/// Slots are kept until [`TokenCache::invalidate`] is called for their destination,
/// so a caller that rotates keys should invalidate the old configuration.
#[derive(Default)]
pub struct TokenCache {
    slots: DashMap<SlotKey, TokenSlot>,
    refreshes: AtomicU64,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached token for `destination`, issuing a new one if it is
    /// missing or within the refresh margin.
    ///
    /// The ttl, key name and key are checked before the cache is consulted, so an
    /// unusable configuration fails even while a valid token is cached.
    pub async fn get(
        &self,
        destination: &EndpointConfig,
        clock: &dyn Clock,
    ) -> Result<AccessToken, TelemetryError> {
        validate(destination)?;
        let slot = self.slot(destination);
        let mut cached = slot.lock().await;
        let now = clock.now_epoch_secs()?;

        if let Some(token) = cached.as_ref() {
            if is_fresh(token, destination.ttl_secs(), now) {
                return Ok(token.clone());
            }
        }

        let token = issuer::issue(
            &destination.resource_uri(),
            destination.key_name(),
            destination.key(),
            destination.ttl_secs(),
            now,
        )?;
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        debug!(
            "Issued token for {} expiring at {}",
            token.resource_uri(),
            token.expiry()
        );
        *cached = Some(token.clone());
        Ok(token)
    }

    /// Drops `rejected` from the cache so the next `get` signs a new token.
    /// Does nothing if the slot already holds a different token.
    pub async fn discard(&self, destination: &EndpointConfig, rejected: &AccessToken) {
        let slot = self.slot(destination);
        let mut cached = slot.lock().await;
        if cached.as_ref() == Some(rejected) {
            debug!("Discarding rejected token for {}", rejected.resource_uri());
            *cached = None;
        }
    }

    /// Forgets the token of `destination` unconditionally and releases its slot.
    pub async fn invalidate(&self, destination: &EndpointConfig) {
        if let Some((_, slot)) = self.slots.remove(&SlotKey::new(destination)) {
            *slot.lock().await = None;
        }
    }

    /// Number of tokens issued since creation.
    pub fn refresh_count(&self) -> u64 {
        self.refreshes.load(Ordering::SeqCst)
    }

    /// Number of destinations with a slot.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn slot(&self, destination: &EndpointConfig) -> TokenSlot {
        Arc::clone(
            &self
                .slots
                .entry(SlotKey::new(destination))
                .or_insert_with(|| Arc::new(Mutex::new(None))),
        )
    }
}

fn validate(destination: &EndpointConfig) -> Result<(), TelemetryError> {
    if destination.ttl_secs() <= 0 {
        return Err(TelemetryError::InvalidInput(format!(
            "Token ttl must be positive, got {}",
            destination.ttl_secs()
        )));
    }
    if destination.key_name().is_empty() {
        return Err(TelemetryError::InvalidInput("Key name is empty".to_string()));
    }
    if destination.key().is_empty() {
        return Err(TelemetryError::SigningError(
            "Signing key is empty".to_string(),
        ));
    }
    Ok(())
}

/// A token is reused while more than `ttl / REFRESH_MARGIN_DIVISOR` seconds remain.
fn is_fresh(token: &AccessToken, ttl_secs: i64, now: u64) -> bool {
    let margin = (ttl_secs / REFRESH_MARGIN_DIVISOR).max(0) as u64;
    token.expiry() > now.saturating_add(margin)
}
