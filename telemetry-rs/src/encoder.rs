//! Module encoder
//!
//! Flattens a [`Reading`] into the ordered `channel -> value` record sent as the
//! request body. Non-finite values are rejected. Negative values are clamped only
//! on channels explicitly listed in the [`ClampPolicy`].

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::HashSet;

use common::constants::AXIS_SUFFIXES;
use common::{Reading, SensorType};

use crate::constants::VIBRATION_CHANNEL;
use crate::models::errors::TelemetryError;

/// Returns `max(0, value)`.
pub fn clamp_negative_to_zero(value: f64) -> f64 {
    if value < 0.0 {
        0.0
    } else {
        value
    }
}

/// Channels considered non-negative by convention, clamped with [`clamp_negative_to_zero`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ClampPolicy {
    non_negative: HashSet<String>,
}

impl ClampPolicy {
    /// Policy that clamps nothing.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn non_negative<I, S>(channels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            non_negative: channels.into_iter().map(Into::into).collect(),
        }
    }

    /// The three accelerometer axes, as reported by the mobile app.
    pub fn accelerometer() -> Self {
        Self::non_negative(
            AXIS_SUFFIXES
                .iter()
                .map(|axis| format!("{}{axis}", SensorType::Accelerometer.channel_prefix())),
        )
    }

    pub fn enable(mut self, channel: &str) -> Self {
        self.non_negative.insert(channel.to_string());
        self
    }

    pub fn disable(mut self, channel: &str) -> Self {
        self.non_negative.remove(channel);
        self
    }

    pub fn applies_to(&self, channel: &str) -> bool {
        self.non_negative.contains(channel)
    }

    pub fn apply(&self, channel: &str, value: f64) -> f64 {
        if self.applies_to(channel) {
            clamp_negative_to_zero(value)
        } else {
            value
        }
    }
}

/// Channel computed from a reading rather than copied from it.
#[derive(Clone, Debug, PartialEq)]
pub enum DerivedChannel {
    /// Euclidean norm of a triaxial sensor's raw (unclamped) value.
    Magnitude { sensor: SensorType, name: String },
}

impl DerivedChannel {
    /// `vibration = sqrt(x² + y² + z²)` of the accelerometer.
    pub fn vibration() -> Self {
        DerivedChannel::Magnitude {
            sensor: SensorType::Accelerometer,
            name: VIBRATION_CHANNEL.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            DerivedChannel::Magnitude { name, .. } => name,
        }
    }

    /// None if the source sensor is absent from `reading` or not triaxial.
    fn compute(&self, reading: &Reading) -> Option<f64> {
        match self {
            DerivedChannel::Magnitude { sensor, .. } => reading
                .get(sensor)
                .and_then(|m| m.as_xyz())
                .map(|xyz| xyz.magnitude()),
        }
    }
}

/// Ordered mapping from channel name to value. Serializes to a JSON object in insertion order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TelemetryPayload {
    channels: Vec<(String, f64)>,
}

impl TelemetryPayload {
    pub fn get(&self, channel: &str) -> Option<f64> {
        self.channels
            .iter()
            .find(|(name, _)| name == channel)
            .map(|(_, value)| *value)
    }

    pub fn names(&self) -> Vec<&str> {
        self.channels.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// JSON body of the request.
    pub fn to_json(&self) -> Result<Vec<u8>, TelemetryError> {
        serde_json::to_vec(self).map_err(|e| TelemetryError::EncodingError(e.to_string()))
    }

    fn insert(&mut self, channel: String, value: f64) -> Result<(), TelemetryError> {
        if channel.is_empty() {
            return Err(TelemetryError::InvalidInput("Empty channel name".to_string()));
        }
        if !value.is_finite() {
            return Err(TelemetryError::InvalidInput(format!(
                "Channel {channel} is not finite: {value}"
            )));
        }
        if self.get(&channel).is_some() {
            return Err(TelemetryError::InvalidInput(format!(
                "Duplicate channel {channel}"
            )));
        }
        self.channels.push((channel, value));
        Ok(())
    }
}

impl Serialize for TelemetryPayload {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.channels.len()))?;
        for (name, value) in &self.channels {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Turns readings into payloads. Deterministic: the same reading always yields the same payload.
#[derive(Clone, Debug, Default)]
pub struct TelemetryEncoder {
    clamp: ClampPolicy,
    derived: Vec<DerivedChannel>,
}

impl TelemetryEncoder {
    pub fn new(clamp: ClampPolicy, derived: Vec<DerivedChannel>) -> Self {
        Self { clamp, derived }
    }

    /// Vibration channel enabled, accelerometer axes clamped.
    pub fn vibration_monitor() -> Self {
        Self::new(ClampPolicy::accelerometer(), vec![DerivedChannel::vibration()])
    }

    pub fn with_clamp_policy(mut self, clamp: ClampPolicy) -> Self {
        self.clamp = clamp;
        self
    }

    pub fn with_derived(mut self, derived: DerivedChannel) -> Self {
        self.derived.push(derived);
        self
    }

    /// Reading channels in reading order, then derived channels.
    ///
    /// # Errors
    /// InvalidInput if the reading is empty, a value is NaN or infinite, or two
    /// channels share a name.
    pub fn encode(&self, reading: &Reading) -> Result<TelemetryPayload, TelemetryError> {
        if reading.is_empty() {
            return Err(TelemetryError::InvalidInput(format!(
                "Reading #{} has no measurements",
                reading.sequence()
            )));
        }

        let mut payload = TelemetryPayload::default();
        for (sensor, measurement) in reading.iter() {
            for (channel, value) in measurement.channels(sensor.channel_prefix()) {
                if !value.is_finite() {
                    return Err(TelemetryError::InvalidInput(format!(
                        "Channel {channel} is not finite: {value}"
                    )));
                }
                let value = self.clamp.apply(&channel, value);
                payload.insert(channel, value)?;
            }
        }

        for derived in &self.derived {
            if let Some(value) = derived.compute(reading) {
                let value = self.clamp.apply(derived.name(), value);
                payload.insert(derived.name().to_string(), value)?;
            }
        }
        Ok(payload)
    }
}
