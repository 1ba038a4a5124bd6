//! Sensor-side data model shared by reading producers and the telemetry core.
//!
//! A [`Reading`] is an immutable snapshot of one sampling tick: an ordinal, a
//! timestamp and one [`Measurement`] per [`SensorType`].

pub mod constants;

#[doc(hidden)]
pub mod types;

// Re-export types
#[doc(inline)]
pub use types::{Measurement, Reading, SensorType, XYZ};
