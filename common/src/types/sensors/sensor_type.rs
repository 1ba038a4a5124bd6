use std::fmt;

use crate::constants::{ACCELEROMETER_PREFIX, GYROSCOPE_PREFIX, MAGNETOMETER_PREFIX};

/// Represents different types of sensors.
///
/// # Variants
///
/// - `Accelerometer`: three-axis acceleration.
/// - `Gyroscope`: three-axis rotation rate.
/// - `Magnetometer`: three-axis magnetic field.
/// - `Other(String)`: any other sensor, named by its channel prefix.
///
/// # Examples
///
/// ```
/// use common::SensorType;
///
/// assert_eq!(SensorType::Gyroscope.channel_prefix(), "gyroscope");
///
/// let sensor = SensorType::Other(String::from("pressure"));
/// assert_eq!(sensor.to_string(), "pressure");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum SensorType {
    Accelerometer,
    Gyroscope,
    Magnetometer,
    Other(String),
}

impl SensorType {
    /// Prefix used to name the payload channels produced by this sensor.
    pub fn channel_prefix(&self) -> &str {
        match self {
            SensorType::Accelerometer => ACCELEROMETER_PREFIX,
            SensorType::Gyroscope => GYROSCOPE_PREFIX,
            SensorType::Magnetometer => MAGNETOMETER_PREFIX,
            SensorType::Other(name) => name.as_str(),
        }
    }
}

impl fmt::Display for SensorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.channel_prefix())
    }
}
