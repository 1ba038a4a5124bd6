use crate::types::sensors::SensorType;
use crate::types::untimed::{Measurement, XYZ};

/// Immutable snapshot of every sensor sampled during one tick.
///
/// Measurements keep the order in which they were added. Adding a second
/// measurement for the same sensor replaces the first one.
///
/// # Examples
///
/// ```
/// use common::{Reading, SensorType, XYZ};
///
/// let reading = Reading::new(7, 0.7)
///     .with(SensorType::Accelerometer, XYZ::new([-0.2, 0.1, 9.8]))
///     .with(SensorType::Gyroscope, [0.0, 0.01, 0.0]);
///
/// assert_eq!(reading.sequence(), 7);
/// assert_eq!(reading.len(), 2);
/// assert!(reading.accelerometer().is_some());
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Reading {
    sequence: u64,
    timestamp: f64,
    measurements: Vec<(SensorType, Measurement)>,
}

impl Reading {
    pub fn new(sequence: u64, timestamp: f64) -> Self {
        Self {
            sequence,
            timestamp,
            measurements: Vec::new(),
        }
    }

    pub fn with(mut self, sensor: SensorType, measurement: impl Into<Measurement>) -> Self {
        let measurement = measurement.into();
        match self.measurements.iter_mut().find(|(s, _)| *s == sensor) {
            Some(entry) => entry.1 = measurement,
            None => self.measurements.push((sensor, measurement)),
        }
        self
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    pub fn get(&self, sensor: &SensorType) -> Option<&Measurement> {
        self.measurements
            .iter()
            .find(|(s, _)| s == sensor)
            .map(|(_, m)| m)
    }

    pub fn accelerometer(&self) -> Option<&XYZ> {
        self.get(&SensorType::Accelerometer)
            .and_then(Measurement::as_xyz)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SensorType, &Measurement)> {
        self.measurements.iter().map(|(s, m)| (s, m))
    }

    pub fn len(&self) -> usize {
        self.measurements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.measurements.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use once_cell::sync::Lazy;

    static ACC: Lazy<XYZ> = Lazy::new(|| XYZ::new([-0.2, 0.1, 9.8]));
    static GYRO: Lazy<XYZ> = Lazy::new(|| XYZ::new([0.01, 0.02, 0.03]));

    #[test]
    fn test_reading_keeps_insertion_order() {
        let reading = Reading::new(1, 0.1)
            .with(SensorType::Gyroscope, GYRO.clone())
            .with(SensorType::Accelerometer, ACC.clone());

        let sensors: Vec<&SensorType> = reading.iter().map(|(s, _)| s).collect();
        assert_eq!(
            sensors,
            vec![&SensorType::Gyroscope, &SensorType::Accelerometer]
        );
        assert_eq!(reading.timestamp(), 0.1);
    }

    #[test]
    fn test_reading_replaces_duplicate_sensor() {
        let reading = Reading::new(1, 0.1)
            .with(SensorType::Accelerometer, GYRO.clone())
            .with(SensorType::Accelerometer, ACC.clone());

        assert_eq!(reading.len(), 1);
        assert_eq!(reading.accelerometer(), Some(&*ACC));
    }

    #[test]
    fn test_empty_reading() {
        let reading = Reading::new(0, 0.0);
        assert!(reading.is_empty());
        assert!(reading.accelerometer().is_none());
        assert!(reading.get(&SensorType::Magnetometer).is_none());
    }
}
