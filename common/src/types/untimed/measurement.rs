use crate::constants::AXIS_SUFFIXES;
use crate::types::untimed::XYZ;

/// Value reported by a single sensor during one sampling tick.
#[derive(Clone, Debug, PartialEq)]
pub enum Measurement {
    Triaxial(XYZ),
    Scalar(f64),
}

impl Measurement {
    /// Flattens the measurement into `(channel name, value)` pairs.
    ///
    /// A triaxial value of prefix `accelerometer` yields `accelerometerX`,
    /// `accelerometerY` and `accelerometerZ`; a scalar yields the prefix alone.
    pub fn channels(&self, prefix: &str) -> Vec<(String, f64)> {
        match self {
            Measurement::Triaxial(xyz) => AXIS_SUFFIXES
                .iter()
                .zip(xyz.inner())
                .map(|(axis, value)| (format!("{prefix}{axis}"), value))
                .collect(),
            Measurement::Scalar(value) => vec![(prefix.to_string(), *value)],
        }
    }

    pub fn as_xyz(&self) -> Option<&XYZ> {
        match self {
            Measurement::Triaxial(xyz) => Some(xyz),
            Measurement::Scalar(_) => None,
        }
    }
}

impl From<XYZ> for Measurement {
    fn from(value: XYZ) -> Self {
        Measurement::Triaxial(value)
    }
}

impl From<[f64; 3]> for Measurement {
    fn from(value: [f64; 3]) -> Self {
        Measurement::Triaxial(XYZ::from(value))
    }
}

impl From<f64> for Measurement {
    fn from(value: f64) -> Self {
        Measurement::Scalar(value)
    }
}
