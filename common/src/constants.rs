pub const N_XYZ_COORDINATES: usize = 3;

/// Suffixes appended to a sensor channel prefix when a triaxial measurement is flattened.
pub const AXIS_SUFFIXES: [&str; N_XYZ_COORDINATES] = ["X", "Y", "Z"];

pub const ACCELEROMETER_PREFIX: &str = "accelerometer";
pub const GYROSCOPE_PREFIX: &str = "gyroscope";
pub const MAGNETOMETER_PREFIX: &str = "magnetometer";
