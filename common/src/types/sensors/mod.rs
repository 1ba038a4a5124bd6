pub mod reading;
pub mod sensor_type;

pub use crate::types::sensors::reading::Reading;
pub use crate::types::sensors::sensor_type::SensorType;
