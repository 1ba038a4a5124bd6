pub mod sensors;
pub mod untimed;

pub use sensors::{Reading, SensorType};
pub use untimed::{Measurement, XYZ};
