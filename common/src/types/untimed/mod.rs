pub mod measurement;
pub mod xyz;

pub use crate::types::untimed::measurement::Measurement;
pub use crate::types::untimed::xyz::XYZ;
