//! # Crate telemetry-rs
//!
//! ## telemetry-rs
//!
//! The `telemetry-rs` crate publishes sensor readings captured on a phone to a cloud
//! IoT message-ingestion endpoint. Each request is authorized with a shared access
//! signature: a time-bounded token signed with HMAC-SHA256 over the resource path and
//! its expiry.
//!
//! Features include:
//! - Flattening of readings into an ordered JSON record, with a derived `vibration`
//!   channel and optional clamping of non-negative channels.
//! - Token issuing with percent-encoded fields, cached per destination and refreshed
//!   by a single caller when less than a tenth of its lifetime remains.
//! - A structured [`PublishOutcome`] for every publish, so callers choose their retry policy.
//! - A service that publishes readings from a channel concurrently, retrying once on a
//!   rejected token.
//!
//! ```no_run
//! use telemetry_rs::{run_mock_service, EndpointConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let destination = EndpointConfig::from_env().expect("Missing endpoint configuration");
//!     let (handle, service) = run_mock_service(destination, 100, true, 5000).unwrap();
//!     handle.await.unwrap();
//!     println!("{} readings published", service.stats().succeeded());
//! }
//! ```

pub mod adapters;
pub mod constants;
pub mod encoder;
mod helpers;
pub mod models;
pub mod ports;
pub mod services;
pub mod token;

pub use adapters::production::{HttpTelemetryPublisher, SystemClock};
pub use encoder::{ClampPolicy, DerivedChannel, TelemetryEncoder, TelemetryPayload};
pub use models::config::{EndpointConfig, SigningKey};
pub use models::errors::TelemetryError;
pub use models::outcome::{FailureKind, PublishFailure, PublishOutcome};
pub use ports::{Clock, TelemetryPort};
pub use services::{publish_detached, run_mock_service, run_service, TelemetryService};
pub use token::AccessToken;
