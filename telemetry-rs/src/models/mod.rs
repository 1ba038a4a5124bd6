pub mod attempt;
pub mod config;
pub mod errors;
pub(crate) mod http_client;
pub mod outcome;
pub(crate) mod shutdown;
