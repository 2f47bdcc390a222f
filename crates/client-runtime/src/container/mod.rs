//! # Client Container
//!
//! Configuration loading, validation and the per-subsystem values derived
//! from it.

pub mod config;

pub use config::{ClientConfig, ConfigError, EndpointConfig, MAX_TRANSACTION_EXPIRATION_SECS};
