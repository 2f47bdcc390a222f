//! Service layer: connection lifecycle, classification and correlation.

pub mod classifier;
pub mod connection;
pub mod handler;
