//! Adapters for the outbound ports.

pub mod key_store;
