//! Ports layer for the transaction codec.

pub mod inbound;
