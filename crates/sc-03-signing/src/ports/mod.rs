//! Ports layer: the signing API and the key storage it depends on.

pub mod inbound;
pub mod outbound;
