//! Domain layer: wire envelopes, correlation state and policies. No I/O.

pub mod callbacks;
pub mod config;
pub mod endpoint;
pub mod envelope;
pub mod errors;
pub mod mapper;
pub mod retry;
pub mod state;
pub mod stats;
pub mod wait_slot;
