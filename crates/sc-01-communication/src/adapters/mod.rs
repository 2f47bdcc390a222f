//! Socket adapters.

pub mod websocket;

#[cfg(any(test, feature = "test-utils"))]
pub mod memory;
