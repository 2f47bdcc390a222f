//! # Steem Client Test Suite
//!
//! Cross-crate flows driven against a real WebSocket server on
//! `127.0.0.1`, so the tungstenite transport, the correlator and the
//! signer are exercised together.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── node.rs        # scripted local node
//!     ├── rpc_flows.rs   # calls, notices, timeouts, reconnects
//!     └── broadcast.rs   # build, sign and broadcast
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p sc-tests
//! cargo test -p sc-tests integration::rpc_flows::
//! ```

#![allow(dead_code)]

pub mod integration;
