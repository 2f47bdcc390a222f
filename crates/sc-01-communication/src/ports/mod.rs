//! Ports: the RPC contract offered upward and the socket contract required
//! downward.

pub mod inbound;
pub mod outbound;
