//! End-to-end flows against a local node.

pub mod node;

#[cfg(test)]
mod broadcast;
#[cfg(test)]
mod rpc_flows;
