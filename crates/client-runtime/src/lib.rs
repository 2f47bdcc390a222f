//! # Client Runtime
//!
//! Wires configuration, the RPC layer (SC-01), the transaction codec
//! (SC-02) and the signer (SC-03) into [`SteemClient`].
//!
//! ## Layout
//!
//! - `container/`: [`ClientConfig`] loading, validation and env overrides
//! - `api/`: typed database and broadcast API wrappers
//! - `models.rs`: typed node answers
//! - `builder.rs`: operations behind the convenience calls
//! - `client.rs`: the facade
//!
//! Logging goes through `tracing`; [`init_telemetry`] installs the
//! subscriber once per process.
//!
//! ## Example
//!
//! ```no_run
//! use client_runtime::{init_telemetry, ClientConfig, SteemClient, TelemetryConfig};
//! use sc_03_signing::InMemoryKeyStore;
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! init_telemetry(&TelemetryConfig::from_env())?;
//! let client = SteemClient::new(ClientConfig::from_env(), Arc::new(InMemoryKeyStore::new()))?;
//! let head = client.database().get_dynamic_global_properties().await?;
//! println!("head block {}", head.head_block_number);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod builder;
pub mod client;
pub mod container;
pub mod errors;
pub mod models;

pub use api::database::LATEST_HISTORY_ENTRY;
pub use api::{BroadcastApi, DatabaseApi};
pub use builder::{TransactionBuilder, FOLLOW_PLUGIN_ID, MAX_POST_TAGS};
pub use client::SteemClient;
pub use container::{ClientConfig, ConfigError, EndpointConfig, MAX_TRANSACTION_EXPIRATION_SECS};
pub use errors::ClientError;
pub use sc_telemetry::{init_telemetry, TelemetryConfig, TelemetryError};
pub use models::{
    Account, AccountVote, AppliedOperation, BlockHeader, BroadcastConfirmation, ChainProperties,
    DynamicGlobalProperties, FeedHistory, SignedBlock, SignedBlockHeader, VoteState,
};
