//! # Signing Subsystem (SC-03)
//!
//! Computes signing digests over the codec's canonical bytes and produces
//! canonical, recoverable secp256k1 signatures.
//!
//! ## Architecture
//!
//! This subsystem follows hexagonal architecture:
//! - **Domain Layer** (`domain/`): WIF keys, digests, ECDSA, no I/O
//! - **Ports Layer** (`ports/`): [`SigningApi`] and the [`KeyProvider`] it
//!   depends on
//! - **Adapters** (`adapters/`): in-memory key storage
//! - **Service Layer** (`service.rs`): [`SigningService`]
//!
//! ## Security Notes
//!
//! - Signatures are deterministic (RFC 6979), so identical inputs always
//!   give identical signed bytes.
//! - Authority thresholds are not evaluated locally; ask the node via
//!   `verify_authority`.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::key_store::InMemoryKeyStore;
pub use domain::digest::{signing_digest, transaction_id};
pub use domain::ecdsa::{is_canonical, recover_public_key, sign_digest, verify_signature};
pub use domain::errors::SigningError;
pub use domain::keys::PrivateKey;
pub use ports::inbound::SigningApi;
pub use ports::outbound::KeyProvider;
pub use service::SigningService;
