//! # Transaction Codec Subsystem (SC-02)
//!
//! Canonical, consensus-exact binary serialization of transactions and
//! their ordered operations.
//!
//! ## Architecture
//!
//! - **Domain Layer** (`domain/`): operations, authorities, transactions
//!   and their byte layouts
//! - **Ports Layer** (`ports/`): the [`TransactionCodecApi`] trait
//! - **Service Layer** (`service.rs`): size-checked codec implementation
//!
//! ## Exactness
//!
//! The node rebuilds these bytes independently to verify signatures. A
//! single byte of difference invalidates every signature over the
//! transaction, so layouts are fixed by the network and never by this
//! crate's convenience.

pub mod domain;
pub mod ports;
pub mod service;

pub use domain::authority::{Authority, AuthorityRole, RequiredAuthority};
pub use domain::errors::TransactionError;
pub use domain::extension::Extension;
pub use domain::operations::*;
pub use domain::transaction::{ReferenceBlock, Transaction};
pub use ports::inbound::TransactionCodecApi;
pub use service::{CodecConfig, TransactionCodec, MAX_TRANSACTION_SIZE};
