//! # Outbound Ports (Driven Ports / SPI)
//!
//! Credential storage is owned by the application; the signer only asks
//! it for keys.

use crate::domain::keys::PrivateKey;
use sc_02_transaction_codec::AuthorityRole;
use shared_types::AccountName;

/// Source of private keys by account and role.
pub trait KeyProvider: Send + Sync {
    /// The key of `account` for `role`, if one is stored.
    fn private_key(&self, account: &AccountName, role: AuthorityRole) -> Option<PrivateKey>;
}
