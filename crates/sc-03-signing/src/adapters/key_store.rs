//! In-memory key storage.

use crate::domain::errors::SigningError;
use crate::domain::keys::PrivateKey;
use crate::ports::outbound::KeyProvider;
use parking_lot::RwLock;
use sc_02_transaction_codec::AuthorityRole;
use shared_types::AccountName;
use std::collections::HashMap;
use tracing::debug;

/// Keys held in process memory, keyed by (account, role).
#[derive(Debug, Default)]
pub struct InMemoryKeyStore {
    keys: RwLock<HashMap<(AccountName, AuthorityRole), PrivateKey>>,
}

impl InMemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a key, replacing any previous key for the same role.
    pub fn add_key(&self, account: AccountName, role: AuthorityRole, key: PrivateKey) {
        debug!(account = %account, role = %role, "Stored private key");
        self.keys.write().insert((account, role), key);
    }

    /// Parse and store WIF keys for several roles of one account.
    pub fn add_account(
        &self,
        account: &AccountName,
        keys: &[(AuthorityRole, &str)],
    ) -> Result<(), SigningError> {
        let parsed = keys
            .iter()
            .map(|(role, wif)| PrivateKey::from_wif(wif).map(|key| (*role, key)))
            .collect::<Result<Vec<_>, _>>()?;
        for (role, key) in parsed {
            self.add_key(account.clone(), role, key);
        }
        Ok(())
    }

    /// Drop every key of an account. Returns how many were removed.
    pub fn remove_account(&self, account: &AccountName) -> usize {
        let mut keys = self.keys.write();
        let before = keys.len();
        keys.retain(|(owner, _), _| owner != account);
        before - keys.len()
    }

    pub fn contains(&self, account: &AccountName, role: AuthorityRole) -> bool {
        self.keys.read().contains_key(&(account.clone(), role))
    }

    pub fn len(&self) -> usize {
        self.keys.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.read().is_empty()
    }
}

impl KeyProvider for InMemoryKeyStore {
    fn private_key(&self, account: &AccountName, role: AuthorityRole) -> Option<PrivateKey> {
        self.keys.read().get(&(account.clone(), role)).cloned()
    }
}
