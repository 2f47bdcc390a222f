//! Error type of the client facade.

use crate::container::ConfigError;
use sc_01_communication::{CommunicationError, RequestMethod};
use sc_02_transaction_codec::TransactionError;
use sc_03_signing::SigningError;
use shared_types::TypeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Communication(#[from] CommunicationError),

    #[error(transparent)]
    Transaction(#[from] TransactionError),

    #[error(transparent)]
    Signing(SigningError),

    #[error(transparent)]
    Type(#[from] TypeError),

    /// A local precondition failed before anything was signed or sent.
    #[error("Invalid transaction: {0}")]
    InvalidTransaction(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("No default account configured")]
    NoDefaultAccount,

    /// The node answered a call that always has a value with nothing.
    #[error("The node returned no value for {method}")]
    MissingResult { method: RequestMethod },

    #[error("JSON error: {0}")]
    Json(String),
}

impl From<SigningError> for ClientError {
    fn from(error: SigningError) -> Self {
        match error {
            SigningError::MissingKey { account, role } => {
                Self::InvalidTransaction(format!("no {role} key stored for {account}"))
            }
            SigningError::Transaction(e) => Self::Transaction(e),
            other => Self::Signing(other),
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(error: serde_json::Error) -> Self {
        Self::Json(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sc_02_transaction_codec::AuthorityRole;
    use shared_types::AccountName;

    #[test]
    fn test_missing_key_is_invalid_transaction() {
        let error: ClientError = SigningError::MissingKey {
            account: AccountName::new("steemj").unwrap(),
            role: AuthorityRole::Posting,
        }
        .into();
        assert!(matches!(error, ClientError::InvalidTransaction(ref m) if m == "no posting key stored for steemj"));
    }

    #[test]
    fn test_codec_failure_keeps_its_kind() {
        let error: ClientError = SigningError::Transaction(TransactionError::EmptyOperations).into();
        assert!(matches!(error, ClientError::Transaction(TransactionError::EmptyOperations)));
    }
}
