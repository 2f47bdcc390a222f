//! # Private Keys
//!
//! secp256k1 secret keys and their Wallet Import Format:
//! base58(`0x80` || key || first four bytes of double SHA-256).

use crate::domain::errors::SigningError;
use secp256k1::{Secp256k1, SecretKey, Signing};
use sha2::{Digest, Sha256};
use shared_types::PublicKey;
use std::fmt;
use std::str::FromStr;

/// WIF version byte for main network private keys.
pub const WIF_VERSION: u8 = 0x80;

const SECRET_LEN: usize = 32;
const CHECKSUM_LEN: usize = 4;
/// Suffix some wallets append to mark a compressed public key.
const COMPRESSED_FLAG: u8 = 0x01;

/// A private key used to sign transactions.
#[derive(Clone, PartialEq, Eq)]
pub struct PrivateKey {
    secret: SecretKey,
}

impl PrivateKey {
    pub fn from_bytes(bytes: &[u8; SECRET_LEN]) -> Result<Self, SigningError> {
        SecretKey::from_slice(bytes)
            .map(|secret| Self { secret })
            .map_err(|_| SigningError::InvalidPrivateKey)
    }

    pub fn from_wif(wif: &str) -> Result<Self, SigningError> {
        let raw = bs58::decode(wif.trim())
            .into_vec()
            .map_err(|e| SigningError::InvalidWif(e.to_string()))?;

        let body_len = raw
            .len()
            .checked_sub(CHECKSUM_LEN)
            .ok_or_else(|| SigningError::InvalidWif("too short".to_string()))?;
        let (body, checksum) = raw.split_at(body_len);
        if checksum != wif_checksum(body) {
            return Err(SigningError::ChecksumMismatch);
        }

        let secret = match body {
            [WIF_VERSION, key @ ..] if key.len() == SECRET_LEN => key,
            [WIF_VERSION, key @ .., COMPRESSED_FLAG] if key.len() == SECRET_LEN => key,
            [WIF_VERSION, ..] => {
                return Err(SigningError::InvalidWif(format!("unexpected length {}", raw.len())))
            }
            _ => return Err(SigningError::InvalidWif("wrong version byte".to_string())),
        };

        SecretKey::from_slice(secret)
            .map(|secret| Self { secret })
            .map_err(|_| SigningError::InvalidPrivateKey)
    }

    pub fn to_wif(&self) -> String {
        let mut payload = Vec::with_capacity(1 + SECRET_LEN + CHECKSUM_LEN);
        payload.push(WIF_VERSION);
        payload.extend_from_slice(&self.secret.secret_bytes());
        let checksum = wif_checksum(&payload);
        payload.extend_from_slice(&checksum);
        bs58::encode(payload).into_string()
    }

    /// Compressed public key of this private key.
    pub fn public_key_with<C: Signing>(&self, secp: &Secp256k1<C>) -> PublicKey {
        PublicKey::from_bytes(self.secret.public_key(secp).serialize())
    }

    /// Same as [`public_key_with`](Self::public_key_with) using a
    /// short-lived signing context.
    pub fn public_key(&self) -> PublicKey {
        self.public_key_with(&Secp256k1::signing_only())
    }

    pub(crate) fn secret(&self) -> &SecretKey {
        &self.secret
    }
}

impl FromStr for PrivateKey {
    type Err = SigningError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_wif(s)
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(<redacted>)")
    }
}

fn wif_checksum(payload: &[u8]) -> [u8; CHECKSUM_LEN] {
    let digest = Sha256::digest(Sha256::digest(payload));
    let mut out = [0u8; CHECKSUM_LEN];
    out.copy_from_slice(&digest[..CHECKSUM_LEN]);
    out
}
