//! # Recoverable ECDSA
//!
//! Deterministic (RFC 6979) secp256k1 signatures in the 65-byte compact
//! form the network expects: `27 + recovery_id`, then `r`, then `s`.
//!
//! ## Canonical signatures
//!
//! The node only accepts signatures whose `r` and `s` both encode to 32
//! bytes without a sign bit and without a redundant leading zero. When a
//! signature is not canonical, signing is repeated with 32 bytes of extra
//! nonce data holding the attempt number (little-endian), which keeps the
//! result deterministic for a given key and digest.

use crate::domain::errors::SigningError;
use crate::domain::keys::PrivateKey;
use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, Secp256k1, Signing, Verification};
use shared_types::{CompactSignature, PublicKey};

/// Header byte offset for compact signatures.
pub const RECOVERY_HEADER_BASE: u8 = 27;

/// Upper bound on nonce retries. Each attempt is canonical with
/// probability of roughly one in four.
pub const MAX_CANONICAL_ATTEMPTS: u64 = 1_000;

/// Whether the node accepts this compact signature.
pub fn is_canonical(signature: &CompactSignature) -> bool {
    let c = signature.as_bytes();
    c[1] & 0x80 == 0
        && !(c[1] == 0 && c[2] & 0x80 == 0)
        && c[33] & 0x80 == 0
        && !(c[33] == 0 && c[34] & 0x80 == 0)
}

/// Nonce data for a retry: the attempt number in the first eight bytes.
fn nonce_data(attempt: u64) -> [u8; 32] {
    let mut data = [0u8; 32];
    data[..8].copy_from_slice(&attempt.to_le_bytes());
    data
}

fn to_compact(signature: &RecoverableSignature) -> CompactSignature {
    let (recovery_id, rs) = signature.serialize_compact();
    let mut bytes = [0u8; CompactSignature::LEN];
    // Recovery ids are 0..=3.
    bytes[0] = RECOVERY_HEADER_BASE + recovery_id.to_i32() as u8;
    bytes[1..].copy_from_slice(&rs);
    CompactSignature(bytes)
}

fn from_compact(signature: &CompactSignature) -> Result<RecoverableSignature, SigningError> {
    let header = signature.as_bytes()[0];
    if !(RECOVERY_HEADER_BASE..RECOVERY_HEADER_BASE + 8).contains(&header) {
        return Err(SigningError::InvalidSignature(format!(
            "header byte {header:#04x} out of range"
        )));
    }
    let recovery_id = RecoveryId::from_i32(i32::from(signature.recovery_id()))
        .map_err(|e| SigningError::InvalidSignature(e.to_string()))?;
    RecoverableSignature::from_compact(&signature.as_bytes()[1..], recovery_id)
        .map_err(|e| SigningError::InvalidSignature(e.to_string()))
}

/// A canonical signature together with the attempt that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanonicalSignature {
    pub signature: CompactSignature,
    pub attempts: u64,
}

/// Sign a 32-byte digest, retrying with extra nonce data until canonical.
pub fn sign_digest<C: Signing>(
    secp: &Secp256k1<C>,
    digest: &[u8; 32],
    key: &PrivateKey,
) -> Result<CanonicalSignature, SigningError> {
    let message = Message::from_digest(*digest);

    for attempt in 0..MAX_CANONICAL_ATTEMPTS {
        let signature = if attempt == 0 {
            secp.sign_ecdsa_recoverable(&message, key.secret())
        } else {
            secp.sign_ecdsa_recoverable_with_noncedata(&message, key.secret(), &nonce_data(attempt))
        };
        let compact = to_compact(&signature);
        if is_canonical(&compact) {
            return Ok(CanonicalSignature {
                signature: compact,
                attempts: attempt + 1,
            });
        }
    }
    Err(SigningError::NonCanonical(MAX_CANONICAL_ATTEMPTS))
}

/// Recover the signer's public key from a digest and compact signature.
pub fn recover_public_key<C: Verification>(
    secp: &Secp256k1<C>,
    digest: &[u8; 32],
    signature: &CompactSignature,
) -> Result<PublicKey, SigningError> {
    let recoverable = from_compact(signature)?;
    secp.recover_ecdsa(&Message::from_digest(*digest), &recoverable)
        .map(|key| PublicKey::from_bytes(key.serialize()))
        .map_err(|_| SigningError::RecoveryFailed)
}

/// Check a compact signature against an expected public key.
pub fn verify_signature<C: Verification>(
    secp: &Secp256k1<C>,
    digest: &[u8; 32],
    signature: &CompactSignature,
    expected: &PublicKey,
) -> Result<bool, SigningError> {
    let recoverable = from_compact(signature)?;
    let key = secp256k1::PublicKey::from_slice(expected.as_bytes())
        .map_err(|_| SigningError::InvalidPublicKey)?;
    Ok(secp
        .verify_ecdsa(&Message::from_digest(*digest), &recoverable.to_standard(), &key)
        .is_ok())
}
