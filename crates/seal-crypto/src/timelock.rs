//! Time-locked wrapping of the content key
//!
//! The wrapping key is derived deterministically from the public pair
//! `(unlock_timestamp, salt)` via HKDF-SHA256, so any party holding the
//! record can reconstruct it once it knows the unlock time.
//!
//! The `now < unlock_timestamp` check here is advisory, client-side only:
//! a holder of the stored record can derive the key early. Real enforcement
//! belongs to the ledger/contract layer, which withholds the record fields
//! until the scheduled time.

use hkdf::Hkdf;
use sha2::Sha256;

use seal_core::{SealError, SealResult};

use crate::keys::{unwrap_key, wrap_key, ContentKey, MasterKey};
use crate::KEY_SIZE;

const DERIVE_DOMAIN: &[u8] = b"chainseal-timelock-v1";

/// A content key wrapped under a key derived from its unlock time and salt.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TimeLocked {
    /// `[12-byte iv][ciphertext + tag]` of K1 under the derived key (base64).
    pub wrapped_key: String,
    /// Unix timestamp (seconds) at which unlock is permitted.
    pub unlock_timestamp: u64,
    /// Public salt mixed into the derivation.
    pub salt: String,
}

/// Derive the wrapping key for `(unlock_timestamp, salt)`.
fn derive_wrapping_key(unlock_timestamp: u64, salt: &str) -> SealResult<MasterKey> {
    let hkdf = Hkdf::<Sha256>::new(Some(salt.as_bytes()), DERIVE_DOMAIN);
    let mut info = Vec::with_capacity(DERIVE_DOMAIN.len() + 8);
    info.extend_from_slice(DERIVE_DOMAIN);
    info.extend_from_slice(&unlock_timestamp.to_be_bytes());

    let mut okm = [0u8; KEY_SIZE];
    hkdf.expand(&info, &mut okm)
        .map_err(|e| SealError::KeyGeneration(format!("HKDF expand failed: {e}")))?;
    Ok(MasterKey::from_bytes(okm))
}

/// Lock a content key to an unlock timestamp and salt.
pub fn lock(key: &ContentKey, unlock_timestamp: u64, salt: &str) -> SealResult<TimeLocked> {
    let wrapping = derive_wrapping_key(unlock_timestamp, salt)?;
    let wrapped = wrap_key(&wrapping, key)?;

    Ok(TimeLocked {
        wrapped_key: crate::locked::b64_encode(&wrapped),
        unlock_timestamp,
        salt: salt.to_string(),
    })
}

/// Recover the content key, provided the unlock time has passed.
///
/// `now` is the caller's clock (Unix seconds). Returns `StillLocked` when
/// `now < unlock_timestamp`; this is expected and retryable, not corruption.
pub fn unlock(locked: &TimeLocked, now: u64) -> SealResult<ContentKey> {
    if now < locked.unlock_timestamp {
        return Err(SealError::StillLocked {
            unlock_at: locked.unlock_timestamp,
            now,
        });
    }

    let wrapping = derive_wrapping_key(locked.unlock_timestamp, &locked.salt)?;
    let wrapped = crate::locked::b64_decode(&locked.wrapped_key)?;
    unwrap_key(&wrapping, &wrapped)
}
