//! LockedKey: the single polymorphic custody abstraction
//!
//! Three custody schemes (time-locked, RSA-per-center, two-layer AES+Shamir)
//! modeled as one tagged enum; a paper record carries exactly one variant and
//! unlock dispatches on the supplied credentials.
//!
//! Serialized as JSON for ledger storage; binary fields are base64, matching
//! the rest of the wire surface.

use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rsa::RsaPrivateKey;
use serde::{Deserialize, Serialize};

use seal_core::{SealError, SealResult};

use crate::keys::{unwrap_key, wrap_key, ContentKey, MasterKey};
use crate::split::{combine, split, KeyShare};
use crate::timelock::{self, TimeLocked};
use crate::wrap;

pub(crate) fn b64_encode(data: &[u8]) -> String {
    BASE64.encode(data)
}

pub(crate) fn b64_decode(s: &str) -> SealResult<Vec<u8>> {
    BASE64
        .decode(s)
        .map_err(|e| SealError::Decryption(format!("base64 decode: {e}")))
}

/// A content key rendered inaccessible except under its unlock condition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "scheme", rename_all = "snake_case")]
pub enum LockedKey {
    /// K1 wrapped under a key derived from (unlock timestamp, salt).
    TimeLocked(TimeLocked),
    /// K1 wrapped once per recipient under their RSA public key.
    PerRecipient {
        /// recipient id -> base64 RSA-OAEP blob
        entries: BTreeMap<String, String>,
    },
    /// K1 wrapped under K2; K2 Shamir-split across custodians.
    ///
    /// `shares` is populated at lock time for handing out to custodians and
    /// must be stripped (`take_shares`) before the record is persisted;
    /// a record carrying its own shares would defeat the threshold.
    Threshold {
        /// base64 `[iv][ct+tag]` of K1 under K2
        wrapped_key: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        shares: Vec<KeyShare>,
        threshold: u8,
    },
}

/// Credentials presented at unlock time; must match the record's variant.
pub enum UnlockCredentials {
    /// Time lock: nothing beyond the caller's clock.
    Time,
    /// Per-recipient: the requesting center's id and private key.
    RecipientKey {
        recipient_id: String,
        private_key: Box<RsaPrivateKey>,
    },
    /// Threshold: the gathered custodian shares.
    Shares(Vec<KeyShare>),
}

impl LockedKey {
    /// Lock a content key to a future unlock time.
    pub fn time_locked(key: &ContentKey, unlock_timestamp: u64, salt: &str) -> SealResult<Self> {
        Ok(LockedKey::TimeLocked(timelock::lock(
            key,
            unlock_timestamp,
            salt,
        )?))
    }

    /// Wrap the same content key once per recipient.
    ///
    /// `recipients` pairs each recipient id with its registered public key
    /// PEM. An empty recipient set is rejected: it would produce a key
    /// nobody can ever unlock.
    pub fn per_recipient(key: &ContentKey, recipients: &[(String, String)]) -> SealResult<Self> {
        if recipients.is_empty() {
            return Err(SealError::Config(
                "per-recipient lock requires at least one recipient".into(),
            ));
        }

        let mut entries = BTreeMap::new();
        for (id, pem) in recipients {
            let public = wrap::public_key_from_pem(pem)?;
            let blob = wrap::wrap(key.as_bytes(), &public)?;
            entries.insert(id.clone(), b64_encode(&blob));
        }
        Ok(LockedKey::PerRecipient { entries })
    }

    /// Two-layer lock: generate K2, wrap K1 under it, split K2.
    ///
    /// K2 is zeroized before this returns; afterwards only a threshold of
    /// the returned shares can reconstruct it.
    pub fn threshold(key: &ContentKey, total_shares: u8, threshold: u8) -> SealResult<Self> {
        let master = MasterKey::generate()?;
        let wrapped = wrap_key(&master, key)?;
        let shares = split(master.as_bytes(), total_shares, threshold)?;
        // `master` drops (and zeroizes) here.

        Ok(LockedKey::Threshold {
            wrapped_key: b64_encode(&wrapped),
            shares,
            threshold,
        })
    }

    /// Take the custodian share handouts, leaving the record free of them.
    /// Idempotent; non-threshold variants yield an empty vec.
    pub fn take_shares(&mut self) -> Vec<KeyShare> {
        match self {
            LockedKey::Threshold { shares, .. } => std::mem::take(shares),
            _ => Vec::new(),
        }
    }

    /// True once no share material remains embedded.
    pub fn is_persistable(&self) -> bool {
        match self {
            LockedKey::Threshold { shares, .. } => shares.is_empty(),
            _ => true,
        }
    }

    /// Recover the content key with the supplied credentials.
    ///
    /// `now` is the caller's Unix clock, used only by the time-locked
    /// variant. Credentials of the wrong kind for the stored variant are an
    /// `Unwrap` error.
    pub fn unlock(&self, credentials: &UnlockCredentials, now: u64) -> SealResult<ContentKey> {
        match (self, credentials) {
            (LockedKey::TimeLocked(locked), UnlockCredentials::Time) => {
                timelock::unlock(locked, now)
            }
            (
                LockedKey::PerRecipient { entries },
                UnlockCredentials::RecipientKey {
                    recipient_id,
                    private_key,
                },
            ) => {
                let blob_b64 =
                    entries
                        .get(recipient_id)
                        .ok_or_else(|| SealError::RecipientNotFound {
                            id: recipient_id.clone(),
                        })?;
                let blob = b64_decode(blob_b64)?;
                let bytes = wrap::unwrap(&blob, private_key)?;
                key_from_vec(bytes)
            }
            (
                LockedKey::Threshold {
                    wrapped_key,
                    threshold,
                    ..
                },
                UnlockCredentials::Shares(supplied),
            ) => {
                let master_bytes = combine(supplied, *threshold)?;
                let master = master_from_vec(master_bytes)?;
                let wrapped = b64_decode(wrapped_key)?;
                unwrap_key(&master, &wrapped)
            }
            _ => Err(SealError::Unwrap(
                "supplied credentials do not match the key's custody scheme".into(),
            )),
        }
    }

    /// Serialize for ledger storage.
    pub fn to_bytes(&self) -> SealResult<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| SealError::Ledger(format!("locked key encode: {e}")))
    }

    /// Parse a ledger-stored locked key.
    pub fn from_bytes(data: &[u8]) -> SealResult<Self> {
        serde_json::from_slice(data).map_err(|e| SealError::Ledger(format!("locked key decode: {e}")))
    }
}

fn key_from_vec(mut bytes: Vec<u8>) -> SealResult<ContentKey> {
    use zeroize::Zeroize;
    if bytes.len() != crate::KEY_SIZE {
        bytes.zeroize();
        return Err(SealError::Unwrap(format!(
            "unwrapped key has wrong size: {} bytes",
            bytes.len()
        )));
    }
    let mut arr = [0u8; crate::KEY_SIZE];
    arr.copy_from_slice(&bytes);
    bytes.zeroize();
    Ok(ContentKey::from_bytes(arr))
}

fn master_from_vec(mut bytes: Vec<u8>) -> SealResult<MasterKey> {
    use zeroize::Zeroize;
    if bytes.len() != crate::KEY_SIZE {
        bytes.zeroize();
        return Err(SealError::ShareMismatch);
    }
    let mut arr = [0u8; crate::KEY_SIZE];
    arr.copy_from_slice(&bytes);
    bytes.zeroize();
    Ok(MasterKey::from_bytes(arr))
}
