//! Shamir threshold splitting of the master key
//!
//! K2 is split into `total_shares` fragments over GF(256); any `threshold` of
//! them reconstruct it exactly, fewer reveal nothing computationally. A 4-byte
//! blake3 checksum is appended to the secret before splitting so that shares
//! accidentally mixed from different splits are detected at combine time
//! instead of yielding a silently wrong key.

use sharks::{Share, Sharks};
use zeroize::Zeroize;

use seal_core::{SealError, SealResult};

const CHECKSUM_LEN: usize = 4;

/// One fragment of a threshold-split secret.
///
/// The first byte of the serialized form is the share's x-coordinate; two
/// shares from the same split never collide on it.
#[derive(Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct KeyShare {
    #[serde(with = "b64_bytes")]
    bytes: Vec<u8>,
}

impl KeyShare {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    fn index(&self) -> Option<u8> {
        self.bytes.first().copied()
    }
}

impl std::fmt::Debug for KeyShare {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyShare")
            .field("index", &self.index())
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Split `secret` into `total_shares` shares with reconstruction threshold
/// `threshold`.
pub fn split(secret: &[u8], total_shares: u8, threshold: u8) -> SealResult<Vec<KeyShare>> {
    if threshold == 0 || threshold > total_shares {
        return Err(SealError::Config(format!(
            "threshold {threshold} must be in 1..={total_shares}"
        )));
    }

    let mut payload = Vec::with_capacity(secret.len() + CHECKSUM_LEN);
    payload.extend_from_slice(secret);
    payload.extend_from_slice(&blake3::hash(secret).as_bytes()[..CHECKSUM_LEN]);

    let sharks = Sharks(threshold);
    let shares: Vec<KeyShare> = sharks
        .dealer(&payload)
        .take(total_shares as usize)
        .map(|share| KeyShare::from_bytes(Vec::from(&share)))
        .collect();
    payload.zeroize();

    Ok(shares)
}

/// Reconstruct the secret from at least `threshold` distinct shares.
///
/// Fails with `InsufficientShares` when too few distinct shares are supplied
/// and with `ShareMismatch` when the shares do not all come from the same
/// split (checksum verification fails).
pub fn combine(shares: &[KeyShare], threshold: u8) -> SealResult<Vec<u8>> {
    let mut parsed: Vec<Share> = Vec::with_capacity(shares.len());
    let mut seen_indexes = std::collections::BTreeSet::new();
    for share in shares {
        let s = Share::try_from(share.as_bytes()).map_err(|reason| {
            tracing::debug!(reason, "share parse failed");
            SealError::ShareMismatch
        })?;
        if seen_indexes.insert(share.index()) {
            parsed.push(s);
        }
    }

    if parsed.len() < threshold as usize {
        return Err(SealError::InsufficientShares {
            have: parsed.len(),
            need: threshold as usize,
        });
    }

    // Count was checked above, so a recover failure means structurally
    // inconsistent shares (e.g. differing lengths across splits).
    let sharks = Sharks(threshold);
    let mut payload = sharks
        .recover(parsed.iter())
        .map_err(|_| SealError::ShareMismatch)?;

    // The payload holds key material; wipe it on every exit.
    if payload.len() < CHECKSUM_LEN {
        payload.zeroize();
        return Err(SealError::ShareMismatch);
    }
    let checksum_ok = {
        let (secret, checksum) = payload.split_at(payload.len() - CHECKSUM_LEN);
        &blake3::hash(secret).as_bytes()[..CHECKSUM_LEN] == checksum
    };
    if !checksum_ok {
        payload.zeroize();
        return Err(SealError::ShareMismatch);
    }

    let secret = payload[..payload.len() - CHECKSUM_LEN].to_vec();
    payload.zeroize();
    Ok(secret)
}

mod b64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(de)?;
        STANDARD.decode(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_combine_roundtrip() {
        let secret = [0xC3u8; 32];
        let shares = split(&secret, 3, 2).unwrap();
        assert_eq!(shares.len(), 3);

        let recovered = combine(&shares[..2], 2).unwrap();
        assert_eq!(recovered, secret);
    }

    #[test]
    fn any_t_subset_recovers() {
        let secret = b"paper master key material".to_vec();
        let shares = split(&secret, 5, 3).unwrap();

        for subset in [[0, 1, 2], [0, 2, 4], [1, 3, 4], [2, 3, 4]] {
            let picked: Vec<KeyShare> = subset.iter().map(|&i| shares[i].clone()).collect();
            assert_eq!(combine(&picked, 3).unwrap(), secret);
        }
    }

    #[test]
    fn below_threshold_fails() {
        let shares = split(&[1u8; 32], 3, 2).unwrap();
        let result = combine(&shares[..1], 2);
        assert!(matches!(
            result,
            Err(SealError::InsufficientShares { have: 1, need: 2 })
        ));
    }

    #[test]
    fn duplicate_shares_do_not_count_twice() {
        let shares = split(&[2u8; 32], 3, 2).unwrap();
        let dupes = vec![shares[0].clone(), shares[0].clone()];
        let result = combine(&dupes, 2);
        assert!(matches!(
            result,
            Err(SealError::InsufficientShares { have: 1, need: 2 })
        ));
    }

    #[test]
    fn mixed_splits_detected() {
        let shares_a = split(&[3u8; 32], 3, 2).unwrap();
        let shares_b = split(&[4u8; 32], 3, 2).unwrap();

        // One share from each split; enough by count, inconsistent by origin.
        // Pick indexes so the x-coordinates differ and both survive dedup.
        let mixed = vec![shares_a[0].clone(), shares_b[1].clone()];
        let result = combine(&mixed, 2);
        assert!(matches!(result, Err(SealError::ShareMismatch)));
    }

    #[test]
    fn undersized_payload_is_a_mismatch() {
        // Shares dealt over a payload shorter than the checksum can only
        // come from outside this module; combine rejects them.
        let sharks = Sharks(2);
        let shares: Vec<KeyShare> = sharks
            .dealer(&[0xAB])
            .take(2)
            .map(|s| KeyShare::from_bytes(Vec::from(&s)))
            .collect();
        let result = combine(&shares, 2);
        assert!(matches!(result, Err(SealError::ShareMismatch)));
    }

    #[test]
    fn zero_threshold_rejected() {
        assert!(split(&[5u8; 32], 3, 0).is_err());
        assert!(split(&[5u8; 32], 2, 3).is_err());
    }

    proptest::proptest! {
        #[test]
        fn arbitrary_secrets_roundtrip(
            secret in proptest::collection::vec(proptest::prelude::any::<u8>(), 1..=64)
        ) {
            let shares = split(&secret, 3, 2).unwrap();
            let recovered = combine(&shares[1..], 2).unwrap();
            proptest::prop_assert_eq!(recovered, secret);
        }
    }
}
