//! Key types and symmetric key wrapping
//!
//! `ContentKey` (K1) encrypts a paper's chunks; `MasterKey` (K2) wraps K1 in
//! the threshold custody scheme and backs the time-lock derivation. Both are
//! zeroized on drop so ephemeral material does not linger after submission.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroize;

use seal_core::{SealError, SealResult};

use crate::{IV_SIZE, KEY_SIZE, TAG_SIZE};

/// The per-paper 256-bit content key (K1). Zeroized on drop.
#[derive(Clone)]
pub struct ContentKey {
    bytes: [u8; KEY_SIZE],
}

impl ContentKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }

    /// Generate a fresh random content key from the OS entropy source.
    pub fn generate() -> SealResult<Self> {
        let mut bytes = [0u8; KEY_SIZE];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| SealError::KeyGeneration(format!("OS entropy source failed: {e}")))?;
        Ok(Self::from_bytes(bytes))
    }
}

impl Drop for ContentKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for ContentKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// A 256-bit master key (K2). Wraps a content key in the threshold scheme.
/// Zeroized on drop.
#[derive(Clone)]
pub struct MasterKey {
    bytes: [u8; KEY_SIZE],
}

impl MasterKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }

    pub fn generate() -> SealResult<Self> {
        let mut bytes = [0u8; KEY_SIZE];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| SealError::KeyGeneration(format!("OS entropy source failed: {e}")))?;
        Ok(Self::from_bytes(bytes))
    }
}

impl Drop for MasterKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MasterKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Wrap (encrypt) a content key under a master key.
///
/// AES-256-GCM with a random IV. Output: `[12-byte iv][ciphertext + 16-byte tag]`
pub fn wrap_key(master: &MasterKey, content: &ContentKey) -> SealResult<Vec<u8>> {
    let cipher = Aes256Gcm::new(master.as_bytes().into());

    let mut iv = [0u8; IV_SIZE];
    OsRng
        .try_fill_bytes(&mut iv)
        .map_err(|e| SealError::KeyGeneration(format!("IV generation failed: {e}")))?;

    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&iv), content.as_bytes().as_ref())
        .map_err(|e| SealError::Encryption(format!("key wrapping failed: {e}")))?;

    let mut result = Vec::with_capacity(IV_SIZE + ciphertext.len());
    result.extend_from_slice(&iv);
    result.extend_from_slice(&ciphertext);
    Ok(result)
}

/// Unwrap (decrypt) a content key using the master key.
///
/// Input: `[12-byte iv][ciphertext + 16-byte tag]` (output of `wrap_key`)
pub fn unwrap_key(master: &MasterKey, wrapped: &[u8]) -> SealResult<ContentKey> {
    if wrapped.len() < IV_SIZE + KEY_SIZE + TAG_SIZE {
        return Err(SealError::Unwrap(format!(
            "wrapped key too short: {} bytes (expected at least {})",
            wrapped.len(),
            IV_SIZE + KEY_SIZE + TAG_SIZE
        )));
    }

    let (iv, ciphertext) = wrapped.split_at(IV_SIZE);
    let cipher = Aes256Gcm::new(master.as_bytes().into());

    let mut plaintext = cipher
        .decrypt(Nonce::from_slice(iv), ciphertext)
        .map_err(|_| {
            SealError::Unwrap("key unwrapping failed: wrong master key or corrupted data".into())
        })?;

    if plaintext.len() != KEY_SIZE {
        plaintext.zeroize();
        return Err(SealError::Unwrap(format!(
            "unwrapped key has wrong size: {} bytes (expected {KEY_SIZE})",
            plaintext.len()
        )));
    }

    let mut key_bytes = [0u8; KEY_SIZE];
    key_bytes.copy_from_slice(&plaintext);
    plaintext.zeroize();

    Ok(ContentKey::from_bytes(key_bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_keys_are_random() {
        let k1 = ContentKey::generate().unwrap();
        let k2 = ContentKey::generate().unwrap();
        assert_ne!(k1.as_bytes(), k2.as_bytes(), "random keys must differ");
    }

    #[test]
    fn wrap_unwrap_roundtrip() {
        let master = MasterKey::from_bytes([42u8; KEY_SIZE]);
        let content = ContentKey::generate().unwrap();

        let wrapped = wrap_key(&master, &content).unwrap();
        let unwrapped = unwrap_key(&master, &wrapped).unwrap();

        assert_eq!(content.as_bytes(), unwrapped.as_bytes());
    }

    #[test]
    fn unwrap_with_wrong_master_fails() {
        let master1 = MasterKey::from_bytes([1u8; KEY_SIZE]);
        let master2 = MasterKey::from_bytes([2u8; KEY_SIZE]);
        let content = ContentKey::generate().unwrap();

        let wrapped = wrap_key(&master1, &content).unwrap();
        let result = unwrap_key(&master2, &wrapped);

        assert!(matches!(result, Err(SealError::Unwrap(_))));
    }

    #[test]
    fn unwrap_truncated_fails() {
        let master = MasterKey::from_bytes([3u8; KEY_SIZE]);
        let content = ContentKey::generate().unwrap();

        let wrapped = wrap_key(&master, &content).unwrap();
        let result = unwrap_key(&master, &wrapped[..wrapped.len() - 4]);

        assert!(matches!(result, Err(SealError::Unwrap(_))));
    }

    #[test]
    fn wrapped_key_size() {
        let master = MasterKey::from_bytes([4u8; KEY_SIZE]);
        let content = ContentKey::generate().unwrap();
        let wrapped = wrap_key(&master, &content).unwrap();

        // iv (12) + key (32) + tag (16) = 60
        assert_eq!(wrapped.len(), IV_SIZE + KEY_SIZE + TAG_SIZE);
    }

    #[test]
    fn debug_output_redacts_key_material() {
        let key = ContentKey::from_bytes([0xAA; KEY_SIZE]);
        let debug = format!("{key:?}");
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains("170"), "raw bytes must not leak into Debug");
    }
}
