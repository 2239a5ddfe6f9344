//! Per-chunk AES-256-GCM encryption/decryption
//!
//! Every chunk of a paper is encrypted under the paper's single content key
//! with a fresh random 96-bit IV. The stored object is `{iv, ciphertext+tag}`;
//! the wire shape (base64 JSON) lives in seal-chunks.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use rand::rngs::OsRng;
use rand::RngCore;

use seal_core::{SealError, SealResult};

use crate::keys::ContentKey;
use crate::{IV_SIZE, TAG_SIZE};

/// One encrypted chunk: random IV plus GCM ciphertext (tag appended).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedChunk {
    pub iv: Vec<u8>,
    pub ciphertext: Vec<u8>,
}

/// Encrypt a single chunk with AES-256-GCM under the paper's content key.
///
/// A fresh random IV is drawn per call; reusing an IV under the same key
/// would break GCM, so callers never supply one.
pub fn encrypt_chunk(key: &ContentKey, plaintext: &[u8]) -> SealResult<EncryptedChunk> {
    let cipher = Aes256Gcm::new(key.as_bytes().into());

    let mut iv = [0u8; IV_SIZE];
    OsRng
        .try_fill_bytes(&mut iv)
        .map_err(|e| SealError::KeyGeneration(format!("IV generation failed: {e}")))?;

    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&iv), plaintext)
        .map_err(|e| SealError::Encryption(format!("chunk encryption failed: {e}")))?;

    Ok(EncryptedChunk {
        iv: iv.to_vec(),
        ciphertext,
    })
}

/// Decrypt a single chunk.
///
/// Fails with a `Decryption` error on a wrong key, truncated input, or any
/// tag mismatch. Never returns partial plaintext.
pub fn decrypt_chunk(key: &ContentKey, chunk: &EncryptedChunk) -> SealResult<Vec<u8>> {
    if chunk.iv.len() != IV_SIZE {
        return Err(SealError::Decryption(format!(
            "bad IV length: {} bytes (expected {IV_SIZE})",
            chunk.iv.len()
        )));
    }
    if chunk.ciphertext.len() < TAG_SIZE {
        return Err(SealError::Decryption(format!(
            "ciphertext too short: {} bytes (minimum {TAG_SIZE})",
            chunk.ciphertext.len()
        )));
    }

    let cipher = Aes256Gcm::new(key.as_bytes().into());

    cipher
        .decrypt(Nonce::from_slice(&chunk.iv), chunk.ciphertext.as_ref())
        .map_err(|_| {
            SealError::Decryption(
                "chunk decryption failed: wrong key, corrupted data, or tampering".into(),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encrypt_decrypt_roundtrip() {
        let key = ContentKey::generate().unwrap();
        let plaintext = b"question 1: derive the chunk cipher";

        let encrypted = encrypt_chunk(&key, plaintext).unwrap();
        let decrypted = decrypt_chunk(&key, &encrypted).unwrap();

        assert_eq!(&decrypted, plaintext);
    }

    #[test]
    fn encrypt_decrypt_empty() {
        let key = ContentKey::generate().unwrap();

        let encrypted = encrypt_chunk(&key, b"").unwrap();
        let decrypted = decrypt_chunk(&key, &encrypted).unwrap();

        assert_eq!(decrypted, b"");
    }

    #[test]
    fn decrypt_wrong_key_fails() {
        let key1 = ContentKey::generate().unwrap();
        let key2 = ContentKey::generate().unwrap();

        let encrypted = encrypt_chunk(&key1, b"sealed paper contents").unwrap();
        let result = decrypt_chunk(&key2, &encrypted);

        assert!(matches!(result, Err(SealError::Decryption(_))));
    }

    #[test]
    fn fresh_iv_per_call() {
        let key = ContentKey::generate().unwrap();

        let a = encrypt_chunk(&key, b"same plaintext").unwrap();
        let b = encrypt_chunk(&key, b"same plaintext").unwrap();

        assert_ne!(a.iv, b.iv, "each encryption must draw a fresh IV");
        assert_ne!(a.ciphertext, b.ciphertext);
    }

    #[test]
    fn tampered_ciphertext_fails() {
        let key = ContentKey::generate().unwrap();

        let mut encrypted = encrypt_chunk(&key, b"sealed paper contents").unwrap();
        encrypted.ciphertext[0] ^= 0xFF;

        let result = decrypt_chunk(&key, &encrypted);
        assert!(matches!(result, Err(SealError::Decryption(_))));
    }

    #[test]
    fn truncated_ciphertext_fails() {
        let key = ContentKey::generate().unwrap();

        let mut encrypted = encrypt_chunk(&key, b"sealed paper contents").unwrap();
        encrypted.ciphertext.truncate(8);

        let result = decrypt_chunk(&key, &encrypted);
        assert!(matches!(result, Err(SealError::Decryption(_))));
    }

    #[test]
    fn encrypted_size() {
        let key = ContentKey::generate().unwrap();
        let plaintext = vec![0u8; 1000];

        let encrypted = encrypt_chunk(&key, &plaintext).unwrap();

        assert_eq!(encrypted.iv.len(), IV_SIZE);
        // plaintext (1000) + tag (16)
        assert_eq!(encrypted.ciphertext.len(), 1000 + TAG_SIZE);
    }
}
