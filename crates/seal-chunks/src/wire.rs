//! Stored-chunk wire shape
//!
//! Each encrypted chunk is stored as a small JSON object:
//!
//! ```json
//! { "iv": "<base64>", "encryptedData": "<base64>" }
//! ```
//!
//! This is the exact shape the reassembler fetches from the storage gateway,
//! so field names are part of the stored format and must not change.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};

use seal_core::{SealError, SealResult};
use seal_crypto::EncryptedChunk;

/// The serialized form of one encrypted chunk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SealedChunk {
    /// Base64 AES-GCM IV
    pub iv: String,
    /// Base64 ciphertext + tag
    #[serde(rename = "encryptedData")]
    pub encrypted_data: String,
}

impl SealedChunk {
    pub fn from_encrypted(chunk: &EncryptedChunk) -> Self {
        Self {
            iv: BASE64.encode(&chunk.iv),
            encrypted_data: BASE64.encode(&chunk.ciphertext),
        }
    }

    pub fn to_encrypted(&self) -> SealResult<EncryptedChunk> {
        let iv = BASE64
            .decode(&self.iv)
            .map_err(|e| SealError::Decryption(format!("chunk iv base64: {e}")))?;
        let ciphertext = BASE64
            .decode(&self.encrypted_data)
            .map_err(|e| SealError::Decryption(format!("chunk data base64: {e}")))?;
        Ok(EncryptedChunk { iv, ciphertext })
    }

    /// Serialize to the stored JSON object.
    pub fn to_bytes(&self) -> SealResult<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| SealError::Storage(format!("chunk encode: {e}")))
    }

    /// Parse a fetched chunk object.
    pub fn from_bytes(data: &[u8]) -> SealResult<Self> {
        serde_json::from_slice(data)
            .map_err(|e| SealError::Decryption(format!("malformed chunk object: {e}")))
    }
}
