//! RSA-OAEP key wrapping for per-center paper delivery
//!
//! Each exam center generates an RSA-2048 keypair on its own device and
//! registers only the PEM public key with the ledger. The private half never
//! leaves the center. Wrapping is for short secrets (a content key), never
//! for document bytes.

use rand::rngs::OsRng;
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;

use seal_core::{SealError, SealResult};

/// RSA modulus size in bits.
pub const RSA_BITS: usize = 2048;

/// Largest input OAEP-SHA256 can wrap under a 2048-bit modulus:
/// 256 - 2*32 - 2 bytes.
pub const MAX_WRAP_INPUT: usize = 190;

/// An exam center's RSA-2048 keypair.
///
/// The private key stays in this struct on the owning device; only
/// `public_key_pem` is ever transmitted (to the ledger registry).
pub struct RecipientKeyPair {
    private_key: RsaPrivateKey,
    public_key_pem: String,
}

impl RecipientKeyPair {
    /// Generate a fresh RSA-2048 keypair.
    pub fn generate() -> SealResult<Self> {
        let private_key = RsaPrivateKey::new(&mut OsRng, RSA_BITS)
            .map_err(|e| SealError::KeyGeneration(format!("RSA key generation failed: {e}")))?;

        let public_key_pem = RsaPublicKey::from(&private_key)
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| SealError::KeyGeneration(format!("public key PEM encoding: {e}")))?;

        Ok(Self {
            private_key,
            public_key_pem,
        })
    }

    pub fn public_key_pem(&self) -> &str {
        &self.public_key_pem
    }

    pub fn private_key(&self) -> &RsaPrivateKey {
        &self.private_key
    }

    /// PEM-encode the private key (PKCS#8) for local-only storage.
    pub fn private_key_pem(&self) -> SealResult<String> {
        let pem = self
            .private_key
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| SealError::KeyGeneration(format!("private key PEM encoding: {e}")))?;
        Ok(pem.to_string())
    }

    /// Reload a keypair from a locally stored PKCS#8 private key PEM.
    pub fn from_private_key_pem(pem: &str) -> SealResult<Self> {
        let private_key = RsaPrivateKey::from_pkcs8_pem(pem)
            .map_err(|e| SealError::Unwrap(format!("invalid private key PEM: {e}")))?;
        let public_key_pem = RsaPublicKey::from(&private_key)
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| SealError::Unwrap(format!("public key PEM encoding: {e}")))?;
        Ok(Self {
            private_key,
            public_key_pem,
        })
    }
}

impl std::fmt::Debug for RecipientKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecipientKeyPair")
            .field("private_key", &"[REDACTED]")
            .field("public_key_pem", &self.public_key_pem)
            .finish()
    }
}

/// Parse a registered public key from its PEM form.
pub fn public_key_from_pem(pem: &str) -> SealResult<RsaPublicKey> {
    RsaPublicKey::from_public_key_pem(pem)
        .map_err(|e| SealError::Unwrap(format!("invalid public key PEM: {e}")))
}

/// Wrap a short secret (a content or master key) under a recipient's public
/// key with RSA-OAEP-SHA256.
pub fn wrap(secret: &[u8], public_key: &RsaPublicKey) -> SealResult<Vec<u8>> {
    if secret.len() > MAX_WRAP_INPUT {
        return Err(SealError::Unwrap(format!(
            "wrap input too large: {} bytes (OAEP limit {MAX_WRAP_INPUT}); \
             wrap a key, not a document",
            secret.len()
        )));
    }

    public_key
        .encrypt(&mut OsRng, Oaep::new::<Sha256>(), secret)
        .map_err(|e| SealError::Unwrap(format!("RSA-OAEP wrap failed: {e}")))
}

/// Unwrap a secret with the recipient's private key.
pub fn unwrap(blob: &[u8], private_key: &RsaPrivateKey) -> SealResult<Vec<u8>> {
    private_key
        .decrypt(Oaep::new::<Sha256>(), blob)
        .map_err(|_| {
            SealError::Unwrap("RSA-OAEP unwrap failed: wrong key or malformed ciphertext".into())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::ContentKey;

    // RSA-2048 generation is slow; share one keypair across tests.
    fn test_keypair() -> &'static RecipientKeyPair {
        use std::sync::OnceLock;
        static PAIR: OnceLock<RecipientKeyPair> = OnceLock::new();
        PAIR.get_or_init(|| RecipientKeyPair::generate().unwrap())
    }

    #[test]
    fn wrap_unwrap_roundtrip() {
        let pair = test_keypair();
        let key = ContentKey::generate().unwrap();

        let public = public_key_from_pem(pair.public_key_pem()).unwrap();
        let wrapped = wrap(key.as_bytes(), &public).unwrap();
        let unwrapped = unwrap(&wrapped, pair.private_key()).unwrap();

        assert_eq!(unwrapped.as_slice(), key.as_bytes());
    }

    #[test]
    fn unwrap_with_wrong_key_fails() {
        let pair = test_keypair();
        let other = RecipientKeyPair::generate().unwrap();

        let public = public_key_from_pem(pair.public_key_pem()).unwrap();
        let wrapped = wrap(&[7u8; 32], &public).unwrap();

        let result = unwrap(&wrapped, other.private_key());
        assert!(matches!(result, Err(SealError::Unwrap(_))));
    }

    #[test]
    fn oversize_input_rejected() {
        let pair = test_keypair();
        let public = public_key_from_pem(pair.public_key_pem()).unwrap();

        let result = wrap(&vec![0u8; MAX_WRAP_INPUT + 1], &public);
        assert!(matches!(result, Err(SealError::Unwrap(_))));
    }

    #[test]
    fn private_key_pem_roundtrip() {
        let pair = test_keypair();
        let pem = pair.private_key_pem().unwrap();

        let reloaded = RecipientKeyPair::from_private_key_pem(&pem).unwrap();
        assert_eq!(reloaded.public_key_pem(), pair.public_key_pem());

        // The reloaded private key still unwraps
        let public = public_key_from_pem(pair.public_key_pem()).unwrap();
        let wrapped = wrap(&[9u8; 32], &public).unwrap();
        let unwrapped = unwrap(&wrapped, reloaded.private_key()).unwrap();
        assert_eq!(unwrapped, vec![9u8; 32]);
    }

    #[test]
    fn malformed_ciphertext_fails() {
        let pair = test_keypair();
        let result = unwrap(b"not an rsa ciphertext", pair.private_key());
        assert!(matches!(result, Err(SealError::Unwrap(_))));
    }
}
