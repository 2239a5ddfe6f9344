//! seal-crypto: key custody for sealed exam papers
//!
//! Key hierarchy:
//! ```text
//! Content Key K1 (256-bit random, one per paper)
//!   └── encrypts every chunk: AES-256-GCM, fresh 96-bit IV per chunk
//! K1 is never persisted in plaintext. It is stored as a LockedKey:
//!   ├── TimeLocked:    K1 wrapped under HKDF(salt, unlock_timestamp)
//!   ├── PerRecipient:  K1 wrapped under each exam center's RSA-2048 key (OAEP)
//!   └── Threshold:     K1 wrapped under master key K2; K2 Shamir-split t-of-n
//! ```
//!
//! The submitting party deliberately discards K1 (and K2) once the locked key
//! is produced; after that point no single party can decrypt except through
//! the variant's unlock condition.

pub mod cipher;
pub mod keys;
pub mod locked;
pub mod split;
pub mod timelock;
pub mod wrap;

pub use cipher::{decrypt_chunk, encrypt_chunk, EncryptedChunk};
pub use keys::{unwrap_key, wrap_key, ContentKey, MasterKey};
pub use locked::{LockedKey, UnlockCredentials};
pub use split::{combine, split, KeyShare};
pub use timelock::TimeLocked;
pub use wrap::RecipientKeyPair;

/// Size of a content or master key in bytes (256-bit)
pub const KEY_SIZE: usize = 32;

/// Size of an AES-GCM IV (96-bit)
pub const IV_SIZE: usize = 12;

/// Size of a GCM authentication tag
pub const TAG_SIZE: usize = 16;
