use thiserror::Error;

pub type SealResult<T> = Result<T, SealError>;

#[derive(Debug, Error)]
pub enum SealError {
    /// Entropy source failure during key generation. Fatal; abort the operation.
    #[error("key generation error: {0}")]
    KeyGeneration(String),

    /// AEAD encryption failure (cipher-internal, e.g. length bookkeeping).
    #[error("encryption error: {0}")]
    Encryption(String),

    /// Wrong key, corrupted ciphertext, or tampering (AEAD tag mismatch).
    /// Never accompanied by partial plaintext.
    #[error("decryption error: {0}")]
    Decryption(String),

    /// RSA unwrap failure: malformed ciphertext or wrong private key.
    #[error("key unwrap error: {0}")]
    Unwrap(String),

    /// Unlock condition not yet met. Expected and retryable, not corruption.
    #[error("key is still time-locked until {unlock_at} (now {now})")]
    StillLocked { unlock_at: u64, now: u64 },

    /// Fewer distinct shares supplied than the split's threshold.
    #[error("insufficient shares: have {have}, need {need}")]
    InsufficientShares { have: usize, need: usize },

    /// Supplied shares do not all come from the same split.
    #[error("share mismatch: shares are not from the same split")]
    ShareMismatch,

    /// All storage mirrors exhausted for one chunk id. Reassembly aborts
    /// rather than returning a truncated document.
    #[error("chunk fetch failed on all mirrors: {id}")]
    ChunkFetch { id: String },

    /// Requester is not among the wrapped recipients (access denied).
    #[error("recipient not found in locked key: {id}")]
    RecipientNotFound { id: String },

    #[error("storage error: {0}")]
    Storage(String),

    #[error("ledger error: {0}")]
    Ledger(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SealError {
    /// True for errors the caller can retry later without anything being wrong
    /// with the stored artifacts (time lock not elapsed, shares still being
    /// gathered).
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SealError::StillLocked { .. } | SealError::InsufficientShares { .. }
        )
    }
}
