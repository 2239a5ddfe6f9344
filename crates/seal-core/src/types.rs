use serde::{Deserialize, Serialize};

/// Ledger-assigned paper identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaperId(pub u64);

impl std::fmt::Display for PaperId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "paper-{}", self.0)
    }
}

/// Which key-custody scheme seals a paper's content key.
///
/// The three schemes are selectable strategies; a paper record carries
/// exactly one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustodyPolicy {
    /// Content key wrapped under a key derived from (unlock timestamp, salt).
    /// Enforcement of the timestamp is the ledger's job; the local check is
    /// advisory only.
    TimeLock { unlock_timestamp: u64 },
    /// Content key wrapped once per recipient under their RSA public key.
    PerRecipient { recipient_ids: Vec<String> },
    /// Content key wrapped under a random master key, master key Shamir-split
    /// across custodians.
    Threshold { total_shares: u8, threshold: u8 },
}

/// Lifecycle of a paper through the submission and retrieval pipelines.
///
/// Forward-only on the submission side; retrieval is an independent path
/// starting from `Stored`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaperPhase {
    /// Plaintext in memory, nothing persisted.
    Submitted,
    /// Chunks encrypted, content key still in memory.
    Encrypted,
    /// Locked key produced, plaintext content key discarded.
    KeyLocked,
    /// Chunk ids and locked key on the ledger, all ephemeral key material
    /// wiped from the submitting process. Terminal for submission.
    Stored,
    /// An authorized party recovered the content key.
    Unwrapped,
    /// Document bytes recovered and verified.
    Reassembled,
}

/// A positioned reference to one stored chunk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkRef {
    /// Zero-based position within the document. The ordered `chunk_ids`
    /// sequence on the ledger is the ordering authority; this index is
    /// carried for pipeline bookkeeping, never stored in the id itself.
    pub index: u64,
    /// Content-addressed storage id (blake3 hex of the stored object).
    pub storage_id: String,
    /// Plaintext length of this chunk in bytes.
    pub plaintext_len: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paper_id_display() {
        assert_eq!(PaperId(7).to_string(), "paper-7");
    }

    #[test]
    fn custody_policy_serde_roundtrip() {
        let policies = vec![
            CustodyPolicy::TimeLock {
                unlock_timestamp: 1700000000,
            },
            CustodyPolicy::PerRecipient {
                recipient_ids: vec!["center-a".into(), "center-b".into()],
            },
            CustodyPolicy::Threshold {
                total_shares: 3,
                threshold: 2,
            },
        ];
        for policy in policies {
            let json = serde_json::to_string(&policy).unwrap();
            let back: CustodyPolicy = serde_json::from_str(&json).unwrap();
            assert_eq!(back, policy);
        }
    }
}
