//! Versioned paper record
//!
//! One versioned struct with explicit optional fields per custody variant,
//! not several incompatible shapes; the version field leaves room for the
//! schema to evolve without breaking stored records.

use serde::{Deserialize, Serialize};

use seal_core::types::PaperId;

pub const RECORD_VERSION: u32 = 1;

/// Ledger-held record for one sealed paper.
///
/// Created on submission; mutated only by `Ledger::schedule` (unlock time and
/// custodians); never deleted. `chunk_ids` order is the sole ordering
/// authority for reassembly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaperRecord {
    pub version: u32,
    pub paper_id: PaperId,
    pub exam_name: String,
    pub subject: String,
    /// Ordered storage ids of the encrypted chunks.
    pub chunk_ids: Vec<String>,
    /// Serialized LockedKey (JSON text).
    pub locked_key: String,
    /// Unlock time, present for the time-locked variant and once scheduled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unlock_timestamp: Option<u64>,
    /// Custodian / recipient identities authorized for this paper.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub custodians: Vec<String>,
    /// Submission time (Unix seconds).
    pub created_at: u64,
}

impl PaperRecord {
    pub fn to_bytes(&self) -> seal_core::SealResult<Vec<u8>> {
        serde_json::to_vec(self)
            .map_err(|e| seal_core::SealError::Ledger(format!("record encode: {e}")))
    }

    pub fn from_bytes(data: &[u8]) -> seal_core::SealResult<Self> {
        serde_json::from_slice(data)
            .map_err(|e| seal_core::SealError::Ledger(format!("record decode: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_roundtrip() {
        let record = PaperRecord {
            version: RECORD_VERSION,
            paper_id: PaperId(3),
            exam_name: "Final Semester Math 2026".into(),
            subject: "Advanced Calculus".into(),
            chunk_ids: vec!["id0".into(), "id1".into(), "id2".into()],
            locked_key: r#"{"scheme":"time_locked"}"#.into(),
            unlock_timestamp: Some(1_700_000_000),
            custodians: vec!["center-a".into()],
            created_at: 1_699_000_000,
        };

        let bytes = record.to_bytes().unwrap();
        let restored = PaperRecord::from_bytes(&bytes).unwrap();

        assert_eq!(restored.paper_id, PaperId(3));
        assert_eq!(restored.chunk_ids.len(), 3);
        assert_eq!(restored.unlock_timestamp, Some(1_700_000_000));
    }

    #[test]
    fn optional_fields_absent_when_empty() {
        let record = PaperRecord {
            version: RECORD_VERSION,
            paper_id: PaperId(1),
            exam_name: "n".into(),
            subject: "s".into(),
            chunk_ids: vec![],
            locked_key: "{}".into(),
            unlock_timestamp: None,
            custodians: vec![],
            created_at: 0,
        };

        let json = String::from_utf8(record.to_bytes().unwrap()).unwrap();
        assert!(!json.contains("unlock_timestamp"));
        assert!(!json.contains("custodians"));
    }
}
