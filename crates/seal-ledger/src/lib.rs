//! seal-ledger: the paper-registry collaborator
//!
//! The real registry is an on-chain contract; the pipeline only reads and
//! writes small opaque fields keyed by paper id and does not implement access
//! control — that stays the ledger's responsibility. `MemoryLedger` backs
//! tests and the demo CLI, optionally persisted to a JSON file.

pub mod record;

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use seal_core::types::PaperId;
use seal_core::{SealError, SealResult};

pub use record::{PaperRecord, RECORD_VERSION};

#[async_trait]
pub trait Ledger: Send + Sync {
    /// Store a new record; the ledger assigns and returns the paper id.
    async fn put_paper(&self, record: PaperRecord) -> SealResult<PaperId>;

    async fn get_paper(&self, id: PaperId) -> SealResult<PaperRecord>;

    /// The only permitted mutation: set the unlock time and custodian set
    /// during exam scheduling. Records are never deleted.
    async fn schedule(
        &self,
        id: PaperId,
        unlock_timestamp: u64,
        custodians: Vec<String>,
    ) -> SealResult<()>;

    /// Register an exam center's public key PEM (overwrites a re-registration).
    async fn register_recipient_key(&self, recipient_id: &str, public_key_pem: &str)
        -> SealResult<()>;

    async fn recipient_key(&self, recipient_id: &str) -> SealResult<String>;
}

#[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
struct LedgerState {
    next_id: u64,
    papers: BTreeMap<u64, PaperRecord>,
    recipient_keys: BTreeMap<String, String>,
}

/// In-memory ledger with optional JSON persistence.
#[derive(Default)]
pub struct MemoryLedger {
    state: RwLock<LedgerState>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a JSON file, or start empty if the file does not exist.
    pub fn load_or_default(path: &std::path::Path) -> SealResult<Self> {
        let state = match std::fs::read(path) {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| SealError::Ledger(format!("{}: {e}", path.display())))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => LedgerState::default(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            state: RwLock::new(state),
        })
    }

    /// Write the full state to a JSON file.
    pub async fn persist(&self, path: &std::path::Path) -> SealResult<()> {
        let state = self.state.read().await;
        let bytes = serde_json::to_vec_pretty(&*state)
            .map_err(|e| SealError::Ledger(format!("ledger encode: {e}")))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, bytes)?;
        Ok(())
    }
}

#[async_trait]
impl Ledger for MemoryLedger {
    async fn put_paper(&self, mut record: PaperRecord) -> SealResult<PaperId> {
        let mut state = self.state.write().await;
        let id = PaperId(state.next_id);
        state.next_id += 1;
        record.paper_id = id;
        tracing::info!(paper = %id, chunks = record.chunk_ids.len(), "paper recorded");
        state.papers.insert(id.0, record);
        Ok(id)
    }

    async fn get_paper(&self, id: PaperId) -> SealResult<PaperRecord> {
        let state = self.state.read().await;
        state
            .papers
            .get(&id.0)
            .cloned()
            .ok_or_else(|| SealError::Ledger(format!("unknown paper: {id}")))
    }

    async fn schedule(
        &self,
        id: PaperId,
        unlock_timestamp: u64,
        custodians: Vec<String>,
    ) -> SealResult<()> {
        let mut state = self.state.write().await;
        let record = state
            .papers
            .get_mut(&id.0)
            .ok_or_else(|| SealError::Ledger(format!("unknown paper: {id}")))?;
        record.unlock_timestamp = Some(unlock_timestamp);
        record.custodians = custodians;
        tracing::info!(paper = %id, unlock_at = unlock_timestamp, "paper scheduled");
        Ok(())
    }

    async fn register_recipient_key(
        &self,
        recipient_id: &str,
        public_key_pem: &str,
    ) -> SealResult<()> {
        let mut state = self.state.write().await;
        state
            .recipient_keys
            .insert(recipient_id.to_string(), public_key_pem.to_string());
        Ok(())
    }

    async fn recipient_key(&self, recipient_id: &str) -> SealResult<String> {
        let state = self.state.read().await;
        state
            .recipient_keys
            .get(recipient_id)
            .cloned()
            .ok_or_else(|| SealError::RecipientNotFound {
                id: recipient_id.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_record() -> PaperRecord {
        PaperRecord {
            version: RECORD_VERSION,
            paper_id: PaperId(0),
            exam_name: "exam".into(),
            subject: "subject".into(),
            chunk_ids: vec!["a".into(), "b".into()],
            locked_key: "{}".into(),
            unlock_timestamp: None,
            custodians: vec![],
            created_at: 1,
        }
    }

    #[tokio::test]
    async fn ids_are_assigned_sequentially() {
        let ledger = MemoryLedger::new();
        let id0 = ledger.put_paper(test_record()).await.unwrap();
        let id1 = ledger.put_paper(test_record()).await.unwrap();

        assert_eq!(id0, PaperId(0));
        assert_eq!(id1, PaperId(1));

        let stored = ledger.get_paper(id1).await.unwrap();
        assert_eq!(stored.paper_id, id1);
    }

    #[tokio::test]
    async fn schedule_sets_unlock_and_custodians() {
        let ledger = MemoryLedger::new();
        let id = ledger.put_paper(test_record()).await.unwrap();

        ledger
            .schedule(id, 1_700_000_000, vec!["center-a".into(), "center-b".into()])
            .await
            .unwrap();

        let record = ledger.get_paper(id).await.unwrap();
        assert_eq!(record.unlock_timestamp, Some(1_700_000_000));
        assert_eq!(record.custodians.len(), 2);
    }

    #[tokio::test]
    async fn unknown_paper_is_a_ledger_error() {
        let ledger = MemoryLedger::new();
        let result = ledger.get_paper(PaperId(99)).await;
        assert!(matches!(result, Err(SealError::Ledger(_))));
    }

    #[tokio::test]
    async fn recipient_key_registry() {
        let ledger = MemoryLedger::new();
        ledger
            .register_recipient_key("center-a", "-----BEGIN PUBLIC KEY-----")
            .await
            .unwrap();

        let pem = ledger.recipient_key("center-a").await.unwrap();
        assert!(pem.starts_with("-----BEGIN"));

        let missing = ledger.recipient_key("center-x").await;
        assert!(matches!(
            missing,
            Err(SealError::RecipientNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn persist_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");

        let ledger = MemoryLedger::new();
        let id = ledger.put_paper(test_record()).await.unwrap();
        ledger.persist(&path).await.unwrap();

        let reloaded = MemoryLedger::load_or_default(&path).unwrap();
        let record = reloaded.get_paper(id).await.unwrap();
        assert_eq!(record.exam_name, "exam");

        // ids keep advancing after reload
        let next = reloaded.put_paper(test_record()).await.unwrap();
        assert_eq!(next, PaperId(1));
    }
}
