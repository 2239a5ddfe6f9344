//! Submission pipeline: chunk → encrypt → store → lock → record

use futures::stream::{self, StreamExt, TryStreamExt};
use rand::distributions::Alphanumeric;
use rand::Rng;
use tracing::{debug, info};

use seal_chunks::{chunk_document, SealedChunk};
use seal_core::types::{CustodyPolicy, PaperId};
use seal_core::{SealError, SealResult};
use seal_crypto::{encrypt_chunk, ContentKey, KeyShare, LockedKey};
use seal_ledger::{Ledger, PaperRecord, RECORD_VERSION};
use seal_storage::StorageGateway;

#[derive(Debug, Clone)]
pub struct SubmitOptions {
    pub exam_name: String,
    pub subject: String,
    /// Maximum chunk size in bytes.
    pub max_chunk_size: usize,
    /// In-flight chunk uploads. Order of the resulting storage ids always
    /// matches chunk order regardless of completion order.
    pub concurrency: usize,
    pub custody: CustodyPolicy,
}

impl SubmitOptions {
    pub fn new(exam_name: impl Into<String>, subject: impl Into<String>, custody: CustodyPolicy) -> Self {
        Self {
            exam_name: exam_name.into(),
            subject: subject.into(),
            max_chunk_size: seal_chunks::DEFAULT_MAX_CHUNK_SIZE,
            concurrency: 4,
            custody,
        }
    }
}

/// What the submitter walks away with. Deliberately excludes any key
/// material other than the threshold share handouts, which exist precisely
/// to leave the submitter's hands.
#[derive(Debug)]
pub struct SubmissionReceipt {
    pub paper_id: PaperId,
    /// Ordered storage ids, mirroring the ledger record.
    pub chunk_ids: Vec<String>,
    pub chunks: usize,
    pub bytes: u64,
    /// Custodian share handouts (threshold custody only). The record on the
    /// ledger carries none of these.
    pub share_handouts: Vec<KeyShare>,
}

/// Seal a paper: encrypt its chunks under a fresh content key, store them,
/// lock the key per the custody policy, and record the paper on the ledger.
///
/// All ephemeral key material (K1, and K2 inside the threshold lock) is
/// zeroized on every path out of this function, success or failure. A
/// failure in any chunk upload cancels the in-flight siblings and persists
/// no record.
pub async fn submit(
    document: &[u8],
    opts: &SubmitOptions,
    store: &dyn StorageGateway,
    ledger: &dyn Ledger,
) -> SealResult<SubmissionReceipt> {
    if opts.concurrency == 0 {
        return Err(SealError::Config("concurrency must be greater than zero".into()));
    }

    let key = ContentKey::generate()?;
    let chunks = chunk_document(document, opts.max_chunk_size)?;
    info!(
        exam = %opts.exam_name,
        bytes = document.len(),
        chunks = chunks.len(),
        "sealing paper"
    );

    // Encrypt and upload with bounded concurrency. `buffered` yields results
    // in input order, so the collected ids are the authoritative chunk
    // ordering; the first error drops the stream and cancels in-flight
    // uploads.
    let key_ref = &key;
    let chunk_ids: Vec<String> = stream::iter(chunks.into_iter().enumerate())
        .map(|(index, chunk)| async move {
            let encrypted = encrypt_chunk(key_ref, chunk)?;
            let object = SealedChunk::from_encrypted(&encrypted).to_bytes()?;
            let id = store.put(&object).await?;
            debug!(index, id = %id, bytes = chunk.len(), "chunk stored");
            Ok::<String, SealError>(id)
        })
        .buffered(opts.concurrency)
        .try_collect()
        .await?;

    // Lock K1 per the custody policy; K1 itself is discarded when `key`
    // drops at the end of this function.
    let (mut locked, unlock_timestamp, custodians) = lock_key(&key, opts, ledger).await?;
    let share_handouts = locked.take_shares();
    debug_assert!(locked.is_persistable());

    let record = PaperRecord {
        version: RECORD_VERSION,
        paper_id: PaperId(0), // assigned by the ledger
        exam_name: opts.exam_name.clone(),
        subject: opts.subject.clone(),
        chunk_ids: chunk_ids.clone(),
        locked_key: String::from_utf8(locked.to_bytes()?)
            .map_err(|e| SealError::Ledger(format!("locked key not utf-8 json: {e}")))?,
        unlock_timestamp,
        custodians,
        created_at: unix_now(),
    };

    let paper_id = ledger.put_paper(record).await?;
    info!(paper = %paper_id, "paper sealed and recorded");

    Ok(SubmissionReceipt {
        paper_id,
        chunks: chunk_ids.len(),
        bytes: document.len() as u64,
        chunk_ids,
        share_handouts,
    })
}

async fn lock_key(
    key: &ContentKey,
    opts: &SubmitOptions,
    ledger: &dyn Ledger,
) -> SealResult<(LockedKey, Option<u64>, Vec<String>)> {
    match &opts.custody {
        CustodyPolicy::TimeLock { unlock_timestamp } => {
            let salt: String = rand::thread_rng()
                .sample_iter(&Alphanumeric)
                .take(13)
                .map(char::from)
                .collect();
            let locked = LockedKey::time_locked(key, *unlock_timestamp, &salt)?;
            Ok((locked, Some(*unlock_timestamp), Vec::new()))
        }
        CustodyPolicy::PerRecipient { recipient_ids } => {
            let mut recipients = Vec::with_capacity(recipient_ids.len());
            for id in recipient_ids {
                let pem = ledger.recipient_key(id).await?;
                recipients.push((id.clone(), pem));
            }
            let locked = LockedKey::per_recipient(key, &recipients)?;
            Ok((locked, None, recipient_ids.clone()))
        }
        CustodyPolicy::Threshold {
            total_shares,
            threshold,
        } => {
            let locked = LockedKey::threshold(key, *total_shares, *threshold)?;
            Ok((locked, None, Vec::new()))
        }
    }
}

fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
