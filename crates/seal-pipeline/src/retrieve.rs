//! Retrieval pipeline: record → unlock → fetch → decrypt → reassemble

use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{debug, info};

use seal_chunks::SealedChunk;
use seal_core::types::PaperId;
use seal_core::{SealError, SealResult};
use seal_crypto::{decrypt_chunk, LockedKey, UnlockCredentials};
use seal_ledger::Ledger;
use seal_storage::StorageGateway;

#[derive(Debug, Clone)]
pub struct RetrieveOptions {
    /// In-flight chunk fetches. Decrypted bytes are placed by chunk index,
    /// never by arrival order.
    pub concurrency: usize,
}

impl Default for RetrieveOptions {
    fn default() -> Self {
        Self { concurrency: 4 }
    }
}

/// Recover a sealed paper.
///
/// Unlocks the record's key with the supplied credentials (`now` is the
/// caller's Unix clock, used by the time-locked variant), fetches every chunk
/// (the gateway handles mirror fallback), decrypts, and concatenates in
/// record order. Any chunk failure aborts the whole operation; a partial
/// document is never returned.
pub async fn retrieve(
    paper_id: PaperId,
    credentials: &UnlockCredentials,
    now: u64,
    opts: &RetrieveOptions,
    store: &dyn StorageGateway,
    ledger: &dyn Ledger,
) -> SealResult<Vec<u8>> {
    if opts.concurrency == 0 {
        return Err(SealError::Config("concurrency must be greater than zero".into()));
    }

    let record = ledger.get_paper(paper_id).await?;
    let locked = LockedKey::from_bytes(record.locked_key.as_bytes())?;
    let key = locked.unlock(credentials, now)?;
    info!(paper = %paper_id, chunks = record.chunk_ids.len(), "key unlocked, fetching chunks");

    // Fetch and decrypt with bounded concurrency. Each result carries its
    // chunk index; placement uses that index, so completion order is
    // irrelevant. The first error drops the stream, cancelling in-flight
    // fetches, and nothing partial escapes.
    let key_ref = &key;
    let store_ref = store;
    let decrypted: Vec<(usize, Vec<u8>)> = stream::iter(record.chunk_ids.iter().enumerate())
        .map(|(index, id)| async move {
            let object = store_ref.get(id).await?;
            let chunk = SealedChunk::from_bytes(&object)?.to_encrypted()?;
            let plaintext = decrypt_chunk(key_ref, &chunk)?;
            debug!(index, id = %id, bytes = plaintext.len(), "chunk recovered");
            Ok::<(usize, Vec<u8>), SealError>((index, plaintext))
        })
        .buffered(opts.concurrency)
        .try_collect()
        .await?;

    // Write each chunk into its slot by index, then concatenate.
    let mut slots: Vec<Option<Vec<u8>>> = vec![None; record.chunk_ids.len()];
    for (index, plaintext) in decrypted {
        slots[index] = Some(plaintext);
    }

    let mut document = Vec::new();
    for (index, slot) in slots.into_iter().enumerate() {
        match slot {
            Some(bytes) => document.extend_from_slice(&bytes),
            None => {
                // Unreachable with try_collect semantics, but a truncated
                // document must never leave this function.
                return Err(SealError::ChunkFetch {
                    id: record.chunk_ids[index].clone(),
                });
            }
        }
    }

    info!(paper = %paper_id, bytes = document.len(), "paper reassembled");
    Ok(document)
}
