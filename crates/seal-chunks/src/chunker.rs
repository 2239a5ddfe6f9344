//! Sequential fixed-size chunking

use seal_core::{SealError, SealResult};

/// Default maximum chunk size: 512 KiB.
pub const DEFAULT_MAX_CHUNK_SIZE: usize = 512 * 1024;

/// Split `document` into sequential, non-overlapping chunks of at most
/// `max_chunk_size` bytes. The last chunk may be shorter. An empty document
/// yields an empty sequence.
pub fn chunk_document(document: &[u8], max_chunk_size: usize) -> SealResult<Vec<&[u8]>> {
    if max_chunk_size == 0 {
        return Err(SealError::Config(
            "max_chunk_size must be greater than zero".into(),
        ));
    }
    Ok(document.chunks(max_chunk_size).collect())
}
