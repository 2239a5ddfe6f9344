//! seal-chunks: fixed-size chunking and the stored-chunk wire shape
//!
//! A paper is split sequentially into chunks of at most `max_chunk_size`
//! bytes (512 KiB by default). The ordered chunk sequence is the only
//! ordering signal for reassembly: storage ids carry no positional metadata.

pub mod chunker;
pub mod wire;

pub use chunker::{chunk_document, DEFAULT_MAX_CHUNK_SIZE};
pub use wire::SealedChunk;
