//! seal-storage: content-addressed blob storage for encrypted chunks
//!
//! The pipeline only depends on `put(bytes) -> id` and `get(id) -> bytes`.
//! Ids are content addresses (blake3 of the stored object), so any mirror
//! returning the byte-identical object for an id is acceptable.

pub mod gateway;
pub mod mirror;

pub use gateway::{build_operator, OpendalGateway, StorageGateway};
pub use mirror::MirroredGateway;
