//! Mirrored gateway: ordered fallback across storage endpoints
//!
//! Fetches try the primary first, then each public mirror, with a bounded
//! per-attempt timeout. Because ids are content addresses, a response from
//! any mirror is the byte-identical object. Writes always go to the primary;
//! mirrors are read-side replicas.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use seal_core::{SealError, SealResult};

use crate::gateway::StorageGateway;

pub struct MirroredGateway {
    mirrors: Vec<Arc<dyn StorageGateway>>,
    fetch_timeout: Duration,
}

impl MirroredGateway {
    /// `mirrors` in preference order; the first is the write target.
    pub fn new(mirrors: Vec<Arc<dyn StorageGateway>>, fetch_timeout: Duration) -> SealResult<Self> {
        if mirrors.is_empty() {
            return Err(SealError::Config(
                "mirrored gateway requires at least one endpoint".into(),
            ));
        }
        Ok(Self {
            mirrors,
            fetch_timeout,
        })
    }

    pub fn mirror_count(&self) -> usize {
        self.mirrors.len()
    }
}

#[async_trait]
impl StorageGateway for MirroredGateway {
    async fn put(&self, bytes: &[u8]) -> SealResult<String> {
        self.mirrors[0].put(bytes).await
    }

    async fn get(&self, id: &str) -> SealResult<Vec<u8>> {
        for (i, mirror) in self.mirrors.iter().enumerate() {
            match tokio::time::timeout(self.fetch_timeout, mirror.get(id)).await {
                Ok(Ok(bytes)) => {
                    if i > 0 {
                        tracing::debug!(id = %id, mirror = i, "fetched from fallback mirror");
                    }
                    return Ok(bytes);
                }
                Ok(Err(e)) => {
                    tracing::warn!(id = %id, mirror = i, error = %e, "mirror fetch failed");
                }
                Err(_) => {
                    tracing::warn!(id = %id, mirror = i, "mirror fetch timed out");
                }
            }
        }
        Err(SealError::ChunkFetch { id: id.to_string() })
    }
}
