//! StorageGateway trait and the OpenDAL-backed implementation

use async_trait::async_trait;
use opendal::Operator;

use seal_core::config::StorageConfig;
use seal_core::{SealError, SealResult};

/// Content-addressed blob store.
///
/// `put` returns the object's id (blake3 hex of the bytes); `get` fetches it
/// back. Implementations are caller-owned handles passed into the pipeline,
/// never process-wide singletons.
#[async_trait]
pub trait StorageGateway: Send + Sync {
    async fn put(&self, bytes: &[u8]) -> SealResult<String>;
    async fn get(&self, id: &str) -> SealResult<Vec<u8>>;
}

/// A gateway backed by an OpenDAL Operator (Memory for tests, S3 or local
/// fs for deployment). Objects live under `chunks/{id}`.
#[derive(Clone)]
pub struct OpendalGateway {
    op: Operator,
}

impl OpendalGateway {
    pub fn new(op: Operator) -> Self {
        Self { op }
    }

    /// In-memory gateway for tests and the demo ledger.
    pub fn memory() -> SealResult<Self> {
        let op = Operator::new(opendal::services::Memory::default())
            .map_err(|e| SealError::Storage(format!("memory operator: {e}")))?
            .finish();
        Ok(Self::new(op))
    }

    fn object_path(id: &str) -> String {
        format!("chunks/{id}")
    }
}

#[async_trait]
impl StorageGateway for OpendalGateway {
    async fn put(&self, bytes: &[u8]) -> SealResult<String> {
        let id = blake3::hash(bytes).to_hex().to_string();
        self.op
            .write(&Self::object_path(&id), bytes.to_vec())
            .await
            .map_err(|e| SealError::Storage(format!("put {id}: {e}")))?;
        tracing::debug!(id = %id, bytes = bytes.len(), "stored chunk object");
        Ok(id)
    }

    async fn get(&self, id: &str) -> SealResult<Vec<u8>> {
        let buf = self
            .op
            .read(&Self::object_path(id))
            .await
            .map_err(|e| SealError::Storage(format!("get {id}: {e}")))?;
        Ok(buf.to_bytes().to_vec())
    }
}

/// Build an OpenDAL Operator from storage config.
///
/// Endpoint selection: empty endpoint gives an in-memory store (demo mode),
/// an `fs://` endpoint a local directory, anything else an S3-compatible
/// service. A logging layer plus retries with jitter are applied in all
/// cases, as transient gateway errors are the norm for public mirrors.
pub fn build_operator(cfg: &StorageConfig) -> SealResult<Operator> {
    let op = if cfg.endpoint.is_empty() {
        Operator::new(opendal::services::Memory::default())
            .map_err(|e| SealError::Storage(format!("memory operator: {e}")))?
            .finish()
    } else if let Some(root) = cfg.endpoint.strip_prefix("fs://") {
        let builder = opendal::services::Fs::default().root(root);
        Operator::new(builder)
            .map_err(|e| SealError::Storage(format!("fs operator: {e}")))?
            .finish()
    } else {
        if cfg.endpoint.starts_with("http://") && cfg.enforce_tls {
            return Err(SealError::Config(format!(
                "storage endpoint uses plaintext HTTP ({}) but enforce_tls is enabled",
                cfg.endpoint
            )));
        }
        let builder = opendal::services::S3::default()
            .endpoint(&cfg.endpoint)
            .region(&cfg.region)
            .bucket(&cfg.bucket);
        Operator::new(builder)
            .map_err(|e| SealError::Storage(format!("s3 operator: {e}")))?
            .finish()
    };

    Ok(op
        .layer(opendal::layers::LoggingLayer::default())
        .layer(
            opendal::layers::RetryLayer::new()
                .with_max_times(3)
                .with_jitter(),
        ))
}
