use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level ChainSeal configuration (loaded from seal.toml)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SealConfig {
    pub storage: StorageConfig,
    pub ledger: LedgerConfig,
    pub pipeline: PipelineConfig,
    pub custody: CustodyConfig,
    /// Log level (default: info)
    pub log_level: String,
}

impl Default for SealConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            ledger: LedgerConfig::default(),
            pipeline: PipelineConfig::default(),
            custody: CustodyConfig::default(),
            log_level: "info".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Primary gateway endpoint (S3-compatible or local fs path)
    pub endpoint: String,
    /// S3 region (default: us-east-1)
    pub region: String,
    /// Bucket name for chunk objects
    pub bucket: String,
    /// Public fallback gateway endpoints, tried in order on fetch failure
    pub mirrors: Vec<String>,
    /// Per-fetch timeout in seconds before falling through to the next mirror
    pub fetch_timeout_secs: u64,
    /// Enforce HTTPS for gateway connections
    pub enforce_tls: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            region: "us-east-1".into(),
            bucket: "chainseal".into(),
            mirrors: Vec::new(),
            fetch_timeout_secs: 30,
            enforce_tls: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Path of the local ledger file (demo stand-in for the on-chain registry)
    pub path: PathBuf,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("seal-ledger.json"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Maximum chunk size in bytes (default: 512 KiB)
    pub max_chunk_size: usize,
    /// In-flight chunk uploads/fetches per operation
    pub concurrency: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_chunk_size: 512 * 1024,
            concurrency: 4,
        }
    }
}

/// Defaults for the threshold custody scheme.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CustodyConfig {
    pub total_shares: u8,
    pub threshold: u8,
}

impl Default for CustodyConfig {
    fn default() -> Self {
        Self {
            total_shares: 3,
            threshold: 2,
        }
    }
}

impl SealConfig {
    /// Load configuration from a TOML file. Missing sections fall back to
    /// defaults; a malformed file is a config error.
    pub fn load(path: &Path) -> crate::SealResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: SealConfig = toml::from_str(&raw)
            .map_err(|e| crate::SealError::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> crate::SealResult<()> {
        if self.pipeline.max_chunk_size == 0 {
            return Err(crate::SealError::Config(
                "pipeline.max_chunk_size must be greater than zero".into(),
            ));
        }
        if self.pipeline.concurrency == 0 {
            return Err(crate::SealError::Config(
                "pipeline.concurrency must be greater than zero".into(),
            ));
        }
        if self.custody.threshold == 0 || self.custody.threshold > self.custody.total_shares {
            return Err(crate::SealError::Config(format!(
                "custody threshold {} must be in 1..={}",
                self.custody.threshold, self.custody.total_shares
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = SealConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.pipeline.max_chunk_size, 512 * 1024);
        assert_eq!(config.custody.total_shares, 3);
        assert_eq!(config.custody.threshold, 2);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn load_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seal.toml");
        std::fs::write(
            &path,
            r#"
[storage]
endpoint = "https://gateway.example.com"
mirrors = ["https://mirror-a.example.com", "https://mirror-b.example.com"]

[pipeline]
concurrency = 8
"#,
        )
        .unwrap();

        let config = SealConfig::load(&path).unwrap();
        assert_eq!(config.storage.endpoint, "https://gateway.example.com");
        assert_eq!(config.storage.mirrors.len(), 2);
        assert_eq!(config.pipeline.concurrency, 8);
        // untouched sections keep defaults
        assert_eq!(config.pipeline.max_chunk_size, 512 * 1024);
        assert_eq!(config.custody.threshold, 2);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn zero_chunk_size_rejected() {
        let mut config = SealConfig::default();
        config.pipeline.max_chunk_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn threshold_above_total_rejected() {
        let mut config = SealConfig::default();
        config.custody.threshold = 5;
        config.custody.total_shares = 3;
        assert!(config.validate().is_err());
    }
}
