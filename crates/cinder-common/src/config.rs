//! Configuration structures for CinderDB.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Storage configuration for the database engine core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path to the data file.
    pub data_path: PathBuf,
    /// Buffer pool size in number of frames.
    pub pool_size: usize,
    /// K for the LRU-K replacement policy (1 degenerates to plain LRU).
    pub replacer_k: usize,
    /// Initial per-bucket capacity for the extendible hash directory.
    pub bucket_size: usize,
    /// Enable fsync after page writes.
    pub fsync_enabled: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("./cinder.db"),
            pool_size: 1024,
            replacer_k: 2,
            bucket_size: 4,
            fsync_enabled: true,
        }
    }
}

impl StorageConfig {
    /// Returns the total buffer pool size in bytes.
    pub fn pool_size_bytes(&self) -> usize {
        self.pool_size * crate::page::PAGE_SIZE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_config_defaults() {
        let config = StorageConfig::default();
        assert_eq!(config.data_path, PathBuf::from("./cinder.db"));
        assert_eq!(config.pool_size, 1024);
        assert_eq!(config.replacer_k, 2);
        assert_eq!(config.bucket_size, 4);
        assert!(config.fsync_enabled);
    }

    #[test]
    fn test_pool_size_bytes() {
        let config = StorageConfig::default();
        assert_eq!(config.pool_size_bytes(), 1024 * 4096);

        let config = StorageConfig {
            pool_size: 16,
            ..Default::default()
        };
        assert_eq!(config.pool_size_bytes(), 16 * 4096);
    }

    #[test]
    fn test_storage_config_serde_roundtrip() {
        let original = StorageConfig {
            pool_size: 64,
            replacer_k: 3,
            ..Default::default()
        };
        let serialized = serde_json::to_string(&original).unwrap();
        let deserialized: StorageConfig = serde_json::from_str(&serialized).unwrap();

        assert_eq!(original.data_path, deserialized.data_path);
        assert_eq!(original.pool_size, deserialized.pool_size);
        assert_eq!(original.replacer_k, deserialized.replacer_k);
        assert_eq!(original.bucket_size, deserialized.bucket_size);
        assert_eq!(original.fsync_enabled, deserialized.fsync_enabled);
    }
}
