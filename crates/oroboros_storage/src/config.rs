//! # Storage Configuration
//!
//! Tunables for the arena and the sparse sets. Loaded once at world start,
//! usually from the `[storage]` table of the engine's TOML config.
//!
//! ```toml
//! arena_block_bytes = 1048576
//! data_page_bytes = 4096
//! initial_entity_capacity = 4096
//! growth_factor = 2.0
//! scratch_pool_limit = 64
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{StorageError, StorageResult};

/// Configuration for arena and sparse-set storage.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Size of each arena block in bytes. Must be a power of two.
    pub arena_block_bytes: usize,
    /// Size of each sparse-set data page in bytes. Must be a power of two.
    pub data_page_bytes: usize,
    /// Number of entity ids the sparse-set page tables cover up front.
    pub initial_entity_capacity: usize,
    /// Capacity multiplier used when containers grow.
    pub growth_factor: f32,
    /// Maximum number of idle buffers kept by a scratch arena.
    pub scratch_pool_limit: usize,
}

impl StorageConfig {
    /// Default arena block: 1 MiB.
    pub const DEFAULT_ARENA_BLOCK_BYTES: usize = 1 << 20;

    /// Default data page: 4 KiB.
    pub const DEFAULT_DATA_PAGE_BYTES: usize = 4096;

    /// Smallest arena block accepted by [`validate`](Self::validate).
    pub const MIN_ARENA_BLOCK_BYTES: usize = 256;

    /// Parses a configuration from TOML text and validates it.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::ConfigParse`] for malformed TOML and
    /// [`StorageError::InvalidConfig`] for out-of-range values.
    pub fn from_toml_str(text: &str) -> StorageResult<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| StorageError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::ConfigIo`] if the file cannot be read, plus
    /// everything [`from_toml_str`](Self::from_toml_str) can return.
    pub fn load<P: AsRef<Path>>(path: P) -> StorageResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())
            .map_err(|e| StorageError::ConfigIo(e.to_string()))?;
        Self::from_toml_str(&text)
    }

    /// Checks that every value is in range.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidConfig`] naming the first bad field.
    pub fn validate(&self) -> StorageResult<()> {
        if !self.arena_block_bytes.is_power_of_two()
            || self.arena_block_bytes < Self::MIN_ARENA_BLOCK_BYTES
        {
            return Err(StorageError::InvalidConfig(format!(
                "arena_block_bytes must be a power of two >= {}, got {}",
                Self::MIN_ARENA_BLOCK_BYTES,
                self.arena_block_bytes
            )));
        }
        if !self.data_page_bytes.is_power_of_two() {
            return Err(StorageError::InvalidConfig(format!(
                "data_page_bytes must be a power of two, got {}",
                self.data_page_bytes
            )));
        }
        if !(self.growth_factor > 1.0) {
            return Err(StorageError::InvalidConfig(format!(
                "growth_factor must be greater than 1.0, got {}",
                self.growth_factor
            )));
        }
        Ok(())
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            arena_block_bytes: Self::DEFAULT_ARENA_BLOCK_BYTES,
            data_page_bytes: Self::DEFAULT_DATA_PAGE_BYTES,
            initial_entity_capacity: 4096,
            growth_factor: 2.0,
            scratch_pool_limit: 64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(StorageConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = StorageConfig::from_toml_str("data_page_bytes = 8192\n").unwrap();
        assert_eq!(config.data_page_bytes, 8192);
        assert_eq!(
            config.arena_block_bytes,
            StorageConfig::DEFAULT_ARENA_BLOCK_BYTES
        );
    }

    #[test]
    fn test_rejects_bad_values() {
        let err = StorageConfig::from_toml_str("data_page_bytes = 1000\n").unwrap_err();
        assert!(matches!(err, StorageError::InvalidConfig(_)));

        let err = StorageConfig::from_toml_str("growth_factor = 1.0\n").unwrap_err();
        assert!(matches!(err, StorageError::InvalidConfig(_)));

        let err = StorageConfig::from_toml_str("arena_block_bytes = 64\n").unwrap_err();
        assert!(matches!(err, StorageError::InvalidConfig(_)));
    }

    #[test]
    fn test_rejects_malformed_toml() {
        let err = StorageConfig::from_toml_str("data_page_bytes = [").unwrap_err();
        assert!(matches!(err, StorageError::ConfigParse(_)));
    }
}
