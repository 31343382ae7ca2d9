//! Configuration for DirDoc
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{DirDocError, Result};

/// Main configuration for a DirDoc store
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Base directory holding one directory per collection
    /// Internal structure:
    ///   {data_dir}/
    ///     └── {Collection}/
    ///           ├── .seq         (last issued key)
    ///           └── {key}/       (one file per non-null field)
    pub data_dir: PathBuf,

    /// fsync field files and the sequence counter after writing
    pub sync_writes: bool,

    // -------------------------------------------------------------------------
    // Key Allocation Configuration
    // -------------------------------------------------------------------------
    /// Hold an exclusive file lock on `.seq` while allocating a key
    pub lock_sequence: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            sync_writes: false,
            lock_sequence: true,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check the config before an engine is opened with it
    pub fn validate(&self) -> Result<()> {
        if self.data_dir.as_os_str().is_empty() {
            return Err(DirDocError::Config("data_dir must not be empty".to_string()));
        }
        if self.data_dir.is_file() {
            return Err(DirDocError::Config(format!(
                "data_dir {} is a file",
                self.data_dir.display()
            )));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory (root for all collections)
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Enable or disable fsync after writes
    pub fn sync_writes(mut self, sync: bool) -> Self {
        self.config.sync_writes = sync;
        self
    }

    /// Enable or disable locking of the sequence counter
    pub fn lock_sequence(mut self, lock: bool) -> Self {
        self.config.lock_sequence = lock;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
