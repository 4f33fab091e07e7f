//! Shared runtime configuration store.
//!
//! Holds the single in-process configuration value behind a read/write lock
//! with last-writer-wins semantics. External services (the HTTP config API)
//! replace the value; subsystems read a cheap `Arc` snapshot. Reads never
//! observe a partially-applied update.

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use crate::{ConfigError, RuntimeConfig};

/// File-backed, cached runtime configuration.
pub struct ConfigStore {
    path: PathBuf,
    current: RwLock<Arc<RuntimeConfig>>,
}

impl ConfigStore {
    /// Create a store for the given file path, caching the defaults until
    /// `load` is called.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            current: RwLock::new(Arc::new(RuntimeConfig::default())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The cached configuration snapshot.
    pub fn current(&self) -> Arc<RuntimeConfig> {
        self.current.read().expect("config lock poisoned").clone()
    }

    /// Replace the cached configuration (last-writer-wins). Returns the
    /// previous snapshot.
    pub fn replace(&self, config: RuntimeConfig) -> Arc<RuntimeConfig> {
        let mut guard = self.current.write().expect("config lock poisoned");
        std::mem::replace(&mut *guard, Arc::new(config))
    }

    /// Reload from disk (missing file → defaults) and cache the result.
    pub fn load(&self) -> Result<Arc<RuntimeConfig>, ConfigError> {
        let config = RuntimeConfig::load_from(&self.path)?;
        let snapshot = Arc::new(config);
        *self.current.write().expect("config lock poisoned") = snapshot.clone();
        Ok(snapshot)
    }

    /// Persist the cached configuration to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.current().save_to(&self.path)
    }
}
