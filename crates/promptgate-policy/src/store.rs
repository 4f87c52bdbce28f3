//! Atomic policy snapshot store
//!
//! The store owns the active `Arc<CompiledPolicy>`. Readers clone the `Arc`
//! under a short read lock and keep evaluating against that snapshot even
//! if a reload lands mid-flight. A failed reload leaves the previous
//! snapshot active — the service never degrades to fail-open.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use promptgate_core::Result;
use tracing::{info, warn};

use crate::config::{CompiledPolicy, PolicyConfig};

/// Holder of the active policy snapshot
pub struct PolicyStore {
    source: Option<PathBuf>,
    active: RwLock<Arc<CompiledPolicy>>,
}

impl PolicyStore {
    /// Load the initial policy from a file.
    ///
    /// Fail-closed: any parse or validation error propagates, and the
    /// caller must refuse to serve traffic without a store.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let compiled = PolicyConfig::from_file(path)?.compile()?;
        info!(policy = %path.display(), "policy loaded");

        Ok(Self {
            source: Some(path.to_path_buf()),
            active: RwLock::new(Arc::new(compiled)),
        })
    }

    /// Build a store from an already validated configuration (tests,
    /// embedded use)
    pub fn from_config(config: PolicyConfig) -> Result<Self> {
        Ok(Self {
            source: None,
            active: RwLock::new(Arc::new(config.compile()?)),
        })
    }

    /// The active snapshot. Cheap; callers hold the returned `Arc` for the
    /// duration of one evaluation.
    pub fn current(&self) -> Arc<CompiledPolicy> {
        self.active.read().clone()
    }

    /// Re-read the policy document this store was loaded from.
    ///
    /// On success the new snapshot replaces the active one atomically; on
    /// failure the error is returned and the active snapshot is untouched.
    pub fn reload(&self) -> Result<()> {
        let path = self.source.as_ref().ok_or_else(|| {
            promptgate_core::Error::config("store was not loaded from a file, nothing to reload")
        })?;

        let document = std::fs::read_to_string(path).map_err(|e| {
            promptgate_core::Error::config(format!(
                "failed to read policy file {:?}: {}",
                path, e
            ))
        })?;

        self.reload_from_str(&document)
    }

    /// Validate and swap in a new policy document.
    pub fn reload_from_str(&self, document: &str) -> Result<()> {
        match PolicyConfig::from_yaml(document).and_then(PolicyConfig::compile) {
            Ok(compiled) => {
                *self.active.write() = Arc::new(compiled);
                info!("policy reloaded");
                Ok(())
            }
            Err(e) => {
                warn!("policy reload rejected, previous policy stays active: {}", e);
                Err(e)
            }
        }
    }
}
