//! slauncher-icons: in-memory icon cache for the launcher grid.
//!
//! Features:
//! - Byte-bounded LRU cache of rendered icons keyed by app id
//! - At most one render per app id in flight; late callers join it
//! - Decoding on a background runtime, never on the caller's thread
//! - Explicit teardown that cancels outstanding renders

pub mod cache;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod manager;
pub mod renderer;
pub mod types;

pub use cache::IconCache;
pub use config::IconCacheConfig;
pub use coordinator::{JoinedLoad, LoadCoordinator};
pub use error::{IconError, RenderError};
pub use manager::{IconCacheManager, IconLoad};
pub use renderer::{BitmapRenderer, IconRenderer};
pub use types::{CacheKey, CacheUtilization, IconSource, RenderedIcon};

use log::info;
use std::sync::{Mutex, OnceLock, PoisonError};

static REGISTRY: OnceLock<IconCacheRegistry> = OnceLock::new();

/// Get the process-wide registry.
pub fn registry() -> &'static IconCacheRegistry {
    REGISTRY.get_or_init(IconCacheRegistry::new)
}

/// Holds at most one live [`IconCacheManager`].
///
/// The first `get_or_init` builds the manager; later calls hand out clones
/// of the same handle until [`destroy`](Self::destroy), after which the next
/// call builds a fresh one.
pub struct IconCacheRegistry {
    slot: Mutex<Option<IconCacheManager>>,
}

impl IconCacheRegistry {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    /// Get the live manager, building it from `config` if there is none.
    pub fn get_or_init(
        &self,
        config: impl FnOnce() -> IconCacheConfig,
    ) -> Result<IconCacheManager, IconError> {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(manager) = slot.as_ref().filter(|m| !m.is_destroyed()) {
            return Ok(manager.clone());
        }

        let manager = IconCacheManager::new(config())?;
        *slot = Some(manager.clone());
        Ok(manager)
    }

    /// Get the live manager without building one.
    pub fn get(&self) -> Option<IconCacheManager> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .filter(|m| !m.is_destroyed())
            .cloned()
    }

    /// Tear down the live manager, if any.
    pub fn destroy(&self) {
        let manager = self
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(manager) = manager {
            manager.destroy();
            info!("Icon cache registry reset");
        }
    }
}

impl Default for IconCacheRegistry {
    fn default() -> Self {
        Self::new()
    }
}
