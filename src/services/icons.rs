//! Icon cache service.
//!
//! Builds the process-wide icon cache and warms it with every installed
//! app's icon once the catalog is indexed.

use crate::functions::formatting::readable_bytes;
use log::{debug, info};
use slauncher_apps::AppCatalog;
use slauncher_icons::{IconCacheConfig, IconCacheManager, IconError};

/// Get (or build) the shared icon cache.
pub fn start(config: &IconCacheConfig) -> Result<IconCacheManager, IconError> {
    let icons = slauncher_icons::registry().get_or_init(|| config.clone())?;
    info!(
        "Using shared icon cache ({}px, {})",
        icons.icon_size(),
        readable_bytes(icons.utilization().capacity)
    );
    Ok(icons)
}

/// Queue background renders for every installed app with an icon.
pub fn preload_catalog(icons: &IconCacheManager, catalog: &AppCatalog) -> usize {
    let queued = icons.preload_icons(catalog.icon_sources());
    debug!("Queued {} catalog icons", queued);
    queued
}

/// Destroy the shared icon cache. A later `start` builds a fresh one.
pub fn stop() {
    slauncher_icons::registry().destroy();
}
