//! Shared launcher services.
//!
//! Services own the long-lived state every panel reads from.
//!
//! - `apps` - Installed app catalog, scanned from .desktop files
//! - `icons` - Icon cache lifecycle and catalog preloading

pub mod apps;
pub mod icons;

use crate::config::LauncherConfig;
use log::info;
use slauncher_apps::AppCatalog;
use slauncher_icons::{IconCacheManager, IconError};
use std::sync::Arc;

/// Start all shared services.
/// Call this once from main before creating any panels.
pub fn start_all(config: &LauncherConfig) -> Result<ServiceStatus, IconError> {
    info!("Starting shared services...");

    let icons = icons::start(&config.icons)?;
    let catalog = apps::start_indexing();
    if config.preload_all_icons {
        icons::preload_catalog(&icons, &catalog);
    }

    Ok(ServiceStatus { icons, catalog })
}

/// Tear down services that hold background work.
pub fn stop_all() {
    icons::stop();
}

/// Handles to started services, injected into panels.
pub struct ServiceStatus {
    pub icons: IconCacheManager,
    pub catalog: Arc<AppCatalog>,
}
