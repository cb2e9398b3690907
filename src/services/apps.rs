//! App catalog service shim.
//!
//! Wraps the slauncher-apps crate and reports catalog scans on the launcher
//! event bus.

use crate::panels::events::{self, LauncherEvent};
use log::info;
use slauncher_apps::AppCatalog;
use std::sync::Arc;

/// Index installed apps. Blocks on the first call while the system is scanned.
pub fn start_indexing() -> Arc<AppCatalog> {
    info!("Indexing installed apps (slauncher-apps)...");

    let catalog = slauncher_apps::get_catalog();
    events::send(LauncherEvent::CatalogRefreshed {
        app_count: catalog.len(),
    });
    catalog
}
