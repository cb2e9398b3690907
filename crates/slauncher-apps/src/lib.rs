//! slauncher-apps: installed app catalog and grid slot selection.
//!
//! Provides:
//! - Desktop application catalog parsed from .desktop files
//! - Icon lookup across icon themes, yielding sources for the icon cache
//! - Persisted app-per-slot selection for the home screen grid

mod catalog;
mod desktop_entry;
mod error;
mod icons;
mod paths;
mod selection;

pub use catalog::{AppCatalog, AppEvent, AppInfo};
pub use desktop_entry::DesktopApp;
pub use error::AppsError;
pub use icons::IconTheme;
pub use paths::{get_config_dir, get_config_path, get_selection_path};
pub use selection::{AppSelection, DEFAULT_APP_COUNT};

use std::sync::{Arc, OnceLock};

static CATALOG: OnceLock<Arc<AppCatalog>> = OnceLock::new();

/// Get the global app catalog instance.
/// The first call scans the system, which blocks.
pub fn get_catalog() -> Arc<AppCatalog> {
    CATALOG
        .get_or_init(|| {
            let catalog = AppCatalog::new();
            catalog.refresh();
            Arc::new(catalog)
        })
        .clone()
}
