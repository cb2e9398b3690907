//! Installed application catalog.

use crate::desktop_entry::{exec_command_line, parse_desktop_file};
use crate::error::AppsError;
use crate::icons::IconTheme;
use crate::paths::get_application_directories;
use log::{debug, info};
use slauncher_icons::IconSource;
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::{PoisonError, RwLock};

/// Events emitted when the catalog changes.
#[derive(Debug, Clone)]
pub enum AppEvent {
    Refresh,
}

/// A launchable app as shown in the grid and the all-apps list.
#[derive(Clone, Debug)]
pub struct AppInfo {
    /// Desktop id without ".desktop"; the icon cache key.
    pub package_name: String,
    pub app_name: String,
    pub exec: String,
    /// None if no raster icon could be found.
    pub icon: Option<IconSource>,
}

impl AppInfo {
    /// Start the app detached from the launcher's stdio.
    pub fn launch(&self) -> Result<(), AppsError> {
        let args = exec_command_line(&self.exec);
        let Some((program, rest)) = args.split_first() else {
            return Err(AppsError::EmptyCommand(self.package_name.clone()));
        };

        info!("Launching {} ({})", self.app_name, program);
        let mut child = Command::new(program)
            .args(rest)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| AppsError::Launch {
                package: self.package_name.clone(),
                source,
            })?;

        // Reap the child so it doesn't linger as a zombie.
        std::thread::spawn(move || {
            let _ = child.wait();
        });
        Ok(())
    }
}

/// The installed application catalog.
pub struct AppCatalog {
    /// Visible apps sorted by name.
    apps: RwLock<Vec<AppInfo>>,
    /// Directories scanned for .desktop files, highest priority first.
    app_dirs: Vec<PathBuf>,
    icon_theme: IconTheme,
    event_tx: tokio::sync::broadcast::Sender<AppEvent>,
}

impl AppCatalog {
    /// Create an empty catalog over the XDG application directories.
    pub fn new() -> Self {
        Self::with_directories(get_application_directories(), IconTheme::new())
    }

    pub fn with_directories(app_dirs: Vec<PathBuf>, icon_theme: IconTheme) -> Self {
        let (tx, _) = tokio::sync::broadcast::channel(16);

        Self {
            apps: RwLock::new(Vec::new()),
            app_dirs,
            icon_theme,
            event_tx: tx,
        }
    }

    /// Rescan icons and desktop files. Blocking; run it off the UI thread.
    pub fn refresh(&self) {
        info!("Scanning app catalog...");

        self.icon_theme.build_index();
        let apps = self.scan_desktop_files();
        let count = apps.len();
        *self.apps.write().unwrap_or_else(PoisonError::into_inner) = apps;

        let _ = self.event_tx.send(AppEvent::Refresh);
        info!("App catalog refresh complete: {} apps", count);
    }

    /// All visible apps, sorted by name.
    pub fn installed_apps(&self) -> Vec<AppInfo> {
        self.apps
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Find an app by package name.
    pub fn find(&self, package_name: &str) -> Option<AppInfo> {
        self.apps
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|app| app.package_name == package_name)
            .cloned()
    }

    /// Apps whose name or package name contains `query`, ignoring case.
    /// An empty query matches everything. Same order as `installed_apps`.
    pub fn search(&self, query: &str) -> Vec<AppInfo> {
        let query = query.trim().to_lowercase();
        self.apps
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|app| {
                app.app_name.to_lowercase().contains(&query)
                    || app.package_name.to_lowercase().contains(&query)
            })
            .cloned()
            .collect()
    }

    /// (package name, icon) pairs for every app that has an icon.
    pub fn icon_sources(&self) -> Vec<(String, IconSource)> {
        self.apps
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter_map(|app| Some((app.package_name.clone(), app.icon.clone()?)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.apps.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Subscribe to catalog changes.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<AppEvent> {
        self.event_tx.subscribe()
    }

    fn scan_desktop_files(&self) -> Vec<AppInfo> {
        // None marks a NoDisplay entry; it still shadows the same id in
        // lower priority directories.
        let mut by_id: HashMap<String, Option<AppInfo>> = HashMap::new();

        for dir in &self.app_dirs {
            if !dir.exists() {
                continue;
            }

            let walker = walkdir::WalkDir::new(dir).follow_links(true).max_depth(3);
            for entry in walker.into_iter().filter_map(|e| e.ok()) {
                let path = entry.path();
                if path.extension().and_then(|e| e.to_str()) != Some("desktop") {
                    continue;
                }
                let Some(app) = parse_desktop_file(path) else {
                    continue;
                };
                if by_id.contains_key(&app.id) {
                    continue;
                }

                if app.no_display {
                    debug!("Skipping hidden app {}", app.id);
                    by_id.insert(app.id, None);
                    continue;
                }

                let icon = app
                    .icon_name
                    .as_deref()
                    .and_then(|name| self.icon_theme.resolve_source(name));
                let info = AppInfo {
                    package_name: app.package_name().to_string(),
                    app_name: app.name,
                    exec: app.exec,
                    icon,
                };
                by_id.insert(app.id, Some(info));
            }
        }

        let mut apps: Vec<AppInfo> = by_id.into_values().flatten().collect();
        apps.sort_by_key(|app| app.app_name.to_lowercase());
        apps
    }
}

impl Default for AppCatalog {
    fn default() -> Self {
        Self::new()
    }
}
