//! Home screen app grid.
//!
//! Holds which app sits in each slot and turns slots into icons through the
//! shared icon cache. Cached icons bind synchronously; misses render in the
//! background and the cell shows a placeholder until they land.

use super::events::{self, LauncherEvent};
use futures_util::future::{self, BoxFuture, FutureExt};
use log::debug;
use slauncher_apps::{AppInfo, AppSelection, AppsError};
use slauncher_icons::{IconCacheManager, RenderedIcon};
use std::path::Path;

/// What a grid cell displays.
#[derive(Clone, Debug)]
pub enum CellIcon {
    /// No app assigned to the slot.
    Empty,
    Ready(RenderedIcon),
    /// App has no icon, or its icon failed to render.
    Placeholder,
}

impl CellIcon {
    pub fn is_ready(&self) -> bool {
        matches!(self, CellIcon::Ready(_))
    }
}

pub struct AppGrid {
    cells: Vec<Option<AppInfo>>,
    icons: IconCacheManager,
}

impl AppGrid {
    pub fn new(app_count: usize, icons: IconCacheManager) -> Self {
        Self {
            cells: vec![None; app_count],
            icons,
        }
    }

    pub fn app_count(&self) -> usize {
        self.cells.len()
    }

    pub fn app_at(&self, position: usize) -> Option<&AppInfo> {
        self.cells.get(position)?.as_ref()
    }

    /// Replace every slot. Extra apps are dropped; missing ones leave the
    /// trailing slots empty.
    pub fn update_selected_apps(&mut self, apps: Vec<Option<AppInfo>>) {
        let app_count = self.cells.len();
        self.cells = apps;
        self.cells.resize(app_count, None);
    }

    pub fn update_app_count(&mut self, app_count: usize) {
        self.cells.resize(app_count, None);
    }

    /// Assign an app to one slot. Returns false if the slot doesn't exist.
    pub fn update_app_at(&mut self, position: usize, app: Option<AppInfo>) -> bool {
        let Some(cell) = self.cells.get_mut(position) else {
            return false;
        };
        *cell = app;
        events::send(LauncherEvent::SlotChanged(position));
        true
    }

    /// Put `app` in slot `position` and save the choice to `path` right away.
    ///
    /// Returns false, without saving, if the slot doesn't exist.
    pub fn select_app(
        &mut self,
        position: usize,
        app: AppInfo,
        selection: &mut AppSelection,
        path: &Path,
    ) -> Result<bool, AppsError> {
        if position >= self.cells.len() || !selection.select(position, app.package_name.clone()) {
            return Ok(false);
        }
        selection.save(path)?;
        Ok(self.update_app_at(position, Some(app)))
    }

    /// Start background renders for every occupied slot.
    pub fn preload_visible_icons(&self) -> usize {
        let visible = self
            .cells
            .iter()
            .flatten()
            .filter_map(|app| Some((app.package_name.as_str(), app.icon.clone()?)));
        self.icons.preload_icons(visible)
    }

    /// Resolve the icon for one slot.
    ///
    /// Resolves immediately for empty slots, apps without an icon and cache
    /// hits. Otherwise waits for the render and announces the outcome on the
    /// launcher event bus.
    pub fn bind(&self, position: usize) -> BoxFuture<'static, CellIcon> {
        let Some(app) = self.app_at(position) else {
            return future::ready(CellIcon::Empty).boxed();
        };
        let Some(source) = app.icon.clone() else {
            return future::ready(CellIcon::Placeholder).boxed();
        };
        if let Some(icon) = self.icons.get_cached_icon(&app.package_name) {
            return future::ready(CellIcon::Ready(icon)).boxed();
        }

        let key = app.package_name.clone();
        self.icons
            .load_icon(&key, source)
            .map(move |icon| match icon {
                Some(icon) => {
                    events::send_icon_ready(&key);
                    CellIcon::Ready(icon)
                }
                None => {
                    debug!("Showing placeholder for {}", key);
                    events::send_icon_failed(&key);
                    CellIcon::Placeholder
                }
            })
            .boxed()
    }

    /// Bind every slot, in slot order.
    pub async fn bind_all(&self) -> Vec<CellIcon> {
        let binds: Vec<_> = (0..self.cells.len()).map(|i| self.bind(i)).collect();
        future::join_all(binds).await
    }
}
