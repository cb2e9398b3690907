//! Grid slot selection and its on-disk form.

use crate::catalog::{AppCatalog, AppInfo};
use crate::error::AppsError;
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Number of grid slots on first run.
pub const DEFAULT_APP_COUNT: usize = 6;

/// Which app sits in which grid slot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSelection {
    /// Number of slots shown on the home screen.
    pub app_count: usize,
    /// Package name per slot, `None` for an empty slot.
    pub slots: Vec<Option<String>>,
}

impl Default for AppSelection {
    fn default() -> Self {
        Self {
            app_count: DEFAULT_APP_COUNT,
            slots: vec![None; DEFAULT_APP_COUNT],
        }
    }
}

impl AppSelection {
    /// Load from the selection file, or return the default if it is missing
    /// or unreadable.
    pub fn load(path: &Path) -> Self {
        let mut selection = match fs::read_to_string(path) {
            Ok(json) => serde_json::from_str(&json).unwrap_or_else(|e| {
                warn!("Ignoring invalid selection file {:?}: {}", path, e);
                Self::default()
            }),
            Err(_) => Self::default(),
        };
        selection.normalize();
        selection
    }

    /// Save to the selection file, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), AppsError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Put `package_name` into slot `position`.
    /// Returns false if the slot doesn't exist.
    pub fn select(&mut self, position: usize, package_name: impl Into<String>) -> bool {
        match self.slots.get_mut(position) {
            Some(slot) => {
                *slot = Some(package_name.into());
                true
            }
            None => false,
        }
    }

    /// Empty slot `position`.
    pub fn clear(&mut self, position: usize) {
        if let Some(slot) = self.slots.get_mut(position) {
            *slot = None;
        }
    }

    pub fn get(&self, position: usize) -> Option<&str> {
        self.slots.get(position)?.as_deref()
    }

    /// Grow with empty slots or truncate.
    pub fn set_app_count(&mut self, app_count: usize) {
        self.app_count = app_count;
        self.normalize();
    }

    /// Map every slot to an installed app. Slots naming an app that is no
    /// longer installed come back empty.
    pub fn resolve(&self, catalog: &AppCatalog) -> Vec<Option<AppInfo>> {
        self.slots
            .iter()
            .map(|slot| slot.as_deref().and_then(|name| catalog.find(name)))
            .collect()
    }

    fn normalize(&mut self) {
        self.slots.resize(self.app_count, None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_default() {
        let dir = tempfile::tempdir().unwrap();
        let selection = AppSelection::load(&dir.path().join("selection.json"));

        assert_eq!(selection, AppSelection::default());
        assert_eq!(selection.slots.len(), DEFAULT_APP_COUNT);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/selection.json");

        let mut selection = AppSelection::default();
        assert!(selection.select(0, "org.mozilla.firefox"));
        assert!(selection.select(5, "org.gnome.Terminal"));
        assert!(!selection.select(6, "out.of.range"));
        selection.save(&path).unwrap();

        let loaded = AppSelection::load(&path);
        assert_eq!(loaded.get(0), Some("org.mozilla.firefox"));
        assert_eq!(loaded.get(1), None);
        assert_eq!(loaded.get(5), Some("org.gnome.Terminal"));
        assert_eq!(loaded, selection);
    }

    #[test]
    fn test_app_count_grows_and_shrinks() {
        let mut selection = AppSelection::default();
        selection.select(1, "a");
        selection.select(4, "b");

        selection.set_app_count(9);
        assert_eq!(selection.slots.len(), 9);
        assert_eq!(selection.get(4), Some("b"));
        assert_eq!(selection.get(8), None);

        selection.set_app_count(3);
        assert_eq!(selection.slots.len(), 3);
        assert_eq!(selection.get(1), Some("a"));
        assert_eq!(selection.get(4), None);
    }

    #[test]
    fn test_slot_count_follows_app_count_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("selection.json");
        fs::write(&path, r#"{ "app_count": 4, "slots": ["a"] }"#).unwrap();

        let selection = AppSelection::load(&path);
        assert_eq!(selection.slots, vec![Some("a".to_string()), None, None, None]);
    }

    #[test]
    fn test_corrupt_file_gives_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("selection.json");
        fs::write(&path, "not json").unwrap();

        assert_eq!(AppSelection::load(&path), AppSelection::default());
    }

    #[test]
    fn test_clear_slot() {
        let mut selection = AppSelection::default();
        selection.select(2, "a");
        selection.clear(2);
        selection.clear(99);

        assert_eq!(selection.get(2), None);
    }
}
