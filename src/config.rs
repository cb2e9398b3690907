//! Launcher configuration.
//!
//! Read from `~/.config/slauncher/launcher.json`; every field is optional.

use log::warn;
use serde::{Deserialize, Serialize};
use slauncher_icons::IconCacheConfig;
use std::fs;
use std::path::Path;

/// Overrides `icons.density` when set.
pub const DENSITY_ENV: &str = "SLAUNCHER_DENSITY";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LauncherConfig {
    pub icons: IconCacheConfig,
    /// Render every installed app's icon in the background after each
    /// catalog scan, not just the ones on the home screen.
    pub preload_all_icons: bool,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            icons: IconCacheConfig::default(),
            preload_all_icons: true,
        }
    }
}

impl LauncherConfig {
    /// Load from disk, falling back to defaults, then apply environment
    /// overrides.
    pub fn load(path: &Path) -> Self {
        let mut config = Self::read(path);
        if let Ok(value) = std::env::var(DENSITY_ENV) {
            config.apply_density(&value);
        }
        config
    }

    fn read(path: &Path) -> Self {
        let Ok(json) = fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&json).unwrap_or_else(|e| {
            warn!("Ignoring invalid config {:?}: {}", path, e);
            Self::default()
        })
    }

    fn apply_density(&mut self, value: &str) {
        match value.trim().parse::<f32>() {
            Ok(density) if density.is_finite() && density > 0.0 => self.icons.density = density,
            _ => warn!("Ignoring invalid {}={:?}", DENSITY_ENV, value),
        }
    }
}
