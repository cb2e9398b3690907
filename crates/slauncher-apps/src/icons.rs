//! Icon theme indexing.

use crate::paths::{get_icon_base_directories, get_icon_theme_order, parse_icon_theme_index};
use log::debug;
use slauncher_icons::IconSource;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{PoisonError, RwLock};

/// Raster formats the icon renderer can decode, in preference order.
const RASTER_EXTENSIONS: [&str; 5] = ["png", "webp", "ico", "bmp", "jpg"];

/// Maps icon names to raster files across themes and pixmap directories.
pub struct IconTheme {
    /// Icon name (lowercase, no extension) -> path.
    index: RwLock<HashMap<String, PathBuf>>,
    /// Fixed search directories. When None, XDG theme directories are used.
    search_dirs: Option<Vec<PathBuf>>,
}

impl IconTheme {
    pub fn new() -> Self {
        Self {
            index: RwLock::new(HashMap::new()),
            search_dirs: None,
        }
    }

    /// Index only the given directories, in order.
    pub fn with_search_directories(dirs: Vec<PathBuf>) -> Self {
        Self {
            index: RwLock::new(HashMap::new()),
            search_dirs: Some(dirs),
        }
    }

    /// Rebuild the name index.
    ///
    /// Earlier directories win, so theme inheritance order is respected.
    /// Within one directory tree a more preferred format replaces a less
    /// preferred one.
    pub fn build_index(&self) {
        let mut index: HashMap<String, (usize, usize, PathBuf)> = HashMap::new();
        let search_dirs = self.search_directories();
        debug!("Scanning {} icon directories...", search_dirs.len());

        for (dir_rank, dir_path) in search_dirs.iter().enumerate() {
            if !dir_path.exists() {
                continue;
            }

            let walker = walkdir::WalkDir::new(dir_path)
                .follow_links(true)
                .max_depth(10);

            for entry in walker.into_iter().filter_map(|e| e.ok()) {
                if entry.file_type().is_dir() {
                    continue;
                }

                let path = entry.path();
                let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
                    continue;
                };
                let ext = ext.to_lowercase();
                let Some(format_rank) = RASTER_EXTENSIONS.iter().position(|e| *e == ext) else {
                    continue;
                };
                let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                    continue;
                };

                let candidate = (dir_rank, format_rank, path.to_path_buf());
                index
                    .entry(stem.to_lowercase())
                    .and_modify(|current| {
                        if (dir_rank, format_rank) < (current.0, current.1) {
                            *current = candidate.clone();
                        }
                    })
                    .or_insert_with(|| candidate.clone());
            }
        }

        let index = index
            .into_iter()
            .map(|(name, (_, _, path))| (name, path))
            .collect();
        *self.index.write().unwrap_or_else(PoisonError::into_inner) = index;
    }

    /// Resolve an icon name to a file path.
    pub fn resolve(&self, name: &str) -> Option<PathBuf> {
        if name.starts_with('/') {
            let path = PathBuf::from(name);
            return path.exists().then_some(path);
        }

        let index = self.index.read().unwrap_or_else(PoisonError::into_inner);
        let name_lower = name.to_lowercase();

        [
            name_lower.clone(),
            name_lower.replace(' ', "-"),
            name_lower.replace('_', "-"),
        ]
        .iter()
        .find_map(|variant| index.get(variant).cloned())
    }

    /// Resolve an icon name to a source the icon cache can render.
    pub fn resolve_source(&self, name: &str) -> Option<IconSource> {
        self.resolve(name).map(IconSource::File)
    }

    pub fn len(&self) -> usize {
        self.index
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn search_directories(&self) -> Vec<PathBuf> {
        if let Some(dirs) = &self.search_dirs {
            return dirs.clone();
        }

        let mut result = Vec::new();
        let icon_dirs = get_icon_base_directories();

        for theme in &get_icon_theme_order() {
            for base_dir in &icon_dirs {
                let theme_root = base_dir.join(theme);
                if !theme_root.exists() {
                    continue;
                }

                match parse_icon_theme_index(&theme_root) {
                    Some(parsed) if !parsed.directories.is_empty() => {
                        result.extend(parsed.directories.iter().map(|d| theme_root.join(d)));
                    }
                    _ => result.push(theme_root),
                }
            }
        }

        // Pixmaps and loose icons in the base directories come last.
        result.extend(icon_dirs);
        result
    }
}

impl Default for IconTheme {
    fn default() -> Self {
        Self::new()
    }
}
