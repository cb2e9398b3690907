//! XDG directory discovery and icon theme index parsing.

use std::collections::{HashSet, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};

fn home_dir() -> PathBuf {
    PathBuf::from(std::env::var("HOME").unwrap_or_default())
}

/// `$XDG_DATA_HOME` followed by every entry of `$XDG_DATA_DIRS`, then the
/// Flatpak export roots.
fn data_directories() -> Vec<PathBuf> {
    let home = home_dir();
    let data_home = std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home.join(".local/share"));
    let data_dirs = std::env::var("XDG_DATA_DIRS")
        .unwrap_or_else(|_| "/usr/local/share:/usr/share".to_string());

    let mut result = vec![data_home];
    result.extend(
        data_dirs
            .split(':')
            .filter(|d| !d.is_empty())
            .map(PathBuf::from),
    );
    result.push(PathBuf::from("/var/lib/flatpak/exports/share"));
    result.push(home.join(".local/share/flatpak/exports/share"));
    result
}

/// Base icon directories, user first.
pub fn get_icon_base_directories() -> Vec<PathBuf> {
    let mut result = vec![home_dir().join(".icons")];
    for data_dir in data_directories() {
        result.push(data_dir.join("icons"));
        result.push(data_dir.join("pixmaps"));
    }
    result.push(PathBuf::from("/var/lib/snapd/desktop/icons"));
    result
}

/// Directories that may contain .desktop files.
pub fn get_application_directories() -> Vec<PathBuf> {
    let mut result: Vec<PathBuf> = data_directories()
        .into_iter()
        .map(|d| d.join("applications"))
        .collect();
    result.push(PathBuf::from("/var/lib/snapd/desktop/applications"));
    result
}

/// Directory holding the launcher's config files (`~/.config/slauncher`).
pub fn get_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| home_dir().join(".config"))
        .join("slauncher")
}

/// Path of the persisted grid slot selection.
pub fn get_selection_path() -> PathBuf {
    get_config_dir().join("selection.json")
}

/// Path of the launcher config file.
pub fn get_config_path() -> PathBuf {
    get_config_dir().join("launcher.json")
}

/// The `[Icon Theme]` section of an index.theme file.
#[derive(Debug, Default, PartialEq)]
pub struct ParsedIconTheme {
    pub directories: Vec<String>,
    pub inherits: Vec<String>,
}

pub fn parse_icon_theme_index(theme_root: &Path) -> Option<ParsedIconTheme> {
    let content = fs::read_to_string(theme_root.join("index.theme")).ok()?;
    Some(parse_icon_theme(&content))
}

fn parse_icon_theme(content: &str) -> ParsedIconTheme {
    let mut parsed = ParsedIconTheme::default();
    let mut in_theme_section = false;

    for line in content.lines().map(str::trim) {
        if line.starts_with('[') {
            in_theme_section = line.eq_ignore_ascii_case("[Icon Theme]");
            continue;
        }
        if !in_theme_section {
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let list = || -> Vec<String> {
            value
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        };
        match key.trim() {
            "Directories" => parsed.directories = list(),
            "Inherits" => parsed.inherits = list(),
            _ => {}
        }
    }

    parsed
}

/// Icon themes to search, most specific first, with inherited themes
/// appended breadth-first.
pub fn get_icon_theme_order() -> Vec<String> {
    let mut themes = Vec::new();
    if let Ok(theme) = std::env::var("GTK_THEME") {
        themes.push(theme);
    }
    themes.push("Adwaita".to_string());
    themes.push("hicolor".to_string());

    resolve_theme_inheritance(themes, &get_icon_base_directories())
}

fn resolve_theme_inheritance(start_themes: Vec<String>, base_dirs: &[PathBuf]) -> Vec<String> {
    let mut result = Vec::new();
    let mut visited = HashSet::new();
    let mut queue = VecDeque::from(start_themes);

    while let Some(theme) = queue.pop_front() {
        if !visited.insert(theme.clone()) {
            continue;
        }

        // First theme instance found on disk wins.
        let parsed = base_dirs
            .iter()
            .find_map(|base| parse_icon_theme_index(&base.join(&theme)));
        if let Some(parsed) = parsed {
            queue.extend(parsed.inherits.into_iter().filter(|p| !visited.contains(p)));
        }

        result.push(theme);
    }

    result
}
