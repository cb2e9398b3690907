//! Desktop entry parsing.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Launchable application parsed from a .desktop file.
#[derive(Clone, Debug)]
pub struct DesktopApp {
    /// File name, e.g. "org.mozilla.firefox.desktop".
    pub id: String,
    pub name: String,
    pub exec: String,
    pub icon_name: Option<String>,
    pub no_display: bool,
}

impl DesktopApp {
    /// App id without the ".desktop" suffix. Used as the icon cache key.
    pub fn package_name(&self) -> &str {
        self.id.strip_suffix(".desktop").unwrap_or(&self.id)
    }
}

/// Split an `Exec` value into program and arguments.
///
/// Double quotes group words and allow backslash escapes inside them.
/// Field codes (`%f`, `%U`, `%i`, ...) are dropped since the launcher never
/// passes files or URLs; `%%` becomes a literal percent sign.
pub fn exec_command_line(exec: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quoted = false;
    let mut chars = exec.chars();

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                quoted = !quoted;
                in_word = true;
            }
            '\\' if quoted => {
                if let Some(escaped) = chars.next() {
                    current.push(escaped);
                }
            }
            c if c.is_whitespace() && !quoted => {
                if in_word {
                    args.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            c => {
                current.push(c);
                in_word = true;
            }
        }
    }
    if in_word {
        args.push(current);
    }

    args.into_iter().filter_map(strip_field_codes).collect()
}

/// Remove field codes from one argument. None if nothing is left.
fn strip_field_codes(arg: String) -> Option<String> {
    if !arg.contains('%') {
        return Some(arg);
    }

    let mut out = String::with_capacity(arg.len());
    let mut chars = arg.chars();
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
        } else if chars.next() == Some('%') {
            out.push('%');
        }
    }
    (!out.is_empty()).then_some(out)
}

/// Parse a .desktop file into a DesktopApp struct.
/// Returns None for anything that isn't a complete `Type=Application` entry.
pub fn parse_desktop_file(path: &Path) -> Option<DesktopApp> {
    let content = fs::read_to_string(path).ok()?;
    let id = path.file_name()?.to_string_lossy().to_string();
    parse_desktop_entry(&content, id)
}

fn parse_desktop_entry(content: &str, id: String) -> Option<DesktopApp> {
    let mut entries = HashMap::new();
    let mut in_desktop_entry = false;

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if line.starts_with('[') && line.ends_with(']') {
            in_desktop_entry = line == "[Desktop Entry]";
            continue;
        }

        if in_desktop_entry {
            if let Some((key, value)) = line.split_once('=') {
                entries.insert(key.trim(), value.trim());
            }
        }
    }

    if entries.get("Type").copied() != Some("Application") {
        return None;
    }

    Some(DesktopApp {
        id,
        name: entries.get("Name")?.to_string(),
        exec: entries.get("Exec")?.to_string(),
        icon_name: entries
            .get("Icon")
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string()),
        no_display: entries.get("NoDisplay").is_some_and(|s| *s == "true"),
    })
}
