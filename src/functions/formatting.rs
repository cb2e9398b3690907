const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];

/// Human readable byte count, e.g. "4.0 MB".
pub fn readable_bytes(bytes: usize) -> String {
    if bytes < 1024 {
        return format!("{bytes} B");
    }

    let mut value = bytes as f64 / 1024.0;
    let mut unit = UNITS[0];
    for next in &UNITS[1..] {
        if value < 1024.0 {
            break;
        }
        value /= 1024.0;
        unit = next;
    }
    format!("{value:.1} {unit}")
}
