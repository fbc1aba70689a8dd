//! Human-readable byte sizes for terminal output

const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];

/// Format a byte count with binary units, e.g. `1536` -> `"1.5 KiB"`
pub fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        return format!("{} B", bytes);
    }

    // Choose the unit on the value as it will print, so 1048575 is "1.0 MiB"
    let mut value = bytes as f64;
    let mut unit = 0;
    while unit < UNITS.len() - 1 && (value * 10.0).round() >= 10240.0 {
        value /= 1024.0;
        unit += 1;
    }

    format!("{:.1} {}", value, UNITS[unit])
}
