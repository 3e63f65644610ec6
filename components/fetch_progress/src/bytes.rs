// components/fetch_progress/src/bytes.rs
const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Render a byte count with base-1024 units and at most one decimal.
///
/// A trailing `.0` is dropped, so `1024` becomes `"1KB"` and `1536`
/// becomes `"1.5KB"`.
pub fn format_bytes(bytes: u64) -> String {
    if bytes == 0 {
        return "0B".to_string();
    }

    let mut scaled = bytes as f64;
    let mut unit = 0;
    while scaled >= 1024.0 && unit < UNITS.len() - 1 {
        scaled /= 1024.0;
        unit += 1;
    }

    let rounded = (scaled * 10.0).round() / 10.0;
    if rounded.fract() == 0.0 {
        format!("{}{}", rounded as u64, UNITS[unit])
    } else {
        format!("{:.1}{}", rounded, UNITS[unit])
    }
}
