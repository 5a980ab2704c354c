//! Human-readable strings for renderers.

const UNITS: [&str; 6] = ["B", "KiB", "MiB", "GiB", "TiB", "PiB"];

/// Binary-unit byte count: `0 B`, `1.5 KiB`, `1.0 MiB`.
pub fn format_bytes(bytes: u64) -> String {
    format_scaled(bytes as f64)
}

/// Bytes per second, e.g. `12.3 KiB/s`.
pub fn format_rate(bps: f64) -> String {
    let bps = if bps.is_finite() { bps.max(0.0) } else { 0.0 };
    format!("{}/s", format_scaled(bps))
}

/// One-decimal percentage clamped to `[0, 100]`.
pub fn format_percent(percent: f64) -> String {
    let percent = if percent.is_nan() {
        0.0
    } else {
        percent.clamp(0.0, 100.0)
    };
    format!("{percent:.1}%")
}

fn format_scaled(value: f64) -> String {
    let mut size = value;
    let mut idx = 0;
    while size >= 1024.0 && idx < UNITS.len() - 1 {
        size /= 1024.0;
        idx += 1;
    }
    if idx == 0 {
        format!("{} {}", size as u64, UNITS[idx])
    } else {
        format!("{size:.1} {}", UNITS[idx])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(1023), "1023 B");
        assert_eq!(format_bytes(1536), "1.5 KiB");
        assert_eq!(format_bytes(1_048_576), "1.0 MiB");
    }

    #[test]
    fn rates() {
        assert_eq!(format_rate(2048.0), "2.0 KiB/s");
        assert_eq!(format_rate(-5.0), "0 B/s");
        assert_eq!(format_rate(f64::NAN), "0 B/s");
    }

    #[test]
    fn percents() {
        assert_eq!(format_percent(12.345), "12.3%");
        assert_eq!(format_percent(150.0), "100.0%");
        assert_eq!(format_percent(-1.0), "0.0%");
    }
}
