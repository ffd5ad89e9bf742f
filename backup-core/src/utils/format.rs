//! Human-readable sizes for listings and the dashboard widget.

const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];

/// Format bytes as a human-readable string.
///
/// The unit is the largest one (up to TB) that keeps the value at or above 1,
/// and the value is rounded to at most two decimals with trailing zeros dropped.
pub fn format_bytes(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    let rounded = (size * 100.0).round() / 100.0;
    format!("{} {}", rounded, UNITS[unit_index])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(1), "1 B");
        assert_eq!(format_bytes(1023), "1023 B");
        assert_eq!(format_bytes(1024), "1 KB");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(1024 * 1024), "1 MB");
        assert_eq!(format_bytes(1_073_741_824), "1 GB");
    }

    #[test]
    fn test_format_bytes_two_decimals() {
        // 1234567 / 1024^2 = 1.1773...
        assert_eq!(format_bytes(1_234_567), "1.18 MB");
    }

    #[test]
    fn test_format_bytes_caps_at_terabytes() {
        let pb = 1024u64.pow(5);
        assert_eq!(format_bytes(pb), "1024 TB");
        assert!(format_bytes(u64::MAX).ends_with(" TB"));
    }

    #[test]
    fn test_units_never_decrease() {
        let unit_rank = |s: String| {
            let unit = s.rsplit(' ').next().unwrap().to_string();
            UNITS.iter().position(|u| *u == unit).unwrap()
        };

        let mut last = 0;
        let mut n = 1u64;
        while n < u64::MAX / 3 {
            let rank = unit_rank(format_bytes(n));
            assert!(rank >= last, "unit went backwards at {}", n);
            last = rank;
            n = n * 3 + 1;
        }
    }
}
