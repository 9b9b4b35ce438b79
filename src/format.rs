//! Output formatting utilities

use std::time::Duration;

const KB: f64 = 1024.0;
const MB: f64 = 1024.0 * 1024.0;
const GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Format a byte count with two decimals and a B/KB/MB/GB suffix.
///
/// Binary unit steps: `1023` renders as `1023.00B`, `1024` as `1.00KB`.
/// Everything at or above 1 GiB stays in GB.
pub fn format_size(bytes: u64) -> String {
    let b = bytes as f64;
    if b < KB {
        format!("{:.2}B", b)
    } else if b < MB {
        format!("{:.2}KB", b / KB)
    } else if b < GB {
        format!("{:.2}MB", b / MB)
    } else {
        format!("{:.2}GB", b / GB)
    }
}

/// Format transfer rate in human-readable form
pub fn format_rate(bytes_per_sec: f64) -> String {
    format!("{}/s", format_size(bytes_per_sec.max(0.0) as u64))
}

/// Format duration in human-readable form
pub fn format_duration(duration: Duration) -> String {
    format_duration_secs(duration.as_secs_f64())
}

/// Format duration from seconds
pub fn format_duration_secs(secs: f64) -> String {
    if secs < 1.0 {
        format!("{:.0}ms", secs * 1000.0)
    } else if secs < 60.0 {
        format!("{:.1}s", secs)
    } else if secs < 3600.0 {
        let mins = (secs / 60.0).floor();
        let remaining = secs - mins * 60.0;
        format!("{}m {:.0}s", mins as u64, remaining)
    } else {
        let hours = (secs / 3600.0).floor();
        let remaining = secs - hours * 3600.0;
        let mins = (remaining / 60.0).floor();
        format!("{}h {}m", hours as u64, mins as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size_boundaries() {
        assert_eq!(format_size(0), "0.00B");
        assert_eq!(format_size(1023), "1023.00B");
        assert_eq!(format_size(1024), "1.00KB");
        assert_eq!(format_size(1024 * 1024 - 1), "1024.00KB");
        assert_eq!(format_size(1024 * 1024), "1.00MB");
        assert_eq!(format_size(1024 * 1024 * 1024), "1.00GB");
        assert_eq!(format_size(5 * 1024 * 1024 * 1024), "5.00GB");
    }

    #[test]
    fn test_format_size_monotonic() {
        // Parse back the numeric part scaled by the unit and check ordering
        fn as_bytes(s: &str) -> f64 {
            let (num, unit) = s.split_at(s.len() - 2);
            match unit {
                "KB" => num.parse::<f64>().unwrap() * 1024.0,
                "MB" => num.parse::<f64>().unwrap() * 1024.0 * 1024.0,
                "GB" => num.parse::<f64>().unwrap() * 1024.0 * 1024.0 * 1024.0,
                _ => s.trim_end_matches('B').parse::<f64>().unwrap(),
            }
        }

        let samples: Vec<u64> = vec![
            0,
            1,
            512,
            1023,
            1024,
            4096,
            1024 * 1024,
            10 * 1024 * 1024,
            1024 * 1024 * 1024,
            6 * 1024 * 1024 * 1024,
        ];
        for pair in samples.windows(2) {
            assert!(as_bytes(&format_size(pair[0])) <= as_bytes(&format_size(pair[1])));
        }
    }

    #[test]
    fn test_format_rate() {
        assert_eq!(format_rate(1024.0), "1.00KB/s");
    }

    #[test]
    fn test_format_duration_secs() {
        assert_eq!(format_duration_secs(0.5), "500ms");
        assert_eq!(format_duration_secs(45.0), "45.0s");
        assert_eq!(format_duration_secs(90.0), "1m 30s");
        assert_eq!(format_duration_secs(3700.0), "1h 1m");
    }
}
