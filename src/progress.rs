//! Progress display for transfers

use crate::format::format_size;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Render a one-line progress report.
///
/// Pure function of (consumed, total); an unknown or zero total renders the
/// consumed count alone.
pub fn render_line(consumed: u64, total: u64) -> String {
    if total == 0 {
        return format!("{} transferred", format_size(consumed));
    }
    let rate = (100.0 * consumed as f64 / total as f64).floor() as u64;
    format!(
        "[{:>3}%] {} / {}",
        rate.min(100),
        format_size(consumed),
        format_size(total)
    )
}

/// Byte-level progress bar for a single transfer
pub struct TransferProgress {
    bar: ProgressBar,
    enabled: bool,
}

impl TransferProgress {
    /// Create a progress display; hidden when `enabled` is false
    pub fn new(enabled: bool) -> Self {
        let bar = if enabled {
            let pb = ProgressBar::new(0);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} {msg:.dim} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})")
                    .unwrap()
                    .progress_chars("=>-"),
            );
            pb.enable_steady_tick(Duration::from_millis(100));
            pb
        } else {
            ProgressBar::hidden()
        };

        Self { bar, enabled }
    }

    /// Begin a transfer of `total` bytes
    pub fn start(&self, name: &str, total: u64) {
        self.bar.set_length(total);
        self.bar.set_position(0);
        self.bar.set_message(truncate_name(name, 30));
    }

    /// Add transferred bytes
    pub fn inc(&self, bytes: u64) {
        self.bar.inc(bytes);
    }

    /// Set the absolute transferred position (used when resuming)
    pub fn set_position(&self, bytes: u64) {
        self.bar.set_position(bytes);
    }

    /// Complete and clear the bar
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }

    /// Print a message without disturbing the bar
    pub fn println(&self, msg: &str) {
        if self.enabled {
            self.bar.println(msg);
        } else {
            println!("{}", msg);
        }
    }
}

/// Truncate an object name to `max_len` characters for display.
///
/// Counts characters, not bytes, so multibyte names slice cleanly.
fn truncate_name(name: &str, max_len: usize) -> String {
    let total = name.chars().count();
    if total <= max_len {
        return name.to_string();
    }
    let keep = max_len.saturating_sub(3);
    let start = name
        .char_indices()
        .nth(total - keep)
        .map(|(i, _)| i)
        .unwrap_or(0);
    format!("...{}", &name[start..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_line() {
        assert_eq!(render_line(0, 1024), "[  0%] 0.00B / 1.00KB");
        assert_eq!(render_line(512, 1024), "[ 50%] 512.00B / 1.00KB");
        assert_eq!(render_line(1024, 1024), "[100%] 1.00KB / 1.00KB");
    }

    #[test]
    fn test_render_line_unknown_total() {
        assert_eq!(render_line(2048, 0), "2.00KB transferred");
    }

    #[test]
    fn test_render_line_never_exceeds_100() {
        assert_eq!(render_line(2048, 1024), "[100%] 2.00KB / 1.00KB");
    }

    #[test]
    fn test_truncate_name() {
        assert_eq!(truncate_name("short.txt", 30), "short.txt");
        let long = "a-very-long-object-name-that-keeps-going.bin";
        let truncated = truncate_name(long, 20);
        assert_eq!(truncated.len(), 20);
        assert!(truncated.starts_with("..."));
    }

    #[test]
    fn test_truncate_name_multibyte() {
        // 23 chars but 61 bytes; must not slice mid-character
        let name = "数据集打包归档文件二零二四年度最终版本.zip";
        assert_eq!(truncate_name(name, 30), name);

        let truncated = truncate_name(name, 10);
        assert_eq!(truncated.chars().count(), 10);
        assert!(truncated.starts_with("..."));
        assert!(truncated.ends_with(".zip"));
    }
}
