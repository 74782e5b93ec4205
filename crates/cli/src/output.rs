//! Terminal output utilities
//!
//! Status lines go to stderr so that stdout can carry JSON.

use owo_colors::OwoColorize;

/// Status message helpers
pub struct Status;

impl Status {
    /// Print a success message
    pub fn success(message: &str) {
        eprintln!("{} {}", "✓".green(), message);
    }

    /// Print a warning message
    pub fn warning(message: &str) {
        eprintln!("{} {}", "⚠".yellow(), message);
    }

    /// Print an info message
    pub fn info(message: &str) {
        eprintln!("{} {}", "ℹ".blue(), message);
    }

    /// Print a header
    pub fn header(message: &str) {
        eprintln!();
        eprintln!("{}", message.bold());
        eprintln!("{}", "─".repeat(message.chars().count()));
    }

    /// Print an aligned `label: value` line
    pub fn field(label: &str, value: &str) {
        eprintln!("  {:<12} {}", format!("{label}:").dimmed(), value);
    }
}

/// Format a duration for display
pub fn format_duration(duration: std::time::Duration) -> String {
    let secs = duration.as_secs_f32();
    if secs < 1.0 {
        format!("{:.0}ms", secs * 1000.0)
    } else if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        let mins = (secs / 60.0).floor();
        let remaining_secs = secs % 60.0;
        format!("{}m {:.0}s", mins, remaining_secs)
    }
}

/// Append the area unit to an already formatted value
pub fn format_area(km2: &str) -> String {
    format!("{km2} km²")
}

/// Append the length unit to an already formatted value
pub fn format_length(km: &str) -> String {
    format!("{km} km")
}

/// Format a longitude/latitude pair to 6 decimals
pub fn format_lon_lat(longitude: f64, latitude: f64) -> String {
    format!("{longitude:.6}, {latitude:.6}")
}

/// Format a count with singular/plural
pub fn format_count(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{} {}", count, singular)
    } else {
        format!("{} {}", count, plural)
    }
}
