//! Progress indicators
//!
//! Provides progress bars and spinners for long-running operations.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

const SPINNER_TEMPLATE: &str = "{spinner:.blue} {msg}";
const STAGE_TEMPLATE: &str = "{spinner:.green} {prefix:<15.bold} [{bar:40.cyan/blue}] {pos:>3}% {msg}";

/// Create a spinner for indeterminate progress
pub fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template(SPINNER_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// Create a 0-100 bar whose prefix names the current stage
pub fn stage_bar() -> ProgressBar {
    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::with_template(STAGE_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░"),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Show a stage update on a bar from [`stage_bar`]
///
/// Progress is shown as reported, so a worker moving backwards moves the bar
/// backwards.
pub fn set_stage(pb: &ProgressBar, label: &str, percent: f64, message: Option<&str>) {
    pb.set_prefix(label.to_string());
    pb.set_position(percent_position(percent));
    pb.set_message(message.unwrap_or_default().to_string());
}

fn percent_position(percent: f64) -> u64 {
    if percent.is_finite() {
        percent.clamp(0.0, 100.0).round() as u64
    } else {
        0
    }
}

/// Finish a progress bar with a success message
pub fn finish_success(pb: &ProgressBar, message: &str) {
    pb.finish_with_message(format!("✓ {}", message));
}

/// Finish a progress bar with an error message
pub fn finish_error(pb: &ProgressBar, message: &str) {
    pb.abandon_with_message(format!("✗ {}", message));
}
