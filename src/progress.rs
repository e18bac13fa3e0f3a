//! Spinner helpers for long-running subprocess work

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

/// Start a steady-tick spinner with the given label
pub fn spinner(label: impl Into<String>) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(label.into());
    pb
}

/// Run a future under a spinner, clearing it when the future resolves
pub async fn with_spinner<T, F>(label: &str, future: F) -> T
where
    F: std::future::Future<Output = T>,
{
    let pb = spinner(label.to_string());
    let result = future.await;
    pb.finish_and_clear();
    result
}
