//! Progress bar utilities

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};

/// Create a progress bar counting rendered frames
pub fn create_progress_bar(total: u64, message: &str) -> Result<ProgressBar> {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} frames {msg}")?
            .progress_chars("##-"),
    );
    pb.set_message(message.to_string());
    Ok(pb)
}
