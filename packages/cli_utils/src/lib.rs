#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Shared CLI utilities for the tick monitor.
//!
//! [`init_logger`] sets up `indicatif-log-bridge` so that `log::info!` and
//! friends are suspended while spinners redraw, and [`OverlaySpinner`] is
//! the terminal stand-in for the dashboard's blocking update overlay.

use std::sync::Mutex;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

pub use indicatif::MultiProgress;

/// A spinner that can be raised and lowered repeatedly.
///
/// Raising an already raised spinner only updates its message; lowering a
/// lowered one does nothing.
pub struct OverlaySpinner {
    multi: MultiProgress,
    message: String,
    bar: Mutex<Option<ProgressBar>>,
}

impl OverlaySpinner {
    /// Creates a lowered spinner that will show `message` when raised.
    #[must_use]
    pub fn new(multi: &MultiProgress, message: &str) -> Self {
        Self {
            multi: multi.clone(),
            message: message.to_string(),
            bar: Mutex::new(None),
        }
    }

    /// Shows the spinner.
    pub fn raise(&self) {
        let Ok(mut slot) = self.bar.lock() else {
            return;
        };
        if let Some(bar) = slot.as_ref() {
            bar.set_message(self.message.clone());
            return;
        }
        let bar = self.multi.add(ProgressBar::new_spinner());
        bar.enable_steady_tick(Duration::from_millis(100));
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg} [{elapsed}]")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message(self.message.clone());
        *slot = Some(bar);
    }

    /// Hides the spinner.
    pub fn lower(&self) {
        let Ok(mut slot) = self.bar.lock() else {
            return;
        };
        if let Some(bar) = slot.take() {
            bar.finish_and_clear();
            self.multi.remove(&bar);
        }
    }
}

/// Initializes the global logger wrapped in `indicatif-log-bridge` so that
/// `log::info!` and friends are suspended while spinners redraw.
///
/// Returns the [`MultiProgress`] that all spinners must be added to.
#[must_use]
pub fn init_logger() -> MultiProgress {
    let multi = MultiProgress::new();

    let logger = pretty_env_logger::formatted_builder()
        .parse_env("RUST_LOG")
        .build();
    let level = logger.filter();

    indicatif_log_bridge::LogWrapper::new(multi.clone(), logger)
        .try_init()
        .ok(); // Ignore error if logger was already set (e.g., in tests)

    log::set_max_level(level);

    multi
}
