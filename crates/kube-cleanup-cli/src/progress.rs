//! Progress bars for validation phases

use indicatif::{ProgressBar, ProgressStyle};
use kube_cleanup_core::{Check, RunObserver};
use tracing::debug;

/// Draws one bar per check on stderr
pub struct ProgressReporter {
    enabled: bool,
    bar: Option<ProgressBar>,
}

impl ProgressReporter {
    /// Bars are only drawn when requested and stderr is a terminal
    pub fn new(requested: bool) -> Self {
        Self {
            enabled: requested && atty::is(atty::Stream::Stderr),
            bar: None,
        }
    }

    pub fn hidden() -> Self {
        Self {
            enabled: false,
            bar: None,
        }
    }
}

impl RunObserver for ProgressReporter {
    fn phase_started(&mut self, check: Check, total: usize) {
        debug!("Checking {} {}", total, check);
        if !self.enabled {
            return;
        }

        let bar = ProgressBar::new(total as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{msg:>12} [{bar:40.cyan/blue}] {pos}/{len}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        bar.set_message(check.to_string());
        self.bar = Some(bar);
    }

    fn resource_done(&mut self, _check: Check) {
        if let Some(bar) = &self.bar {
            bar.inc(1);
        }
    }

    fn phase_finished(&mut self, check: Check, findings: usize) {
        if let Some(bar) = self.bar.take() {
            bar.finish_with_message(format!("{} ({} findings)", check, findings));
        }
    }
}
