//! Live progress line.

use crate::scanner::{ScanReporter, TallySnapshot};
use console::style;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::net::IpAddr;

/// Reporter that renders to the terminal.
///
/// Progress is a single line redrawn in place. Hits are printed above it so
/// they never tear the progress line. When the bar is hidden (quiet mode or
/// no terminal) hits go straight to stdout.
pub struct TerminalReporter {
    bar: ProgressBar,
    total: u128,
}

impl TerminalReporter {
    pub fn new(total: u128, show_progress: bool) -> Self {
        let bar = if show_progress {
            let len = u64::try_from(total).unwrap_or(u64::MAX);
            let bar = ProgressBar::with_draw_target(Some(len), ProgressDrawTarget::stdout());
            let template = "{spinner:.green} [{elapsed_precise}] {msg}";
            if let Ok(style) = ProgressStyle::default_spinner().template(template) {
                bar.set_style(style);
            }
            bar
        } else {
            ProgressBar::hidden()
        };

        Self { bar, total }
    }

    fn progress_message(&self, snapshot: &TallySnapshot) -> String {
        format!(
            "Progress: {}/{} ({:.1}%) | Found: {}",
            snapshot.processed,
            self.total,
            snapshot.percent_of(self.total),
            style(snapshot.succeeded).green()
        )
    }
}

impl ScanReporter for TerminalReporter {
    fn snapshot(&self, snapshot: &TallySnapshot) {
        self.bar.set_position(snapshot.processed);
        self.bar.set_message(self.progress_message(snapshot));
    }

    fn found(&self, address: IpAddr, snapshot: &TallySnapshot) {
        let line = format!("{} {}", style("[+]").green().bold(), style(address).green());
        if self.bar.is_hidden() {
            println!("{}", line);
        } else {
            self.bar.println(line);
            self.snapshot(snapshot);
        }
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}
