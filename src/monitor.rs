//! Search counters and progress reporting

use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic counters shared between the search workers
///
/// Workers increment, the driver reads snapshots; contention is negligible
/// next to the per-candidate derivation work.
#[derive(Debug, Default)]
pub struct SearchCounters {
    total_checked: AtomicU64,
    fulfilled_checksum: AtomicU64,
    without_repetitions: AtomicU64,
}

/// Point-in-time view of the counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterSnapshot {
    pub total_checked: u64,
    pub fulfilled_checksum: u64,
    pub without_repetitions: u64,
}

impl SearchCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one enumerated candidate
    pub fn record_checked(&self) {
        self.total_checked.fetch_add(1, Ordering::Relaxed);
    }

    /// Count one candidate passing the checksum filter
    pub fn record_checksum(&self) {
        self.fulfilled_checksum.fetch_add(1, Ordering::Relaxed);
    }

    /// Count one candidate passing the repetition filter
    pub fn record_repetition_free(&self) {
        self.without_repetitions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            total_checked: self.total_checked.load(Ordering::Relaxed),
            fulfilled_checksum: self.fulfilled_checksum.load(Ordering::Relaxed),
            without_repetitions: self.without_repetitions.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Display for CounterSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} total, {} fulfilled checksum, {} without repetitions",
            self.total_checked, self.fulfilled_checksum, self.without_repetitions
        )
    }
}

/// Emits progress whenever `total_checked` crosses the next power of two
#[derive(Debug)]
pub struct ProgressReporter {
    bar: Option<ProgressBar>,
    next_report: u64,
}

impl ProgressReporter {
    /// Create a reporter for a search space of `total` candidates
    pub fn new(total: u128, show_bar: bool) -> Self {
        let bar = show_bar.then(|| {
            let bar = ProgressBar::new(total.min(u64::MAX as u128) as u64);
            bar.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg}")
                    .expect("static progress template")
                    .progress_chars("#>-"),
            );
            bar
        });
        Self {
            bar,
            next_report: 2,
        }
    }

    /// Report progress if a doubling threshold was crossed since last time
    pub fn maybe_report(&mut self, snapshot: CounterSnapshot) {
        if let Some(bar) = &self.bar {
            bar.set_position(snapshot.total_checked);
            bar.set_message(format!(
                "{} valid",
                snapshot.without_repetitions
            ));
        }
        if snapshot.total_checked >= self.next_report {
            info!("Seed phrases checked: {snapshot}");
            while self.next_report <= snapshot.total_checked {
                self.next_report = self.next_report.saturating_mul(2);
            }
        }
    }

    /// Emit the final summary
    pub fn finish(&self, snapshot: CounterSnapshot) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
        info!("Search finished: {snapshot}");
    }
}
