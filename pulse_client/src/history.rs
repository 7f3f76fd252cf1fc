//! Rolling sample history for chart rendering.
//!
//! The dashboard plots the last [`HISTORY_WINDOW`] samples of a
//! series; older samples fall off the front as new ones arrive.

use std::collections::VecDeque;

use crate::metrics::CpuMetrics;

/// Samples kept per series.
pub const HISTORY_WINDOW: usize = 10;

/// Fixed-window rolling history of samples.
#[derive(Debug, Clone)]
pub struct History<T> {
    window: usize,
    samples: VecDeque<T>,
}

impl<T> Default for History<T> {
    fn default() -> Self {
        Self::new(HISTORY_WINDOW)
    }
}

impl<T> History<T> {
    /// Create a history keeping at most `window` samples.
    #[must_use]
    pub fn new(window: usize) -> Self {
        Self {
            window: window.max(1),
            samples: VecDeque::with_capacity(window.max(1)),
        }
    }

    /// Append a sample, evicting the oldest when the window is full.
    pub fn push(&mut self, sample: T) {
        if self.samples.len() == self.window {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    /// The most recent sample.
    #[must_use]
    pub fn latest(&self) -> Option<&T> {
        self.samples.back()
    }

    /// Samples in arrival order, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.samples.iter()
    }

    /// Number of stored samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether no samples have been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// The configured window size.
    #[must_use]
    pub const fn window(&self) -> usize {
        self.window
    }
}

/// Rolling usage history for the CPU chart: the overall series plus
/// one series per core.
#[derive(Debug, Clone, Default)]
pub struct CpuUsageHistory {
    overall: History<f64>,
    cores: Vec<History<f64>>,
}

impl CpuUsageHistory {
    /// Create an empty history with the default window.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one CPU sample.
    pub fn record(&mut self, sample: &CpuMetrics) {
        self.overall.push(sample.usage);
        if self.cores.len() < sample.cores_usage.len() {
            self.cores
                .resize_with(sample.cores_usage.len(), History::default);
        }
        for (series, usage) in self.cores.iter_mut().zip(&sample.cores_usage) {
            series.push(*usage);
        }
    }

    /// The overall usage series.
    #[must_use]
    pub const fn overall(&self) -> &History<f64> {
        &self.overall
    }

    /// Per-core usage series, indexed by core.
    #[must_use]
    pub fn cores(&self) -> &[History<f64>] {
        &self.cores
    }
}
