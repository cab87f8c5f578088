//! # Quality Statistics
//!
//! Per-report quality samples and the rolling history window the analyzer
//! reads. Samples are derived from raw feedback-report fields by the
//! conversion helpers in this module; the window keeps the last
//! [`STATS_HISTORY`] samples, addressed by a monotonically increasing
//! counter that never resets.

use serde::Serialize;

/// Number of samples kept in the rolling window.
pub const STATS_HISTORY: usize = 3;

/// One network-quality sample, derived from a single feedback report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct QualitySample {
    /// Extended highest sequence number received remotely (informational).
    pub ext_highest_seq: u64,
    /// Packet loss since the last report, percent in [0, 100].
    pub loss_pct: f64,
    /// Interarrival jitter in milliseconds.
    pub jitter_ms: f64,
    /// Round-trip propagation estimate in seconds.
    pub rtt_secs: f64,
}

/// Convert an 8-bit fractional loss (x/256) to a percentage.
pub fn loss_pct_from_fraction(fraction_lost: u8) -> f64 {
    100.0 * fraction_lost as f64 / 256.0
}

/// Convert interarrival jitter from transport clock ticks to milliseconds.
pub fn jitter_ms_from_ticks(ticks: u32, clock_rate: u32) -> f64 {
    if clock_rate == 0 {
        return 0.0;
    }
    1000.0 * ticks as f64 / clock_rate as f64
}

/// Rolling window of the last [`STATS_HISTORY`] quality samples.
///
/// `record` advances the counter and overwrites the oldest slot, so
/// `latest()` is always the most recently recorded sample regardless of
/// how many have been seen. Slots that have never been written read as
/// zero-valued defaults; callers must not trust cross-sample comparisons
/// until [`sample_count`](Self::sample_count) reaches `STATS_HISTORY`.
#[derive(Debug, Clone, Default)]
pub struct StatsHistory {
    slots: [QualitySample; STATS_HISTORY],
    current_index: u64,
}

impl StatsHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sample, advancing the window.
    pub fn record(&mut self, sample: QualitySample) {
        self.current_index += 1;
        self.slots[(self.current_index % STATS_HISTORY as u64) as usize] = sample;
    }

    /// Most recent sample.
    pub fn latest(&self) -> &QualitySample {
        self.at_offset(0)
    }

    /// One report back.
    pub fn previous(&self) -> &QualitySample {
        self.at_offset(1)
    }

    /// Two reports back.
    pub fn previous2(&self) -> &QualitySample {
        self.at_offset(2)
    }

    /// Number of samples recorded since creation.
    pub fn sample_count(&self) -> u64 {
        self.current_index
    }

    fn at_offset(&self, back: u64) -> &QualitySample {
        let n = STATS_HISTORY as u64;
        let idx = (n + self.current_index % n - back) % n;
        &self.slots[idx as usize]
    }
}
