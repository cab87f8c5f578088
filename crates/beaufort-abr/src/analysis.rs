//! # Quality Analysis
//!
//! Pure decision rules over the rolling stats window: the analyzer maps
//! the latest sample (plus history) to a proposed corrective [`Action`],
//! and the improvement detector decides whether a previously degraded
//! condition has recovered. Both are free of side effects so they can be
//! tested against canned sample sequences.

use std::fmt;

use serde::Serialize;

use crate::stats::{QualitySample, StatsHistory};

/// Loss percentage above which the link is considered unacceptable.
pub const UNACCEPTABLE_LOSS_PCT: f64 = 20.0;
/// Interarrival jitter considered big (ms).
pub const BIG_JITTER_MS: f64 = 40.0;
/// Round-trip propagation considered significant (seconds).
pub const SIGNIFICANT_DELAY_SECS: f64 = 0.2;
/// Cap on the loss-proportional bitrate cut (percent).
const MAX_BITRATE_CUT_PCT: f64 = 50.0;

/// What the analyzer proposes doing about the latest sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ActionKind {
    DoNothing,
    DecreaseBitrate,
    DecreasePacketRate,
    IncreaseQuality,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKind::DoNothing => write!(f, "DoNothing"),
            ActionKind::DecreaseBitrate => write!(f, "DecreaseBitrate"),
            ActionKind::DecreasePacketRate => write!(f, "DecreasePacketRate"),
            ActionKind::IncreaseQuality => write!(f, "IncreaseQuality"),
        }
    }
}

/// A proposed corrective action. `magnitude` is a percentage, meaningful
/// only for [`ActionKind::DecreaseBitrate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Action {
    pub kind: ActionKind,
    pub magnitude: u8,
}

impl Action {
    pub(crate) fn increase_quality() -> Action {
        Action {
            kind: ActionKind::IncreaseQuality,
            magnitude: 0,
        }
    }
}

/// Round-trip propagation doubled between two consecutive samples.
///
/// Only fires once the current value is at or above
/// [`SIGNIFICANT_DELAY_SECS`]; both boundaries are inclusive.
pub(crate) fn rtt_doubled(cur: &QualitySample, prev: &QualitySample) -> bool {
    cur.rtt_secs >= SIGNIFICANT_DELAY_SECS
        && prev.rtt_secs > 0.0
        && cur.rtt_secs >= prev.rtt_secs * 2.0
}

/// Map the rolling window to a corrective action.
///
/// Rules are evaluated in strict priority order against the latest sample
/// and the one before it:
///
/// 1. Heavy loss **and** heavy jitter → cut bitrate proportionally to the
///    loss (capped at 50%).
/// 2. Round-trip propagation doubled → cut bitrate by a fixed 20%.
/// 3. Heavy loss alone → pure lossy network, no congestion symptom: reduce
///    the packet rate instead of the bitrate.
/// 4. Otherwise → nothing.
pub fn analyse(history: &StatsHistory) -> Action {
    let cur = history.latest();
    let prev = history.previous();

    if cur.loss_pct >= UNACCEPTABLE_LOSS_PCT && cur.jitter_ms >= BIG_JITTER_MS {
        tracing::debug!(
            loss_pct = cur.loss_pct,
            jitter_ms = cur.jitter_ms,
            "analyse: loss rate unacceptable and big jitter"
        );
        Action {
            kind: ActionKind::DecreaseBitrate,
            magnitude: cur.loss_pct.min(MAX_BITRATE_CUT_PCT) as u8,
        }
    } else if rtt_doubled(cur, prev) {
        tracing::debug!(rtt_secs = cur.rtt_secs, "analyse: round-trip propagation doubled");
        Action {
            kind: ActionKind::DecreaseBitrate,
            magnitude: 20,
        }
    } else if cur.loss_pct >= UNACCEPTABLE_LOSS_PCT {
        tracing::debug!(loss_pct = cur.loss_pct, "analyse: loss rate unacceptable");
        Action {
            kind: ActionKind::DecreasePacketRate,
            magnitude: 0,
        }
    } else {
        Action {
            kind: ActionKind::DoNothing,
            magnitude: 0,
        }
    }
}

/// Whether a previously degraded condition has recovered.
///
/// A loss episode is judged on loss alone: when the previous sample was
/// above the loss threshold, the verdict is whether loss went down, with
/// no fallthrough to the RTT check. Otherwise a prior RTT doubling counts
/// as recovered once the round-trip estimate drops again.
pub fn has_improved(history: &StatsHistory) -> bool {
    let cur = history.latest();
    let prev = history.previous();
    let prev2 = history.previous2();

    if prev.loss_pct >= UNACCEPTABLE_LOSS_PCT {
        if cur.loss_pct < prev.loss_pct {
            tracing::debug!("lost percentage has improved");
            return true;
        }
        return false;
    }
    if rtt_doubled(prev, prev2) && cur.rtt_secs < prev.rtt_secs {
        tracing::debug!("round-trip propagation decreased");
        return true;
    }
    false
}
