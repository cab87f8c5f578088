//! # Controller State Machine
//!
//! Orchestrates one control cycle per incoming feedback report. The
//! machine has four states and no terminal state; it runs for the life of
//! the session:
//!
//! ```text
//!                 degradation              degradation
//!   Init ────────────────────▶ Probing ◀──────────────── ProbingUp
//!    ▲                          │    ▲                      │  ▲
//!    │ quality floor reached    │    │ degradation          │  │ still
//!    │ while probing up      improved│                      │  │ clean
//!    │                          ▼    │                      ▼  │
//!    └───────────────────────  Stable ── 5 clean reports ───┘
//! ```
//!
//! Init and Stable share one transition body; Stable differs only in
//! incrementing the hysteresis counter first. Probing exits to Stable only
//! on a detected improvement, never merely because no new degrading event
//! fired — declaring victory on noise is what the hysteresis exists to
//! prevent.

use std::fmt;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::analysis::{self, Action, ActionKind};
use crate::encoder::{ClockSource, EncoderControl};
use crate::executor::{self, CannotIncreaseFurther, Knobs};
use crate::stats::{self, QualitySample, StatsHistory};

/// Consecutive clean reports required before probing for headroom.
const STABLE_REPORTS_BEFORE_PROBE: u32 = 5;

/// Controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum State {
    /// Passively watching for degradation.
    Init,
    /// A corrective action was taken; waiting for improvement.
    Probing,
    /// Improvement detected; counting clean reports.
    Stable,
    /// Proactively raising quality after a clean streak.
    ProbingUp,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            State::Init => write!(f, "Init"),
            State::Probing => write!(f, "Probing"),
            State::Stable => write!(f, "Stable"),
            State::ProbingUp => write!(f, "ProbingUp"),
        }
    }
}

/// Raw fields of one feedback report, as delivered by the transport's
/// feedback channel. Extracting them from the wire format is the caller's
/// concern.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeedbackReport {
    /// Extended highest sequence number received remotely.
    pub ext_highest_seq: u64,
    /// Fractional loss since the last report, x/256.
    pub fraction_lost: u8,
    /// Interarrival jitter in transport clock ticks.
    pub interarrival_jitter: u32,
    /// Round-trip propagation estimate in seconds.
    pub rtt_secs: f64,
}

/// Observable control events, queued per cycle and drained by the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ControlEvent {
    /// A report arrived before the payload clock rate could be resolved
    /// and was dropped without touching the history.
    ReportDropped,
    /// An action was driven through the executor.
    ActionExecuted { kind: ActionKind, magnitude: u8 },
    /// The state machine moved between states.
    StateChanged { from: State, to: State },
}

/// Adaptive bitrate controller for one audio call leg.
///
/// Owned exclusively by its session and mutated only through
/// [`process_report`](Self::process_report); callers delivering reports
/// from multiple threads must serialize the calls.
pub struct AbrController {
    state: State,
    stable_count: u32,
    knobs: Knobs,
    /// Resolved once from the negotiated payload type, then immutable.
    clock_rate: Option<u32>,
    history: StatsHistory,
    events: Vec<ControlEvent>,
}

impl AbrController {
    /// Create a controller, seeding the nominal bitrate from the encoder.
    ///
    /// An absent bitrate knob means a VBR-less codec: all quality
    /// reduction will go through the packetization interval.
    pub fn new(encoder: &dyn EncoderControl) -> Self {
        let nominal_bitrate = encoder.bitrate().unwrap_or(0);
        if nominal_bitrate > 0 {
            info!(nominal_bitrate, "encoder has nominal bitrate");
        }
        AbrController {
            state: State::Init,
            stable_count: 0,
            knobs: Knobs::new(nominal_bitrate),
            clock_rate: None,
            history: StatsHistory::new(),
            events: Vec::new(),
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn stable_count(&self) -> u32 {
        self.stable_count
    }

    pub fn knobs(&self) -> &Knobs {
        &self.knobs
    }

    pub fn history(&self) -> &StatsHistory {
        &self.history
    }

    /// Process one feedback report to completion: record the sample, run
    /// the analysis, drive the chosen action, update state.
    pub fn process_report(
        &mut self,
        report: &FeedbackReport,
        clock: &dyn ClockSource,
        encoder: &mut dyn EncoderControl,
    ) {
        let clock_rate = match self.clock_rate {
            Some(rate) => rate,
            None => match clock.clock_rate() {
                Some(rate) => {
                    debug!(clock_rate = rate, "payload clock rate resolved");
                    self.clock_rate = Some(rate);
                    rate
                }
                None => {
                    // Jitter cannot be converted without a clock rate.
                    // Drop the report; the history index does not advance,
                    // so the window never holds a phantom zero entry.
                    warn!("payload clock rate unresolved, dropping report");
                    self.events.push(ControlEvent::ReportDropped);
                    return;
                }
            },
        };

        let sample = QualitySample {
            ext_highest_seq: report.ext_highest_seq,
            loss_pct: stats::loss_pct_from_fraction(report.fraction_lost),
            jitter_ms: stats::jitter_ms_from_ticks(report.interarrival_jitter, clock_rate),
            rtt_secs: report.rtt_secs,
        };
        debug!(
            loss_pct = sample.loss_pct,
            jitter_ms = sample.jitter_ms,
            rtt_secs = sample.rtt_secs,
            "feedback report"
        );
        self.history.record(sample);
        self.run_state_machine(encoder);
    }

    /// Drain queued control events in occurrence order.
    pub fn drain_events(&mut self) -> impl Iterator<Item = ControlEvent> + '_ {
        self.events.drain(..)
    }

    fn run_state_machine(&mut self, encoder: &mut dyn EncoderControl) {
        let from = self.state;
        match self.state {
            State::Stable => {
                self.stable_count += 1;
                self.watch(encoder);
            }
            State::Init => self.watch(encoder),
            State::Probing => {
                self.stable_count = 0;
                if analysis::has_improved(&self.history) {
                    self.state = State::Stable;
                } else {
                    let action = analysis::analyse(&self.history);
                    if action.kind != ActionKind::DoNothing {
                        let _ = self.execute(action, encoder);
                    }
                }
            }
            State::ProbingUp => {
                self.stable_count = 0;
                let action = analysis::analyse(&self.history);
                if action.kind != ActionKind::DoNothing {
                    let _ = self.execute(action, encoder);
                    self.state = State::Probing;
                } else if self.execute(Action::increase_quality(), encoder).is_err() {
                    // Packetization is back at its minimum; nothing left
                    // to probe for.
                    self.state = State::Init;
                }
            }
        }

        if self.state != from {
            info!(from = %from, to = %self.state, "state transition");
            self.events.push(ControlEvent::StateChanged {
                from,
                to: self.state,
            });
        } else {
            debug!(state = %self.state, "state unchanged");
        }
    }

    /// Shared Init/Stable transition body: act on any degradation, and
    /// after enough consecutive clean reports probe for headroom.
    fn watch(&mut self, encoder: &mut dyn EncoderControl) {
        let action = analysis::analyse(&self.history);
        if action.kind != ActionKind::DoNothing {
            let _ = self.execute(action, encoder);
            self.state = State::Probing;
        } else if self.stable_count >= STABLE_REPORTS_BEFORE_PROBE {
            let _ = self.execute(Action::increase_quality(), encoder);
            self.state = State::ProbingUp;
        }
    }

    fn execute(
        &mut self,
        action: Action,
        encoder: &mut dyn EncoderControl,
    ) -> Result<(), CannotIncreaseFurther> {
        let result = executor::execute(&mut self.knobs, action, encoder);
        self.events.push(ControlEvent::ActionExecuted {
            kind: action.kind,
            magnitude: action.magnitude,
        });
        result
    }
}
