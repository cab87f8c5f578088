//! # Controller trajectories under generated network scenarios
//!
//! Drives the Beaufort controller through seeded feedback traces and
//! asserts trajectory-level behaviour: calm links leave it alone,
//! congestion forces bitrate cuts, lossy links only touch the packet
//! rate, and the knob invariants hold at every step.

use anyhow::bail;
use beaufort_abr::analysis::ActionKind;
use beaufort_abr::controller::{AbrController, ControlEvent, State};
use beaufort_abr::encoder::{ClockSource, EncoderControl};
use beaufort_sim::scenario::{Scenario, ScenarioConfig};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

// ─── Fakes ──────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct SimEncoder {
    bitrate: Option<u32>,
    set_bitrate_calls: usize,
    set_ptime_calls: usize,
}

impl SimEncoder {
    fn vbr(bitrate: u32) -> Self {
        SimEncoder {
            bitrate: Some(bitrate),
            ..Default::default()
        }
    }
}

impl EncoderControl for SimEncoder {
    fn bitrate(&self) -> Option<u32> {
        self.bitrate
    }

    fn set_bitrate(&mut self, bitrate: u32) -> anyhow::Result<()> {
        if self.bitrate.is_none() {
            bail!("no bitrate knob");
        }
        self.set_bitrate_calls += 1;
        self.bitrate = Some(bitrate);
        Ok(())
    }

    fn set_ptime(&mut self, _ptime_ms: u32) -> anyhow::Result<()> {
        self.set_ptime_calls += 1;
        Ok(())
    }
}

struct Clock48k;

impl ClockSource for Clock48k {
    fn clock_rate(&self) -> Option<u32> {
        Some(48_000)
    }
}

/// Run a whole trace, checking the knob invariants after every report.
fn run(ctl: &mut AbrController, enc: &mut SimEncoder, cfg: ScenarioConfig) -> Vec<ControlEvent> {
    let nominal = ctl.knobs().nominal_bitrate;
    let mut events = Vec::new();
    for report in Scenario::new(cfg).reports() {
        ctl.process_report(&report, &Clock48k, enc);
        let knobs = ctl.knobs();
        assert!(
            (knobs.min_ptime..=100).contains(&knobs.cur_ptime),
            "ptime out of range: {}",
            knobs.cur_ptime
        );
        assert!(
            knobs.current_bitrate <= nominal,
            "bitrate above nominal: {}",
            knobs.current_bitrate
        );
        events.extend(ctl.drain_events());
    }
    events
}

// ─── Trajectories ───────────────────────────────────────────────────────────

#[test]
fn calm_link_is_left_alone() {
    init_tracing();
    let mut enc = SimEncoder::vbr(64_000);
    let mut ctl = AbrController::new(&enc);

    let events = run(&mut ctl, &mut enc, ScenarioConfig::calm(11));
    assert_eq!(ctl.state(), State::Init);
    assert!(events.is_empty(), "no actions on a calm link: {events:?}");
    assert_eq!(ctl.knobs().cur_ptime, 20);
    assert_eq!(ctl.knobs().current_bitrate, 64_000);
    assert_eq!(enc.set_bitrate_calls, 0);
    assert_eq!(enc.set_ptime_calls, 0);
}

#[test]
fn congested_link_forces_bitrate_cuts() {
    let mut enc = SimEncoder::vbr(64_000);
    let mut ctl = AbrController::new(&enc);

    let events = run(&mut ctl, &mut enc, ScenarioConfig::congested(17));
    assert!(events.iter().any(|e| matches!(
        e,
        ControlEvent::ActionExecuted {
            kind: ActionKind::DecreaseBitrate,
            ..
        }
    )));
    assert!(events.contains(&ControlEvent::StateChanged {
        from: State::Init,
        to: State::Probing,
    }));
    assert!(
        ctl.knobs().current_bitrate < 64_000,
        "bitrate should have been cut, got {}",
        ctl.knobs().current_bitrate
    );
}

#[test]
fn lossy_link_only_touches_packet_rate() {
    let mut enc = SimEncoder::default(); // VBR-less codec
    let mut ctl = AbrController::new(&enc);

    run(&mut ctl, &mut enc, ScenarioConfig::lossy_link(23));
    assert_eq!(enc.set_bitrate_calls, 0, "VBR-less: never a bitrate call");
    assert!(enc.set_ptime_calls > 0, "loss must have raised ptime");
}

#[test]
fn identical_seeds_yield_identical_trajectories() {
    let mut enc_a = SimEncoder::vbr(64_000);
    let mut ctl_a = AbrController::new(&enc_a);
    let events_a = run(&mut ctl_a, &mut enc_a, ScenarioConfig::congested(5));

    let mut enc_b = SimEncoder::vbr(64_000);
    let mut ctl_b = AbrController::new(&enc_b);
    let events_b = run(&mut ctl_b, &mut enc_b, ScenarioConfig::congested(5));

    assert_eq!(events_a, events_b);
    assert_eq!(ctl_a.state(), ctl_b.state());
    assert_eq!(ctl_a.knobs(), ctl_b.knobs());
}
