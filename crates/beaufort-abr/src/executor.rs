//! # Action Executor
//!
//! Applies a proposed [`Action`] against the encoder capability, updating
//! the bitrate/packetization knobs. Bitrate-control failures never abort a
//! control cycle: they fall back deterministically to a
//! packetization-interval increase, and a failed ptime push is logged and
//! swallowed. The next feedback report simply re-triggers analysis.

use serde::Serialize;
use tracing::{debug, warn};

use crate::analysis::{Action, ActionKind};
use crate::encoder::EncoderControl;

/// Packetization-interval ceiling (ms).
pub const MAX_PTIME_MS: u32 = 100;
/// Initial and minimum packetization interval (ms).
pub const DEFAULT_PTIME_MS: u32 = 20;

/// Packetization is already at its minimum; quality cannot be raised
/// further. Internal signal, never surfaced to the caller as an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CannotIncreaseFurther;

/// Bitrate and packetization knobs the executor drives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Knobs {
    /// Smallest packetization interval the session accepts (ms).
    pub min_ptime: u32,
    /// Current packetization interval (ms). Always within
    /// `[min_ptime, MAX_PTIME_MS]`.
    pub cur_ptime: u32,
    /// Encoder bitrate at session start (bits/sec); 0 signals a VBR-less
    /// codec with no bitrate knob.
    pub nominal_bitrate: u32,
    /// Bookkeeping of the last bitrate read back from the encoder
    /// (bits/sec). May go stale when a re-read fails.
    pub current_bitrate: u32,
}

impl Knobs {
    pub fn new(nominal_bitrate: u32) -> Self {
        Knobs {
            min_ptime: DEFAULT_PTIME_MS,
            cur_ptime: DEFAULT_PTIME_MS,
            nominal_bitrate,
            current_bitrate: nominal_bitrate,
        }
    }
}

/// Apply `action` against the encoder, updating knob bookkeeping.
///
/// Returns `Err(CannotIncreaseFurther)` only for an `IncreaseQuality`
/// action with `cur_ptime` already at `min_ptime`; every other outcome,
/// including absorbed capability failures, is `Ok`.
pub fn execute(
    knobs: &mut Knobs,
    action: Action,
    encoder: &mut dyn EncoderControl,
) -> Result<(), CannotIncreaseFurther> {
    debug!(kind = %action.kind, magnitude = action.magnitude, "executing action");
    match action.kind {
        ActionKind::DoNothing => Ok(()),
        ActionKind::DecreaseBitrate => {
            decrease_bitrate(knobs, action.magnitude, encoder);
            Ok(())
        }
        ActionKind::DecreasePacketRate => {
            increase_ptime(knobs, encoder);
            Ok(())
        }
        ActionKind::IncreaseQuality => {
            if knobs.cur_ptime > knobs.min_ptime {
                knobs.cur_ptime -= knobs.min_ptime;
                apply_ptime(knobs, encoder);
                Ok(())
            } else {
                Err(CannotIncreaseFurther)
            }
        }
    }
}

fn decrease_bitrate(knobs: &mut Knobs, magnitude: u8, encoder: &mut dyn EncoderControl) {
    if knobs.nominal_bitrate == 0 {
        // Not a VBR codec; the only knob left is the packet rate.
        increase_ptime(knobs, encoder);
        return;
    }
    let Some(cur) = encoder.bitrate() else {
        warn!("bitrate read failed");
        increase_ptime(knobs, encoder);
        return;
    };
    let new = cur - (cur as u64 * magnitude as u64 / 100) as u32;
    debug!(from = cur, to = new, "attempting to reduce audio bitrate");
    if let Err(err) = encoder.set_bitrate(new) {
        warn!(%err, "bitrate set failed");
        increase_ptime(knobs, encoder);
        return;
    }
    // Best-effort re-read; stale bookkeeping on a failed read is fine.
    if let Some(actual) = encoder.bitrate() {
        knobs.current_bitrate = actual;
        debug!(bitrate = actual, "bitrate actually set");
    }
}

/// Packetization-interval fallback: one step toward fewer, larger packets.
fn increase_ptime(knobs: &mut Knobs, encoder: &mut dyn EncoderControl) {
    if knobs.cur_ptime >= MAX_PTIME_MS {
        debug!("maximum ptime reached");
        return;
    }
    knobs.cur_ptime += knobs.min_ptime;
    apply_ptime(knobs, encoder);
}

fn apply_ptime(knobs: &Knobs, encoder: &mut dyn EncoderControl) {
    match encoder.set_ptime(knobs.cur_ptime) {
        Ok(()) => debug!(ptime_ms = knobs.cur_ptime, "ptime changed"),
        Err(err) => warn!(%err, ptime_ms = knobs.cur_ptime, "ptime push failed"),
    }
}
