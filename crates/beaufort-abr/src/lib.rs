//! # beaufort-abr
//!
//! Beaufort adaptive audio bitrate control.
//!
//! A closed-loop controller for one real-time audio session: it consumes
//! periodic network-quality feedback (packet loss, interarrival jitter,
//! round-trip propagation) delivered out-of-band by the transport, and
//! decides whether to shrink the encoder bitrate, reduce the packet rate
//! by enlarging the packetization interval, or relax back toward nominal
//! quality. Hysteresis keeps it from oscillating on transient noise.
//!
//! The controller is synchronous and reactive — no timers, no background
//! tasks. It is driven exclusively by the arrival of feedback reports and
//! talks to the encoder through narrow capability traits.
//!
//! ## Crate structure
//!
//! - [`stats`] — Quality samples and the rolling 3-report history window
//! - [`analysis`] — Threshold rules proposing corrective actions
//! - [`encoder`] — Capability traits to the encoder and session
//! - [`executor`] — Action execution with packetization-interval fallback
//! - [`controller`] — Four-state probing/hysteresis state machine

pub mod analysis;
pub mod controller;
pub mod encoder;
pub mod executor;
pub mod stats;
