//! # Encoder and Session Capabilities
//!
//! Narrow seams to the surrounding media session. The controller never
//! references a concrete encoder or session type; adapters implement these
//! traits, and tests drive the controller with fakes returning canned
//! values and controllable failures.

use anyhow::Result;

/// Control surface of the audio encoder.
pub trait EncoderControl {
    /// Current encoder bitrate in bits/sec.
    ///
    /// `None` when the codec exposes no bitrate knob or the underlying
    /// call failed; the controller treats both the same way.
    fn bitrate(&self) -> Option<u32>;

    /// Set the encoder bitrate in bits/sec.
    fn set_bitrate(&mut self, bitrate: u32) -> Result<()>;

    /// Push a new packetization interval (ptime, milliseconds) to the
    /// encoder, FMTP-parameter style.
    fn set_ptime(&mut self, ptime_ms: u32) -> Result<()>;
}

/// Negotiated payload clock lookup.
pub trait ClockSource {
    /// Clock rate of the negotiated payload type in Hz, or `None` while
    /// negotiation has not completed.
    fn clock_rate(&self) -> Option<u32>;
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use anyhow::bail;

    /// Scriptable encoder fake recording every capability call.
    #[derive(Debug, Default)]
    pub struct FakeEncoder {
        /// Value returned by `bitrate()`; `None` models a VBR-less codec
        /// or a failed read.
        pub bitrate: Option<u32>,
        pub fail_set_bitrate: bool,
        pub fail_set_ptime: bool,
        pub set_bitrate_calls: Vec<u32>,
        pub set_ptime_calls: Vec<u32>,
    }

    impl FakeEncoder {
        pub fn vbr(bitrate: u32) -> Self {
            FakeEncoder {
                bitrate: Some(bitrate),
                ..Default::default()
            }
        }

        pub fn cbr() -> Self {
            FakeEncoder::default()
        }
    }

    impl EncoderControl for FakeEncoder {
        fn bitrate(&self) -> Option<u32> {
            self.bitrate
        }

        fn set_bitrate(&mut self, bitrate: u32) -> Result<()> {
            if self.fail_set_bitrate {
                bail!("encoder rejected bitrate change");
            }
            self.set_bitrate_calls.push(bitrate);
            self.bitrate = Some(bitrate);
            Ok(())
        }

        fn set_ptime(&mut self, ptime_ms: u32) -> Result<()> {
            if self.fail_set_ptime {
                bail!("encoder rejected ptime change");
            }
            self.set_ptime_calls.push(ptime_ms);
            Ok(())
        }
    }

    /// Clock source with a fixed (or absent) rate.
    pub struct FixedClock(pub Option<u32>);

    impl ClockSource for FixedClock {
        fn clock_rate(&self) -> Option<u32> {
            self.0
        }
    }
}
