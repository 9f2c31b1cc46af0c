//! Microphone capture, resampling, and the silence gate.
//!
//! Audio is captured via CPAL, downmixed to mono, and resampled to 16kHz
//! (the format the transcriber expects) before the gate or the speech model
//! ever sees it.

use anyhow::Result;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

/// Sample rate the transcriber expects.
pub const TARGET_RATE: u32 = 16_000;

mod gate;
mod recorder;
mod resample;
#[cfg(test)]
mod tests;

pub use gate::{rms_db, GateDecision, SilenceGate};
pub use recorder::Recorder;

/// Capture seam of the pipeline: produces one chunk's worth of 16kHz mono
/// PCM. Implementations must watch `stop` and return early (with whatever
/// was captured so far) once it is raised.
pub trait ChunkSource: Send {
    fn capture(&mut self, duration: Duration, stop: &AtomicBool) -> Result<Vec<f32>>;
}
