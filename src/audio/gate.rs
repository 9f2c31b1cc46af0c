//! RMS silence gate.
//!
//! Whisper is prone to hallucinating text on near-silent input, so chunks
//! whose RMS level sits below a threshold are dropped before the model is
//! invoked. This is a heuristic: false skips and false passes are accepted.

/// Level reported for an empty buffer; also the practical noise floor.
const METER_FLOOR_DB: f32 = -120.0;

/// RMS level of a buffer in dBFS.
pub fn rms_db(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return METER_FLOOR_DB;
    }
    let energy: f32 = samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32;
    let rms = energy.sqrt().max(1e-6);
    20.0 * rms.log10()
}

/// Outcome of gating one chunk, with the measured level for display.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GateDecision {
    Pass { level_db: f32 },
    Skip { level_db: f32 },
}

/// Compares a chunk's RMS level against a fixed threshold.
#[derive(Debug, Clone)]
pub struct SilenceGate {
    threshold_db: f32,
}

impl SilenceGate {
    pub fn new(threshold_db: f32) -> Self {
        Self { threshold_db }
    }

    pub fn evaluate(&self, samples: &[f32]) -> GateDecision {
        let level_db = rms_db(samples);
        if level_db >= self.threshold_db {
            GateDecision::Pass { level_db }
        } else {
            GateDecision::Skip { level_db }
        }
    }
}
