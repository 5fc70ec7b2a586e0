//! Feed-forward compressor with stereo-linked detection.

use crate::insert::{InsertId, InsertParams, InsertProcessor};
use libm::expf;
use morfo_core::{AnalysisTap, DryWet, db_to_linear, linear_to_db};
use serde::{Deserialize, Serialize};

/// Compressor parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompressorParams {
    /// Level above which gain reduction begins, in dB.
    pub threshold_db: f32,
    /// Compression ratio (1-20).
    pub ratio: f32,
    /// Attack time in milliseconds.
    pub attack_ms: f32,
    /// Release time in milliseconds.
    pub release_ms: f32,
    /// Output makeup gain in dB.
    pub makeup_db: f32,
}

impl Default for CompressorParams {
    fn default() -> Self {
        Self {
            threshold_db: -18.0,
            ratio: 4.0,
            attack_ms: 10.0,
            release_ms: 120.0,
            makeup_db: 0.0,
        }
    }
}

/// Peak-detecting compressor; detection is linked across channels so the
/// stereo image does not shift under reduction.
pub struct Compressor {
    params: CompressorParams,
    envelope: f32,
    attack_coeff: f32,
    release_coeff: f32,
    makeup: f32,
    drywet: DryWet,
    sample_rate: f32,
}

impl Compressor {
    /// Create with default parameters, bypassed.
    pub fn new(sample_rate: f32) -> Self {
        let mut fx = Self {
            params: CompressorParams::default(),
            envelope: 0.0,
            attack_coeff: 0.0,
            release_coeff: 0.0,
            makeup: 1.0,
            drywet: DryWet::new(sample_rate),
            sample_rate,
        };
        fx.apply_params();
        fx
    }

    fn apply_params(&mut self) {
        let atk = self.params.attack_ms.max(0.1) / 1000.0 * self.sample_rate;
        let rel = self.params.release_ms.max(1.0) / 1000.0 * self.sample_rate;
        self.attack_coeff = expf(-1.0 / atk);
        self.release_coeff = expf(-1.0 / rel);
        self.makeup = db_to_linear(self.params.makeup_db.clamp(-12.0, 24.0));
    }

    #[inline]
    fn gain_for(&self, level: f32) -> f32 {
        let level_db = linear_to_db(level);
        let over = level_db - self.params.threshold_db;
        if over <= 0.0 {
            return 1.0;
        }
        let ratio = self.params.ratio.clamp(1.0, 20.0);
        let reduced = over - over / ratio;
        db_to_linear(-reduced)
    }
}

impl InsertProcessor for Compressor {
    fn id(&self) -> InsertId {
        InsertId::Compressor
    }

    fn set_params(&mut self, params: &InsertParams) {
        if let InsertParams::Compressor(p) = params {
            self.params = *p;
            self.apply_params();
        }
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.drywet.set_enabled(enabled);
    }

    fn is_enabled(&self) -> bool {
        self.drywet.is_enabled()
    }

    fn set_wet_tap(&mut self, tap: AnalysisTap) {
        self.drywet.set_tap(tap);
    }

    fn process(&mut self, left: &mut [f32], right: &mut [f32]) {
        for i in 0..left.len() {
            let peak = left[i].abs().max(right[i].abs());
            let coeff = if peak > self.envelope {
                self.attack_coeff
            } else {
                self.release_coeff
            };
            self.envelope = peak + (self.envelope - peak) * coeff;

            let gain = self.gain_for(self.envelope) * self.makeup;
            (left[i], right[i]) =
                self.drywet
                    .mix(left[i], right[i], left[i] * gain, right[i] * gain);
        }
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.drywet.set_sample_rate(sample_rate);
        self.apply_params();
    }

    fn reset(&mut self) {
        self.envelope = 0.0;
        self.drywet.snap();
    }
}
