//! Waveshaping distortion with a post-shaper tone filter.

use crate::insert::{InsertId, InsertParams, InsertProcessor};
use libm::tanhf;
use morfo_core::{AnalysisTap, DryWet, Smoothed, Svf, db_to_linear};
use serde::{Deserialize, Serialize};

/// Distortion parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DistortionParams {
    /// Input drive in dB (0-36).
    pub drive_db: f32,
    /// Post-shaper lowpass cutoff in Hz.
    pub tone_hz: f32,
}

impl Default for DistortionParams {
    fn default() -> Self {
        Self {
            drive_db: 12.0,
            tone_hz: 6000.0,
        }
    }
}

/// tanh waveshaper, normalized so unity input stays near unity output.
pub struct Distortion {
    params: DistortionParams,
    drive: Smoothed,
    tone: [Svf; 2],
    drywet: DryWet,
}

impl Distortion {
    /// Create with default parameters, bypassed.
    pub fn new(sample_rate: f32) -> Self {
        let mut fx = Self {
            params: DistortionParams::default(),
            drive: Smoothed::standard(1.0, sample_rate),
            tone: [Svf::new(sample_rate), Svf::new(sample_rate)],
            drywet: DryWet::new(sample_rate),
        };
        fx.apply_params();
        fx
    }

    fn apply_params(&mut self) {
        self.drive
            .set_target(db_to_linear(self.params.drive_db.clamp(0.0, 36.0)));
        for t in &mut self.tone {
            t.set_cutoff(self.params.tone_hz.clamp(200.0, 20000.0));
        }
    }
}

impl InsertProcessor for Distortion {
    fn id(&self) -> InsertId {
        InsertId::Distortion
    }

    fn set_params(&mut self, params: &InsertParams) {
        if let InsertParams::Distortion(p) = params {
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
            let drive = self.drive.advance();
            let norm = tanhf(drive).max(1e-3);
            let wet_l = self.tone[0].process(tanhf(left[i] * drive) / norm);
            let wet_r = self.tone[1].process(tanhf(right[i] * drive) / norm);
            (left[i], right[i]) = self.drywet.mix(left[i], right[i], wet_l, wet_r);
        }
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.drive.set_sample_rate(sample_rate);
        self.drywet.set_sample_rate(sample_rate);
        for t in &mut self.tone {
            t.set_sample_rate(sample_rate);
        }
        self.apply_params();
    }

    fn reset(&mut self) {
        for t in &mut self.tone {
            t.reset();
        }
        self.drywet.snap();
    }
}
