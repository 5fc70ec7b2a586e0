//! Four-stage allpass phaser.

use crate::insert::{InsertId, InsertParams, InsertProcessor};
use morfo_core::{AnalysisTap, Biquad, DryWet, Lfo};
use serde::{Deserialize, Serialize};

const STAGES: usize = 4;
/// Allpass coefficients are recomputed every this many samples.
const CONTROL_INTERVAL: u32 = 16;

/// Phaser parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PhaserParams {
    /// Sweep rate in Hz (0.05-5).
    pub rate_hz: f32,
    /// Sweep floor in Hz.
    pub min_hz: f32,
    /// Sweep ceiling in Hz.
    pub max_hz: f32,
    /// Feedback amount (0-0.9).
    pub feedback: f32,
}

impl Default for PhaserParams {
    fn default() -> Self {
        Self {
            rate_hz: 0.4,
            min_hz: 300.0,
            max_hz: 3000.0,
            feedback: 0.4,
        }
    }
}

/// Swept-notch phaser.
pub struct Phaser {
    params: PhaserParams,
    stages: [[Biquad; STAGES]; 2],
    fb: (f32, f32),
    lfo: Lfo,
    control_counter: u32,
    drywet: DryWet,
    sample_rate: f32,
}

impl Phaser {
    /// Create with default parameters, bypassed.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            params: PhaserParams::default(),
            stages: [
                core::array::from_fn(|_| Biquad::new()),
                core::array::from_fn(|_| Biquad::new()),
            ],
            fb: (0.0, 0.0),
            lfo: Lfo::new(sample_rate, 0.4),
            control_counter: 0,
            drywet: DryWet::new(sample_rate),
            sample_rate,
        }
    }

    fn retune(&mut self, lfo_value: f32) {
        let lo = self.params.min_hz.clamp(50.0, 10000.0);
        let hi = self.params.max_hz.clamp(lo, 12000.0);
        let center = lo + (lfo_value * 0.5 + 0.5) * (hi - lo);
        for channel in &mut self.stages {
            for stage in channel.iter_mut() {
                stage.set_allpass(center, 0.7, self.sample_rate);
            }
        }
    }
}

impl InsertProcessor for Phaser {
    fn id(&self) -> InsertId {
        InsertId::Phaser
    }

    fn set_params(&mut self, params: &InsertParams) {
        if let InsertParams::Phaser(p) = params {
            self.params = *p;
            self.lfo.set_rate(p.rate_hz.clamp(0.05, 5.0));
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
        let feedback = self.params.feedback.clamp(0.0, 0.9);
        for i in 0..left.len() {
            let lfo_value = self.lfo.next();
            if self.control_counter == 0 {
                self.retune(lfo_value);
            }
            self.control_counter = (self.control_counter + 1) % CONTROL_INTERVAL;

            let mut wet_l = left[i] + self.fb.0 * feedback;
            let mut wet_r = right[i] + self.fb.1 * feedback;
            for s in 0..STAGES {
                wet_l = self.stages[0][s].process(wet_l);
                wet_r = self.stages[1][s].process(wet_r);
            }
            self.fb = (wet_l, wet_r);
            (left[i], right[i]) = self.drywet.mix(left[i], right[i], wet_l, wet_r);
        }
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.lfo.set_sample_rate(sample_rate);
        self.drywet.set_sample_rate(sample_rate);
    }

    fn reset(&mut self) {
        for channel in &mut self.stages {
            for stage in channel.iter_mut() {
                stage.reset();
            }
        }
        self.fb = (0.0, 0.0);
        self.lfo.reset();
        self.control_counter = 0;
        self.drywet.snap();
    }
}
