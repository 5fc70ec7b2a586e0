//! Ring modulator: multiplication by a sine carrier.

use crate::insert::{InsertId, InsertParams, InsertProcessor};
use core::f32::consts::TAU;
use libm::sinf;
use morfo_core::{AnalysisTap, DryWet, Smoothed};
use serde::{Deserialize, Serialize};

/// Ring modulator parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RingModParams {
    /// Carrier frequency in Hz (1-8000).
    pub freq_hz: f32,
}

impl Default for RingModParams {
    fn default() -> Self {
        Self { freq_hz: 440.0 }
    }
}

/// Sine-carrier ring modulation.
pub struct RingMod {
    freq: Smoothed,
    phase: f32,
    drywet: DryWet,
    sample_rate: f32,
}

impl RingMod {
    /// Create with default parameters, bypassed.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            freq: Smoothed::standard(440.0, sample_rate),
            phase: 0.0,
            drywet: DryWet::new(sample_rate),
            sample_rate,
        }
    }
}

impl InsertProcessor for RingMod {
    fn id(&self) -> InsertId {
        InsertId::RingMod
    }

    fn set_params(&mut self, params: &InsertParams) {
        if let InsertParams::RingMod(p) = params {
            self.freq.set_target(p.freq_hz.clamp(1.0, 8000.0));
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
            let carrier = sinf(self.phase * TAU);
            self.phase += self.freq.advance() / self.sample_rate;
            if self.phase >= 1.0 {
                self.phase -= 1.0;
            }
            (left[i], right[i]) =
                self.drywet
                    .mix(left[i], right[i], left[i] * carrier, right[i] * carrier);
        }
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.freq.set_sample_rate(sample_rate);
        self.drywet.set_sample_rate(sample_rate);
    }

    fn reset(&mut self) {
        self.phase = 0.0;
        self.drywet.snap();
    }
}
