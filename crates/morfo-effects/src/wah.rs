//! LFO-swept bandpass wah.

use crate::insert::{InsertId, InsertParams, InsertProcessor};
use morfo_core::{AnalysisTap, Biquad, DryWet, Lfo};
use serde::{Deserialize, Serialize};

/// Bandpass coefficients are recomputed every this many samples.
const CONTROL_INTERVAL: u32 = 16;

/// Wah parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WahParams {
    /// Sweep rate in Hz (0.1-10).
    pub rate_hz: f32,
    /// Sweep floor in Hz.
    pub min_hz: f32,
    /// Sweep ceiling in Hz.
    pub max_hz: f32,
    /// Filter Q (1-15).
    pub resonance: f32,
}

impl Default for WahParams {
    fn default() -> Self {
        Self {
            rate_hz: 1.5,
            min_hz: 400.0,
            max_hz: 2200.0,
            resonance: 5.0,
        }
    }
}

/// Auto-wah voiced as a swept resonant bandpass.
pub struct Wah {
    params: WahParams,
    filters: [Biquad; 2],
    lfo: Lfo,
    control_counter: u32,
    drywet: DryWet,
    sample_rate: f32,
}

impl Wah {
    /// Create with default parameters, bypassed.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            params: WahParams::default(),
            filters: [Biquad::new(), Biquad::new()],
            lfo: Lfo::new(sample_rate, 1.5),
            control_counter: 0,
            drywet: DryWet::new(sample_rate),
            sample_rate,
        }
    }

    fn retune(&mut self, lfo_value: f32) {
        let lo = self.params.min_hz.clamp(100.0, 4000.0);
        let hi = self.params.max_hz.clamp(lo, 8000.0);
        let center = lo + (lfo_value * 0.5 + 0.5) * (hi - lo);
        let q = self.params.resonance.clamp(1.0, 15.0);
        for f in &mut self.filters {
            f.set_bandpass(center, q, self.sample_rate);
        }
    }
}

impl InsertProcessor for Wah {
    fn id(&self) -> InsertId {
        InsertId::Wah
    }

    fn set_params(&mut self, params: &InsertParams) {
        if let InsertParams::Wah(p) = params {
            self.params = *p;
            self.lfo.set_rate(p.rate_hz.clamp(0.1, 10.0));
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
            let lfo_value = self.lfo.next();
            if self.control_counter == 0 {
                self.retune(lfo_value);
            }
            self.control_counter = (self.control_counter + 1) % CONTROL_INTERVAL;

            // Bandpass kills most energy; boost to stay audible
            let wet_l = self.filters[0].process(left[i]) * 2.0;
            let wet_r = self.filters[1].process(right[i]) * 2.0;
            (left[i], right[i]) = self.drywet.mix(left[i], right[i], wet_l, wet_r);
        }
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.lfo.set_sample_rate(sample_rate);
        self.drywet.set_sample_rate(sample_rate);
    }

    fn reset(&mut self) {
        for f in &mut self.filters {
            f.reset();
        }
        self.lfo.reset();
        self.control_counter = 0;
        self.drywet.snap();
    }
}
