//! Dual-tap modulated chorus.
//!
//! Two delay taps per channel, modulated by quadrature LFOs, centered
//! around a 20 ms base delay.

use crate::insert::{InsertId, InsertParams, InsertProcessor};
use morfo_core::{AnalysisTap, DelayLine, DryWet, Lfo};
use serde::{Deserialize, Serialize};

const BASE_DELAY_MS: f32 = 20.0;
const MAX_DELAY_SECS: f32 = 0.06;

/// Chorus parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChorusParams {
    /// Modulation rate in Hz (0.05-10).
    pub rate_hz: f32,
    /// Modulation depth in milliseconds (0-15).
    pub depth_ms: f32,
}

impl Default for ChorusParams {
    fn default() -> Self {
        Self {
            rate_hz: 0.8,
            depth_ms: 6.0,
        }
    }
}

/// Classic stereo chorus.
pub struct Chorus {
    params: ChorusParams,
    delay: [DelayLine; 2],
    lfo: [Lfo; 2],
    drywet: DryWet,
    sample_rate: f32,
}

impl Chorus {
    /// Create with default parameters, bypassed.
    pub fn new(sample_rate: f32) -> Self {
        let mut lfo_r = Lfo::new(sample_rate, 0.8);
        lfo_r.set_phase(0.25); // quadrature for stereo movement
        let mut fx = Self {
            params: ChorusParams::default(),
            delay: [
                DelayLine::from_time(sample_rate, MAX_DELAY_SECS),
                DelayLine::from_time(sample_rate, MAX_DELAY_SECS),
            ],
            lfo: [Lfo::new(sample_rate, 0.8), lfo_r],
            drywet: DryWet::new(sample_rate),
            sample_rate,
        };
        fx.apply_params();
        fx
    }

    fn apply_params(&mut self) {
        let rate = self.params.rate_hz.clamp(0.05, 10.0);
        for lfo in &mut self.lfo {
            lfo.set_rate(rate);
        }
    }
}

impl InsertProcessor for Chorus {
    fn id(&self) -> InsertId {
        InsertId::Chorus
    }

    fn set_params(&mut self, params: &InsertParams) {
        if let InsertParams::Chorus(p) = params {
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
        let depth = self.params.depth_ms.clamp(0.0, 15.0) / 1000.0 * self.sample_rate;
        let base = BASE_DELAY_MS / 1000.0 * self.sample_rate;
        for i in 0..left.len() {
            self.delay[0].write(left[i]);
            self.delay[1].write(right[i]);
            let wet_l = self.delay[0].read(base + self.lfo[0].next() * depth * 0.5);
            let wet_r = self.delay[1].read(base + self.lfo[1].next() * depth * 0.5);
            (left[i], right[i]) = self.drywet.mix(left[i], right[i], wet_l, wet_r);
        }
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.delay = [
            DelayLine::from_time(sample_rate, MAX_DELAY_SECS),
            DelayLine::from_time(sample_rate, MAX_DELAY_SECS),
        ];
        for lfo in &mut self.lfo {
            lfo.set_sample_rate(sample_rate);
        }
        self.drywet.set_sample_rate(sample_rate);
    }

    fn reset(&mut self) {
        for d in &mut self.delay {
            d.clear();
        }
        for lfo in &mut self.lfo {
            lfo.reset();
        }
        self.lfo[1].set_phase(0.25);
        self.drywet.snap();
    }
}
