//! Amplitude-modulation tremolo with stereo phase spread.

use crate::insert::{InsertId, InsertParams, InsertProcessor};
use morfo_core::{AnalysisTap, DryWet, Lfo};
use serde::{Deserialize, Serialize};

/// Tremolo parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TremoloParams {
    /// Modulation rate in Hz (0.1-20).
    pub rate_hz: f32,
    /// Modulation depth (0-1).
    pub depth: f32,
    /// Phase offset of the right channel in cycles (0 = mono, 0.5 = ping-pong).
    pub stereo_phase: f32,
}

impl Default for TremoloParams {
    fn default() -> Self {
        Self {
            rate_hz: 5.0,
            depth: 0.6,
            stereo_phase: 0.0,
        }
    }
}

/// LFO-driven gain modulation.
pub struct Tremolo {
    params: TremoloParams,
    lfo: [Lfo; 2],
    drywet: DryWet,
}

impl Tremolo {
    /// Create with default parameters, bypassed.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            params: TremoloParams::default(),
            lfo: [Lfo::new(sample_rate, 5.0), Lfo::new(sample_rate, 5.0)],
            drywet: DryWet::new(sample_rate),
        }
    }

    fn apply_params(&mut self) {
        let rate = self.params.rate_hz.clamp(0.1, 20.0);
        for lfo in &mut self.lfo {
            lfo.set_rate(rate);
        }
        self.lfo[1].set_phase(self.params.stereo_phase.clamp(0.0, 1.0));
    }
}

impl InsertProcessor for Tremolo {
    fn id(&self) -> InsertId {
        InsertId::Tremolo
    }

    fn set_params(&mut self, params: &InsertParams) {
        if let InsertParams::Tremolo(p) = params {
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
        let depth = self.params.depth.clamp(0.0, 1.0);
        for i in 0..left.len() {
            // Unipolar gain: 1 at LFO peak, (1 - depth) at trough
            let g_l = 1.0 - depth * (self.lfo[0].next() * 0.5 + 0.5);
            let g_r = 1.0 - depth * (self.lfo[1].next() * 0.5 + 0.5);
            let wet_l = left[i] * g_l;
            let wet_r = right[i] * g_r;
            (left[i], right[i]) = self.drywet.mix(left[i], right[i], wet_l, wet_r);
        }
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        for lfo in &mut self.lfo {
            lfo.set_sample_rate(sample_rate);
        }
        self.drywet.set_sample_rate(sample_rate);
    }

    fn reset(&mut self) {
        for lfo in &mut self.lfo {
            lfo.reset();
        }
        self.apply_params();
        self.drywet.snap();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modulates_amplitude() {
        let mut fx = Tremolo::new(48000.0);
        fx.set_params(&InsertParams::Tremolo(TremoloParams {
            rate_hz: 10.0,
            depth: 1.0,
            stereo_phase: 0.0,
        }));
        fx.set_enabled(true);

        let mut l = vec![1.0f32; 48000];
        let mut r = vec![1.0f32; 48000];
        fx.process(&mut l, &mut r);

        let tail = &l[24000..];
        let min = tail.iter().cloned().fold(f32::MAX, f32::min);
        let max = tail.iter().cloned().fold(f32::MIN, f32::max);
        assert!(max - min > 0.5, "tremolo should swing: {min}..{max}");
    }

    #[test]
    fn never_exceeds_input_magnitude() {
        let mut fx = Tremolo::new(48000.0);
        fx.set_enabled(true);
        let mut l = vec![0.8f32; 8192];
        let mut r = vec![0.8f32; 8192];
        fx.process(&mut l, &mut r);
        assert!(l.iter().all(|&s| s <= 0.8 + 1e-5));
    }
}
