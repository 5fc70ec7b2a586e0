//! Short modulated delay with feedback.

use crate::insert::{InsertId, InsertParams, InsertProcessor};
use morfo_core::{AnalysisTap, DelayLine, DryWet, Lfo};
use serde::{Deserialize, Serialize};

const MAX_DELAY_SECS: f32 = 0.02;

/// Flanger parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FlangerParams {
    /// Sweep rate in Hz (0.05-5).
    pub rate_hz: f32,
    /// Sweep depth in milliseconds (0-10).
    pub depth_ms: f32,
    /// Feedback amount (0-0.9).
    pub feedback: f32,
}

impl Default for FlangerParams {
    fn default() -> Self {
        Self {
            rate_hz: 0.3,
            depth_ms: 3.0,
            feedback: 0.5,
        }
    }
}

/// Jet-sweep flanger.
pub struct Flanger {
    params: FlangerParams,
    delay: [DelayLine; 2],
    fb: (f32, f32),
    lfo: Lfo,
    drywet: DryWet,
    sample_rate: f32,
}

impl Flanger {
    /// Create with default parameters, bypassed.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            params: FlangerParams::default(),
            delay: [
                DelayLine::from_time(sample_rate, MAX_DELAY_SECS),
                DelayLine::from_time(sample_rate, MAX_DELAY_SECS),
            ],
            fb: (0.0, 0.0),
            lfo: Lfo::new(sample_rate, 0.3),
            drywet: DryWet::new(sample_rate),
            sample_rate,
        }
    }
}

impl InsertProcessor for Flanger {
    fn id(&self) -> InsertId {
        InsertId::Flanger
    }

    fn set_params(&mut self, params: &InsertParams) {
        if let InsertParams::Flanger(p) = params {
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
        let depth = self.params.depth_ms.clamp(0.0, 10.0) / 1000.0 * self.sample_rate;
        let feedback = self.params.feedback.clamp(0.0, 0.9);
        for i in 0..left.len() {
            // Sweep between 1 sample and the depth
            let sweep = 1.0 + (self.lfo.next() * 0.5 + 0.5) * depth;
            self.delay[0].write(left[i] + self.fb.0 * feedback);
            self.delay[1].write(right[i] + self.fb.1 * feedback);
            let wet_l = self.delay[0].read(sweep);
            let wet_r = self.delay[1].read(sweep);
            self.fb = (wet_l, wet_r);
            (left[i], right[i]) = self.drywet.mix(left[i], right[i], wet_l, wet_r);
        }
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.delay = [
            DelayLine::from_time(sample_rate, MAX_DELAY_SECS),
            DelayLine::from_time(sample_rate, MAX_DELAY_SECS),
        ];
        self.lfo.set_sample_rate(sample_rate);
        self.drywet.set_sample_rate(sample_rate);
    }

    fn reset(&mut self) {
        for d in &mut self.delay {
            d.clear();
        }
        self.fb = (0.0, 0.0);
        self.lfo.reset();
        self.drywet.snap();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feedback_stays_stable() {
        let mut fx = Flanger::new(48000.0);
        fx.set_params(&InsertParams::Flanger(FlangerParams {
            rate_hz: 1.0,
            depth_ms: 10.0,
            feedback: 2.0, // clamped to 0.9
        }));
        fx.set_enabled(true);
        let mut l = vec![0.5f32; 48000];
        let mut r = vec![0.5f32; 48000];
        fx.process(&mut l, &mut r);
        assert!(l.iter().all(|s| s.is_finite() && s.abs() < 20.0));
    }

    #[test]
    fn bypassed_is_identity() {
        let mut fx = Flanger::new(48000.0);
        let mut l = [0.1f32; 32];
        let mut r = [0.1f32; 32];
        fx.process(&mut l, &mut r);
        assert!(l.iter().all(|&s| (s - 0.1).abs() < 1e-6));
    }
}
