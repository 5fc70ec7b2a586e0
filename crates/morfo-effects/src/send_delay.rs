//! Send-bus feedback delay with tempo sync and ping-pong.
//!
//! Unlike the inserts this is a wet-only processor: the render core feeds it
//! the (level-scaled) send tap and mixes its output back via the return
//! ramp, so there is no dry path or enable crossfade here. Delay time moves
//! through a smoother, so retuning (or a tempo change while synced) bends
//! the echoes instead of clicking.

use libm::expf;
use morfo_core::{DelayLine, Smoothed, SyncDivision};
use serde::{Deserialize, Serialize};

const MAX_DELAY_SECS: f32 = 2.0;

/// Delay time: fixed milliseconds or a musical division of the global BPM.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum DelayTime {
    /// Fixed time in milliseconds.
    Ms(f32),
    /// Tempo-synced division.
    Synced(SyncDivision),
}

/// Send delay parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DelayParams {
    /// Echo spacing.
    pub time: DelayTime,
    /// Regeneration (0-0.95).
    pub feedback: f32,
    /// Cross-feed the channels for alternating echoes.
    pub ping_pong: bool,
    /// One-pole damping cutoff applied inside the loop, in Hz.
    pub damping_hz: f32,
}

impl Default for DelayParams {
    fn default() -> Self {
        Self {
            time: DelayTime::Ms(350.0),
            feedback: 0.45,
            ping_pong: false,
            damping_hz: 5000.0,
        }
    }
}

/// The delay send bus processor.
pub struct SendDelay {
    params: DelayParams,
    bpm: f32,
    delay: [DelayLine; 2],
    time_samples: Smoothed,
    damp_state: (f32, f32),
    damp_coeff: f32,
    sample_rate: f32,
}

impl SendDelay {
    /// Create with default parameters.
    pub fn new(sample_rate: f32) -> Self {
        let mut fx = Self {
            params: DelayParams::default(),
            bpm: 120.0,
            delay: [
                DelayLine::from_time(sample_rate, MAX_DELAY_SECS),
                DelayLine::from_time(sample_rate, MAX_DELAY_SECS),
            ],
            time_samples: Smoothed::new(0.0, sample_rate, 80.0),
            damp_state: (0.0, 0.0),
            damp_coeff: 0.0,
            sample_rate,
        };
        fx.apply_params();
        fx.time_samples.set_immediate(fx.time_samples.target());
        fx
    }

    /// Replace the parameter snapshot.
    pub fn set_params(&mut self, params: &DelayParams) {
        self.params = *params;
        self.apply_params();
    }

    /// Update the global tempo; a synced time retargets.
    pub fn set_bpm(&mut self, bpm: f32) {
        self.bpm = bpm.max(1.0);
        self.apply_params();
    }

    fn apply_params(&mut self) {
        let seconds = match self.params.time {
            DelayTime::Ms(ms) => ms.clamp(1.0, MAX_DELAY_SECS * 1000.0) / 1000.0,
            DelayTime::Synced(div) => div.seconds(self.bpm).min(MAX_DELAY_SECS),
        };
        self.time_samples.set_target(seconds * self.sample_rate);
        let hz = self.params.damping_hz.clamp(200.0, 18000.0);
        self.damp_coeff = expf(-core::f32::consts::TAU * hz / self.sample_rate);
    }

    /// Render the send input into the output buffers (overwrites them).
    pub fn render(&mut self, in_l: &[f32], in_r: &[f32], out_l: &mut [f32], out_r: &mut [f32]) {
        let feedback = self.params.feedback.clamp(0.0, 0.95);
        for i in 0..in_l.len() {
            let t = self.time_samples.advance();
            let tap_l = self.delay[0].read(t);
            let tap_r = self.delay[1].read(t);

            // One-pole damping inside the loop keeps repeats darkening
            self.damp_state.0 = tap_l + (self.damp_state.0 - tap_l) * self.damp_coeff;
            self.damp_state.1 = tap_r + (self.damp_state.1 - tap_r) * self.damp_coeff;

            let (fb_l, fb_r) = if self.params.ping_pong {
                (self.damp_state.1, self.damp_state.0)
            } else {
                (self.damp_state.0, self.damp_state.1)
            };
            self.delay[0].write(in_l[i] + fb_l * feedback);
            self.delay[1].write(in_r[i] + fb_r * feedback);

            out_l[i] = tap_l;
            out_r[i] = tap_r;
        }
    }

    /// Update the sample rate.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.delay = [
            DelayLine::from_time(sample_rate, MAX_DELAY_SECS),
            DelayLine::from_time(sample_rate, MAX_DELAY_SECS),
        ];
        self.time_samples.set_sample_rate(sample_rate);
        self.apply_params();
    }

    /// Clear the delay memory.
    pub fn reset(&mut self) {
        for d in &mut self.delay {
            d.clear();
        }
        self.damp_state = (0.0, 0.0);
    }
}
