//! Send-bus reverb: Schroeder topology.
//!
//! Four parallel damped combs into two series allpasses per channel, with
//! the right channel's delay lengths offset for decorrelation. Wet-only,
//! like the delay send; levels are the render core's business.
//!
//! Reference: Schroeder, "Natural Sounding Artificial Reverberation",
//! JAES 1962; tunings after the freeverb lineage.

use alloc::vec;
use alloc::vec::Vec;
use serde::{Deserialize, Serialize};

const COMB_TUNINGS: [usize; 4] = [1116, 1188, 1277, 1356];
const ALLPASS_TUNINGS: [usize; 2] = [556, 441];
const STEREO_SPREAD: usize = 23;

/// Reverb parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReverbParams {
    /// Tail length (0-1); maps onto comb feedback.
    pub room_size: f32,
    /// High-frequency absorption inside the tail (0-1).
    pub damping: f32,
}

impl Default for ReverbParams {
    fn default() -> Self {
        Self {
            room_size: 0.6,
            damping: 0.4,
        }
    }
}

/// Lowpass-feedback comb filter.
struct Comb {
    buffer: Vec<f32>,
    index: usize,
    feedback: f32,
    damp: f32,
    filter_state: f32,
}

impl Comb {
    fn new(len: usize) -> Self {
        Self {
            buffer: vec![0.0; len],
            index: 0,
            feedback: 0.8,
            damp: 0.4,
            filter_state: 0.0,
        }
    }

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let out = self.buffer[self.index];
        self.filter_state = out + (self.filter_state - out) * self.damp;
        self.buffer[self.index] = input + self.filter_state * self.feedback;
        self.index = (self.index + 1) % self.buffer.len();
        out
    }

    fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.filter_state = 0.0;
    }
}

/// Schroeder allpass diffuser.
struct Allpass {
    buffer: Vec<f32>,
    index: usize,
}

impl Allpass {
    fn new(len: usize) -> Self {
        Self {
            buffer: vec![0.0; len],
            index: 0,
        }
    }

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        const G: f32 = 0.5;
        let delayed = self.buffer[self.index];
        let out = delayed - input * G;
        self.buffer[self.index] = input + delayed * G;
        self.index = (self.index + 1) % self.buffer.len();
        out
    }

    fn clear(&mut self) {
        self.buffer.fill(0.0);
    }
}

/// The reverb send bus processor.
pub struct SendReverb {
    combs: [Vec<Comb>; 2],
    allpasses: [Vec<Allpass>; 2],
    sample_rate: f32,
}

impl SendReverb {
    /// Create with default parameters. Tunings are scaled from their
    /// 44.1 kHz reference lengths to the actual sample rate.
    pub fn new(sample_rate: f32) -> Self {
        let scale = sample_rate / 44100.0;
        let make_combs = |offset: usize| -> Vec<Comb> {
            COMB_TUNINGS
                .iter()
                .map(|&len| Comb::new(((len + offset) as f32 * scale) as usize + 1))
                .collect()
        };
        let make_allpasses = |offset: usize| -> Vec<Allpass> {
            ALLPASS_TUNINGS
                .iter()
                .map(|&len| Allpass::new(((len + offset) as f32 * scale) as usize + 1))
                .collect()
        };
        let mut reverb = Self {
            combs: [make_combs(0), make_combs(STEREO_SPREAD)],
            allpasses: [make_allpasses(0), make_allpasses(STEREO_SPREAD)],
            sample_rate,
        };
        reverb.set_params(&ReverbParams::default());
        reverb
    }

    /// Replace the parameter snapshot.
    pub fn set_params(&mut self, params: &ReverbParams) {
        let feedback = 0.7 + params.room_size.clamp(0.0, 1.0) * 0.28;
        let damp = params.damping.clamp(0.0, 1.0) * 0.9;
        for channel in &mut self.combs {
            for comb in channel.iter_mut() {
                comb.feedback = feedback;
                comb.damp = damp;
            }
        }
    }

    /// Render the send input into the output buffers (overwrites them).
    pub fn render(&mut self, in_l: &[f32], in_r: &[f32], out_l: &mut [f32], out_r: &mut [f32]) {
        for i in 0..in_l.len() {
            // Mono-sum the send into the tank, decorrelate on the way out
            let input = (in_l[i] + in_r[i]) * 0.25;

            let mut acc_l = 0.0;
            for comb in self.combs[0].iter_mut() {
                acc_l += comb.process(input);
            }
            let mut acc_r = 0.0;
            for comb in self.combs[1].iter_mut() {
                acc_r += comb.process(input);
            }
            for ap in self.allpasses[0].iter_mut() {
                acc_l = ap.process(acc_l);
            }
            for ap in self.allpasses[1].iter_mut() {
                acc_r = ap.process(acc_r);
            }
            out_l[i] = acc_l;
            out_r[i] = acc_r;
        }
    }

    /// Current sample rate.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Clear the tank.
    pub fn reset(&mut self) {
        for channel in &mut self.combs {
            for comb in channel.iter_mut() {
                comb.clear();
            }
        }
        for channel in &mut self.allpasses {
            for ap in channel.iter_mut() {
                ap.clear();
            }
        }
    }
}
