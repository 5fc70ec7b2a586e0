//! Bit-depth and sample-rate reduction.

use crate::insert::{InsertId, InsertParams, InsertProcessor};
use libm::floorf;
use morfo_core::{AnalysisTap, DryWet};
use serde::{Deserialize, Serialize};

/// Bitcrusher parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BitcrusherParams {
    /// Quantization depth in bits (1-16).
    pub bits: u32,
    /// Hold factor: every Nth sample is kept (1-64).
    pub downsample: u32,
}

impl Default for BitcrusherParams {
    fn default() -> Self {
        Self {
            bits: 8,
            downsample: 4,
        }
    }
}

/// Quantize-and-hold lo-fi stage.
pub struct Bitcrusher {
    params: BitcrusherParams,
    held: (f32, f32),
    counter: u32,
    drywet: DryWet,
}

impl Bitcrusher {
    /// Create with default parameters, bypassed.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            params: BitcrusherParams::default(),
            held: (0.0, 0.0),
            counter: 0,
            drywet: DryWet::new(sample_rate),
        }
    }

    #[inline]
    fn quantize(&self, x: f32) -> f32 {
        let levels = (1u32 << self.params.bits.clamp(1, 16)) as f32;
        floorf(x * levels) / levels
    }
}

impl InsertProcessor for Bitcrusher {
    fn id(&self) -> InsertId {
        InsertId::Bitcrusher
    }

    fn set_params(&mut self, params: &InsertParams) {
        if let InsertParams::Bitcrusher(p) = params {
            self.params = *p;
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
        let hold = self.params.downsample.clamp(1, 64);
        for i in 0..left.len() {
            if self.counter == 0 {
                self.held = (self.quantize(left[i]), self.quantize(right[i]));
            }
            self.counter = (self.counter + 1) % hold;
            (left[i], right[i]) = self.drywet.mix(left[i], right[i], self.held.0, self.held.1);
        }
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.drywet.set_sample_rate(sample_rate);
    }

    fn reset(&mut self) {
        self.held = (0.0, 0.0);
        self.counter = 0;
        self.drywet.snap();
    }
}
