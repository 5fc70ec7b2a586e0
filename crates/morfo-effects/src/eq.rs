//! Three-band EQ: low shelf, mid peak, high shelf.

use crate::insert::{InsertId, InsertParams, InsertProcessor};
use morfo_core::{AnalysisTap, Biquad, DryWet};
use serde::{Deserialize, Serialize};

/// EQ parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EqParams {
    /// Low-shelf gain in dB (-18 to +18).
    pub low_db: f32,
    /// Low-shelf corner in Hz.
    pub low_hz: f32,
    /// Mid-peak gain in dB (-18 to +18).
    pub mid_db: f32,
    /// Mid-peak center in Hz.
    pub mid_hz: f32,
    /// High-shelf gain in dB (-18 to +18).
    pub high_db: f32,
    /// High-shelf corner in Hz.
    pub high_hz: f32,
}

impl Default for EqParams {
    fn default() -> Self {
        Self {
            low_db: 0.0,
            low_hz: 200.0,
            mid_db: 0.0,
            mid_hz: 1000.0,
            high_db: 0.0,
            high_hz: 6000.0,
        }
    }
}

/// Shelving/peaking tone control.
pub struct Eq {
    params: EqParams,
    bands: [[Biquad; 3]; 2],
    drywet: DryWet,
    sample_rate: f32,
}

impl Eq {
    /// Create flat, bypassed.
    pub fn new(sample_rate: f32) -> Self {
        let mut fx = Self {
            params: EqParams::default(),
            bands: [
                core::array::from_fn(|_| Biquad::new()),
                core::array::from_fn(|_| Biquad::new()),
            ],
            drywet: DryWet::new(sample_rate),
            sample_rate,
        };
        fx.apply_params();
        fx
    }

    fn apply_params(&mut self) {
        let p = &self.params;
        for channel in &mut self.bands {
            channel[0].set_low_shelf(
                p.low_hz.clamp(20.0, 1000.0),
                p.low_db.clamp(-18.0, 18.0),
                self.sample_rate,
            );
            channel[1].set_peaking(
                p.mid_hz.clamp(100.0, 8000.0),
                1.0,
                p.mid_db.clamp(-18.0, 18.0),
                self.sample_rate,
            );
            channel[2].set_high_shelf(
                p.high_hz.clamp(1000.0, 18000.0),
                p.high_db.clamp(-18.0, 18.0),
                self.sample_rate,
            );
        }
    }
}

impl InsertProcessor for Eq {
    fn id(&self) -> InsertId {
        InsertId::Eq
    }

    fn set_params(&mut self, params: &InsertParams) {
        if let InsertParams::Eq(p) = params {
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
            let mut wet_l = left[i];
            let mut wet_r = right[i];
            for b in 0..3 {
                wet_l = self.bands[0][b].process(wet_l);
                wet_r = self.bands[1][b].process(wet_r);
            }
            (left[i], right[i]) = self.drywet.mix(left[i], right[i], wet_l, wet_r);
        }
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.drywet.set_sample_rate(sample_rate);
        self.apply_params();
    }

    fn reset(&mut self) {
        for channel in &mut self.bands {
            for band in channel.iter_mut() {
                band.reset();
            }
        }
        self.drywet.snap();
    }
}
