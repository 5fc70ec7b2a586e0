//! Mid/side stereo width control.

use crate::insert::{InsertId, InsertParams, InsertProcessor};
use morfo_core::{AnalysisTap, DryWet, Smoothed};
use serde::{Deserialize, Serialize};

/// Widener parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WidenerParams {
    /// Stereo width in percent: 0 = mono, 100 = unchanged, 200 = doubled side.
    pub width_pct: f32,
}

impl Default for WidenerParams {
    fn default() -> Self {
        Self { width_pct: 140.0 }
    }
}

/// M/S encode, scale the side, decode.
pub struct Widener {
    width: Smoothed,
    drywet: DryWet,
}

impl Widener {
    /// Create with default parameters, bypassed.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            width: Smoothed::standard(1.4, sample_rate),
            drywet: DryWet::new(sample_rate),
        }
    }
}

impl InsertProcessor for Widener {
    fn id(&self) -> InsertId {
        InsertId::Widener
    }

    fn set_params(&mut self, params: &InsertParams) {
        if let InsertParams::Widener(p) = params {
            self.width.set_target(p.width_pct.clamp(0.0, 200.0) / 100.0);
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
            let w = self.width.advance();
            let mid = (left[i] + right[i]) * 0.5;
            let side = (left[i] - right[i]) * 0.5 * w;
            (left[i], right[i]) = self.drywet.mix(left[i], right[i], mid + side, mid - side);
        }
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.width.set_sample_rate(sample_rate);
        self.drywet.set_sample_rate(sample_rate);
    }

    fn reset(&mut self) {
        self.drywet.snap();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_width_folds_to_mono() {
        let mut fx = Widener::new(48000.0);
        fx.set_params(&InsertParams::Widener(WidenerParams { width_pct: 0.0 }));
        fx.set_enabled(true);
        let mut l = vec![0.4f32; 8192];
        let mut r = vec![0.8f32; 8192];
        fx.process(&mut l, &mut r);
        // Both channels converge to the mid (0.6)
        assert!((l[8000] - 0.6).abs() < 0.02, "got {}", l[8000]);
        assert!((r[8000] - 0.6).abs() < 0.02, "got {}", r[8000]);
    }

    #[test]
    fn unity_width_is_transparent() {
        let mut fx = Widener::new(48000.0);
        fx.set_params(&InsertParams::Widener(WidenerParams { width_pct: 100.0 }));
        fx.set_enabled(true);
        let mut l = vec![0.3f32; 8192];
        let mut r = vec![0.7f32; 8192];
        fx.process(&mut l, &mut r);
        assert!((l[8000] - 0.3).abs() < 0.02);
        assert!((r[8000] - 0.7).abs() < 0.02);
    }
}
