//! Shared dry/wet crossfade skeleton for insert effects.
//!
//! Every insert effect is bypassable the same way: enabling ramps the dry
//! gain to 0 and the wet gain to 1 over a fixed time, disabling does the
//! reverse. The effect's own tone parameters are independent of this
//! crossfade. Embedding one [`DryWet`] per effect keeps the behavior uniform
//! across the whole family.

use crate::param::Ramp;
use crate::tap::AnalysisTap;

/// Crossfade time for enable/bypass transitions.
pub const ENABLE_RAMP_SECS: f32 = 0.03;

/// Dry/wet crossfade with a fixed enable ramp and an optional wet tap.
#[derive(Debug, Clone)]
pub struct DryWet {
    dry: Ramp,
    wet: Ramp,
    enabled: bool,
    tap: Option<AnalysisTap>,
}

impl DryWet {
    /// Create in the bypassed state (dry = 1, wet = 0).
    pub fn new(sample_rate: f32) -> Self {
        Self {
            dry: Ramp::new(1.0, sample_rate),
            wet: Ramp::new(0.0, sample_rate),
            enabled: false,
            tap: None,
        }
    }

    /// Ramp toward enabled (wet) or bypassed (dry).
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled == enabled {
            return;
        }
        self.enabled = enabled;
        let (dry_t, wet_t) = if enabled { (0.0, 1.0) } else { (1.0, 0.0) };
        self.dry.ramp_to(dry_t, ENABLE_RAMP_SECS);
        self.wet.ramp_to(wet_t, ENABLE_RAMP_SECS);
    }

    /// Whether the effect is (heading toward) enabled.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// True while the crossfade still carries any wet signal; a fully
    /// bypassed effect can skip its wet computation.
    #[inline]
    pub fn carries_wet(&self) -> bool {
        self.enabled || !self.wet.is_settled() || self.wet.value() > 0.0
    }

    /// Attach an analysis tap that records the wet signal pre-mix.
    pub fn set_tap(&mut self, tap: AnalysisTap) {
        self.tap = Some(tap);
    }

    /// Mix one stereo sample pair, advancing the crossfade.
    #[inline]
    pub fn mix(&mut self, dry_l: f32, dry_r: f32, wet_l: f32, wet_r: f32) -> (f32, f32) {
        if let Some(tap) = &self.tap {
            tap.write(wet_l);
            tap.write(wet_r);
        }
        let d = self.dry.advance();
        let w = self.wet.advance();
        (dry_l * d + wet_l * w, dry_r * d + wet_r * w)
    }

    /// Update the sample rate of the internal ramps.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.dry.set_sample_rate(sample_rate);
        self.wet.set_sample_rate(sample_rate);
    }

    /// Finish any in-flight crossfade instantly.
    pub fn snap(&mut self) {
        self.dry.snap_to_target();
        self.wet.snap_to_target();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_bypassed() {
        let mut dw = DryWet::new(48000.0);
        let (l, r) = dw.mix(0.5, -0.5, 99.0, 99.0);
        assert_eq!((l, r), (0.5, -0.5));
    }

    #[test]
    fn enable_crossfades_to_wet() {
        let mut dw = DryWet::new(48000.0);
        dw.set_enabled(true);
        // Run past the 30 ms ramp
        let mut out = (0.0, 0.0);
        for _ in 0..(48000.0 * ENABLE_RAMP_SECS) as usize + 10 {
            out = dw.mix(1.0, 1.0, -1.0, -1.0);
        }
        assert!((out.0 + 1.0).abs() < 1e-4, "got {}", out.0);
    }

    #[test]
    fn crossfade_has_no_jump() {
        let mut dw = DryWet::new(48000.0);
        let mut prev = dw.mix(1.0, 1.0, 0.0, 0.0).0;
        dw.set_enabled(true);
        for _ in 0..3000 {
            let (l, _) = dw.mix(1.0, 1.0, 0.0, 0.0);
            assert!((l - prev).abs() < 0.01, "step {prev} -> {l}");
            prev = l;
        }
    }

    #[test]
    fn redundant_enable_is_a_no_op() {
        let mut dw = DryWet::new(48000.0);
        dw.set_enabled(true);
        for _ in 0..5000 {
            dw.mix(0.0, 0.0, 1.0, 1.0);
        }
        dw.set_enabled(true);
        let (l, _) = dw.mix(0.0, 0.0, 1.0, 1.0);
        assert!((l - 1.0).abs() < 1e-4, "re-enable restarted the ramp");
    }
}
