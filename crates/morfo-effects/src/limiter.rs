//! Master brickwall limiter.
//!
//! Stereo-linked peak limiting with instant attack and exponential release.
//! The applied gain reduction is published through an atomic so the engine
//! (and its GUI) can read a meter without touching the render thread.
//!
//! Reference: Giannoulis, Massberg & Reiss, "Digital Dynamic Range
//! Compressor Design - A Tutorial and Analysis", JAES 2012 (ballistics).

use alloc::sync::Arc;
use core::sync::atomic::{AtomicU32, Ordering};
use libm::expf;
use morfo_core::{Ramp, db_to_linear, linear_to_db};

/// Release time constant.
const RELEASE_MS: f32 = 120.0;

/// Enable/bypass blend time.
const BLEND_SECS: f32 = 0.03;

/// The master limiter.
pub struct MasterLimiter {
    threshold: f32,
    gain: f32,
    release_coeff: f32,
    /// Bypass blend: 0 = transparent, 1 = limiting.
    blend: Ramp,
    enabled: bool,
    reduction_bits: Arc<AtomicU32>,
}

impl MasterLimiter {
    /// Create enabled, with a -0.3 dB threshold.
    pub fn new(sample_rate: f32) -> Self {
        let mut blend = Ramp::new(0.0, sample_rate);
        blend.set_immediate(1.0);
        Self {
            threshold: db_to_linear(-0.3),
            gain: 1.0,
            release_coeff: expf(-1.0 / (RELEASE_MS / 1000.0 * sample_rate)),
            blend,
            enabled: true,
            reduction_bits: Arc::new(AtomicU32::new(0.0f32.to_bits())),
        }
    }

    /// Set the ceiling in dB (clamped to -30..0).
    pub fn set_threshold_db(&mut self, db: f32) {
        self.threshold = db_to_linear(db.clamp(-30.0, 0.0));
    }

    /// Enable or bypass; the transition is a short crossfade.
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled != enabled {
            self.enabled = enabled;
            self.blend.ramp_to(if enabled { 1.0 } else { 0.0 }, BLEND_SECS);
        }
    }

    /// Whether limiting is engaged.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// A cloneable handle to the gain-reduction meter (dB, >= 0).
    pub fn reduction_handle(&self) -> Arc<AtomicU32> {
        Arc::clone(&self.reduction_bits)
    }

    /// Current gain reduction in dB.
    pub fn reduction_db(&self) -> f32 {
        f32::from_bits(self.reduction_bits.load(Ordering::Relaxed))
    }

    /// Update the sample rate.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.release_coeff = expf(-1.0 / (RELEASE_MS / 1000.0 * sample_rate));
        self.blend.set_sample_rate(sample_rate);
    }

    /// Process a stereo block in place.
    pub fn process(&mut self, left: &mut [f32], right: &mut [f32]) {
        let mut max_reduction = 0.0f32;
        for i in 0..left.len() {
            let peak = left[i].abs().max(right[i].abs()).max(1e-9);
            let target = if peak > self.threshold {
                self.threshold / peak
            } else {
                1.0
            };
            // Instant attack, exponential release back toward unity
            if target < self.gain {
                self.gain = target;
            } else {
                self.gain = target + (self.gain - target) * self.release_coeff;
            }
            max_reduction = max_reduction.max(-linear_to_db(self.gain));

            let blend = self.blend.advance();
            let g = 1.0 + (self.gain - 1.0) * blend;
            left[i] *= g;
            right[i] *= g;
        }
        self.reduction_bits
            .store(max_reduction.max(0.0).to_bits(), Ordering::Relaxed);
    }

    /// Reset ballistics.
    pub fn reset(&mut self) {
        self.gain = 1.0;
        self.reduction_bits.store(0.0f32.to_bits(), Ordering::Relaxed);
    }
}
