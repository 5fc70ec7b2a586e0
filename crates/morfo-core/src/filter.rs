//! Filters and delay primitives used across the synth and effect crates.
//!
//! [`Svf`] is a Chamberlin state-variable filter: cheap coefficients, stable
//! under per-sample cutoff modulation, which is exactly what voice filters
//! need. [`Biquad`] is the RBJ cookbook form for the EQ-shaped effects, and
//! [`DelayLine`] is a fractional-read circular buffer for the modulation and
//! echo effects.

use alloc::vec;
use alloc::vec::Vec;
use core::f32::consts::PI;
use libm::{cosf, sinf};

/// Chamberlin state-variable filter, lowpass output.
///
/// Coefficient `f = 2 sin(pi * fc / sr)` is recomputed only when the cutoff
/// actually moves, so sweeping it per sample from a modulation source costs
/// one `sinf` per change rather than per sample of silence.
#[derive(Debug, Clone)]
pub struct Svf {
    low: f32,
    band: f32,
    f: f32,
    q: f32,
    cutoff: f32,
    resonance: f32,
    sample_rate: f32,
}

impl Svf {
    /// Create a filter at 1 kHz cutoff, Butterworth-ish resonance.
    pub fn new(sample_rate: f32) -> Self {
        let mut svf = Self {
            low: 0.0,
            band: 0.0,
            f: 0.0,
            q: 1.0,
            cutoff: 1000.0,
            resonance: 0.707,
            sample_rate,
        };
        svf.update_coefficients();
        svf
    }

    /// Set cutoff frequency in Hz, clamped to a stable range.
    pub fn set_cutoff(&mut self, cutoff: f32) {
        let clamped = cutoff.clamp(10.0, self.sample_rate * 0.49);
        if (clamped - self.cutoff).abs() > 0.01 {
            self.cutoff = clamped;
            self.update_coefficients();
        }
    }

    /// Current cutoff in Hz.
    pub fn cutoff(&self) -> f32 {
        self.cutoff
    }

    /// Set resonance (0.5 = heavily damped, higher = more ringing).
    pub fn set_resonance(&mut self, resonance: f32) {
        self.resonance = resonance.clamp(0.5, 20.0);
        self.update_coefficients();
    }

    /// Configure as a transparent pass-through: cutoff at the top of the
    /// stable range, minimum resonance. Used when a filter section is
    /// disabled but must stay in the signal path.
    pub fn set_transparent(&mut self) {
        self.cutoff = self.sample_rate * 0.49;
        self.resonance = 0.5;
        self.update_coefficients();
    }

    /// Update the sample rate.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.cutoff = self.cutoff.min(sample_rate * 0.49);
        self.update_coefficients();
    }

    /// Clear filter state.
    pub fn reset(&mut self) {
        self.low = 0.0;
        self.band = 0.0;
    }

    /// Process one sample (lowpass output).
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let high = input - self.low - self.q * self.band;
        self.band += self.f * high;
        self.low += self.f * self.band;
        flush_denormal(&mut self.low);
        flush_denormal(&mut self.band);
        self.low
    }

    fn update_coefficients(&mut self) {
        self.f = (2.0 * sinf(PI * self.cutoff / self.sample_rate)).min(1.5);
        self.q = 1.0 / self.resonance.max(0.5);
    }
}

#[inline]
fn flush_denormal(x: &mut f32) {
    if x.abs() < 1e-20 {
        *x = 0.0;
    }
}

/// Direct Form I biquad with RBJ cookbook coefficient constructors.
#[derive(Debug, Clone, Default)]
pub struct Biquad {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
}

impl Biquad {
    /// Identity filter (passes input unchanged).
    pub fn new() -> Self {
        Self {
            b0: 1.0,
            ..Default::default()
        }
    }

    /// Set raw normalized coefficients.
    pub fn set_coefficients(&mut self, b0: f32, b1: f32, b2: f32, a1: f32, a2: f32) {
        self.b0 = b0;
        self.b1 = b1;
        self.b2 = b2;
        self.a1 = a1;
        self.a2 = a2;
    }

    /// Configure as a peaking EQ band.
    pub fn set_peaking(&mut self, freq: f32, q: f32, gain_db: f32, sample_rate: f32) {
        let a = libm::powf(10.0, gain_db / 40.0);
        let w0 = 2.0 * PI * freq / sample_rate;
        let alpha = sinf(w0) / (2.0 * q);
        let a0 = 1.0 + alpha / a;
        self.set_coefficients(
            (1.0 + alpha * a) / a0,
            (-2.0 * cosf(w0)) / a0,
            (1.0 - alpha * a) / a0,
            (-2.0 * cosf(w0)) / a0,
            (1.0 - alpha / a) / a0,
        );
    }

    /// Configure as a low shelf.
    pub fn set_low_shelf(&mut self, freq: f32, gain_db: f32, sample_rate: f32) {
        let a = libm::powf(10.0, gain_db / 40.0);
        let w0 = 2.0 * PI * freq / sample_rate;
        let (sw, cw) = (sinf(w0), cosf(w0));
        let alpha = sw / 2.0 * libm::sqrtf(2.0);
        let two_sqrt_a_alpha = 2.0 * libm::sqrtf(a) * alpha;
        let a0 = (a + 1.0) + (a - 1.0) * cw + two_sqrt_a_alpha;
        self.set_coefficients(
            (a * ((a + 1.0) - (a - 1.0) * cw + two_sqrt_a_alpha)) / a0,
            (2.0 * a * ((a - 1.0) - (a + 1.0) * cw)) / a0,
            (a * ((a + 1.0) - (a - 1.0) * cw - two_sqrt_a_alpha)) / a0,
            (-2.0 * ((a - 1.0) + (a + 1.0) * cw)) / a0,
            ((a + 1.0) + (a - 1.0) * cw - two_sqrt_a_alpha) / a0,
        );
    }

    /// Configure as a high shelf.
    pub fn set_high_shelf(&mut self, freq: f32, gain_db: f32, sample_rate: f32) {
        let a = libm::powf(10.0, gain_db / 40.0);
        let w0 = 2.0 * PI * freq / sample_rate;
        let (sw, cw) = (sinf(w0), cosf(w0));
        let alpha = sw / 2.0 * libm::sqrtf(2.0);
        let two_sqrt_a_alpha = 2.0 * libm::sqrtf(a) * alpha;
        let a0 = (a + 1.0) - (a - 1.0) * cw + two_sqrt_a_alpha;
        self.set_coefficients(
            (a * ((a + 1.0) + (a - 1.0) * cw + two_sqrt_a_alpha)) / a0,
            (-2.0 * a * ((a - 1.0) + (a + 1.0) * cw)) / a0,
            (a * ((a + 1.0) + (a - 1.0) * cw - two_sqrt_a_alpha)) / a0,
            (2.0 * ((a - 1.0) - (a + 1.0) * cw)) / a0,
            ((a + 1.0) - (a - 1.0) * cw - two_sqrt_a_alpha) / a0,
        );
    }

    /// Configure as a bandpass (constant peak gain).
    pub fn set_bandpass(&mut self, freq: f32, q: f32, sample_rate: f32) {
        let w0 = 2.0 * PI * freq / sample_rate;
        let alpha = sinf(w0) / (2.0 * q);
        let a0 = 1.0 + alpha;
        self.set_coefficients(
            alpha / a0,
            0.0,
            -alpha / a0,
            (-2.0 * cosf(w0)) / a0,
            (1.0 - alpha) / a0,
        );
    }

    /// Configure as a first-order-style allpass at `freq` (for phasers).
    pub fn set_allpass(&mut self, freq: f32, q: f32, sample_rate: f32) {
        let w0 = 2.0 * PI * freq / sample_rate;
        let alpha = sinf(w0) / (2.0 * q);
        let a0 = 1.0 + alpha;
        self.set_coefficients(
            (1.0 - alpha) / a0,
            (-2.0 * cosf(w0)) / a0,
            (1.0 + alpha) / a0,
            (-2.0 * cosf(w0)) / a0,
            (1.0 - alpha) / a0,
        );
    }

    /// Clear state, keep coefficients.
    pub fn reset(&mut self) {
        self.x1 = 0.0;
        self.x2 = 0.0;
        self.y1 = 0.0;
        self.y2 = 0.0;
    }

    /// Process one sample.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let out = self.b0 * input + self.b1 * self.x1 + self.b2 * self.x2
            - self.a1 * self.y1
            - self.a2 * self.y2;
        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = out;
        flush_denormal(&mut self.y1);
        flush_denormal(&mut self.y2);
        out
    }
}

/// Circular delay line with fractional (linearly interpolated) reads.
#[derive(Debug, Clone)]
pub struct DelayLine {
    buffer: Vec<f32>,
    write: usize,
}

impl DelayLine {
    /// Create with capacity for `max_samples` of delay.
    pub fn new(max_samples: usize) -> Self {
        Self {
            buffer: vec![0.0; max_samples.max(2)],
            write: 0,
        }
    }

    /// Create sized for `max_seconds` at `sample_rate`.
    pub fn from_time(sample_rate: f32, max_seconds: f32) -> Self {
        Self::new((sample_rate * max_seconds) as usize + 2)
    }

    /// Maximum delay in samples.
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Push a sample into the line.
    #[inline]
    pub fn write(&mut self, sample: f32) {
        self.buffer[self.write] = sample;
        self.write = (self.write + 1) % self.buffer.len();
    }

    /// Read `delay_samples` behind the write head with linear interpolation.
    #[inline]
    pub fn read(&self, delay_samples: f32) -> f32 {
        let len = self.buffer.len();
        let delay = delay_samples.clamp(0.0, (len - 2) as f32);
        let int = delay as usize;
        let frac = delay - int as f32;

        let i0 = (self.write + len - 1 - int) % len;
        let i1 = (i0 + len - 1) % len;
        self.buffer[i0] + (self.buffer[i1] - self.buffer[i0]) * frac
    }

    /// Zero the buffer.
    pub fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.write = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn svf_passes_dc_at_high_cutoff() {
        let mut svf = Svf::new(48000.0);
        svf.set_transparent();
        let mut out = 0.0;
        for _ in 0..2000 {
            out = svf.process(0.5);
        }
        assert!((out - 0.5).abs() < 0.05, "got {out}");
    }

    #[test]
    fn svf_attenuates_above_cutoff() {
        let mut svf = Svf::new(48000.0);
        svf.set_cutoff(200.0);

        // 8 kHz sine through a 200 Hz lowpass should come out tiny
        let mut energy_in = 0.0;
        let mut energy_out = 0.0;
        for i in 0..48000 {
            let x = sinf(2.0 * PI * 8000.0 * i as f32 / 48000.0);
            let y = svf.process(x);
            energy_in += x * x;
            energy_out += y * y;
        }
        assert!(energy_out < energy_in * 0.01);
    }

    #[test]
    fn svf_cutoff_is_clamped() {
        let mut svf = Svf::new(48000.0);
        svf.set_cutoff(1e9);
        assert!(svf.cutoff() <= 48000.0 * 0.49);
        svf.set_cutoff(-100.0);
        assert!(svf.cutoff() >= 10.0);
    }

    #[test]
    fn svf_stable_under_sweep() {
        let mut svf = Svf::new(48000.0);
        for i in 0..48000 {
            svf.set_cutoff(100.0 + (i % 1000) as f32 * 20.0);
            let y = svf.process(if i % 7 == 0 { 1.0 } else { -0.5 });
            assert!(y.is_finite());
        }
    }

    #[test]
    fn biquad_identity_by_default() {
        let mut bq = Biquad::new();
        assert_eq!(bq.process(0.7), 0.7);
    }

    #[test]
    fn biquad_peaking_boosts_band() {
        let mut bq = Biquad::new();
        bq.set_peaking(1000.0, 1.0, 12.0, 48000.0);

        let mut energy = 0.0;
        let mut energy_in = 0.0;
        for i in 0..48000 {
            let x = sinf(2.0 * PI * 1000.0 * i as f32 / 48000.0);
            let y = bq.process(x);
            energy_in += x * x;
            energy += y * y;
        }
        assert!(energy > energy_in * 2.0, "peaking boost missing");
    }

    #[test]
    fn delay_line_delays_by_integer() {
        let mut dl = DelayLine::new(64);
        dl.write(1.0);
        for _ in 0..9 {
            dl.write(0.0);
        }
        // Impulse was written 10 samples ago
        assert!((dl.read(9.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn delay_line_fractional_interpolates() {
        let mut dl = DelayLine::new(64);
        dl.write(0.0);
        dl.write(1.0);
        // Halfway between the last two samples
        let v = dl.read(0.5);
        assert!((v - 0.5).abs() < 1e-6, "got {v}");
    }

    #[test]
    fn delay_line_clamps_read() {
        let dl = DelayLine::new(16);
        // Reading past capacity must not panic
        let _ = dl.read(1e6);
    }
}
