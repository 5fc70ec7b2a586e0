//! Lock-free analysis taps.
//!
//! A tap sits at a point in the signal chain and records what flows through
//! it: a short ring of recent samples for visualizers, plus a running peak
//! for clip detection. The render thread writes with relaxed atomics and the
//! control thread reads whenever it likes; neither side waits for the other.
//!
//! Samples are stored as `f32` bit patterns in `AtomicU32`. For the peak we
//! exploit that the IEEE-754 bit pattern of non-negative floats is
//! monotonic, so `fetch_max` on the bits of `|x|` is a float max.

use alloc::sync::Arc;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

/// Default ring capacity in samples (stereo-interleaved writers use 2x).
pub const DEFAULT_TAP_LEN: usize = 1024;

#[derive(Debug)]
struct TapInner {
    ring: Vec<AtomicU32>,
    write: AtomicUsize,
    peak_bits: AtomicU32,
}

/// A cloneable handle to one analysis point.
///
/// Cloning shares the underlying buffer; typically the render side holds one
/// clone and the engine holds another for GUI reads.
#[derive(Debug, Clone)]
pub struct AnalysisTap {
    inner: Arc<TapInner>,
}

impl Default for AnalysisTap {
    fn default() -> Self {
        Self::new(DEFAULT_TAP_LEN)
    }
}

impl AnalysisTap {
    /// Create a tap with the given ring capacity.
    pub fn new(len: usize) -> Self {
        let mut ring = Vec::with_capacity(len.max(2));
        for _ in 0..len.max(2) {
            ring.push(AtomicU32::new(0));
        }
        Self {
            inner: Arc::new(TapInner {
                ring,
                write: AtomicUsize::new(0),
                peak_bits: AtomicU32::new(0),
            }),
        }
    }

    /// Record one sample (render thread).
    #[inline]
    pub fn write(&self, sample: f32) {
        let inner = &self.inner;
        let idx = inner.write.fetch_add(1, Ordering::Relaxed) % inner.ring.len();
        inner.ring[idx].store(sample.to_bits(), Ordering::Relaxed);
        inner
            .peak_bits
            .fetch_max(sample.abs().to_bits(), Ordering::Relaxed);
    }

    /// Record a block of samples.
    #[inline]
    pub fn write_block(&self, samples: &[f32]) {
        for &s in samples {
            self.write(s);
        }
    }

    /// Highest magnitude seen since the last [`take_peak`](Self::take_peak).
    pub fn peak(&self) -> f32 {
        f32::from_bits(self.inner.peak_bits.load(Ordering::Relaxed))
    }

    /// Read and reset the running peak.
    pub fn take_peak(&self) -> f32 {
        f32::from_bits(self.inner.peak_bits.swap(0, Ordering::Relaxed))
    }

    /// True if any recorded sample in the ring exceeds `threshold` in
    /// magnitude. This scans the ring, not just the peak, so it catches
    /// excursions even after the peak was consumed.
    pub fn exceeds(&self, threshold: f32) -> bool {
        self.inner
            .ring
            .iter()
            .any(|bits| f32::from_bits(bits.load(Ordering::Relaxed)).abs() > threshold)
    }

    /// Copy the most recent samples into `out`, oldest first.
    pub fn snapshot(&self, out: &mut [f32]) {
        let inner = &self.inner;
        let len = inner.ring.len();
        let take = out.len().min(len);
        let write = inner.write.load(Ordering::Relaxed);
        for (i, slot) in out.iter_mut().take(take).enumerate() {
            let idx = (write + len - take + i) % len;
            *slot = f32::from_bits(inner.ring[idx].load(Ordering::Relaxed));
        }
    }

    /// Zero the ring and peak.
    pub fn clear(&self) {
        for bits in &self.inner.ring {
            bits.store(0, Ordering::Relaxed);
        }
        self.inner.peak_bits.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peak_tracks_magnitude() {
        let tap = AnalysisTap::new(64);
        tap.write(0.25);
        tap.write(-0.9);
        tap.write(0.5);
        assert!((tap.peak() - 0.9).abs() < 1e-6);
    }

    #[test]
    fn take_peak_resets() {
        let tap = AnalysisTap::new(64);
        tap.write(0.7);
        assert!((tap.take_peak() - 0.7).abs() < 1e-6);
        assert_eq!(tap.peak(), 0.0);
    }

    #[test]
    fn exceeds_scans_ring() {
        let tap = AnalysisTap::new(64);
        for _ in 0..32 {
            tap.write(0.1);
        }
        tap.write(1.2);
        let _ = tap.take_peak();
        assert!(tap.exceeds(1.0), "ring scan should still see the excursion");
        assert!(!tap.exceeds(1.5));
    }

    #[test]
    fn snapshot_returns_recent_samples() {
        let tap = AnalysisTap::new(8);
        for i in 0..12 {
            tap.write(i as f32);
        }
        let mut out = [0.0; 4];
        tap.snapshot(&mut out);
        assert_eq!(out, [8.0, 9.0, 10.0, 11.0]);
    }

    #[test]
    fn clones_share_state() {
        let a = AnalysisTap::new(16);
        let b = a.clone();
        a.write(0.8);
        assert!((b.peak() - 0.8).abs() < 1e-6);
    }

    #[test]
    fn clear_is_idempotent() {
        let tap = AnalysisTap::new(16);
        tap.write(0.5);
        tap.clear();
        tap.clear();
        assert_eq!(tap.peak(), 0.0);
        assert!(!tap.exceeds(0.0));
    }
}
