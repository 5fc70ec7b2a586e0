//! Wavetables and bilinear morph interpolation.
//!
//! A table is a rows × cols grid of single-cycle frames, all [`FRAME_LEN`]
//! samples long. Normalized morph coordinates `(x, y)` address the grid:
//! the four neighboring frames are read and blended bilinearly at render
//! time. A single-row or single-column table degenerates to 1-D linear
//! interpolation; a 1x1 table returns its only frame unblended.
//!
//! Built-in tables are generated analytically; user tables wrap the
//! resampled contents of already-decoded sample memory.

use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;
use core::f32::consts::PI;
use libm::{floorf, sinf};

/// Samples per wavetable frame.
pub const FRAME_LEN: usize = 2048;

/// Maximum frames accepted from user sample data.
const MAX_USER_FRAMES: usize = 64;

/// A named grid of single-cycle waveform frames.
#[derive(Debug, Clone)]
pub struct Wavetable {
    name: String,
    rows: usize,
    cols: usize,
    /// Row-major frame data, `rows * cols * FRAME_LEN` samples.
    data: Vec<f32>,
}

impl Wavetable {
    /// Build from raw frame data. Dimension/data mismatches and empty
    /// tables substitute a silent 1x1 table rather than failing - the
    /// render thread must always have something valid to read.
    pub fn from_frames(name: &str, rows: usize, cols: usize, data: Vec<f32>) -> Self {
        if rows == 0 || cols == 0 || data.len() != rows * cols * FRAME_LEN {
            return Self::silent(name);
        }
        Self {
            name: String::from(name),
            rows,
            cols,
            data,
        }
    }

    /// A 1x1 table of silence.
    pub fn silent(name: &str) -> Self {
        Self {
            name: String::from(name),
            rows: 1,
            cols: 1,
            data: vec![0.0; FRAME_LEN],
        }
    }

    /// The built-in analytic table: columns morph sine → triangle → saw →
    /// square, rows add brightness by raising the partial count.
    pub fn analytic(name: &str) -> Self {
        const ROWS: usize = 4;
        const COLS: usize = 4;
        let mut data = Vec::with_capacity(ROWS * COLS * FRAME_LEN);
        for row in 0..ROWS {
            let partials = 1 + (1 << (row + 1)); // 3, 5, 9, 17
            for col in 0..COLS {
                for i in 0..FRAME_LEN {
                    let t = i as f32 / FRAME_LEN as f32;
                    data.push(match col {
                        0 => sinf(t * 2.0 * PI),
                        1 => additive_triangle(t, partials),
                        2 => additive_saw(t, partials),
                        _ => additive_square(t, partials),
                    });
                }
            }
        }
        Self::from_frames(name, ROWS, COLS, data)
    }

    /// Build a 1-D user table by slicing sample memory into fixed-length
    /// frames, resampling each slice to [`FRAME_LEN`]. Empty input yields a
    /// silent table.
    pub fn from_samples(name: &str, samples: &[f32]) -> Self {
        if samples.is_empty() {
            return Self::silent(name);
        }
        let frames = (samples.len() / FRAME_LEN).clamp(1, MAX_USER_FRAMES);
        let slice_len = samples.len() / frames;
        let mut data = Vec::with_capacity(frames * FRAME_LEN);
        for f in 0..frames {
            let slice = &samples[f * slice_len..(f + 1) * slice_len];
            for i in 0..FRAME_LEN {
                // Linear resample of the slice into the frame
                let pos = i as f32 / FRAME_LEN as f32 * (slice.len() - 1).max(1) as f32;
                let i0 = pos as usize;
                let i1 = (i0 + 1).min(slice.len() - 1);
                let frac = pos - floorf(pos);
                data.push(slice[i0] + (slice[i1] - slice[i0]) * frac);
            }
        }
        Self::from_frames(name, 1, frames, data)
    }

    /// Table name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Grid rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Grid columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    fn frame(&self, row: usize, col: usize) -> &[f32] {
        let start = (row * self.cols + col) * FRAME_LEN;
        &self.data[start..start + FRAME_LEN]
    }

    /// Read one frame at a fractional in-frame position with linear
    /// interpolation between adjacent samples.
    #[inline]
    fn read_frame(&self, row: usize, col: usize, pos: f32) -> f32 {
        let frame = self.frame(row, col);
        let i0 = pos as usize % FRAME_LEN;
        let i1 = (i0 + 1) % FRAME_LEN;
        let frac = pos - floorf(pos);
        frame[i0] + (frame[i1] - frame[i0]) * frac
    }

    /// Sample the table at morph position `(x, y)` and phase `[0, 1)`.
    ///
    /// Bilinear: blend along x in the two bounding rows, then along y.
    #[inline]
    pub fn sample(&self, morph_x: f32, morph_y: f32, phase: f32) -> f32 {
        let pos = (phase - floorf(phase)) * FRAME_LEN as f32;

        let x = morph_x.clamp(0.0, 1.0) * (self.cols - 1) as f32;
        let y = morph_y.clamp(0.0, 1.0) * (self.rows - 1) as f32;
        let x0 = x as usize;
        let y0 = y as usize;
        let x1 = (x0 + 1).min(self.cols - 1);
        let y1 = (y0 + 1).min(self.rows - 1);
        let fx = x - x0 as f32;
        let fy = y - y0 as f32;

        let top = {
            let a = self.read_frame(y0, x0, pos);
            let b = self.read_frame(y0, x1, pos);
            a + (b - a) * fx
        };
        if y1 == y0 {
            return top;
        }
        let bottom = {
            let a = self.read_frame(y1, x0, pos);
            let b = self.read_frame(y1, x1, pos);
            a + (b - a) * fx
        };
        top + (bottom - top) * fy
    }
}

fn additive_saw(t: f32, partials: usize) -> f32 {
    let mut out = 0.0;
    for k in 1..=partials {
        out += sinf(t * 2.0 * PI * k as f32) / k as f32;
    }
    out * (2.0 / PI)
}

fn additive_square(t: f32, partials: usize) -> f32 {
    let mut out = 0.0;
    let mut k = 1;
    while k <= partials {
        out += sinf(t * 2.0 * PI * k as f32) / k as f32;
        k += 2;
    }
    out * (4.0 / PI)
}

fn additive_triangle(t: f32, partials: usize) -> f32 {
    let mut out = 0.0;
    let mut k = 1;
    let mut sign = 1.0;
    while k <= partials {
        out += sign * sinf(t * 2.0 * PI * k as f32) / (k * k) as f32;
        sign = -sign;
        k += 2;
    }
    out * (8.0 / (PI * PI))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a table whose frames are constant-valued, for exact
    /// interpolation checks.
    fn constant_table(rows: usize, cols: usize, values: &[f32]) -> Wavetable {
        let mut data = Vec::new();
        for &v in values {
            data.extend(core::iter::repeat_n(v, FRAME_LEN));
        }
        Wavetable::from_frames("const", rows, cols, data)
    }

    #[test]
    fn corners_are_exact() {
        // Grid: (0,0)=A (1,0)=B / (0,1)=C (1,1)=D
        let t = constant_table(2, 2, &[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(t.sample(0.0, 0.0, 0.3), 1.0);
        assert_eq!(t.sample(1.0, 0.0, 0.3), 2.0);
        assert_eq!(t.sample(0.0, 1.0, 0.3), 3.0);
        assert_eq!(t.sample(1.0, 1.0, 0.3), 4.0);
    }

    #[test]
    fn center_is_average_of_corners() {
        let t = constant_table(2, 2, &[1.0, 2.0, 3.0, 4.0]);
        let c = t.sample(0.5, 0.5, 0.0);
        assert!((c - 2.5).abs() < 1e-5, "got {c}");
    }

    #[test]
    fn single_row_degenerates_to_linear() {
        let t = constant_table(1, 3, &[0.0, 1.0, 2.0]);
        assert!((t.sample(0.5, 0.7, 0.0) - 1.0).abs() < 1e-5);
        assert!((t.sample(0.25, 0.0, 0.0) - 0.5).abs() < 1e-5);
    }

    #[test]
    fn one_by_one_returns_frame() {
        let t = constant_table(1, 1, &[0.42]);
        assert_eq!(t.sample(0.9, 0.1, 0.5), 0.42);
    }

    #[test]
    fn bad_dimensions_become_silent() {
        let t = Wavetable::from_frames("bad", 2, 2, vec![0.0; 17]);
        assert_eq!((t.rows(), t.cols()), (1, 1));
        assert_eq!(t.sample(0.5, 0.5, 0.25), 0.0);
    }

    #[test]
    fn analytic_table_is_bounded() {
        let t = Wavetable::analytic("builtin");
        assert_eq!((t.rows(), t.cols()), (4, 4));
        for i in 0..200 {
            let v = t.sample(0.37, 0.81, i as f32 / 200.0);
            assert!((-1.6..=1.6).contains(&v), "sample out of range: {v}");
        }
    }

    #[test]
    fn user_table_from_samples() {
        let src: Vec<f32> = (0..FRAME_LEN * 3).map(|i| (i % 100) as f32 / 100.0).collect();
        let t = Wavetable::from_samples("user", &src);
        assert_eq!(t.rows(), 1);
        assert_eq!(t.cols(), 3);
    }

    #[test]
    fn empty_user_table_is_silent() {
        let t = Wavetable::from_samples("user", &[]);
        assert_eq!(t.sample(0.0, 0.0, 0.0), 0.0);
    }

    #[test]
    fn phase_interpolates_within_frame() {
        // Frame is a ramp: interpolation between adjacent samples
        let mut data = vec![0.0; FRAME_LEN];
        for (i, s) in data.iter_mut().enumerate() {
            *s = i as f32;
        }
        let t = Wavetable::from_frames("ramp", 1, 1, data);
        let half_sample = 0.5 / FRAME_LEN as f32;
        assert!((t.sample(0.0, 0.0, half_sample) - 0.5).abs() < 1e-3);
    }
}
