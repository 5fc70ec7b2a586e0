//! Small conversion helpers shared across the workspace.

use libm::{log2f, powf};

/// Frequency of middle C (C4), the keytracking reference.
pub const C4_HZ: f32 = 261.6256;

/// Convert decibels to a linear gain factor.
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    powf(10.0, db / 20.0)
}

/// Convert a linear gain factor to decibels (floored at -120 dB).
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    20.0 * libm::log10f(linear.max(1e-6))
}

/// Convert a cent offset to a frequency ratio. 100 cents = 1 semitone.
#[inline]
pub fn cents_to_ratio(cents: f32) -> f32 {
    powf(2.0, cents / 1200.0)
}

/// Convert a MIDI note number to frequency (A4 = 69 = 440 Hz).
#[inline]
pub fn midi_to_freq(note: u8) -> f32 {
    440.0 * powf(2.0, (note as f32 - 69.0) / 12.0)
}

/// Keytracked filter cutoff: scales `base` by the note's octave distance
/// from C4, weighted by `keytrack` in `[0, 1]`. Equivalent to
/// `base * (freq/C4)^keytrack`.
#[inline]
pub fn keytracked_cutoff(base: f32, freq: f32, keytrack: f32) -> f32 {
    if keytrack <= 0.0 || freq <= 0.0 {
        return base;
    }
    let octaves = log2f(freq / C4_HZ);
    base * powf(2.0, octaves * keytrack)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn db_round_trip() {
        for db in [-24.0, -6.0, 0.0, 6.0] {
            assert!((linear_to_db(db_to_linear(db)) - db).abs() < 0.01);
        }
    }

    #[test]
    fn octave_is_1200_cents() {
        assert!((cents_to_ratio(1200.0) - 2.0).abs() < 1e-4);
        assert!((cents_to_ratio(-1200.0) - 0.5).abs() < 1e-4);
    }

    #[test]
    fn a4_is_440() {
        assert!((midi_to_freq(69) - 440.0).abs() < 0.01);
        assert!((midi_to_freq(60) - C4_HZ).abs() < 0.1);
    }

    #[test]
    fn keytrack_full_follows_pitch() {
        // One octave above C4 with full keytracking doubles the cutoff
        let c = keytracked_cutoff(1000.0, C4_HZ * 2.0, 1.0);
        assert!((c - 2000.0).abs() < 1.0, "got {c}");
    }

    #[test]
    fn keytrack_zero_is_identity() {
        assert_eq!(keytracked_cutoff(1234.0, 880.0, 0.0), 1234.0);
    }

    #[test]
    fn keytrack_guards_zero_freq() {
        assert_eq!(keytracked_cutoff(500.0, 0.0, 1.0), 500.0);
    }
}
