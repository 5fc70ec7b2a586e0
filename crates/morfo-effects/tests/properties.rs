//! Property tests over the whole insert family, exercised through the
//! uniform interface: bypass transparency, finite output, and crossfade
//! continuity hold for every effect regardless of parameters.

use morfo_effects::{InsertId, build_insert};
use proptest::prelude::*;

fn sine_block(len: usize, freq: f32, amp: f32) -> Vec<f32> {
    (0..len)
        .map(|i| (core::f32::consts::TAU * freq * i as f32 / 48000.0).sin() * amp)
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// A bypassed insert is bit-transparent.
    #[test]
    fn bypassed_inserts_are_transparent(
        id_idx in 0usize..11,
        amp in 0.01f32..0.9,
        freq in 40.0f32..8000.0,
    ) {
        let id = InsertId::ALL[id_idx];
        let mut fx = build_insert(id, 48000.0);
        let reference = sine_block(512, freq, amp);
        let mut l = reference.clone();
        let mut r = reference.clone();
        fx.process(&mut l, &mut r);
        for (a, b) in l.iter().zip(reference.iter()) {
            prop_assert!((a - b).abs() < 1e-5, "{id:?} altered a bypassed signal");
        }
    }

    /// An enabled insert never produces NaN/inf, even on hot input.
    #[test]
    fn enabled_inserts_stay_finite(
        id_idx in 0usize..11,
        amp in 0.0f32..2.0,
        freq in 20.0f32..16000.0,
    ) {
        let id = InsertId::ALL[id_idx];
        let mut fx = build_insert(id, 48000.0);
        fx.set_enabled(true);
        let mut l = sine_block(4096, freq, amp);
        let mut r = sine_block(4096, freq * 1.01, amp);
        fx.process(&mut l, &mut r);
        prop_assert!(l.iter().chain(r.iter()).all(|s| s.is_finite()), "{id:?} produced non-finite output");
    }

    /// The enable crossfade never steps the output discontinuously.
    #[test]
    fn enable_transition_is_smooth(id_idx in 0usize..11) {
        let id = InsertId::ALL[id_idx];
        let mut fx = build_insert(id, 48000.0);

        // Steady low-frequency input; watch the block around the toggle
        let mut prev = 0.1f32;
        for toggle in [true, false] {
            fx.set_enabled(toggle);
            let mut l = vec![0.1f32; 2048];
            let mut r = vec![0.1f32; 2048];
            fx.process(&mut l, &mut r);
            for &s in &l {
                prop_assert!((s - prev).abs() < 0.25, "{id:?} stepped {prev} -> {s}");
                prev = s;
            }
        }
    }
}

#[test]
fn reset_is_idempotent_for_all_inserts() {
    for id in InsertId::ALL {
        let mut fx = build_insert(id, 48000.0);
        fx.set_enabled(true);
        let mut l = sine_block(1024, 440.0, 0.5);
        let mut r = l.clone();
        fx.process(&mut l, &mut r);
        fx.reset();
        fx.reset();
    }
}

#[test]
fn sample_rate_change_is_safe_for_all_inserts() {
    for id in InsertId::ALL {
        let mut fx = build_insert(id, 48000.0);
        fx.set_enabled(true);
        fx.set_sample_rate(44100.0);
        fx.set_sample_rate(96000.0);
        let mut l = sine_block(512, 440.0, 0.5);
        let mut r = l.clone();
        fx.process(&mut l, &mut r);
        assert!(l.iter().all(|s| s.is_finite()), "{id:?} after rate change");
    }
}
