//! End-to-end engine tests over the offline pipeline: the full path from
//! control calls through the command ring, voice bank, insert chain, send
//! buses, and master section.

use morfo_effects::{DelayParams, DelayTime, InsertId, InsertParams, WidenerParams};
use morfo_engine::{Engine, EngineConfig, EngineEvent, MixerParams, RenderCore, TapPoint};
use morfo_synth::InstrumentParams;

const BLOCK: usize = 256;

fn engine() -> (Engine, RenderCore) {
    let mut engine = Engine::new(EngineConfig::default(), InstrumentParams::default());
    let core = engine.init_offline().expect("offline init");
    (engine, core)
}

fn pump(core: &mut RenderCore, blocks: usize) -> f32 {
    let mut l = [0.0f32; BLOCK];
    let mut r = [0.0f32; BLOCK];
    let mut peak = 0.0f32;
    for _ in 0..blocks {
        core.process_block(&mut l, &mut r);
        for s in l.iter().chain(r.iter()) {
            peak = peak.max(s.abs());
        }
    }
    peak
}

#[test]
fn note_flows_to_the_output() {
    let (mut engine, mut core) = engine();
    engine.play_note("C4", 261.63, 0.9, 0.0);
    let peak = pump(&mut core, 20);
    assert!(peak > 0.0, "note should reach the output");
    assert!(engine.has_active_notes());
}

#[test]
fn stop_note_silences_after_the_tail() {
    let (mut engine, mut core) = engine();
    engine.play_note("C4", 261.63, 0.9, 0.0);
    pump(&mut core, 10);
    engine.stop_note("C4");
    // Default release 0.25 s + 0.15 s margin < 100 blocks of 256
    pump(&mut core, 100);
    let peak = pump(&mut core, 10);
    assert!(peak < 1e-4, "output should be silent, got {peak}");
    assert!(!engine.has_active_notes());
}

#[test]
fn voice_events_reach_the_control_side() {
    let (mut engine, mut core) = engine();
    engine.set_user_max_polyphony(2);
    engine.play_note("a", 110.0, 1.0, 0.0);
    engine.play_note("b", 220.0, 1.0, 0.0);
    engine.play_note("c", 330.0, 1.0, 0.0);
    pump(&mut core, 2);

    let mut stolen = Vec::new();
    let mut counts = Vec::new();
    engine.poll_events(|evt| match evt {
        EngineEvent::VoiceStolen(id) => stolen.push(id),
        EngineEvent::VoiceCount(n) => counts.push(n),
    });
    assert_eq!(stolen.len(), 1, "third note must steal");
    assert_eq!(stolen[0].as_str(), "a");
    assert!(counts.iter().all(|&n| n <= 2));
}

#[test]
fn taps_observe_the_signal() {
    let (mut engine, mut core) = engine();
    engine.play_note("C4", 261.63, 1.0, 0.0);
    pump(&mut core, 20);

    assert!(engine.tap(TapPoint::PreInsert).peak() > 0.0);
    assert!(engine.tap(TapPoint::MasterPre).peak() > 0.0);
    assert!(engine.tap(TapPoint::MasterPost).peak() > 0.0);
}

#[test]
fn clip_check_sees_hot_signals() {
    let (mut engine, mut core) = engine();
    // Crank the trim far past unity and disable the limiter
    engine.set_master_limiter_enabled(false);
    engine.set_master_volume_trim_db(12.0);
    engine.play_note("a", 110.0, 1.0, 0.0);
    engine.play_note("b", 165.0, 1.0, 0.0);
    pump(&mut core, 40);

    assert!(engine.check_fast_global_clip(1.0), "hot master should clip-flag");
    assert!(!engine.check_fast_global_clip(1000.0));
}

#[test]
fn limiter_caps_the_master_and_reports_reduction() {
    let (mut engine, mut core) = engine();
    engine.set_master_limiter_enabled(true);
    engine.set_master_limiter_threshold(-12.0);
    engine.set_master_volume_trim_db(6.0);
    for i in 0..8 {
        engine.play_note(&format!("n{i}"), 110.0 * (i + 1) as f32, 1.0, 0.0);
    }
    pump(&mut core, 40);

    let post_peak = engine.tap(TapPoint::MasterPost).peak();
    let ceiling = morfo_core::db_to_linear(-12.0);
    assert!(
        post_peak <= ceiling * 1.1,
        "post-limiter peak {post_peak} above ceiling {ceiling}"
    );
    assert!(engine.master_limiter_reduction_db() >= 0.0);
}

#[test]
fn insert_chain_reorder_is_glitch_free_and_set_preserving() {
    let (mut engine, mut core) = engine();
    // A sine carrier: any output step larger than its slew is a glitch
    let mut osc = morfo_synth::OscillatorParams::default();
    osc.waveform_x = morfo_synth::Waveform::Sine;
    engine.update_oscillator_params(osc);
    engine.set_insert_enabled(InsertId::Distortion, true);
    engine.play_note("a", 220.0, 0.8, 0.0);
    pump(&mut core, 20);

    let mut mixer = MixerParams::default();
    mixer.insert_order.reverse();
    engine.update_mixer_params(mixer);

    // Render across the reorder and inspect the master for steps
    let mut l = [0.0f32; BLOCK];
    let mut r = [0.0f32; BLOCK];
    let mut prev = None;
    for _ in 0..10 {
        core.process_block(&mut l, &mut r);
        for &s in &l {
            if let Some(p) = prev {
                let step: f32 = s - p;
                assert!(step.abs() < 0.5, "discontinuity {p} -> {s}");
            }
            prev = Some(s);
        }
    }
}

#[test]
fn insert_wet_tap_records_when_enabled() {
    let (mut engine, mut core) = engine();
    engine.set_insert_enabled(InsertId::Widener, true);
    engine.update_insert_params(InsertParams::Widener(WidenerParams { width_pct: 150.0 }));
    engine.play_note("a", 330.0, 0.9, 0.0);
    pump(&mut core, 20);

    assert!(
        engine.tap(TapPoint::InsertWet(InsertId::Widener)).peak() > 0.0,
        "enabled insert must record wet output"
    );
}

#[test]
fn delay_send_produces_echoes() {
    let (mut engine, mut core) = engine();
    let mixer = MixerParams {
        delay_send: 0.8,
        delay_return: 1.0,
        ..Default::default()
    };
    engine.update_mixer_params(mixer);
    engine.update_delay_params(DelayParams {
        time: DelayTime::Ms(50.0),
        feedback: 0.3,
        ping_pong: false,
        damping_hz: 10000.0,
    });

    engine.play_note("a", 440.0, 1.0, 0.0);
    pump(&mut core, 4);
    engine.stop_note("a");
    pump(&mut core, 100);

    assert!(
        engine.tap(TapPoint::DelaySendIn).peak() > 0.0,
        "send tap should have seen signal"
    );
}

#[test]
fn mod_wheel_update_reaches_voices() {
    let (mut engine, mut core) = engine();
    engine.play_note("a", 220.0, 1.0, 0.0);
    engine.update_global_mod_wheel(0.7);
    engine.update_global_bpm(140.0);
    let peak = pump(&mut core, 10);
    assert!(peak.is_finite());
}

#[test]
fn dispose_fades_and_resets() {
    let (mut engine, mut core) = engine();
    engine.play_note("a", 220.0, 1.0, 0.0);
    pump(&mut core, 10);
    engine.dispose();
    assert!(!engine.is_running());
    // Render core may still be pumped by a straggling callback; it must
    // stay well-behaved
    let peak = pump(&mut core, 10);
    assert!(peak.is_finite());
    // And a second dispose is harmless
    engine.dispose();
}

#[test]
fn wavetable_selection_switches_generations() {
    let (mut engine, mut core) = engine();
    let mut osc = morfo_synth::OscillatorParams::default();
    osc.waveform_x = morfo_synth::Waveform::Wavetable;
    engine.update_oscillator_params(osc);
    engine.play_note("a", 220.0, 1.0, 0.0);
    let before = pump(&mut core, 20);
    assert!(before > 0.0);

    // Unknown table substitutes silence without failing
    engine.select_wavetable("no-such-table");
    pump(&mut core, 20);
    let after = pump(&mut core, 10);
    assert!(after < before, "silent table should quiet the output");
}

#[test]
fn polyphony_commands_clamp() {
    let (mut engine, mut core) = engine();
    engine.set_user_max_polyphony(0); // clamps to 1
    engine.play_note("a", 110.0, 1.0, 0.0);
    engine.play_note("b", 220.0, 1.0, 0.0);
    pump(&mut core, 2);

    let mut max_count = 0;
    engine.poll_events(|evt| {
        if let EngineEvent::VoiceCount(n) = evt {
            max_count = max_count.max(n);
        }
    });
    assert!(max_count <= 1, "clamped polyphony exceeded: {max_count}");
}
