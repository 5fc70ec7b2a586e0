//! Per-voice modulation routing.
//!
//! Each voice owns one router over the four matrix slots. Two mechanisms:
//!
//! - **Signal routing** (continuous): enabled slots whose destination is a
//!   signal parameter contribute `source * amount * scale` every sample via
//!   [`ModRouter::signal_offsets`]. The amount is smoothed, so an
//!   amount-only edit rescales the live connection without a step.
//! - **Numeric resolution** (discrete): slots targeting envelope times are
//!   summed into the envelope parameters once per gate edge via
//!   [`ModRouter::effective_envelope`], using the analytic LFO value at
//!   that instant, the velocity, and the mod wheel.
//!
//! Applying a matrix snapshot diffs each slot against what is currently
//! routed: a structural change (source, destination, or enabled) tears the
//! routing down and, when valid, fades the new one in from zero; an
//! amount-only change ramps in place. The amplitude envelope modulating its
//! own times would feed back, so those slots are skipped.

use crate::envelope::MIN_SEGMENT_SECS;
use crate::params::{EnvelopeParams, ModDestination, ModMatrixParams, ModSlot, ModSource};
use morfo_core::Smoothed;

/// Current values of every modulation source, captured per sample.
#[derive(Clone, Copy, Debug, Default)]
pub struct ModSourceValues {
    /// LFO output after depth (bipolar).
    pub lfo: f32,
    /// Envelope level (unipolar).
    pub envelope: f32,
    /// Note velocity (unipolar).
    pub velocity: f32,
    /// Global mod wheel (unipolar).
    pub mod_wheel: f32,
}

impl ModSourceValues {
    fn get(&self, source: ModSource) -> f32 {
        match source {
            ModSource::Lfo => self.lfo,
            ModSource::Envelope => self.envelope,
            ModSource::Velocity => self.velocity,
            ModSource::ModWheel => self.mod_wheel,
        }
    }
}

/// Summed signal-rate modulation per destination, already scaled to the
/// destination's unit.
#[derive(Clone, Copy, Debug, Default)]
pub struct SignalOffsets {
    /// X-oscillator pitch offset in cents.
    pub pitch_x_cents: f32,
    /// Y-oscillator pitch offset in cents.
    pub pitch_y_cents: f32,
    /// Y-ratio offset in cents.
    pub ratio_y_cents: f32,
    /// Stereo phase offset in seconds.
    pub phase_offset_s: f32,
    /// Morph offsets.
    pub morph_x: f32,
    /// Morph offsets.
    pub morph_y: f32,
    /// Filter cutoff offsets in Hz.
    pub cutoff_x_hz: f32,
    /// Filter cutoff offsets in Hz.
    pub cutoff_y_hz: f32,
    /// Axis level offsets.
    pub level_x: f32,
    /// Axis level offsets.
    pub level_y: f32,
    /// LFO rate offset in Hz.
    pub lfo_rate_hz: f32,
    /// LFO depth offset.
    pub lfo_depth: f32,
}

#[derive(Debug, Clone)]
struct SlotState {
    config: ModSlot,
    connected: bool,
    gain: Smoothed,
}

/// The per-voice modulation router.
#[derive(Debug, Clone)]
pub struct ModRouter {
    slots: [SlotState; 4],
}

impl ModRouter {
    /// Create with all slots disconnected.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            slots: core::array::from_fn(|_| SlotState {
                config: ModSlot::default(),
                connected: false,
                gain: Smoothed::fast(0.0, sample_rate),
            }),
        }
    }

    /// Update the sample rate of the amount smoothers.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        for slot in &mut self.slots {
            slot.gain.set_sample_rate(sample_rate);
        }
    }

    /// Apply a matrix snapshot, diffing against the applied state.
    pub fn apply(&mut self, params: &ModMatrixParams) {
        for (state, slot) in self.slots.iter_mut().zip(params.slots.iter()) {
            let structural = state.config.source != slot.source
                || state.config.destination != slot.destination
                || state.config.enabled != slot.enabled;

            if structural {
                // Tear down, then fade the new routing in from silence
                state.connected = slot.enabled && !slot.destination.is_numeric();
                state.gain.set_immediate(0.0);
                if state.connected {
                    state.gain.set_target(slot.amount.clamp(-1.0, 1.0));
                }
            } else if state.connected && (state.config.amount - slot.amount).abs() > f32::EPSILON {
                // Live connection, amount-only edit: rescale in place
                state.gain.set_target(slot.amount.clamp(-1.0, 1.0));
            }
            state.config = *slot;
        }
    }

    /// Number of live signal connections (for tests/inspection).
    pub fn connected_count(&self) -> usize {
        self.slots.iter().filter(|s| s.connected).count()
    }

    /// Sum the signal-rate contributions of every live routing.
    #[inline]
    pub fn signal_offsets(&mut self, values: &ModSourceValues) -> SignalOffsets {
        let mut out = SignalOffsets::default();
        for state in &mut self.slots {
            let amount = state.gain.advance();
            if !state.connected {
                continue;
            }
            let dest = state.config.destination;
            let scaled = values.get(state.config.source) * amount * dest.scale();
            match dest {
                ModDestination::PitchX => out.pitch_x_cents += scaled,
                ModDestination::PitchY => out.pitch_y_cents += scaled,
                ModDestination::PitchXy => {
                    out.pitch_x_cents += scaled;
                    out.pitch_y_cents += scaled;
                }
                ModDestination::RatioY => out.ratio_y_cents += scaled,
                ModDestination::PhaseOffset => out.phase_offset_s += scaled,
                ModDestination::MorphX => out.morph_x += scaled,
                ModDestination::MorphY => out.morph_y += scaled,
                ModDestination::CutoffX => out.cutoff_x_hz += scaled,
                ModDestination::CutoffY => out.cutoff_y_hz += scaled,
                ModDestination::CutoffXy => {
                    out.cutoff_x_hz += scaled;
                    out.cutoff_y_hz += scaled;
                }
                ModDestination::LevelX => out.level_x += scaled,
                ModDestination::LevelY => out.level_y += scaled,
                ModDestination::LevelXy => {
                    out.level_x += scaled;
                    out.level_y += scaled;
                }
                ModDestination::LfoRate => out.lfo_rate_hz += scaled,
                ModDestination::LfoDepth => out.lfo_depth += scaled,
                // Numeric destinations never connect
                ModDestination::EnvAttack
                | ModDestination::EnvDecay
                | ModDestination::EnvSustain
                | ModDestination::EnvRelease => {}
            }
        }
        out
    }

    /// Resolve the numeric destinations into effective envelope parameters.
    ///
    /// Called at note-on and note-off with the source values of that
    /// instant. Envelope-sourced slots are skipped (no self-modulation).
    pub fn effective_envelope(
        &self,
        base: &EnvelopeParams,
        lfo_value: f32,
        velocity: f32,
        mod_wheel: f32,
    ) -> EnvelopeParams {
        let mut env = *base;
        for state in &self.slots {
            let slot = state.config;
            if !slot.enabled || !slot.destination.is_numeric() {
                continue;
            }
            if slot.source == ModSource::Envelope {
                continue;
            }
            let value = match slot.source {
                ModSource::Lfo => lfo_value,
                ModSource::Velocity => velocity,
                ModSource::ModWheel => mod_wheel,
                ModSource::Envelope => 0.0,
            };
            let add = slot.amount.clamp(-1.0, 1.0) * value * slot.destination.scale();
            match slot.destination {
                ModDestination::EnvAttack => env.attack_s += add,
                ModDestination::EnvDecay => env.decay_s += add,
                ModDestination::EnvSustain => env.sustain += add,
                ModDestination::EnvRelease => env.release_s += add,
                _ => {}
            }
        }
        env.attack_s = env.attack_s.max(MIN_SEGMENT_SECS);
        env.decay_s = env.decay_s.max(MIN_SEGMENT_SECS);
        env.release_s = env.release_s.max(MIN_SEGMENT_SECS);
        env.sustain = env.sustain.clamp(0.0, 1.0);
        env
    }
}
