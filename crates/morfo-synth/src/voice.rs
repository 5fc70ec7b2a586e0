//! Voices and the voice bank.
//!
//! A [`Voice`] is one note's complete synthesis state: up to seven unison
//! units of dual oscillators, a filter pair (one stereo filter per axis),
//! the amplitude envelope, a noise mix, the per-voice LFO, and the
//! modulation router. The [`VoiceBank`] owns a fixed array of voice slots
//! and implements allocation, retriggering, oldest-note stealing, and the
//! polyphony-dependent headroom scaling.
//!
//! Slot lifetimes use sample countdowns instead of wall-clock timers: a
//! released voice keeps its slot for the release tail plus a safety margin,
//! then frees it from inside the render call. Nothing outside the render
//! thread ever touches a slot that is still audible.

use crate::envelope::Envelope;
use crate::mod_router::{ModRouter, ModSourceValues, SignalOffsets};
use crate::note::NoteId;
use crate::params::{
    FilterParams, InstrumentParams, LfoParams, ModMatrixParams, NoiseParams, OscillatorParams,
    Waveform,
};
use crate::oscillator::Oscillator;
use crate::wavetable::Wavetable;
use crate::wavetable_osc::WavetableOscillator;
use alloc::sync::Arc;
use alloc::vec::Vec;
use libm::{sincosf, sqrtf};
use morfo_core::{cents_to_ratio, keytracked_cutoff, Lfo, Smoothed, Svf};

/// Unison units per voice, upper bound.
pub const MAX_UNISON: usize = 7;

/// Engine-fixed polyphony ceiling.
pub const HARD_POLYPHONY: usize = 32;

/// Release time used for steals and retriggers.
pub const FORCED_RELEASE_SECS: f32 = 0.005;

/// Safety margin added to the release tail before a slot is reclaimed.
pub const DISPOSAL_MARGIN_SECS: f32 = 0.15;

/// Total slots: the polyphony ceiling plus headroom for release tails, so a
/// steal can always allocate immediately while the stolen voice fades.
const SLOT_COUNT: usize = HARD_POLYPHONY + 8;

/// Level the envelope stage holds when the envelope section is disabled.
const ALWAYS_ON_LEVEL: f32 = 1.0;

/// One oscillator of a unison unit: analytic or wavetable-morphing.
#[derive(Debug, Clone)]
enum OscUnit {
    Analytic(Oscillator),
    Table(WavetableOscillator),
}

impl OscUnit {
    fn build(
        waveform: Waveform,
        sample_rate: f32,
        table: &Arc<Wavetable>,
        table_gen: u64,
    ) -> Self {
        match waveform {
            Waveform::Wavetable => Self::Table(WavetableOscillator::new(
                sample_rate,
                Arc::clone(table),
                table_gen,
            )),
            other => {
                let mut osc = Oscillator::new(sample_rate);
                osc.set_waveform(other);
                Self::Analytic(osc)
            }
        }
    }

    #[inline]
    fn set_frequency(&mut self, freq: f32) {
        match self {
            Self::Analytic(o) => o.set_frequency(freq),
            Self::Table(o) => o.set_frequency(freq),
        }
    }

    #[inline]
    fn advance(&mut self, morph_dx: f32, morph_dy: f32, offset_cycles: f32) -> f32 {
        match self {
            Self::Analytic(o) => o.advance_offset(offset_cycles),
            Self::Table(o) => o.advance(morph_dx, morph_dy, offset_cycles),
        }
    }

    fn set_waveform(&mut self, waveform: Waveform) {
        if let Self::Analytic(o) = self {
            o.set_waveform(waveform);
        }
    }

    fn set_morph(&mut self, x: f32, y: f32) {
        if let Self::Table(o) = self {
            o.set_morph(x, y);
        }
    }

    fn set_table(&mut self, table: &Arc<Wavetable>, generation: u64) {
        if let Self::Table(o) = self {
            o.set_table(table, generation);
        }
    }

    fn reset(&mut self) {
        match self {
            Self::Analytic(o) => o.reset(),
            Self::Table(o) => o.reset(),
        }
    }
}

/// One unison unit: an X/Y oscillator pair with its detune and pan slot.
#[derive(Debug, Clone)]
struct UnisonUnit {
    osc_x: OscUnit,
    osc_y: OscUnit,
    detune_ratio: f32,
    pan_l: f32,
    pan_r: f32,
}

/// One note's synthesis state.
#[derive(Debug, Clone)]
pub struct Voice {
    note_id: NoteId,
    base_freq: f32,
    velocity: f32,
    started_at: u64,
    allocated: bool,
    /// A retired voice is still fading out but no longer counts as the
    /// holder of its note id (retrigger/steal handoff).
    retired: bool,

    units: Vec<UnisonUnit>,
    configured_unison: usize,
    configured_modes: (bool, bool),
    unit_gain: f32,

    filter_x: [Svf; 2],
    filter_y: [Svf; 2],
    env: Envelope,
    lfo: Lfo,
    router: ModRouter,
    dyn_gain: Smoothed,

    params: InstrumentParams,
    lfo_base_rate: f32,
    prev_offsets: SignalOffsets,
    mod_wheel: f32,

    table: Arc<Wavetable>,
    table_gen: u64,

    noise_state: u32,
    releasing: bool,
    disposal_remaining: u64,
    sample_rate: f32,
}

impl Voice {
    /// Create an empty slot. All heap the voice will ever need (the unison
    /// unit vector) is reserved here, on the control thread.
    pub fn new(sample_rate: f32, table: Arc<Wavetable>, table_gen: u64) -> Self {
        Self {
            note_id: NoteId::default(),
            base_freq: 0.0,
            velocity: 0.0,
            started_at: 0,
            allocated: false,
            retired: false,
            units: Vec::with_capacity(MAX_UNISON),
            configured_unison: 0,
            configured_modes: (false, false),
            unit_gain: 1.0,
            filter_x: [Svf::new(sample_rate), Svf::new(sample_rate)],
            filter_y: [Svf::new(sample_rate), Svf::new(sample_rate)],
            env: Envelope::new(sample_rate),
            lfo: Lfo::new(sample_rate, 2.0),
            router: ModRouter::new(sample_rate),
            dyn_gain: Smoothed::standard(1.0, sample_rate),
            params: InstrumentParams::default(),
            lfo_base_rate: 2.0,
            prev_offsets: SignalOffsets::default(),
            mod_wheel: 0.0,
            table,
            table_gen,
            noise_state: 0x9E3779B9,
            releasing: false,
            disposal_remaining: 0,
            sample_rate,
        }
    }

    /// The note id this voice sounds, if it is the live holder.
    pub fn note_id(&self) -> Option<NoteId> {
        (self.allocated && !self.retired).then_some(self.note_id)
    }

    /// Slot-ordering timestamp (sample clock at trigger).
    pub fn started_at(&self) -> u64 {
        self.started_at
    }

    /// True while the slot is occupied (including the release tail).
    pub fn is_allocated(&self) -> bool {
        self.allocated
    }

    /// True while the voice counts toward polyphony.
    pub fn is_live(&self) -> bool {
        self.allocated && !self.retired
    }

    /// Current dynamic-headroom gain target.
    pub fn dynamic_gain(&self) -> f32 {
        self.dyn_gain.target()
    }

    /// Trigger this slot for a note.
    #[allow(clippy::too_many_arguments)]
    pub fn trigger(
        &mut self,
        id: NoteId,
        freq: f32,
        velocity: f32,
        mod_wheel: f32,
        params: &InstrumentParams,
        bpm: f32,
        started_at: u64,
    ) {
        self.note_id = id;
        self.base_freq = freq.max(0.0);
        self.velocity = velocity.clamp(0.0, 1.0);
        self.mod_wheel = mod_wheel.clamp(0.0, 1.0);
        self.params = *params;
        self.started_at = started_at;
        self.allocated = true;
        self.retired = false;
        self.releasing = false;
        self.disposal_remaining = 0;
        self.prev_offsets = SignalOffsets::default();

        self.router.apply(&params.mod_matrix);
        self.configure_lfo(&params.lfo, bpm);
        self.configure_filters(&params.filter);
        self.rebuild_units_if_needed();
        self.apply_unison_distribution();

        // Numeric modulation is resolved here, at the gate edge, from the
        // analytic LFO value, velocity, and wheel.
        let lfo_now = self.lfo.value_at(self.lfo.phase()) * params.lfo.depth;
        let eff = self
            .router
            .effective_envelope(&params.envelope, lfo_now, self.velocity, self.mod_wheel);
        if params.envelope.enabled {
            self.env.gate_on(eff.attack_s, eff.decay_s, eff.sustain);
        } else {
            self.env.gate_on_fixed(ALWAYS_ON_LEVEL);
        }
    }

    /// Begin the release. `forced` (steal/retrigger) uses the minimal fixed
    /// time and may shorten an in-flight natural release; a natural release
    /// uses the modulated release value.
    pub fn release(&mut self, forced: bool) {
        if !self.allocated || (self.releasing && !forced) {
            return;
        }
        let release_s = if forced {
            FORCED_RELEASE_SECS
        } else {
            let lfo_now = self.lfo.value_at(self.lfo.phase()) * self.params.lfo.depth;
            self.router
                .effective_envelope(&self.params.envelope, lfo_now, self.velocity, self.mod_wheel)
                .release_s
        };
        self.env.gate_off(release_s);
        let countdown = ((release_s + DISPOSAL_MARGIN_SECS) * self.sample_rate) as u64;
        self.disposal_remaining = if self.releasing {
            self.disposal_remaining.min(countdown)
        } else {
            countdown
        };
        self.releasing = true;
    }

    /// Strip the note id so a replacement voice can own it while this one
    /// fades out.
    pub fn retire(&mut self) {
        self.retired = true;
    }

    /// Instantly silence and free the slot. Idempotent.
    pub fn kill(&mut self) {
        self.env.reset();
        self.allocated = false;
        self.retired = false;
        self.releasing = false;
        self.disposal_remaining = 0;
    }

    /// Remaining samples until the slot frees (0 when not releasing).
    pub fn disposal_remaining(&self) -> u64 {
        self.disposal_remaining
    }

    // -- Broadcast updates (mid-note) --

    /// Replace the oscillator snapshot. Structural changes (unison count,
    /// wavetable/analytic mode) take effect at the next trigger; everything
    /// else applies live.
    pub fn set_osc_params(&mut self, osc: &OscillatorParams) {
        self.params.osc = *osc;
        for unit in &mut self.units {
            unit.osc_x.set_waveform(osc.waveform_x);
            unit.osc_y.set_waveform(osc.waveform_y);
            unit.osc_x.set_morph(osc.morph_x, osc.morph_y);
            unit.osc_y.set_morph(osc.morph_x, osc.morph_y);
        }
        self.apply_unison_distribution();
    }

    /// Replace the filter snapshot.
    pub fn set_filter_params(&mut self, filter: &FilterParams) {
        self.params.filter = *filter;
        self.configure_filters(filter);
    }

    /// Replace the LFO snapshot.
    pub fn set_lfo_params(&mut self, lfo: &LfoParams, bpm: f32) {
        self.params.lfo = *lfo;
        self.configure_lfo(lfo, bpm);
    }

    /// Replace the envelope snapshot (used at the next gate edge).
    pub fn set_envelope_params(&mut self, env: &crate::params::EnvelopeParams) {
        self.params.envelope = *env;
    }

    /// Replace the noise snapshot.
    pub fn set_noise_params(&mut self, noise: &NoiseParams) {
        self.params.noise = *noise;
    }

    /// Re-route the modulation matrix.
    pub fn set_mod_matrix(&mut self, matrix: &ModMatrixParams) {
        self.params.mod_matrix = *matrix;
        self.router.apply(matrix);
    }

    /// Update the global mod wheel value.
    pub fn set_mod_wheel(&mut self, value: f32) {
        self.mod_wheel = value.clamp(0.0, 1.0);
    }

    /// Recompute a synced LFO rate for a new tempo.
    pub fn set_bpm(&mut self, bpm: f32) {
        let lfo = self.params.lfo;
        self.configure_lfo(&lfo, bpm);
    }

    /// Adopt a newly published wavetable.
    pub fn set_table(&mut self, table: &Arc<Wavetable>, generation: u64) {
        self.table = Arc::clone(table);
        self.table_gen = generation;
        for unit in &mut self.units {
            unit.osc_x.set_table(table, generation);
            unit.osc_y.set_table(table, generation);
        }
    }

    /// Ramp the polyphony-headroom gain to a new value.
    pub fn set_dynamic_gain(&mut self, gain: f32) {
        self.dyn_gain.set_target(gain);
    }

    // -- Internals --

    fn configure_lfo(&mut self, lfo: &LfoParams, bpm: f32) {
        self.lfo.set_shape(lfo.shape);
        self.lfo_base_rate = match lfo.sync {
            Some(div) => div.to_hz(bpm),
            None => lfo.rate_hz,
        }
        .clamp(0.0, 40.0);
        self.lfo.set_rate(self.lfo_base_rate);
    }

    fn configure_filters(&mut self, filter: &FilterParams) {
        for f in self.filter_x.iter_mut().chain(self.filter_y.iter_mut()) {
            if filter.enabled {
                f.set_resonance(filter.resonance);
                f.set_cutoff(filter.cutoff_hz);
            } else {
                f.set_transparent();
            }
        }
    }

    /// Rebuild the unison units only when the unison count or the
    /// wavetable/analytic mode changed since the last configuration.
    fn rebuild_units_if_needed(&mut self) {
        let requested = (self.params.osc.unison_voices as usize).clamp(1, MAX_UNISON);
        let modes = (
            self.params.osc.waveform_x == Waveform::Wavetable,
            self.params.osc.waveform_y == Waveform::Wavetable,
        );
        if requested == self.configured_unison && modes == self.configured_modes {
            // Same topology: just restart phases for a clean attack
            for unit in &mut self.units {
                unit.osc_x.reset();
                unit.osc_y.reset();
            }
            return;
        }

        self.units.clear();
        for _ in 0..requested {
            self.units.push(UnisonUnit {
                osc_x: OscUnit::build(
                    self.params.osc.waveform_x,
                    self.sample_rate,
                    &self.table,
                    self.table_gen,
                ),
                osc_y: OscUnit::build(
                    self.params.osc.waveform_y,
                    self.sample_rate,
                    &self.table,
                    self.table_gen,
                ),
                detune_ratio: 1.0,
                pan_l: core::f32::consts::FRAC_1_SQRT_2,
                pan_r: core::f32::consts::FRAC_1_SQRT_2,
            });
        }
        self.configured_unison = requested;
        self.configured_modes = modes;
        self.unit_gain = 1.0 / sqrtf(requested as f32);
    }

    /// Spread detune and pan symmetrically across the unison units.
    fn apply_unison_distribution(&mut self) {
        let n = self.units.len();
        if n == 0 {
            return;
        }
        let detune = self.params.osc.unison_detune_cents;
        let spread = self.params.osc.unison_spread.clamp(0.0, 1.0);
        for (i, unit) in self.units.iter_mut().enumerate() {
            // t spans [-1, 1]; a single unit sits at center (no divide by zero)
            let t = if n == 1 {
                0.0
            } else {
                (i as f32 / (n - 1) as f32 - 0.5) * 2.0
            };
            unit.detune_ratio = cents_to_ratio(t * detune);
            let pan = t * spread;
            let (sin_a, cos_a) = sincosf((pan + 1.0) * core::f32::consts::FRAC_PI_4);
            unit.pan_l = cos_a;
            unit.pan_r = sin_a;
            unit.osc_x.set_morph(self.params.osc.morph_x, self.params.osc.morph_y);
            unit.osc_y.set_morph(self.params.osc.morph_x, self.params.osc.morph_y);
        }
    }

    /// Detune offsets in cents per unit, for inspection/tests.
    pub fn unison_detune_cents(&self) -> Vec<f32> {
        let n = self.units.len();
        self.units
            .iter()
            .enumerate()
            .map(|(i, _)| {
                let t = if n == 1 {
                    0.0
                } else {
                    (i as f32 / (n - 1) as f32 - 0.5) * 2.0
                };
                t * self.params.osc.unison_detune_cents
            })
            .collect()
    }

    #[inline]
    fn white_noise(&mut self) -> f32 {
        let mut x = self.noise_state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.noise_state = x;
        (x as i32 as f32) / (i32::MAX as f32)
    }

    /// Render additively into the stereo voice bus. Returns `true` when the
    /// slot freed itself during this block.
    pub fn render(&mut self, left: &mut [f32], right: &mut [f32]) -> bool {
        if !self.allocated {
            return false;
        }
        let nyquist_cap = self.sample_rate * 0.49;

        for i in 0..left.len() {
            if self.releasing {
                if self.disposal_remaining == 0 {
                    self.kill();
                    return true;
                }
                self.disposal_remaining -= 1;
            }
            if !self.env.is_active() {
                // Silent tail: keep ramps moving, skip synthesis
                self.dyn_gain.advance();
                continue;
            }

            let lfo_raw = self.lfo.next();
            let depth =
                (self.params.lfo.depth + self.prev_offsets.lfo_depth).clamp(0.0, 1.0);
            let values = ModSourceValues {
                lfo: lfo_raw * depth,
                envelope: self.env.level(),
                velocity: self.velocity,
                mod_wheel: self.mod_wheel,
            };
            let off = self.router.signal_offsets(&values);
            let env_level = self.env.advance();

            self.lfo
                .set_rate((self.lfo_base_rate + off.lfo_rate_hz).clamp(0.0, 40.0));

            // Pitch and phase
            let ratio_x = cents_to_ratio(off.pitch_x_cents);
            let ratio_y =
                self.params.osc.ratio_y.max(0.01) * cents_to_ratio(off.pitch_y_cents + off.ratio_y_cents);
            let phase_offset_s = self.params.osc.phase_offset_s + off.phase_offset_s;

            // Filters follow keytracked base plus per-axis modulation
            if self.params.filter.enabled {
                let base = keytracked_cutoff(
                    self.params.filter.cutoff_hz,
                    self.base_freq,
                    self.params.filter.keytrack_pct / 100.0,
                );
                let cx = (base + off.cutoff_x_hz).clamp(20.0, nyquist_cap);
                let cy = (base + off.cutoff_y_hz).clamp(20.0, nyquist_cap);
                self.filter_x[0].set_cutoff(cx);
                self.filter_x[1].set_cutoff(cx);
                self.filter_y[0].set_cutoff(cy);
                self.filter_y[1].set_cutoff(cy);
            }

            let level_x = (self.params.osc.level_x + off.level_x).clamp(0.0, 2.0);
            let level_y = (self.params.osc.level_y + off.level_y).clamp(0.0, 2.0);

            let (mut ax_l, mut ax_r, mut ay_l, mut ay_r) = (0.0f32, 0.0f32, 0.0f32, 0.0f32);
            for unit in &mut self.units {
                let freq_x = self.base_freq * unit.detune_ratio * ratio_x;
                unit.osc_x.set_frequency(freq_x);
                let sx = unit.osc_x.advance(off.morph_x, off.morph_y, 0.0);

                let freq_y = freq_x * ratio_y;
                unit.osc_y.set_frequency(freq_y);
                let shift = phase_offset_s * freq_y;
                let sy = unit.osc_y.advance(off.morph_x, off.morph_y, shift);

                ax_l += sx * unit.pan_l;
                ax_r += sx * unit.pan_r;
                ay_l += sy * unit.pan_l;
                ay_r += sy * unit.pan_r;
            }
            let g = self.unit_gain;
            let fx_l = self.filter_x[0].process(ax_l * g);
            let fx_r = self.filter_x[1].process(ax_r * g);
            let fy_l = self.filter_y[0].process(ay_l * g);
            let fy_r = self.filter_y[1].process(ay_r * g);

            let noise = self.white_noise() * self.params.noise.level;
            let amp = env_level * self.velocity * self.dyn_gain.advance();

            left[i] += (fx_l * level_x + fy_l * level_y + noise) * amp;
            right[i] += (fx_r * level_x + fy_r * level_y + noise) * amp;

            self.prev_offsets = off;
        }
        false
    }
}

/// Outcome of a note-on, surfaced to the engine's event channel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NoteOutcome {
    /// Note id of a voice that was stolen to make room, if any.
    pub stolen: Option<NoteId>,
    /// Live voice count after the operation.
    pub active: usize,
}

/// Fixed-slot polyphonic voice bank.
pub struct VoiceBank {
    voices: Vec<Voice>,
    user_max: usize,
    sample_clock: u64,
    sample_rate: f32,
    params: InstrumentParams,
    bpm: f32,
    mod_wheel: f32,
    table: Arc<Wavetable>,
    table_gen: u64,
}

impl VoiceBank {
    /// Create the bank with every slot pre-built (all allocation happens
    /// here, on the control thread).
    pub fn new(sample_rate: f32, params: InstrumentParams, table: Arc<Wavetable>) -> Self {
        let table_gen = 1;
        let voices = (0..SLOT_COUNT)
            .map(|_| Voice::new(sample_rate, Arc::clone(&table), table_gen))
            .collect();
        Self {
            voices,
            user_max: HARD_POLYPHONY,
            sample_clock: 0,
            sample_rate,
            params,
            bpm: 120.0,
            mod_wheel: 0.0,
            table,
            table_gen,
        }
    }

    /// The bank's sample rate.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Generation of the currently adopted wavetable.
    pub fn wavetable_generation(&self) -> u64 {
        self.table_gen
    }

    /// The currently adopted wavetable.
    pub fn wavetable(&self) -> &Arc<Wavetable> {
        &self.table
    }

    /// The effective polyphony ceiling.
    pub fn polyphony_limit(&self) -> usize {
        self.user_max.min(HARD_POLYPHONY)
    }

    /// Clamp and set the user polyphony limit.
    pub fn set_user_max_polyphony(&mut self, max: usize) {
        self.user_max = max.clamp(1, HARD_POLYPHONY);
    }

    /// Voices currently counting toward polyphony.
    pub fn active_count(&self) -> usize {
        self.voices.iter().filter(|v| v.is_live()).count()
    }

    /// True while any slot is still sounding (including release tails).
    pub fn has_active_notes(&self) -> bool {
        self.voices.iter().any(|v| v.is_allocated())
    }

    /// Read access to the voice slots.
    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    /// Trigger a note. Retriggering a live id force-releases the old voice
    /// first; exceeding the polyphony limit steals the oldest voice.
    pub fn note_on(&mut self, id: NoteId, freq: f32, velocity: f32, mod_wheel: f32) -> NoteOutcome {
        self.mod_wheel = mod_wheel.clamp(0.0, 1.0);
        let mut stolen = None;

        // Same id already sounding: replace it
        if let Some(v) = self
            .voices
            .iter_mut()
            .find(|v| v.note_id() == Some(id))
        {
            v.release(true);
            v.retire();
        }

        // Polyphony exhausted: steal the oldest live voice
        if self.active_count() >= self.polyphony_limit() {
            if let Some(v) = self
                .voices
                .iter_mut()
                .filter(|v| v.is_live())
                .min_by_key(|v| v.started_at())
            {
                stolen = v.note_id();
                v.release(true);
                v.retire();
            }
        }

        // Pick a free slot, or reclaim the tail closest to silence
        let slot = match self.voices.iter().position(|v| !v.is_allocated()) {
            Some(idx) => idx,
            None => {
                let idx = self
                    .voices
                    .iter()
                    .enumerate()
                    .filter(|(_, v)| !v.is_live())
                    .min_by_key(|(_, v)| v.disposal_remaining())
                    .map_or(0, |(i, _)| i);
                self.voices[idx].kill();
                idx
            }
        };

        self.sample_clock += 1;
        let started_at = self.sample_clock;
        let params = self.params;
        let bpm = self.bpm;
        self.voices[slot].trigger(id, freq, velocity, self.mod_wheel, &params, bpm, started_at);

        self.rescale_dynamic_gain();
        NoteOutcome {
            stolen,
            active: self.active_count(),
        }
    }

    /// Release a note naturally. The voice stays in the active set until
    /// its release tail plus margin elapses; dynamic scaling is recomputed
    /// when the slot frees. Unknown ids are ignored.
    pub fn note_off(&mut self, id: NoteId) {
        if let Some(v) = self.voices.iter_mut().find(|v| v.note_id() == Some(id)) {
            v.release(false);
        }
    }

    /// Force-release everything, with the forced minimal fade.
    pub fn all_notes_off(&mut self) {
        for v in &mut self.voices {
            if v.is_allocated() {
                v.release(true);
                v.retire();
            }
        }
    }

    /// Render all voices additively into the (pre-zeroed) stereo bus.
    /// Returns how many slots freed during the block.
    pub fn render(&mut self, left: &mut [f32], right: &mut [f32]) -> usize {
        let mut freed = 0;
        for v in &mut self.voices {
            if v.render(left, right) {
                freed += 1;
            }
        }
        if freed > 0 {
            self.rescale_dynamic_gain();
        }
        freed
    }

    /// Soft headroom: every voice's output gain ramps to
    /// `min(1, 1/sqrt(active * 0.75))`.
    fn rescale_dynamic_gain(&mut self) {
        let active = self.active_count();
        let scale = if active == 0 {
            1.0
        } else {
            (1.0 / sqrtf(active as f32 * 0.75)).min(1.0)
        };
        for v in &mut self.voices {
            if v.is_allocated() {
                v.set_dynamic_gain(scale);
            }
        }
    }

    // -- Snapshot broadcasts --

    /// Replace the oscillator snapshot and broadcast it.
    pub fn update_oscillator(&mut self, osc: &OscillatorParams) {
        self.params.osc = *osc;
        for v in self.live_voices() {
            v.set_osc_params(osc);
        }
    }

    /// Replace the filter snapshot and broadcast it.
    pub fn update_filter(&mut self, filter: &FilterParams) {
        self.params.filter = *filter;
        for v in self.live_voices() {
            v.set_filter_params(filter);
        }
    }

    /// Replace the LFO snapshot and broadcast it.
    pub fn update_lfo(&mut self, lfo: &LfoParams) {
        self.params.lfo = *lfo;
        let bpm = self.bpm;
        for v in self.live_voices() {
            v.set_lfo_params(lfo, bpm);
        }
    }

    /// Replace the envelope snapshot and broadcast it.
    pub fn update_envelope(&mut self, env: &crate::params::EnvelopeParams) {
        self.params.envelope = *env;
        for v in self.live_voices() {
            v.set_envelope_params(env);
        }
    }

    /// Replace the noise snapshot and broadcast it.
    pub fn update_noise(&mut self, noise: &NoiseParams) {
        self.params.noise = *noise;
        for v in self.live_voices() {
            v.set_noise_params(noise);
        }
    }

    /// Replace the modulation matrix and broadcast it.
    pub fn update_mod_matrix(&mut self, matrix: &ModMatrixParams) {
        self.params.mod_matrix = *matrix;
        for v in self.live_voices() {
            v.set_mod_matrix(matrix);
        }
    }

    /// Update the global mod wheel for all sounding voices.
    pub fn set_mod_wheel(&mut self, value: f32) {
        self.mod_wheel = value.clamp(0.0, 1.0);
        for v in self.live_voices() {
            v.set_mod_wheel(value);
        }
    }

    /// Update the tempo; synced LFOs re-derive their rate.
    pub fn set_bpm(&mut self, bpm: f32) {
        self.bpm = bpm.max(1.0);
        let b = self.bpm;
        for v in self.live_voices() {
            v.set_bpm(b);
        }
    }

    /// Publish a new wavetable to every slot.
    pub fn set_wavetable(&mut self, table: Arc<Wavetable>, generation: u64) {
        self.table = Arc::clone(&table);
        self.table_gen = generation;
        for v in &mut self.voices {
            v.set_table(&table, generation);
        }
    }

    fn live_voices(&mut self) -> impl Iterator<Item = &mut Voice> {
        self.voices.iter_mut().filter(|v| v.is_allocated())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bank() -> VoiceBank {
        VoiceBank::new(
            48000.0,
            InstrumentParams::default(),
            Arc::new(Wavetable::analytic("builtin")),
        )
    }

    fn render_some(bank: &mut VoiceBank, blocks: usize) {
        let mut l = [0.0f32; 256];
        let mut r = [0.0f32; 256];
        for _ in 0..blocks {
            l.fill(0.0);
            r.fill(0.0);
            bank.render(&mut l, &mut r);
        }
    }

    #[test]
    fn voices_produce_audio() {
        let mut b = bank();
        b.note_on(NoteId::new("a4"), 440.0, 1.0, 0.0);
        let mut l = [0.0f32; 512];
        let mut r = [0.0f32; 512];
        b.render(&mut l, &mut r);
        let energy: f32 = l.iter().map(|s| s.abs()).sum();
        assert!(energy > 0.0, "triggered voice must sound");
    }

    #[test]
    fn polyphony_bound_holds() {
        let mut b = bank();
        b.set_user_max_polyphony(4);
        for i in 0..20 {
            let id_string = alloc::format!("n{i}");
            b.note_on(NoteId::new(&id_string), 200.0 + i as f32, 1.0, 0.0);
            assert!(b.active_count() <= 4, "bound broken at note {i}");
        }
    }

    #[test]
    fn steal_targets_oldest() {
        let mut b = bank();
        b.set_user_max_polyphony(2);
        b.note_on(NoteId::new("first"), 100.0, 1.0, 0.0);
        b.note_on(NoteId::new("second"), 200.0, 1.0, 0.0);
        let outcome = b.note_on(NoteId::new("third"), 300.0, 1.0, 0.0);
        assert_eq!(outcome.stolen, Some(NoteId::new("first")));

        // "second" must survive
        assert!(b.voices().iter().any(|v| v.note_id() == Some(NoteId::new("second"))));
    }

    #[test]
    fn retrigger_leaves_exactly_one_live_voice() {
        let mut b = bank();
        b.note_on(NoteId::new("same"), 220.0, 1.0, 0.0);
        b.note_on(NoteId::new("same"), 220.0, 1.0, 0.0);
        let live = b
            .voices()
            .iter()
            .filter(|v| v.note_id() == Some(NoteId::new("same")))
            .count();
        assert_eq!(live, 1);
    }

    #[test]
    fn retrigger_does_not_leak_slots() {
        let mut b = bank();
        for _ in 0..100 {
            b.note_on(NoteId::new("same"), 220.0, 1.0, 0.0);
            render_some(&mut b, 2);
        }
        // Old instances fade within release + margin; far fewer than 100
        // slots may be occupied
        assert!(b.voices().iter().filter(|v| v.is_allocated()).count() <= SLOT_COUNT);
        assert_eq!(b.active_count(), 1);
    }

    #[test]
    fn note_off_frees_after_tail() {
        let mut b = bank();
        b.note_on(NoteId::new("x"), 330.0, 1.0, 0.0);
        b.note_off(NoteId::new("x"));
        assert!(b.has_active_notes());

        // Default release 0.25 s + 0.15 s margin = 0.4 s = 19200 samples
        render_some(&mut b, 80);
        assert!(!b.has_active_notes(), "slot should free after the tail");
    }

    #[test]
    fn unison_detune_is_symmetric() {
        let mut b = bank();
        let mut osc = OscillatorParams::default();
        osc.unison_voices = 4;
        osc.unison_detune_cents = 10.0;
        b.update_oscillator(&osc);
        b.note_on(NoteId::new("u"), 220.0, 1.0, 0.0);

        let voice = b
            .voices()
            .iter()
            .find(|v| v.is_live())
            .expect("voice allocated");
        let offsets = voice.unison_detune_cents();
        assert_eq!(offsets.len(), 4);
        assert!((offsets[0] + 10.0).abs() < 1e-4, "got {:?}", offsets);
        assert!((offsets[3] - 10.0).abs() < 1e-4);
        // Symmetric around zero
        for (a, b_) in offsets.iter().zip(offsets.iter().rev()) {
            assert!((a + b_).abs() < 1e-4, "asymmetric: {:?}", offsets);
        }
    }

    #[test]
    fn unison_count_clamps_to_seven() {
        let mut b = bank();
        let mut osc = OscillatorParams::default();
        osc.unison_voices = 100;
        b.update_oscillator(&osc);
        b.note_on(NoteId::new("u"), 220.0, 1.0, 0.0);
        let voice = b.voices().iter().find(|v| v.is_live()).unwrap();
        assert_eq!(voice.unison_detune_cents().len(), MAX_UNISON);
    }

    #[test]
    fn dynamic_gain_scales_with_count() {
        let mut b = bank();
        b.note_on(NoteId::new("1"), 220.0, 1.0, 0.0);
        let one = b.voices().iter().find(|v| v.is_live()).unwrap().dynamic_gain();
        assert!((one - 1.0).abs() < 1e-5, "single voice keeps unity, got {one}");

        for i in 2..=8 {
            let id_string = alloc::format!("{i}");
            b.note_on(NoteId::new(&id_string), 220.0, 1.0, 0.0);
        }
        let eight = b.voices().iter().find(|v| v.is_live()).unwrap().dynamic_gain();
        let expected = (1.0 / sqrtf(8.0 * 0.75)).min(1.0);
        assert!((eight - expected).abs() < 1e-5, "got {eight}, want {expected}");
    }

    #[test]
    fn user_polyphony_clamps() {
        let mut b = bank();
        b.set_user_max_polyphony(0);
        assert_eq!(b.polyphony_limit(), 1);
        b.set_user_max_polyphony(1000);
        assert_eq!(b.polyphony_limit(), HARD_POLYPHONY);
    }

    #[test]
    fn wavetable_mode_renders() {
        let mut b = bank();
        let mut osc = OscillatorParams::default();
        osc.waveform_x = Waveform::Wavetable;
        osc.level_x = 1.0;
        b.update_oscillator(&osc);
        b.note_on(NoteId::new("wt"), 220.0, 1.0, 0.0);

        let mut l = [0.0f32; 1024];
        let mut r = [0.0f32; 1024];
        b.render(&mut l, &mut r);
        assert!(l.iter().any(|s| s.abs() > 0.0));
        assert!(l.iter().all(|s| s.is_finite()));
    }

    #[test]
    fn all_notes_off_fades_everything() {
        let mut b = bank();
        for i in 0..5 {
            let id_string = alloc::format!("{i}");
            b.note_on(NoteId::new(&id_string), 220.0, 1.0, 0.0);
        }
        b.all_notes_off();
        assert_eq!(b.active_count(), 0);
        // Tails clear after the forced release + margin
        render_some(&mut b, 40);
        assert!(!b.has_active_notes());
    }
}
