//! The real-time render core.
//!
//! Owned by the audio callback. Each block: drain the command ring, adopt a
//! newly published wavetable if the generation moved, render voices into
//! the voice bus, run the insert chain in its current order, feed and mix
//! the send buses, apply the master trim and limiter, and write the taps.
//! Nothing here blocks, locks, or allocates; every level change moves
//! through a ramp.

use crate::chain::{InsertChain, MixerParams, SendMode};
use crate::message::{Command, EngineEvent};
use crate::taps::TapSet;
use arc_swap::ArcSwap;
use morfo_core::Ramp;
use morfo_effects::{MasterLimiter, SendDelay, SendReverb};
use morfo_synth::{VoiceBank, Wavetable};
use ringbuf::traits::{Consumer, Producer};
use ringbuf::{HeapCons, HeapProd};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Largest chunk processed at once; device blocks larger than this are
/// split.
pub const MAX_BLOCK: usize = 2048;

/// Ramp time for send/return/trim level changes.
const LEVEL_RAMP_SECS: f32 = 0.05;

/// Fade used when the engine disposes.
const DISPOSE_FADE_SECS: f32 = 0.05;

/// Everything the audio thread owns.
pub struct RenderCore {
    bank: VoiceBank,
    chain: InsertChain,
    delay: SendDelay,
    reverb: SendReverb,
    limiter: MasterLimiter,

    master_trim: Ramp,
    delay_send: Ramp,
    delay_return: Ramp,
    reverb_send: Ramp,
    reverb_return: Ramp,
    send_mode: SendMode,

    commands: HeapCons<Command>,
    events: HeapProd<EngineEvent>,
    taps: TapSet,

    table_swap: Arc<ArcSwap<Wavetable>>,
    table_gen: Arc<AtomicU64>,
    table_gen_seen: u64,
    active_gauge: Arc<AtomicUsize>,

    bus_l: Vec<f32>,
    bus_r: Vec<f32>,
    delay_in_l: Vec<f32>,
    delay_in_r: Vec<f32>,
    reverb_in_l: Vec<f32>,
    reverb_in_r: Vec<f32>,
    ret_l: Vec<f32>,
    ret_r: Vec<f32>,

    sample_rate: f32,
}

/// Construction wiring for [`RenderCore`].
pub(crate) struct RenderWiring {
    pub bank: VoiceBank,
    pub commands: HeapCons<Command>,
    pub events: HeapProd<EngineEvent>,
    pub taps: TapSet,
    pub table_swap: Arc<ArcSwap<Wavetable>>,
    pub table_gen: Arc<AtomicU64>,
    pub active_gauge: Arc<AtomicUsize>,
    pub mixer: MixerParams,
}

impl RenderCore {
    pub(crate) fn new(sample_rate: f32, wiring: RenderWiring) -> Self {
        let mut chain = InsertChain::new(sample_rate);
        for id in morfo_effects::InsertId::ALL {
            chain.set_wet_tap(
                id,
                wiring.taps.tap(crate::taps::TapPoint::InsertWet(id)).clone(),
            );
        }
        chain.set_order(wiring.mixer.insert_order);

        let mut core = Self {
            bank: wiring.bank,
            chain,
            delay: SendDelay::new(sample_rate),
            reverb: SendReverb::new(sample_rate),
            limiter: MasterLimiter::new(sample_rate),
            master_trim: Ramp::new(1.0, sample_rate),
            delay_send: Ramp::new(0.0, sample_rate),
            delay_return: Ramp::new(wiring.mixer.delay_return, sample_rate),
            reverb_send: Ramp::new(0.0, sample_rate),
            reverb_return: Ramp::new(wiring.mixer.reverb_return, sample_rate),
            send_mode: wiring.mixer.send_mode,
            commands: wiring.commands,
            events: wiring.events,
            taps: wiring.taps,
            table_swap: wiring.table_swap,
            table_gen: wiring.table_gen,
            table_gen_seen: 0,
            active_gauge: wiring.active_gauge,
            bus_l: vec![0.0; MAX_BLOCK],
            bus_r: vec![0.0; MAX_BLOCK],
            delay_in_l: vec![0.0; MAX_BLOCK],
            delay_in_r: vec![0.0; MAX_BLOCK],
            reverb_in_l: vec![0.0; MAX_BLOCK],
            reverb_in_r: vec![0.0; MAX_BLOCK],
            ret_l: vec![0.0; MAX_BLOCK],
            ret_r: vec![0.0; MAX_BLOCK],
            sample_rate,
        };
        core.delay_send
            .set_immediate(wiring.mixer.delay_send.clamp(0.0, 1.0));
        core.reverb_send
            .set_immediate(wiring.mixer.reverb_send.clamp(0.0, 1.0));
        core
    }

    /// A handle to the limiter's gain-reduction meter.
    pub fn limiter_reduction_handle(&self) -> Arc<std::sync::atomic::AtomicU32> {
        self.limiter.reduction_handle()
    }

    /// Render one stereo block of arbitrary length (split internally).
    pub fn process_block(&mut self, out_l: &mut [f32], out_r: &mut [f32]) {
        let mut offset = 0;
        let total = out_l.len();
        while offset < total {
            let len = (total - offset).min(MAX_BLOCK);
            self.process_chunk(len);
            out_l[offset..offset + len].copy_from_slice(&self.bus_l[..len]);
            out_r[offset..offset + len].copy_from_slice(&self.bus_r[..len]);
            offset += len;
        }
    }

    /// Render into an interleaved device buffer.
    pub fn process_interleaved(&mut self, data: &mut [f32], channels: usize) {
        if channels == 0 {
            return;
        }
        let frames = data.len() / channels;
        let mut offset = 0;
        while offset < frames {
            let len = (frames - offset).min(MAX_BLOCK);
            self.process_chunk(len);
            for i in 0..len {
                let base = (offset + i) * channels;
                data[base] = self.bus_l[i];
                if channels > 1 {
                    data[base + 1] = self.bus_r[i];
                    for extra in 2..channels {
                        data[base + extra] = 0.0;
                    }
                }
            }
            offset += len;
        }
    }

    fn process_chunk(&mut self, len: usize) {
        self.drain_commands();
        self.adopt_published_table();

        self.bus_l[..len].fill(0.0);
        self.bus_r[..len].fill(0.0);

        // Voices into the bus; slot disposals surface as count events
        let freed = self
            .bank
            .render(&mut self.bus_l[..len], &mut self.bus_r[..len]);
        if freed > 0 {
            let _ = self
                .events
                .try_push(EngineEvent::VoiceCount(self.bank.active_count()));
        }
        self.active_gauge
            .store(self.bank.active_count(), Ordering::Relaxed);

        for i in 0..len {
            self.taps.pre_insert.write(self.bus_l[i]);
            self.taps.pre_insert.write(self.bus_r[i]);
        }

        if self.send_mode == SendMode::PreFx {
            self.capture_sends(len);
        }
        self.chain
            .process(&mut self.bus_l[..len], &mut self.bus_r[..len]);
        if self.send_mode == SendMode::PostFx {
            self.capture_sends(len);
        }

        // Send buses render wet-only; returns mix back ramped
        self.delay.render(
            &self.delay_in_l[..len],
            &self.delay_in_r[..len],
            &mut self.ret_l[..len],
            &mut self.ret_r[..len],
        );
        for i in 0..len {
            let ret = self.delay_return.advance();
            self.bus_l[i] += self.ret_l[i] * ret;
            self.bus_r[i] += self.ret_r[i] * ret;
        }
        self.reverb.render(
            &self.reverb_in_l[..len],
            &self.reverb_in_r[..len],
            &mut self.ret_l[..len],
            &mut self.ret_r[..len],
        );
        for i in 0..len {
            let ret = self.reverb_return.advance();
            self.bus_l[i] += self.ret_l[i] * ret;
            self.bus_r[i] += self.ret_r[i] * ret;
        }

        // Master trim, then the limiter
        for i in 0..len {
            let trim = self.master_trim.advance();
            self.bus_l[i] *= trim;
            self.bus_r[i] *= trim;
            self.taps.master_pre.write(self.bus_l[i]);
            self.taps.master_pre.write(self.bus_r[i]);
        }
        self.limiter
            .process(&mut self.bus_l[..len], &mut self.bus_r[..len]);
        for i in 0..len {
            self.taps.master_post.write(self.bus_l[i]);
            self.taps.master_post.write(self.bus_r[i]);
        }
    }

    /// Scale the current bus into each send's input buffer. The two sends
    /// share a tap point in the chain but ramp their levels independently.
    fn capture_sends(&mut self, len: usize) {
        for i in 0..len {
            let ds = self.delay_send.advance();
            let rs = self.reverb_send.advance();
            self.delay_in_l[i] = self.bus_l[i] * ds;
            self.delay_in_r[i] = self.bus_r[i] * ds;
            self.reverb_in_l[i] = self.bus_l[i] * rs;
            self.reverb_in_r[i] = self.bus_r[i] * rs;
            self.taps.delay_send_in.write(self.delay_in_l[i]);
            self.taps.delay_send_in.write(self.delay_in_r[i]);
            self.taps.reverb_send_in.write(self.reverb_in_l[i]);
            self.taps.reverb_send_in.write(self.reverb_in_r[i]);
        }
    }

    fn adopt_published_table(&mut self) {
        let generation = self.table_gen.load(Ordering::Acquire);
        if generation != self.table_gen_seen {
            self.table_gen_seen = generation;
            let table = self.table_swap.load_full();
            self.bank.set_wavetable(table, generation);
        }
    }

    fn drain_commands(&mut self) {
        while let Some(cmd) = self.commands.try_pop() {
            self.apply(cmd);
        }
    }

    fn apply(&mut self, cmd: Command) {
        match cmd {
            Command::NoteOn {
                id,
                freq,
                velocity,
                mod_wheel,
            } => {
                let outcome = self.bank.note_on(id, freq, velocity, mod_wheel);
                if let Some(stolen) = outcome.stolen {
                    let _ = self.events.try_push(EngineEvent::VoiceStolen(stolen));
                }
                let _ = self
                    .events
                    .try_push(EngineEvent::VoiceCount(outcome.active));
            }
            Command::NoteOff(id) => self.bank.note_off(id),
            Command::AllNotesOff => {
                self.bank.all_notes_off();
                self.master_trim.ramp_to(0.0, DISPOSE_FADE_SECS);
            }
            Command::Oscillator(p) => self.bank.update_oscillator(&p),
            Command::Filter(p) => self.bank.update_filter(&p),
            Command::Lfo(p) => self.bank.update_lfo(&p),
            Command::Envelope(p) => self.bank.update_envelope(&p),
            Command::Noise(p) => self.bank.update_noise(&p),
            Command::ModMatrix(p) => self.bank.update_mod_matrix(&p),
            Command::Mixer(p) => self.apply_mixer(&p),
            Command::Insert(p) => self.chain.set_params(&p),
            Command::InsertEnabled(id, enabled) => self.chain.set_enabled(id, enabled),
            Command::Delay(p) => self.delay.set_params(&p),
            Command::Reverb(p) => self.reverb.set_params(&p),
            Command::MaxPolyphony(n) => self.bank.set_user_max_polyphony(n),
            Command::Bpm(bpm) => {
                self.bank.set_bpm(bpm);
                self.delay.set_bpm(bpm);
            }
            Command::ModWheel(v) => self.bank.set_mod_wheel(v),
            Command::MasterTrimDb(db) => {
                self.master_trim.ramp_to(
                    morfo_core::db_to_linear(db.clamp(-60.0, 12.0)),
                    LEVEL_RAMP_SECS,
                );
            }
            Command::LimiterEnabled(enabled) => self.limiter.set_enabled(enabled),
            Command::LimiterThresholdDb(db) => self.limiter.set_threshold_db(db),
        }
    }

    fn apply_mixer(&mut self, mixer: &MixerParams) {
        self.chain.set_order(mixer.insert_order);
        self.send_mode = mixer.send_mode;
        self.delay_send
            .ramp_to(mixer.delay_send.clamp(0.0, 1.0), LEVEL_RAMP_SECS);
        self.delay_return
            .ramp_to(mixer.delay_return.clamp(0.0, 1.0), LEVEL_RAMP_SECS);
        self.reverb_send
            .ramp_to(mixer.reverb_send.clamp(0.0, 1.0), LEVEL_RAMP_SECS);
        self.reverb_return
            .ramp_to(mixer.reverb_return.clamp(0.0, 1.0), LEVEL_RAMP_SECS);
    }

    /// The render core's sample rate.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }
}
