//! The engine control surface.
//!
//! [`Engine`] is the single object a GUI/host talks to. It owns the
//! control-side state (parameter snapshots, the wavetable library, the
//! command producer, event consumer, taps, meters) and, once initialized,
//! the output stream whose callback owns the [`RenderCore`].
//!
//! Every control call before a successful [`Engine::init`] (or
//! [`Engine::init_offline`]) is a logged no-op; after [`Engine::dispose`]
//! the engine returns to that state and can be re-initialized.

use crate::chain::{MixerParams, order_is_permutation};
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::message::{Command, EngineEvent};
use crate::render::{RenderCore, RenderWiring};
use crate::stream;
use crate::taps::{TapPoint, TapSet};
use arc_swap::ArcSwap;
use morfo_core::AnalysisTap;
use morfo_effects::{DelayParams, InsertId, InsertParams, ReverbParams};
use morfo_synth::{
    EnvelopeParams, FilterParams, InstrumentParams, LfoParams, ModMatrixParams, NoiseParams,
    NoteId, OscillatorParams, VoiceBank, Wavetable,
};
use ringbuf::traits::{Consumer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicU64, AtomicUsize, Ordering};

/// Command/event ring capacity.
const RING_CAPACITY: usize = 1024;

/// Name of the built-in analytic wavetable.
pub const BUILTIN_TABLE: &str = "basic";

/// The morfo synthesizer engine.
pub struct Engine {
    config: EngineConfig,
    params: InstrumentParams,
    mixer: MixerParams,
    bpm: f32,

    library: HashMap<String, Arc<Wavetable>>,
    table_swap: Arc<ArcSwap<Wavetable>>,
    table_gen: Arc<AtomicU64>,

    commands: Option<HeapProd<Command>>,
    events: Option<HeapCons<EngineEvent>>,
    taps: TapSet,
    limiter_reduction: Option<Arc<AtomicU32>>,
    active_gauge: Arc<AtomicUsize>,

    stream: Option<cpal::Stream>,
    running: bool,
}

impl Engine {
    /// Create an uninitialized engine with the given configuration and
    /// initial parameter snapshots.
    pub fn new(config: EngineConfig, params: InstrumentParams) -> Self {
        let basic = Arc::new(Wavetable::analytic(BUILTIN_TABLE));
        let mut library = HashMap::new();
        library.insert(BUILTIN_TABLE.to_string(), Arc::clone(&basic));

        Self {
            config,
            params,
            mixer: MixerParams::default(),
            bpm: 120.0,
            library,
            table_swap: Arc::new(ArcSwap::from_pointee(Wavetable::silent("init"))),
            table_gen: Arc::new(AtomicU64::new(0)),
            commands: None,
            events: None,
            taps: TapSet::new(),
            limiter_reduction: None,
            active_gauge: Arc::new(AtomicUsize::new(0)),
            stream: None,
            running: false,
        }
    }

    /// Whether a successful `init` is in effect.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Build the audio pipeline and start the output device. On failure
    /// the engine stays uninitialized and every control call remains a
    /// no-op; `init` may be retried.
    pub fn init(&mut self) -> Result<()> {
        if self.running {
            return Ok(());
        }
        let core = self.build_pipeline();
        match stream::build_output_stream(&self.config, core) {
            Ok(stream) => {
                self.stream = Some(stream);
                self.running = true;
                tracing::info!("engine initialized");
                Ok(())
            }
            Err(e) => {
                self.teardown_pipeline();
                tracing::warn!(error = %e, "engine init failed");
                Err(e)
            }
        }
    }

    /// Build the pipeline without an output device and hand the render
    /// core back for manual block pumping (offline rendering, tests).
    pub fn init_offline(&mut self) -> Result<RenderCore> {
        if self.running {
            return Err(EngineError::Stream("already running".into()));
        }
        let core = self.build_pipeline();
        self.running = true;
        Ok(core)
    }

    fn build_pipeline(&mut self) -> RenderCore {
        let sample_rate = self.config.sample_rate as f32;
        let (cmd_prod, cmd_cons): (HeapProd<Command>, HeapCons<Command>) =
            HeapRb::new(RING_CAPACITY).split();
        let (evt_prod, evt_cons): (HeapProd<EngineEvent>, HeapCons<EngineEvent>) =
            HeapRb::new(RING_CAPACITY).split();

        // Publish the built-in table as generation 1
        let basic = Arc::clone(&self.library[BUILTIN_TABLE]);
        self.table_swap.store(Arc::clone(&basic));
        self.table_gen.store(1, Ordering::Release);

        let bank = VoiceBank::new(sample_rate, self.params, basic);
        let core = RenderCore::new(
            sample_rate,
            RenderWiring {
                bank,
                commands: cmd_cons,
                events: evt_prod,
                taps: self.taps.clone(),
                table_swap: Arc::clone(&self.table_swap),
                table_gen: Arc::clone(&self.table_gen),
                active_gauge: Arc::clone(&self.active_gauge),
                mixer: self.mixer,
            },
        );
        self.limiter_reduction = Some(core.limiter_reduction_handle());
        self.commands = Some(cmd_prod);
        self.events = Some(evt_cons);

        // Seed the render side with the current tempo; the wiring carries
        // everything else
        if let Some(commands) = &mut self.commands {
            let _ = commands.try_push(Command::Bpm(self.bpm));
        }
        core
    }

    fn teardown_pipeline(&mut self) {
        self.commands = None;
        self.events = None;
        self.limiter_reduction = None;
        self.stream = None;
    }

    /// Fade all voices and tear the audio graph down. Idempotent; the
    /// engine can be re-initialized afterwards.
    pub fn dispose(&mut self) {
        if !self.running {
            return;
        }
        self.push(Command::AllNotesOff);
        if let Some(s) = self.stream.take() {
            use cpal::traits::StreamTrait;
            let _ = s.pause();
        }
        self.teardown_pipeline();
        self.running = false;
        self.active_gauge.store(0, Ordering::Relaxed);
        tracing::info!("engine disposed");
    }

    fn push(&mut self, cmd: Command) {
        if !self.running {
            tracing::debug!(?cmd, "engine not running, control call ignored");
            return;
        }
        if let Some(commands) = &mut self.commands
            && commands.try_push(cmd).is_err()
        {
            tracing::warn!("command ring full, dropping command");
        }
    }

    // -- Note events --

    /// Trigger a note.
    pub fn play_note(&mut self, note_id: &str, freq: f32, velocity: f32, mod_wheel: f32) {
        self.push(Command::NoteOn {
            id: NoteId::new(note_id),
            freq,
            velocity,
            mod_wheel,
        });
    }

    /// Release a note.
    pub fn stop_note(&mut self, note_id: &str) {
        self.push(Command::NoteOff(NoteId::new(note_id)));
    }

    // -- Parameter updates (full snapshot replacement) --

    /// Replace the oscillator snapshot.
    pub fn update_oscillator_params(&mut self, params: OscillatorParams) {
        self.params.osc = params;
        self.push(Command::Oscillator(params));
    }

    /// Replace the filter snapshot.
    pub fn update_filter_params(&mut self, params: FilterParams) {
        self.params.filter = params;
        self.push(Command::Filter(params));
    }

    /// Replace the LFO snapshot.
    pub fn update_lfo_params(&mut self, params: LfoParams) {
        self.params.lfo = params;
        self.push(Command::Lfo(params));
    }

    /// Replace the envelope snapshot.
    pub fn update_envelope_params(&mut self, params: EnvelopeParams) {
        self.params.envelope = params;
        self.push(Command::Envelope(params));
    }

    /// Replace the noise snapshot.
    pub fn update_noise_params(&mut self, params: NoiseParams) {
        self.params.noise = params;
        self.push(Command::Noise(params));
    }

    /// Replace the modulation matrix.
    pub fn update_mod_matrix(&mut self, params: ModMatrixParams) {
        self.params.mod_matrix = params;
        self.push(Command::ModMatrix(params));
    }

    /// Replace the mixer snapshot. An insert order that is not a
    /// permutation of all effects is rejected with a warning.
    pub fn update_mixer_params(&mut self, params: MixerParams) {
        if !order_is_permutation(&params.insert_order) {
            tracing::warn!("rejected insert order: not a permutation of all effects");
            return;
        }
        self.mixer = params;
        self.push(Command::Mixer(params));
    }

    /// Replace one insert effect's tone parameters.
    pub fn update_insert_params(&mut self, params: InsertParams) {
        self.push(Command::Insert(params));
    }

    /// Enable or bypass one insert effect (dry/wet crossfade).
    pub fn set_insert_enabled(&mut self, id: InsertId, enabled: bool) {
        self.push(Command::InsertEnabled(id, enabled));
    }

    /// Replace the delay send parameters.
    pub fn update_delay_params(&mut self, params: DelayParams) {
        self.push(Command::Delay(params));
    }

    /// Replace the reverb send parameters.
    pub fn update_reverb_params(&mut self, params: ReverbParams) {
        self.push(Command::Reverb(params));
    }

    // -- Global controls --

    /// Clamp and set the user polyphony ceiling.
    pub fn set_user_max_polyphony(&mut self, max: usize) {
        self.push(Command::MaxPolyphony(max));
    }

    /// Update the global tempo; synced LFOs and delays follow.
    pub fn update_global_bpm(&mut self, bpm: f32) {
        self.bpm = bpm.max(1.0);
        self.push(Command::Bpm(bpm));
    }

    /// Update the global mod wheel value (0-1).
    pub fn update_global_mod_wheel(&mut self, value: f32) {
        self.push(Command::ModWheel(value));
    }

    /// Master volume trim in dB.
    pub fn set_master_volume_trim_db(&mut self, db: f32) {
        self.push(Command::MasterTrimDb(db));
    }

    /// Engage or bypass the master limiter.
    pub fn set_master_limiter_enabled(&mut self, enabled: bool) {
        self.push(Command::LimiterEnabled(enabled));
    }

    /// Master limiter threshold in dB.
    pub fn set_master_limiter_threshold(&mut self, db: f32) {
        self.push(Command::LimiterThresholdDb(db));
    }

    // -- Wavetables --

    /// Register a user wavetable built from decoded sample memory.
    pub fn load_user_wavetable(&mut self, name: &str, samples: &[f32]) {
        let table = Arc::new(Wavetable::from_samples(name, samples));
        self.library.insert(name.to_string(), table);
    }

    /// Select the active wavetable by name. An unknown name substitutes a
    /// silent table and logs, it never fails.
    pub fn select_wavetable(&mut self, name: &str) {
        if !self.running {
            tracing::debug!(name, "engine not running, wavetable selection ignored");
            return;
        }
        let table = match self.library.get(name) {
            Some(t) => Arc::clone(t),
            None => {
                tracing::warn!(name, "unknown wavetable, substituting silence");
                Arc::new(Wavetable::silent(name))
            }
        };
        self.table_swap.store(table);
        self.table_gen.fetch_add(1, Ordering::AcqRel);
    }

    /// Names of all registered wavetables.
    pub fn wavetable_names(&self) -> Vec<&str> {
        self.library.keys().map(String::as_str).collect()
    }

    // -- Analysis & notifications --

    /// Access one analysis tap.
    pub fn tap(&self, point: TapPoint) -> &AnalysisTap {
        self.taps.tap(point)
    }

    /// True if any analysis tap recorded a sample above `threshold`.
    pub fn check_fast_global_clip(&self, threshold: f32) -> bool {
        self.taps.any_exceeds(threshold)
    }

    /// Current master limiter gain reduction in dB.
    pub fn master_limiter_reduction_db(&self) -> f32 {
        self.limiter_reduction
            .as_ref()
            .map_or(0.0, |bits| f32::from_bits(bits.load(Ordering::Relaxed)))
    }

    /// True while any voice is sounding (including release tails).
    pub fn has_active_notes(&self) -> bool {
        self.active_gauge.load(Ordering::Relaxed) > 0
    }

    /// Drain pending render-thread events into the callback.
    pub fn poll_events(&mut self, mut f: impl FnMut(EngineEvent)) {
        if let Some(events) = &mut self.events {
            while let Some(evt) = events.try_pop() {
                f(evt);
            }
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.dispose();
    }
}
