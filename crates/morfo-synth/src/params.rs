//! Instrument parameter snapshots.
//!
//! The GUI/host sends these as whole-value snapshots; the engine stores its
//! own copy and every update fully replaces the relevant struct — there is
//! no field-level diffing. All snapshots are plain `Copy` data so they can
//! cross the control→render queue without heap traffic, and all carry serde
//! derives so a host can round-trip them into its preset layer.

use morfo_core::{LfoShape, SyncDivision};
use serde::{Deserialize, Serialize};

/// Oscillator waveform selection for one axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Waveform {
    /// Pure sine.
    #[default]
    Sine,
    /// Naive triangle.
    Triangle,
    /// Band-limited sawtooth.
    Saw,
    /// Band-limited square.
    Square,
    /// Band-limited pulse at 25% duty.
    Pulse,
    /// Morphing wavetable playback.
    Wavetable,
}

/// Dual-oscillator section parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct OscillatorParams {
    /// Waveform of the X oscillator.
    pub waveform_x: Waveform,
    /// Waveform of the Y oscillator.
    pub waveform_y: Waveform,
    /// Frequency ratio of the Y oscillator relative to the note pitch.
    pub ratio_y: f32,
    /// Output level of the X axis (0-1).
    pub level_x: f32,
    /// Output level of the Y axis (0-1).
    pub level_y: f32,
    /// Stereo phase offset applied to the Y oscillator, in seconds.
    pub phase_offset_s: f32,
    /// Wavetable morph position, X axis (0-1).
    pub morph_x: f32,
    /// Wavetable morph position, Y axis (0-1).
    pub morph_y: f32,
    /// Requested unison voices (clamped to 1-7).
    pub unison_voices: u32,
    /// Unison detune half-span in cents.
    pub unison_detune_cents: f32,
    /// Unison stereo spread (0 = mono, 1 = full width).
    pub unison_spread: f32,
}

impl Default for OscillatorParams {
    fn default() -> Self {
        Self {
            waveform_x: Waveform::Saw,
            waveform_y: Waveform::Sine,
            ratio_y: 1.0,
            level_x: 0.8,
            level_y: 0.0,
            phase_offset_s: 0.0,
            morph_x: 0.0,
            morph_y: 0.0,
            unison_voices: 1,
            unison_detune_cents: 0.0,
            unison_spread: 0.0,
        }
    }
}

/// Voice filter section parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FilterParams {
    /// When false both filters become transparent, they are never removed
    /// from the path.
    pub enabled: bool,
    /// Base cutoff in Hz before keytracking and modulation.
    pub cutoff_hz: f32,
    /// Resonance (0.5-20).
    pub resonance: f32,
    /// Keyboard tracking in percent (0-100); 100 follows pitch fully.
    pub keytrack_pct: f32,
}

impl Default for FilterParams {
    fn default() -> Self {
        Self {
            enabled: true,
            cutoff_hz: 8000.0,
            resonance: 0.707,
            keytrack_pct: 0.0,
        }
    }
}

/// Per-voice LFO parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LfoParams {
    /// Waveform shape.
    pub shape: LfoShape,
    /// Free-running rate in Hz; ignored while `sync` is set.
    pub rate_hz: f32,
    /// Modulation depth (0-1).
    pub depth: f32,
    /// Tempo sync division; `None` means free-running.
    pub sync: Option<SyncDivision>,
}

impl Default for LfoParams {
    fn default() -> Self {
        Self {
            shape: LfoShape::Sine,
            rate_hz: 2.0,
            depth: 1.0,
            sync: None,
        }
    }
}

/// Amplitude envelope parameters. Times are seconds.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeParams {
    /// When false the voice ramps straight to a fixed always-on level.
    pub enabled: bool,
    /// Attack time.
    pub attack_s: f32,
    /// Decay time.
    pub decay_s: f32,
    /// Sustain level (0-1).
    pub sustain: f32,
    /// Release time.
    pub release_s: f32,
}

impl Default for EnvelopeParams {
    fn default() -> Self {
        Self {
            enabled: true,
            attack_s: 0.01,
            decay_s: 0.15,
            sustain: 0.8,
            release_s: 0.25,
        }
    }
}

/// Noise mix parameters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NoiseParams {
    /// White-noise level mixed at the voice output (0-1).
    pub level: f32,
}

/// One modulation-matrix slot.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModSlot {
    /// Where the modulation signal comes from.
    pub source: ModSource,
    /// What it drives.
    pub destination: ModDestination,
    /// Bipolar amount in [-1, 1], scaled per destination before applying.
    pub amount: f32,
    /// Whether the slot participates at all.
    pub enabled: bool,
}

impl Default for ModSlot {
    fn default() -> Self {
        Self {
            source: ModSource::Lfo,
            destination: ModDestination::CutoffXy,
            amount: 0.0,
            enabled: false,
        }
    }
}

/// The four-slot modulation matrix.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ModMatrixParams {
    /// Independent routing slots.
    pub slots: [ModSlot; 4],
}

/// Modulation sources.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModSource {
    /// The per-voice LFO (bipolar, scaled by depth).
    Lfo,
    /// The amplitude envelope level (unipolar).
    Envelope,
    /// Note velocity (unipolar).
    Velocity,
    /// The global mod wheel (unipolar).
    ModWheel,
}

/// Modulation destinations.
///
/// Signal destinations are applied continuously at signal rate; numeric
/// destinations (the envelope times) are resolved once per gate edge.
/// `*Xy` variants fan a single routing out to both axes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModDestination {
    /// X-oscillator pitch (cents).
    PitchX,
    /// Y-oscillator pitch (cents).
    PitchY,
    /// Both oscillator pitches (cents).
    PitchXy,
    /// Y-oscillator frequency ratio (cents).
    RatioY,
    /// Stereo phase offset (seconds).
    PhaseOffset,
    /// Wavetable morph position, X axis.
    MorphX,
    /// Wavetable morph position, Y axis.
    MorphY,
    /// X-axis filter cutoff (Hz).
    CutoffX,
    /// Y-axis filter cutoff (Hz).
    CutoffY,
    /// Both filter cutoffs (Hz).
    CutoffXy,
    /// X-axis output level.
    LevelX,
    /// Y-axis output level.
    LevelY,
    /// Both output levels.
    LevelXy,
    /// LFO rate (Hz).
    LfoRate,
    /// LFO depth.
    LfoDepth,
    /// Envelope attack time (seconds) - numeric.
    EnvAttack,
    /// Envelope decay time (seconds) - numeric.
    EnvDecay,
    /// Envelope sustain level - numeric.
    EnvSustain,
    /// Envelope release time (seconds) - numeric.
    EnvRelease,
}

impl ModDestination {
    /// Numeric destinations never hold a live signal connection; they are
    /// recomputed at note-on/note-off.
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            ModDestination::EnvAttack
                | ModDestination::EnvDecay
                | ModDestination::EnvSustain
                | ModDestination::EnvRelease
        )
    }

    /// Fixed per-destination scaling applied to `amount * source`.
    pub fn scale(self) -> f32 {
        match self {
            ModDestination::PitchX
            | ModDestination::PitchY
            | ModDestination::PitchXy
            | ModDestination::RatioY => 1200.0,
            ModDestination::CutoffX | ModDestination::CutoffY | ModDestination::CutoffXy => 5000.0,
            ModDestination::PhaseOffset => 0.01,
            ModDestination::LevelX | ModDestination::LevelY | ModDestination::LevelXy => 1.0,
            ModDestination::LfoRate => 20.0,
            ModDestination::LfoDepth => 1.0,
            ModDestination::MorphX | ModDestination::MorphY => 1.0,
            ModDestination::EnvAttack | ModDestination::EnvDecay | ModDestination::EnvRelease => {
                2.0
            }
            ModDestination::EnvSustain => 0.5,
        }
    }
}

/// The complete per-instrument snapshot a new voice is configured from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InstrumentParams {
    /// Oscillator section.
    pub osc: OscillatorParams,
    /// Filter section.
    pub filter: FilterParams,
    /// Per-voice LFO.
    pub lfo: LfoParams,
    /// Amplitude envelope.
    pub envelope: EnvelopeParams,
    /// Noise mix.
    pub noise: NoiseParams,
    /// Modulation matrix.
    pub mod_matrix: ModMatrixParams,
}
