//! Morfo Synth - the synthesis half of the morfo engine
//!
//! Everything between a note event and the voice bus lives here:
//!
//! - [`Oscillator`] - PolyBLEP analytic oscillator (sine/triangle/saw/
//!   square/pulse)
//! - [`Wavetable`] / [`WavetableOscillator`] - morphing wavetable playback
//!   with bilinear frame interpolation
//! - [`Envelope`] - linear-segment ADSR with an always-on mode
//! - [`ModRouter`] - the per-voice four-slot modulation matrix, split into
//!   continuous signal routings and gate-edge numeric resolution
//! - [`Voice`] / [`VoiceBank`] - per-note synthesis and polyphonic
//!   allocation with oldest-note stealing and headroom scaling
//! - Parameter snapshots ([`InstrumentParams`] and friends) - plain `Copy`
//!   data with serde derives, replaced whole on every update
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use morfo_synth::{InstrumentParams, NoteId, VoiceBank, Wavetable};
//!
//! let table = Arc::new(Wavetable::analytic("builtin"));
//! let mut bank = VoiceBank::new(48000.0, InstrumentParams::default(), table);
//!
//! bank.note_on(NoteId::new("C4"), 261.63, 1.0, 0.0);
//!
//! let mut left = [0.0f32; 256];
//! let mut right = [0.0f32; 256];
//! bank.render(&mut left, &mut right);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod envelope;
pub mod mod_router;
pub mod note;
pub mod oscillator;
pub mod params;
pub mod voice;
pub mod wavetable;
pub mod wavetable_osc;

pub use envelope::{EnvStage, Envelope, MIN_SEGMENT_SECS};
pub use mod_router::{ModRouter, ModSourceValues, SignalOffsets};
pub use note::NoteId;
pub use oscillator::Oscillator;
pub use params::{
    EnvelopeParams, FilterParams, InstrumentParams, LfoParams, ModDestination, ModMatrixParams,
    ModSlot, ModSource, NoiseParams, OscillatorParams, Waveform,
};
pub use voice::{
    DISPOSAL_MARGIN_SECS, FORCED_RELEASE_SECS, HARD_POLYPHONY, MAX_UNISON, NoteOutcome, Voice,
    VoiceBank,
};
pub use wavetable::{FRAME_LEN, Wavetable};
pub use wavetable_osc::WavetableOscillator;
