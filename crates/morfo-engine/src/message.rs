//! Typed traffic between the control and render threads.
//!
//! [`Command`] flows control → render over a bounded SPSC ring; every
//! payload is `Copy`, so pushing never allocates and dropping a drained
//! command frees nothing. [`EngineEvent`] flows render → control the same
//! way and is drained by [`crate::Engine::poll_events`].

use crate::chain::MixerParams;
use morfo_effects::{DelayParams, InsertId, InsertParams, ReverbParams};
use morfo_synth::{
    EnvelopeParams, FilterParams, LfoParams, ModMatrixParams, NoiseParams, NoteId,
    OscillatorParams,
};

/// Control-thread commands applied by the render core between blocks.
#[derive(Clone, Copy, Debug)]
pub enum Command {
    /// Trigger a note.
    NoteOn {
        /// Unique key among concurrently sounding notes.
        id: NoteId,
        /// Base frequency in Hz.
        freq: f32,
        /// Velocity (0-1).
        velocity: f32,
        /// Mod wheel value at trigger time (0-1).
        mod_wheel: f32,
    },
    /// Release a note naturally.
    NoteOff(NoteId),
    /// Force-release everything (dispose fade).
    AllNotesOff,
    /// Replace the oscillator snapshot.
    Oscillator(OscillatorParams),
    /// Replace the filter snapshot.
    Filter(FilterParams),
    /// Replace the LFO snapshot.
    Lfo(LfoParams),
    /// Replace the envelope snapshot.
    Envelope(EnvelopeParams),
    /// Replace the noise snapshot.
    Noise(NoiseParams),
    /// Replace the modulation matrix.
    ModMatrix(ModMatrixParams),
    /// Replace the mixer snapshot (insert order, sends).
    Mixer(MixerParams),
    /// Replace one insert effect's tone parameters.
    Insert(InsertParams),
    /// Enable or bypass one insert effect.
    InsertEnabled(InsertId, bool),
    /// Replace the delay send parameters.
    Delay(DelayParams),
    /// Replace the reverb send parameters.
    Reverb(ReverbParams),
    /// New user polyphony ceiling.
    MaxPolyphony(usize),
    /// New global tempo.
    Bpm(f32),
    /// New global mod wheel value.
    ModWheel(f32),
    /// Master volume trim in dB.
    MasterTrimDb(f32),
    /// Engage or bypass the master limiter.
    LimiterEnabled(bool),
    /// Master limiter threshold in dB.
    LimiterThresholdDb(f32),
}

/// Render-thread notifications for the GUI/host collaborator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineEvent {
    /// The live voice count changed.
    VoiceCount(usize),
    /// A voice was stolen to make room for a new note.
    VoiceStolen(NoteId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_are_copy_and_send() {
        fn check<T: Copy + Send + 'static>() {}
        check::<Command>();
        check::<EngineEvent>();
    }
}
