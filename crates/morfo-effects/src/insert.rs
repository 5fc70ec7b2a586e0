//! The uniform insert-processor interface.
//!
//! Every insert effect is the same shape from the outside: a stereo block
//! processor with a dry/wet enable crossfade, a tagged parameter variant,
//! and an optional wet-output analysis tap. The chain never needs to know
//! which effect it is talking to, and the GUI can treat the whole family as
//! one list of ids.

use crate::bitcrusher::BitcrusherParams;
use crate::chorus::ChorusParams;
use crate::compressor::CompressorParams;
use crate::distortion::DistortionParams;
use crate::eq::EqParams;
use crate::flanger::FlangerParams;
use crate::phaser::PhaserParams;
use crate::ring_mod::RingModParams;
use crate::tremolo::TremoloParams;
use crate::wah::WahParams;
use crate::widener::WidenerParams;
use morfo_core::AnalysisTap;
use serde::{Deserialize, Serialize};

/// Identifier of one insert effect instance.
///
/// The set is fixed; ordering in the chain is data
/// (`MixerParams::insert_order`), not identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InsertId {
    /// Waveshaping distortion.
    Distortion,
    /// Bit-depth and sample-rate reduction.
    Bitcrusher,
    /// Dual-tap modulated chorus.
    Chorus,
    /// Short modulated delay with feedback.
    Flanger,
    /// Four-stage allpass phaser.
    Phaser,
    /// Amplitude modulation with stereo phase spread.
    Tremolo,
    /// Carrier multiplication.
    RingMod,
    /// Feedback compressor with makeup gain.
    Compressor,
    /// Three-band shelving/peaking EQ.
    Eq,
    /// LFO-swept bandpass wah.
    Wah,
    /// Mid/side stereo width control.
    Widener,
}

impl InsertId {
    /// All insert ids in their default chain order.
    pub const ALL: [InsertId; 11] = [
        InsertId::Distortion,
        InsertId::Bitcrusher,
        InsertId::Compressor,
        InsertId::Eq,
        InsertId::Wah,
        InsertId::RingMod,
        InsertId::Phaser,
        InsertId::Flanger,
        InsertId::Chorus,
        InsertId::Tremolo,
        InsertId::Widener,
    ];

    /// Stable dense index, for id-keyed arrays.
    pub fn index(self) -> usize {
        match self {
            InsertId::Distortion => 0,
            InsertId::Bitcrusher => 1,
            InsertId::Chorus => 2,
            InsertId::Flanger => 3,
            InsertId::Phaser => 4,
            InsertId::Tremolo => 5,
            InsertId::RingMod => 6,
            InsertId::Compressor => 7,
            InsertId::Eq => 8,
            InsertId::Wah => 9,
            InsertId::Widener => 10,
        }
    }

    /// Display name for UIs.
    pub fn label(self) -> &'static str {
        match self {
            InsertId::Distortion => "Distortion",
            InsertId::Bitcrusher => "Bitcrusher",
            InsertId::Chorus => "Chorus",
            InsertId::Flanger => "Flanger",
            InsertId::Phaser => "Phaser",
            InsertId::Tremolo => "Tremolo",
            InsertId::RingMod => "Ring Mod",
            InsertId::Compressor => "Compressor",
            InsertId::Eq => "EQ",
            InsertId::Wah => "Wah",
            InsertId::Widener => "Widener",
        }
    }
}

/// Tagged parameter snapshot for any insert effect.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum InsertParams {
    /// Distortion parameters.
    Distortion(DistortionParams),
    /// Bitcrusher parameters.
    Bitcrusher(BitcrusherParams),
    /// Chorus parameters.
    Chorus(ChorusParams),
    /// Flanger parameters.
    Flanger(FlangerParams),
    /// Phaser parameters.
    Phaser(PhaserParams),
    /// Tremolo parameters.
    Tremolo(TremoloParams),
    /// Ring modulator parameters.
    RingMod(RingModParams),
    /// Compressor parameters.
    Compressor(CompressorParams),
    /// EQ parameters.
    Eq(EqParams),
    /// Wah parameters.
    Wah(WahParams),
    /// Widener parameters.
    Widener(WidenerParams),
}

impl InsertParams {
    /// Which insert these parameters belong to.
    pub fn id(&self) -> InsertId {
        match self {
            InsertParams::Distortion(_) => InsertId::Distortion,
            InsertParams::Bitcrusher(_) => InsertId::Bitcrusher,
            InsertParams::Chorus(_) => InsertId::Chorus,
            InsertParams::Flanger(_) => InsertId::Flanger,
            InsertParams::Phaser(_) => InsertId::Phaser,
            InsertParams::Tremolo(_) => InsertId::Tremolo,
            InsertParams::RingMod(_) => InsertId::RingMod,
            InsertParams::Compressor(_) => InsertId::Compressor,
            InsertParams::Eq(_) => InsertId::Eq,
            InsertParams::Wah(_) => InsertId::Wah,
            InsertParams::Widener(_) => InsertId::Widener,
        }
    }
}

/// The uniform insert-effect interface.
///
/// Implementations embed a [`morfo_core::DryWet`] stage; `set_enabled`
/// crossfades rather than switching, and the effect's own parameters are
/// independent of that crossfade. Parameter snapshots for a different
/// effect are ignored.
pub trait InsertProcessor: Send {
    /// Which insert this is.
    fn id(&self) -> InsertId;

    /// Replace the parameter snapshot (mismatched variants are ignored).
    fn set_params(&mut self, params: &InsertParams);

    /// Ramp toward enabled (wet) or bypassed (dry).
    fn set_enabled(&mut self, enabled: bool);

    /// Whether the effect is (heading toward) enabled.
    fn is_enabled(&self) -> bool;

    /// Attach a tap recording the wet signal before the dry/wet mix.
    fn set_wet_tap(&mut self, tap: AnalysisTap);

    /// Process a stereo block in place.
    fn process(&mut self, left: &mut [f32], right: &mut [f32]);

    /// Update the sample rate.
    fn set_sample_rate(&mut self, sample_rate: f32);

    /// Clear internal state (delay lines, filters) without changing
    /// parameters. Safe to call repeatedly.
    fn reset(&mut self);
}
