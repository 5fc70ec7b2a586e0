//! Insert-effect metadata for hosts and UIs.

use morfo_effects::InsertId;

/// Category of an insert effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EffectCategory {
    /// Compressors and level processors.
    Dynamics,
    /// Distortion, saturation, degradation.
    Distortion,
    /// Chorus, flanger, phaser, tremolo, ring mod.
    Modulation,
    /// EQ and swept filters.
    Filter,
    /// Stereo field tools.
    Utility,
}

impl EffectCategory {
    /// Human-readable category name.
    pub const fn name(&self) -> &'static str {
        match self {
            EffectCategory::Dynamics => "Dynamics",
            EffectCategory::Distortion => "Distortion",
            EffectCategory::Modulation => "Modulation",
            EffectCategory::Filter => "Filter",
            EffectCategory::Utility => "Utility",
        }
    }
}

/// Metadata for one insert effect.
#[derive(Clone, Copy, Debug)]
pub struct InsertInfo {
    /// The effect's id.
    pub id: InsertId,
    /// Display name.
    pub name: &'static str,
    /// Category for grouping.
    pub category: EffectCategory,
}

/// Metadata for the whole insert family.
pub fn insert_effects() -> [InsertInfo; 11] {
    InsertId::ALL.map(|id| InsertInfo {
        id,
        name: id.label(),
        category: category_of(id),
    })
}

fn category_of(id: InsertId) -> EffectCategory {
    match id {
        InsertId::Compressor => EffectCategory::Dynamics,
        InsertId::Distortion | InsertId::Bitcrusher => EffectCategory::Distortion,
        InsertId::Chorus
        | InsertId::Flanger
        | InsertId::Phaser
        | InsertId::Tremolo
        | InsertId::RingMod => EffectCategory::Modulation,
        InsertId::Eq | InsertId::Wah => EffectCategory::Filter,
        InsertId::Widener => EffectCategory::Utility,
    }
}
