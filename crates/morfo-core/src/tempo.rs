//! Musical division strings and their BPM math.
//!
//! Tempo-synced modules (LFO rate, delay time) describe their period as a
//! division of a whole note: `"1/4"` is a quarter note, `"3/8"` three eighth
//! notes. A trailing `T` makes it a triplet (2/3 of the straight duration),
//! a trailing `D` or `.` makes it dotted (1.5x).

use core::fmt;
use core::str::FromStr;

/// Straight, triplet, or dotted variant of a division.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DivisionModifier {
    /// Straight timing.
    #[default]
    Straight,
    /// Triplet: two-thirds of the straight duration.
    Triplet,
    /// Dotted: one and a half times the straight duration.
    Dotted,
}

impl DivisionModifier {
    /// Duration multiplier relative to straight timing.
    pub fn multiplier(self) -> f32 {
        match self {
            DivisionModifier::Straight => 1.0,
            DivisionModifier::Triplet => 2.0 / 3.0,
            DivisionModifier::Dotted => 1.5,
        }
    }
}

/// A musical division: `numerator` counts of a `1/denominator` note.
///
/// # Example
///
/// ```rust
/// use morfo_core::SyncDivision;
///
/// // At 120 BPM a quarter note lasts 0.5 s, so the synced rate is 2 Hz.
/// let div: SyncDivision = "1/4".parse().unwrap();
/// assert!((div.to_hz(120.0) - 2.0).abs() < 1e-4);
///
/// // Eighth-note triplets are 1.5x faster than straight eighths.
/// let trip: SyncDivision = "1/8T".parse().unwrap();
/// assert!((trip.to_hz(120.0) - 6.0).abs() < 1e-4);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SyncDivision {
    /// How many notes.
    pub numerator: u32,
    /// Note value as a fraction of a whole note.
    pub denominator: u32,
    /// Straight/triplet/dotted.
    pub modifier: DivisionModifier,
}

impl Default for SyncDivision {
    fn default() -> Self {
        Self {
            numerator: 1,
            denominator: 4,
            modifier: DivisionModifier::Straight,
        }
    }
}

impl SyncDivision {
    /// Duration of this division in seconds at the given tempo.
    pub fn seconds(&self, bpm: f32) -> f32 {
        let bpm = bpm.max(1.0);
        let beat = 60.0 / bpm;
        beat * (4.0 / self.denominator.max(1) as f32)
            * self.numerator.max(1) as f32
            * self.modifier.multiplier()
    }

    /// Rate in Hz of one cycle per division at the given tempo.
    pub fn to_hz(&self, bpm: f32) -> f32 {
        1.0 / self.seconds(bpm)
    }
}

/// Error from parsing a division string.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DivisionParseError;

impl fmt::Display for DivisionParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "expected a division like \"1/4\", \"3/8T\" or \"1/2D\"")
    }
}

#[cfg(feature = "std")]
impl std::error::Error for DivisionParseError {}

impl FromStr for SyncDivision {
    type Err = DivisionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (body, modifier) = match s.as_bytes().last() {
            Some(b'T' | b't') => (&s[..s.len() - 1], DivisionModifier::Triplet),
            Some(b'D' | b'd' | b'.') => (&s[..s.len() - 1], DivisionModifier::Dotted),
            _ => (s, DivisionModifier::Straight),
        };

        let (num, den) = body.split_once('/').ok_or(DivisionParseError)?;
        let numerator: u32 = num.trim().parse().map_err(|_| DivisionParseError)?;
        let denominator: u32 = den.trim().parse().map_err(|_| DivisionParseError)?;
        if numerator == 0 || denominator == 0 {
            return Err(DivisionParseError);
        }

        Ok(Self {
            numerator,
            denominator,
            modifier,
        })
    }
}
