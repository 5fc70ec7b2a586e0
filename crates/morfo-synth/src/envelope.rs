//! Linear-segment amplitude envelope.
//!
//! Attack ramps 0 → 1, decay ramps 1 → sustain, sustain holds until the
//! gate drops, release ramps to 0. Segments are linear so the level is
//! exactly monotone within each stage. Times are resolved (including
//! modulation contributions) at the gate edges, not continuously.

/// Envelope stage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EnvStage {
    /// No output; the voice is silent.
    #[default]
    Idle,
    /// Rising toward peak.
    Attack,
    /// Falling toward the sustain level.
    Decay,
    /// Holding the sustain level.
    Sustain,
    /// Falling toward zero after the gate dropped.
    Release,
}

/// Smallest accepted segment time: modulation can never push a time to zero
/// or negative.
pub const MIN_SEGMENT_SECS: f32 = 0.001;

/// Linear ADSR envelope.
#[derive(Debug, Clone)]
pub struct Envelope {
    stage: EnvStage,
    level: f32,
    step: f32,
    sustain: f32,
    /// Decay time captured at gate-on, consumed when the attack peaks.
    decay_secs: f32,
    sample_rate: f32,
}

impl Envelope {
    /// Create an idle envelope.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            stage: EnvStage::Idle,
            level: 0.0,
            step: 0.0,
            sustain: 0.0,
            decay_secs: MIN_SEGMENT_SECS,
            sample_rate,
        }
    }

    /// Start the attack with the given effective times. Attack runs from
    /// the current level, so a voice re-gated mid-release does not snap.
    pub fn gate_on(&mut self, attack_s: f32, decay_s: f32, sustain: f32) {
        self.sustain = sustain.clamp(0.0, 1.0);
        self.stage = EnvStage::Attack;
        let samples = (attack_s.max(MIN_SEGMENT_SECS) * self.sample_rate).max(1.0);
        self.step = (1.0 - self.level) / samples;
        self.decay_secs = decay_s.max(MIN_SEGMENT_SECS);
    }

    /// Always-on mode: head straight for a fixed level and sustain there.
    pub fn gate_on_fixed(&mut self, level: f32) {
        self.sustain = level.clamp(0.0, 1.0);
        self.stage = EnvStage::Attack;
        let samples = (0.005 * self.sample_rate).max(1.0);
        self.step = (self.sustain.max(self.level) - self.level).max(0.0) / samples + 1e-9;
        self.decay_secs = MIN_SEGMENT_SECS;
    }

    /// Begin the release with the given effective release time.
    pub fn gate_off(&mut self, release_s: f32) {
        if self.stage == EnvStage::Idle {
            return;
        }
        self.stage = EnvStage::Release;
        let samples = (release_s.max(MIN_SEGMENT_SECS) * self.sample_rate).max(1.0);
        self.step = self.level / samples;
    }

    /// Drop straight to idle.
    pub fn reset(&mut self) {
        self.stage = EnvStage::Idle;
        self.level = 0.0;
        self.step = 0.0;
    }

    /// Update the sample rate. In-flight segments keep their per-sample step.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
    }

    /// Current stage.
    pub fn stage(&self) -> EnvStage {
        self.stage
    }

    /// Current level without advancing.
    pub fn level(&self) -> f32 {
        self.level
    }

    /// True while the envelope produces (or will produce) output.
    pub fn is_active(&self) -> bool {
        self.stage != EnvStage::Idle
    }

    /// Advance one sample and return the level.
    #[inline]
    pub fn advance(&mut self) -> f32 {
        match self.stage {
            EnvStage::Idle => {
                self.level = 0.0;
            }
            EnvStage::Attack => {
                self.level += self.step;
                if self.level >= 1.0 {
                    self.level = 1.0;
                    self.stage = EnvStage::Decay;
                    let samples = (self.decay_secs * self.sample_rate).max(1.0);
                    self.step = (1.0 - self.sustain) / samples;
                }
            }
            EnvStage::Decay => {
                self.level -= self.step;
                if self.level <= self.sustain {
                    self.level = self.sustain;
                    self.stage = EnvStage::Sustain;
                }
            }
            EnvStage::Sustain => {
                self.level = self.sustain;
            }
            EnvStage::Release => {
                self.level -= self.step;
                if self.level <= 0.0 {
                    self.level = 0.0;
                    self.stage = EnvStage::Idle;
                }
            }
        }
        self.level
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env() -> Envelope {
        Envelope::new(48000.0)
    }

    #[test]
    fn idle_outputs_zero() {
        let mut e = env();
        for _ in 0..100 {
            assert_eq!(e.advance(), 0.0);
        }
    }

    #[test]
    fn attack_decay_sustain_shape() {
        let mut e = env();
        e.gate_on(0.05, 0.1, 0.7);

        // Non-decreasing through the attack
        let attack_samples = (0.05 * 48000.0) as usize;
        let mut prev = 0.0;
        for _ in 0..attack_samples {
            let v = e.advance();
            assert!(v >= prev - 1e-6, "attack must not fall: {prev} -> {v}");
            prev = v;
        }
        assert!((prev - 1.0).abs() < 0.01, "attack should peak near 1, got {prev}");

        // Non-increasing through the decay
        let decay_samples = (0.1 * 48000.0) as usize;
        for _ in 0..decay_samples {
            let v = e.advance();
            assert!(v <= prev + 1e-6, "decay must not rise: {prev} -> {v}");
            prev = v;
        }

        // Constant at sustain afterwards
        for _ in 0..1000 {
            let v = e.advance();
            assert!((v - 0.7).abs() < 1e-4, "sustain should hold, got {v}");
        }
    }

    #[test]
    fn release_reaches_idle() {
        let mut e = env();
        e.gate_on(0.001, 0.001, 0.5);
        for _ in 0..1000 {
            e.advance();
        }
        e.gate_off(0.05);
        assert_eq!(e.stage(), EnvStage::Release);
        for _ in 0..(0.05 * 48000.0) as usize + 10 {
            e.advance();
        }
        assert_eq!(e.stage(), EnvStage::Idle);
        assert_eq!(e.level(), 0.0);
    }

    #[test]
    fn fixed_mode_holds_level() {
        let mut e = env();
        e.gate_on_fixed(1.0);
        for _ in 0..2000 {
            e.advance();
        }
        assert!((e.level() - 1.0).abs() < 1e-3);
        assert_eq!(e.stage(), EnvStage::Sustain);
    }

    #[test]
    fn gate_off_when_idle_is_a_no_op() {
        let mut e = env();
        e.gate_off(0.5);
        assert_eq!(e.stage(), EnvStage::Idle);
    }

    #[test]
    fn times_are_floored() {
        let mut e = env();
        // Zero/negative times must not divide by zero
        e.gate_on(0.0, -1.0, 0.5);
        for _ in 0..100 {
            assert!(e.advance().is_finite());
        }
    }

    #[test]
    fn stages_progress_linearly() {
        let mut e = env();
        e.gate_on(0.01, 0.01, 0.6);
        let mut seen = [false; 4];
        for _ in 0..48000 {
            e.advance();
            match e.stage() {
                EnvStage::Attack => seen[0] = true,
                EnvStage::Decay => seen[1] = true,
                EnvStage::Sustain => seen[2] = true,
                _ => {}
            }
        }
        e.gate_off(0.01);
        for _ in 0..48000 {
            e.advance();
            if e.stage() == EnvStage::Release {
                seen[3] = true;
            }
        }
        assert_eq!(seen, [true; 4]);
        assert_eq!(e.stage(), EnvStage::Idle);
    }
}
