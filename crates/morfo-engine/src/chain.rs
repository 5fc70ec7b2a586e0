//! The insert chain: order as data, processing as buffer routing.
//!
//! Effect instances live in a fixed id-indexed array and are never
//! reconstructed; the chain's signal flow is nothing but the `order`
//! array. A reorder swaps that array between blocks, so there is no
//! disconnect/reconnect churn and no transient to click.

use morfo_core::AnalysisTap;
use morfo_effects::{InsertId, InsertParams, InsertProcessor, build_insert};
use serde::{Deserialize, Serialize};

/// Where the send buses tap the signal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SendMode {
    /// Tap before the insert chain.
    PreFx,
    /// Tap after the insert chain.
    #[default]
    PostFx,
}

/// Mixer snapshot: chain order plus send routing.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MixerParams {
    /// Processing order of the insert chain. Must contain every id once.
    pub insert_order: [InsertId; 11],
    /// Delay send level (0-1).
    pub delay_send: f32,
    /// Delay return level (0-1).
    pub delay_return: f32,
    /// Reverb send level (0-1).
    pub reverb_send: f32,
    /// Reverb return level (0-1).
    pub reverb_return: f32,
    /// Pre- or post-chain send tap.
    pub send_mode: SendMode,
}

impl Default for MixerParams {
    fn default() -> Self {
        Self {
            insert_order: InsertId::ALL,
            delay_send: 0.0,
            delay_return: 0.8,
            reverb_send: 0.0,
            reverb_return: 0.8,
            send_mode: SendMode::PostFx,
        }
    }
}

/// Check that an order names every insert exactly once.
pub fn order_is_permutation(order: &[InsertId; 11]) -> bool {
    let mut seen = [false; 11];
    for id in order {
        if seen[id.index()] {
            return false;
        }
        seen[id.index()] = true;
    }
    true
}

/// The ordered insert chain.
pub struct InsertChain {
    effects: Vec<Box<dyn InsertProcessor>>,
    order: [InsertId; 11],
}

impl InsertChain {
    /// Build every insert instance at the given sample rate.
    pub fn new(sample_rate: f32) -> Self {
        // Instances are stored id-indexed; order is routing data only
        let mut index_order = InsertId::ALL;
        index_order.sort_unstable_by_key(|id| id.index());
        let effects = index_order
            .iter()
            .map(|&id| build_insert(id, sample_rate))
            .collect();
        Self {
            effects,
            order: InsertId::ALL,
        }
    }

    /// Current processing order.
    pub fn order(&self) -> [InsertId; 11] {
        self.order
    }

    /// Adopt a new order. Invalid permutations are ignored (the control
    /// side validates and logs; this is the last line of defense).
    pub fn set_order(&mut self, order: [InsertId; 11]) {
        if order_is_permutation(&order) {
            self.order = order;
        }
    }

    /// Route a parameter snapshot to its effect.
    pub fn set_params(&mut self, params: &InsertParams) {
        self.effects[params.id().index()].set_params(params);
    }

    /// Enable or bypass one effect.
    pub fn set_enabled(&mut self, id: InsertId, enabled: bool) {
        self.effects[id.index()].set_enabled(enabled);
    }

    /// Whether an effect is enabled.
    pub fn is_enabled(&self, id: InsertId) -> bool {
        self.effects[id.index()].is_enabled()
    }

    /// Attach a wet-output tap to one effect.
    pub fn set_wet_tap(&mut self, id: InsertId, tap: AnalysisTap) {
        self.effects[id.index()].set_wet_tap(tap);
    }

    /// Process the bus through every insert in order.
    pub fn process(&mut self, left: &mut [f32], right: &mut [f32]) {
        for id in self.order {
            self.effects[id.index()].process(left, right);
        }
    }

    /// Update the sample rate of every effect.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        for fx in &mut self.effects {
            fx.set_sample_rate(sample_rate);
        }
    }

    /// Reset every effect's state.
    pub fn reset(&mut self) {
        for fx in &mut self.effects {
            fx.reset();
        }
    }
}
