//! Named analysis points across the signal chain.

use morfo_core::AnalysisTap;
use morfo_effects::InsertId;

/// Every analysis point the engine exposes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TapPoint {
    /// Voice bus, before the insert chain.
    PreInsert,
    /// Delay send input.
    DelaySendIn,
    /// Reverb send input.
    ReverbSendIn,
    /// Master bus before the limiter.
    MasterPre,
    /// Master bus after the limiter.
    MasterPost,
    /// One insert effect's wet output.
    InsertWet(InsertId),
}

/// The full tap set; cloned between the engine and the render core (clones
/// share buffers).
#[derive(Clone, Debug)]
pub struct TapSet {
    pub(crate) pre_insert: AnalysisTap,
    pub(crate) delay_send_in: AnalysisTap,
    pub(crate) reverb_send_in: AnalysisTap,
    pub(crate) master_pre: AnalysisTap,
    pub(crate) master_post: AnalysisTap,
    pub(crate) insert_wet: [AnalysisTap; 11],
}

impl Default for TapSet {
    fn default() -> Self {
        Self::new()
    }
}

impl TapSet {
    /// Create a fresh tap set.
    pub fn new() -> Self {
        Self {
            pre_insert: AnalysisTap::default(),
            delay_send_in: AnalysisTap::default(),
            reverb_send_in: AnalysisTap::default(),
            master_pre: AnalysisTap::default(),
            master_post: AnalysisTap::default(),
            insert_wet: core::array::from_fn(|_| AnalysisTap::default()),
        }
    }

    /// Look up one tap.
    pub fn tap(&self, point: TapPoint) -> &AnalysisTap {
        match point {
            TapPoint::PreInsert => &self.pre_insert,
            TapPoint::DelaySendIn => &self.delay_send_in,
            TapPoint::ReverbSendIn => &self.reverb_send_in,
            TapPoint::MasterPre => &self.master_pre,
            TapPoint::MasterPost => &self.master_post,
            TapPoint::InsertWet(id) => &self.insert_wet[id.index()],
        }
    }

    /// Iterate over every tap.
    pub fn iter(&self) -> impl Iterator<Item = &AnalysisTap> {
        [
            &self.pre_insert,
            &self.delay_send_in,
            &self.reverb_send_in,
            &self.master_pre,
            &self.master_post,
        ]
        .into_iter()
        .chain(self.insert_wet.iter())
    }

    /// True if any tap recorded a sample above `threshold` in magnitude.
    pub fn any_exceeds(&self, threshold: f32) -> bool {
        self.iter().any(|tap| tap.exceeds(threshold))
    }
}
