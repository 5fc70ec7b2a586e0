//! Engine configuration.

use serde::{Deserialize, Serialize};

/// Static engine configuration, fixed at `init`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Preferred device buffer size in frames.
    pub buffer_size: u32,
    /// Output device substring match; `None` uses the default device.
    pub device_name: Option<String>,
    /// Initial tempo for synced modules.
    pub bpm: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            buffer_size: 256,
            device_name: None,
            bpm: 120.0,
        }
    }
}
