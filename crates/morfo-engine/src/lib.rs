//! Morfo Engine - the top of the stack
//!
//! An interactive polyphonic wavetable synthesizer engine: note events and
//! parameter snapshots in, stereo audio and notifications out.
//!
//! # Architecture
//!
//! Two halves, one SPSC ring apart:
//!
//! - [`Engine`] lives on the control thread. It owns the parameter
//!   snapshots, the wavetable library, the insert-order data, the analysis
//!   taps and meters, and (after [`Engine::init`]) the cpal output stream.
//! - [`RenderCore`] lives inside the audio callback. It owns the voice
//!   bank, the insert chain, the send buses, and the master section, and is
//!   the only code that touches audio. Commands reach it through a bounded
//!   lock-free ring; wavetables through an atomic pointer swap; events come
//!   back through a second ring drained by [`Engine::poll_events`].
//!
//! # Example
//!
//! ```rust,no_run
//! use morfo_engine::{Engine, EngineConfig};
//! use morfo_synth::InstrumentParams;
//!
//! let mut engine = Engine::new(EngineConfig::default(), InstrumentParams::default());
//! engine.init().expect("audio device");
//!
//! engine.play_note("C4", 261.63, 0.9, 0.0);
//! // ... later
//! engine.stop_note("C4");
//! engine.dispose();
//! ```
//!
//! For offline rendering and tests, [`Engine::init_offline`] returns the
//! [`RenderCore`] for manual block pumping instead of opening a device.

pub mod chain;
pub mod config;
pub mod engine;
pub mod error;
pub mod message;
pub mod registry;
pub mod render;
pub mod stream;
pub mod taps;

pub use chain::{InsertChain, MixerParams, SendMode};
pub use config::EngineConfig;
pub use engine::{BUILTIN_TABLE, Engine};
pub use error::{EngineError, Result};
pub use message::{Command, EngineEvent};
pub use registry::{EffectCategory, InsertInfo, insert_effects};
pub use render::{MAX_BLOCK, RenderCore};
pub use taps::{TapPoint, TapSet};
