//! Morfo Core - DSP primitives for the morfo synthesizer engine
//!
//! Foundation types shared by the synthesis, effects, and engine crates.
//! Everything here is real-time safe: no allocation, no locking, no
//! panicking paths in the per-sample code.
//!
//! # What lives here
//!
//! ## Parameter scheduling
//!
//! Control values never jump. Every value the render thread consumes goes
//! through one of two smoothers:
//!
//! - [`Ramp`] - linear, constant-rate transitions with an explicit duration
//! - [`Smoothed`] - one-pole exponential smoothing for RC-style response
//!
//! ## Modulation and timing
//!
//! - [`Lfo`] - low-frequency oscillator with curve-backed random shapes and
//!   an analytic [`Lfo::value_at`] for control-rate consumers
//! - [`SyncDivision`] - musical division strings (`"1/4"`, `"3/8T"`, `"1/2D"`)
//!   and their BPM math
//!
//! ## Filters and delay
//!
//! - [`Svf`] - Chamberlin state-variable filter, stable under modulation
//! - [`Biquad`] - RBJ cookbook biquad with shelf/peaking coefficients
//! - [`DelayLine`] - fractional-read delay line for modulation effects
//!
//! ## Routing plumbing
//!
//! - [`DryWet`] - the shared enable/bypass crossfade every insert effect embeds
//! - [`AnalysisTap`] - lock-free sample ring + peak meter, written by the
//!   render thread and read by the control thread
//!
//! # no_std
//!
//! The crate is `no_std` compatible (`default-features = false`); `libm`
//! supplies the math. [`AnalysisTap`] needs `alloc` for its ring storage.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod drywet;
pub mod filter;
pub mod lfo;
pub mod math;
pub mod param;
pub mod tap;
pub mod tempo;

pub use drywet::{DryWet, ENABLE_RAMP_SECS};
pub use filter::{Biquad, DelayLine, Svf};
pub use lfo::{Lfo, LfoShape};
pub use math::{C4_HZ, cents_to_ratio, db_to_linear, keytracked_cutoff, linear_to_db, midi_to_freq};
pub use param::{Ramp, Smoothed};
pub use tap::AnalysisTap;
pub use tempo::{DivisionModifier, DivisionParseError, SyncDivision};
