//! Morfo Effects - the insert family, send buses, and master limiter
//!
//! Insert effects are a uniform family behind [`InsertProcessor`]: stereo
//! block processing, tagged [`InsertParams`] snapshots, and a shared
//! dry/wet enable crossfade (see `morfo_core::DryWet`). Their tone DSP is
//! deliberately compact; the contract is the interface, not the flavor.
//!
//! - [`Distortion`], [`Bitcrusher`], [`Chorus`], [`Flanger`], [`Phaser`],
//!   [`Tremolo`], [`RingMod`], [`Compressor`], [`Eq`], [`Wah`], [`Widener`]
//!
//! Send buses are wet-only processors fed by the engine's pre/post-chain
//! tap: [`SendDelay`] (tempo sync, ping-pong) and [`SendReverb`]
//! (Schroeder tank). [`MasterLimiter`] caps the master bus and publishes
//! its gain reduction through an atomic meter.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod bitcrusher;
pub mod chorus;
pub mod compressor;
pub mod distortion;
pub mod eq;
pub mod flanger;
pub mod insert;
pub mod limiter;
pub mod phaser;
pub mod ring_mod;
pub mod send_delay;
pub mod send_reverb;
pub mod tremolo;
pub mod wah;
pub mod widener;

pub use bitcrusher::{Bitcrusher, BitcrusherParams};
pub use chorus::{Chorus, ChorusParams};
pub use compressor::{Compressor, CompressorParams};
pub use distortion::{Distortion, DistortionParams};
pub use eq::{Eq, EqParams};
pub use flanger::{Flanger, FlangerParams};
pub use insert::{InsertId, InsertParams, InsertProcessor};
pub use limiter::MasterLimiter;
pub use phaser::{Phaser, PhaserParams};
pub use ring_mod::{RingMod, RingModParams};
pub use send_delay::{DelayParams, DelayTime, SendDelay};
pub use send_reverb::{ReverbParams, SendReverb};
pub use tremolo::{Tremolo, TremoloParams};
pub use wah::{Wah, WahParams};
pub use widener::{Widener, WidenerParams};

use alloc::boxed::Box;

/// Construct an insert effect by id.
pub fn build_insert(id: InsertId, sample_rate: f32) -> Box<dyn InsertProcessor> {
    match id {
        InsertId::Distortion => Box::new(Distortion::new(sample_rate)),
        InsertId::Bitcrusher => Box::new(Bitcrusher::new(sample_rate)),
        InsertId::Chorus => Box::new(Chorus::new(sample_rate)),
        InsertId::Flanger => Box::new(Flanger::new(sample_rate)),
        InsertId::Phaser => Box::new(Phaser::new(sample_rate)),
        InsertId::Tremolo => Box::new(Tremolo::new(sample_rate)),
        InsertId::RingMod => Box::new(RingMod::new(sample_rate)),
        InsertId::Compressor => Box::new(Compressor::new(sample_rate)),
        InsertId::Eq => Box::new(Eq::new(sample_rate)),
        InsertId::Wah => Box::new(Wah::new(sample_rate)),
        InsertId::Widener => Box::new(Widener::new(sample_rate)),
    }
}
