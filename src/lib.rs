//! # Sampler Controls: Control-Input Engine for a Two-Channel Sampler
//!
//! `sampler_controls` turns the noisy pots, CV jacks and buttons of a
//! Eurorack sampler into stable playback parameters, and resolves the
//! "hold a button, turn a knob" gestures used to browse a 60-bank library
//! without dedicated UI controls.
//!
//! ## Architecture
//!
//! One [`ControlEngine`] runs every stage synchronously, once per ADC timer
//! tick, without allocating:
//!
//! - **Conditioning** - one-pole smoothing for pots, moving-average FIR for
//!   CV, and anti-jitter bracketing for both
//! - **Detents** - ten click-stop positions with anti-hysteresis
//! - **Pitch** - semitone quantizer or tracking-compensated 1V/oct lookup,
//!   scaled by the pitch pot
//! - **Combos** - button + knob gestures with hover and latch states
//! - **Mapper** - final pitch, start, length, volume, bank and sample
//! - **Dispatcher** - edge-triggered calls into the sampler and recorder
//!
//! The audio engine, recorder, sample library and trim editor stay outside
//! the crate, behind the traits in [`host`].
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sampler_controls::prelude::*;
//!
//! let mut engine = ControlEngine::new(EngineConfig::default(), SystemCalibrations::default())?;
//! let mut frame = AdcFrame::at_rest();
//!
//! // Timer interrupt
//! frame.pots[PotChannel::Length(PlayChannel::One)] = adc_reading;
//! engine.tick(&frame, &mut host);
//!
//! // Button handler
//! engine.press(Button::Bank(PlayChannel::One));
//!
//! // Audio callback
//! let params = engine.channel(PlayChannel::One);
//! ```
//!
//! ## Features
//!
//! - `std` (default) - standard library support, implies `alloc`
//! - `alloc` - JSON loading and saving of [`EngineConfig`] and
//!   [`SystemCalibrations`]
//!
//! Without either feature the crate is `no_std` and only needs `libm`.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc;

pub mod buttons;
pub mod channel;
pub mod combo;
pub mod conditioning;
pub mod config;
pub mod detent;
pub mod dispatch;
pub mod engine;
pub mod flags;
pub mod host;
pub mod keyed;
pub mod params;
pub mod pitch;

/// Prelude module for convenient imports
pub mod prelude {
    // Engine
    pub use crate::engine::{ControlEngine, TickMode};

    // Inputs
    pub use crate::buttons::Release;
    pub use crate::channel::{AdcFrame, Button, CvChannel, PlayChannel, PotChannel};

    // Configuration
    pub use crate::config::{ConfigError, EngineConfig, SystemCalibrations};

    // Outputs
    pub use crate::combo::{ComboKey, ComboSnapshot, ComboState};
    pub use crate::flags::{Feedback, FeedbackTable, Trigger, TriggerTable};
    pub use crate::params::{ChannelParams, GlobalModes, PlaybackParams, RecParams};

    // Collaborators
    pub use crate::host::{Host, PlayState, Recorder, SampleLibrary, SamplerEngine, TrimEditor};
}

// Re-export key types at crate root for convenience
pub use prelude::*;
