//! Collaborator Interfaces
//!
//! The engine never touches audio buffers, storage or the display. Everything
//! it needs from the rest of the firmware goes through these traits, which
//! the main loop implements on whatever owns that state.

use crate::channel::{PlayChannel, NUM_BANKS};
use serde::{Deserialize, Serialize};

/// Playback state reported by the sampler engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlayState {
    #[default]
    Silent,
    Prebuffering,
    Playing,
    FadingDown,
}

/// The two-channel playback engine
pub trait SamplerEngine {
    fn start_playing(&mut self, chan: PlayChannel);
    fn toggle_playing(&mut self, chan: PlayChannel);
    fn toggle_reverse(&mut self, chan: PlayChannel);
    fn play_state(&self, chan: PlayChannel) -> PlayState;
}

/// The WAV recorder
pub trait Recorder {
    fn toggle_recording(&mut self);
    fn stop_recording(&mut self);
    fn set_recording_enabled(&mut self, enabled: bool);
}

/// Read-only view of the bank/sample library
pub trait SampleLibrary {
    /// Whether `bank` holds at least one sample
    fn is_bank_enabled(&self, bank: u8) -> bool;

    /// Whether `slot` of `bank` has a sample assigned
    fn has_sample(&self, bank: u8, slot: u8) -> bool;

    /// Ones digit of a bank number, shown as the button colour
    fn bank_color_digit(&self, bank: u8) -> u8 {
        bank % 10
    }

    /// Tens digit of a bank number, shown as a blink count
    fn bank_blink_digit(&self, bank: u8) -> u8 {
        bank / 10
    }
}

/// Sample trimming, only used while edit mode is on
pub trait TrimEditor {
    fn nudge_trim_size(&mut self, bank: u8, slot: u8, delta: i32);
    fn nudge_trim_start(&mut self, bank: u8, slot: u8, delta: i32);
    fn set_sample_gain(&mut self, bank: u8, slot: u8, gain: f32);
}

/// Everything the engine calls out to during a tick
pub trait Host: SamplerEngine + Recorder + SampleLibrary + TrimEditor {}

impl<T: SamplerEngine + Recorder + SampleLibrary + TrimEditor> Host for T {}

/// Whether `bank` is in range and enabled in the library
pub(crate) fn bank_usable(library: &impl SampleLibrary, bank: u8) -> bool {
    bank < NUM_BANKS && library.is_bank_enabled(bank)
}
