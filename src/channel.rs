//! Physical Inputs and Channels
//!
//! Names for every pot, CV jack, button and playback channel on the panel,
//! plus the ADC range constants shared by the conditioning stages.

use crate::keyed::{Key, KeyedArray};
use serde::{Deserialize, Serialize};

/// Largest value a 12-bit ADC reports
pub const ADC_MAX: i32 = 4095;

/// Full ADC span, used to normalise pot+CV sums
pub const ADC_RANGE: f32 = 4096.0;

/// ADC reading for 0V on a bipolar CV jack
pub const ADC_CENTER: i32 = 2048;

/// Number of banks in the sample library
pub const NUM_BANKS: u8 = 60;

/// Number of sample slots in a bank
pub const SAMPLES_PER_BANK: u8 = 10;

/// Clamp an integer to the ADC range
#[inline]
pub fn clamp_adc(value: i32) -> i32 {
    value.clamp(0, ADC_MAX)
}

/// One of the two playback channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayChannel {
    One,
    Two,
}

impl PlayChannel {
    /// The opposite channel
    pub fn other(self) -> Self {
        match self {
            PlayChannel::One => PlayChannel::Two,
            PlayChannel::Two => PlayChannel::One,
        }
    }
}

impl Key for PlayChannel {
    const COUNT: usize = 2;
    const ALL: &'static [Self] = &[PlayChannel::One, PlayChannel::Two];

    fn index(self) -> usize {
        match self {
            PlayChannel::One => 0,
            PlayChannel::Two => 1,
        }
    }
}

/// Potentiometers on the panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PotChannel {
    Pitch(PlayChannel),
    Start(PlayChannel),
    Length(PlayChannel),
    Sample(PlayChannel),
    RecSample,
}

impl Key for PotChannel {
    const COUNT: usize = 9;
    const ALL: &'static [Self] = &[
        PotChannel::Pitch(PlayChannel::One),
        PotChannel::Pitch(PlayChannel::Two),
        PotChannel::Start(PlayChannel::One),
        PotChannel::Start(PlayChannel::Two),
        PotChannel::Length(PlayChannel::One),
        PotChannel::Length(PlayChannel::Two),
        PotChannel::Sample(PlayChannel::One),
        PotChannel::Sample(PlayChannel::Two),
        PotChannel::RecSample,
    ];

    fn index(self) -> usize {
        match self {
            PotChannel::Pitch(c) => c.index(),
            PotChannel::Start(c) => 2 + c.index(),
            PotChannel::Length(c) => 4 + c.index(),
            PotChannel::Sample(c) => 6 + c.index(),
            PotChannel::RecSample => 8,
        }
    }
}

/// CV input jacks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CvChannel {
    Pitch(PlayChannel),
    Start(PlayChannel),
    Length(PlayChannel),
    Sample(PlayChannel),
}

impl CvChannel {
    /// Pitch jacks get the 0V dead zone and the long FIR window
    pub fn is_pitch(self) -> bool {
        matches!(self, CvChannel::Pitch(_))
    }
}

impl Key for CvChannel {
    const COUNT: usize = 8;
    const ALL: &'static [Self] = &[
        CvChannel::Pitch(PlayChannel::One),
        CvChannel::Pitch(PlayChannel::Two),
        CvChannel::Start(PlayChannel::One),
        CvChannel::Start(PlayChannel::Two),
        CvChannel::Length(PlayChannel::One),
        CvChannel::Length(PlayChannel::Two),
        CvChannel::Sample(PlayChannel::One),
        CvChannel::Sample(PlayChannel::Two),
    ];

    fn index(self) -> usize {
        match self {
            CvChannel::Pitch(c) => c.index(),
            CvChannel::Start(c) => 2 + c.index(),
            CvChannel::Length(c) => 4 + c.index(),
            CvChannel::Sample(c) => 6 + c.index(),
        }
    }
}

/// Panel buttons that take part in combos or fire plain actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Button {
    Play(PlayChannel),
    Reverse(PlayChannel),
    Bank(PlayChannel),
    Rec,
    RecBank,
    Edit,
}

impl Key for Button {
    const COUNT: usize = 9;
    const ALL: &'static [Self] = &[
        Button::Play(PlayChannel::One),
        Button::Play(PlayChannel::Two),
        Button::Reverse(PlayChannel::One),
        Button::Reverse(PlayChannel::Two),
        Button::Bank(PlayChannel::One),
        Button::Bank(PlayChannel::Two),
        Button::Rec,
        Button::RecBank,
        Button::Edit,
    ];

    fn index(self) -> usize {
        match self {
            Button::Play(c) => c.index(),
            Button::Reverse(c) => 2 + c.index(),
            Button::Bank(c) => 4 + c.index(),
            Button::Rec => 6,
            Button::RecBank => 7,
            Button::Edit => 8,
        }
    }
}

/// Per-playback-channel table
pub type PerChannel<T> = KeyedArray<PlayChannel, T, 2>;

/// Per-pot table
pub type PotArray<T> = KeyedArray<PotChannel, T, 9>;

/// Per-CV-jack table
pub type CvArray<T> = KeyedArray<CvChannel, T, 8>;

/// Per-button table
pub type ButtonArray<T> = KeyedArray<Button, T, 9>;

/// Latest raw readings from the ADC DMA buffers
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AdcFrame {
    pub pots: PotArray<u16>,
    pub cvs: CvArray<u16>,
}

impl AdcFrame {
    /// A frame with pots at zero and CV jacks at rest (pitch at 0V)
    pub fn at_rest() -> Self {
        Self {
            pots: PotArray::splat(0),
            cvs: CvArray::from_fn(|cv| if cv.is_pitch() { ADC_CENTER as u16 } else { 0 }),
        }
    }
}
