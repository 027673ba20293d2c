//! Event Triggers and UI Feedback
//!
//! Two separate tables replace the single counter-per-event array:
//!
//! - [`TriggerTable`] holds edge-triggered booleans. The dispatcher (or an
//!   external consumer such as the sample loader) takes each one at most once.
//! - [`FeedbackTable`] holds how many more renderer ticks an indication
//!   (flash, blink) should stay lit. Only the LED renderer decays it.

use crate::channel::PlayChannel;
use crate::keyed::{Key, KeyedArray};
use serde::{Deserialize, Serialize};

/// Edge-triggered events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Trigger {
    /// A channel selected a different sample slot
    SampleChanged(PlayChannel),
    /// A channel committed a different bank
    BankChanged(PlayChannel),
    /// The record slot changed
    RecSampleChanged,
    /// The record bank changed
    RecBankChanged,
    /// Play button pressed: toggle play/stop
    PlayButton(PlayChannel),
    /// Start playback now
    PlayTrig(PlayChannel),
    /// A play trigger arrived and is waiting out the settle delay
    PlayTrigDelaying(PlayChannel),
    /// Toggle playback direction
    ReverseTrig(PlayChannel),
    /// Toggle recording
    RecTrig,
    /// Toggle input monitoring and record enable
    ToggleMonitor,
    /// Toggle looping
    ToggleLooping(PlayChannel),
    /// Hold the pitch CV at its value from the play trigger
    LatchPitchCv(PlayChannel),
}

impl Key for Trigger {
    const COUNT: usize = 20;
    const ALL: &'static [Self] = &[
        Trigger::SampleChanged(PlayChannel::One),
        Trigger::SampleChanged(PlayChannel::Two),
        Trigger::BankChanged(PlayChannel::One),
        Trigger::BankChanged(PlayChannel::Two),
        Trigger::RecSampleChanged,
        Trigger::RecBankChanged,
        Trigger::PlayButton(PlayChannel::One),
        Trigger::PlayButton(PlayChannel::Two),
        Trigger::PlayTrig(PlayChannel::One),
        Trigger::PlayTrig(PlayChannel::Two),
        Trigger::PlayTrigDelaying(PlayChannel::One),
        Trigger::PlayTrigDelaying(PlayChannel::Two),
        Trigger::ReverseTrig(PlayChannel::One),
        Trigger::ReverseTrig(PlayChannel::Two),
        Trigger::RecTrig,
        Trigger::ToggleMonitor,
        Trigger::ToggleLooping(PlayChannel::One),
        Trigger::ToggleLooping(PlayChannel::Two),
        Trigger::LatchPitchCv(PlayChannel::One),
        Trigger::LatchPitchCv(PlayChannel::Two),
    ];

    fn index(self) -> usize {
        match self {
            Trigger::SampleChanged(c) => c.index(),
            Trigger::BankChanged(c) => 2 + c.index(),
            Trigger::RecSampleChanged => 4,
            Trigger::RecBankChanged => 5,
            Trigger::PlayButton(c) => 6 + c.index(),
            Trigger::PlayTrig(c) => 8 + c.index(),
            Trigger::PlayTrigDelaying(c) => 10 + c.index(),
            Trigger::ReverseTrig(c) => 12 + c.index(),
            Trigger::RecTrig => 14,
            Trigger::ToggleMonitor => 15,
            Trigger::ToggleLooping(c) => 16 + c.index(),
            Trigger::LatchPitchCv(c) => 18 + c.index(),
        }
    }
}

/// Indications shown by the LED renderer for a number of its ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Feedback {
    /// Play button flash: the new slot holds a sample
    SampleValid(PlayChannel),
    /// Play button flash: the new slot is empty
    SampleEmpty(PlayChannel),
    /// The bank hover target moved
    BankHover(PlayChannel),
    /// The record bank hover target moved
    RecBankHover,
    /// Record slot changed while monitoring
    RecSampleLight,
}

impl Key for Feedback {
    const COUNT: usize = 8;
    const ALL: &'static [Self] = &[
        Feedback::SampleValid(PlayChannel::One),
        Feedback::SampleValid(PlayChannel::Two),
        Feedback::SampleEmpty(PlayChannel::One),
        Feedback::SampleEmpty(PlayChannel::Two),
        Feedback::BankHover(PlayChannel::One),
        Feedback::BankHover(PlayChannel::Two),
        Feedback::RecBankHover,
        Feedback::RecSampleLight,
    ];

    fn index(self) -> usize {
        match self {
            Feedback::SampleValid(c) => c.index(),
            Feedback::SampleEmpty(c) => 2 + c.index(),
            Feedback::BankHover(c) => 4 + c.index(),
            Feedback::RecBankHover => 6,
            Feedback::RecSampleLight => 7,
        }
    }
}

/// Pending edge-triggered events
#[derive(Debug, Clone, Default)]
pub struct TriggerTable {
    pending: KeyedArray<Trigger, bool, 20>,
}

impl TriggerTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, trigger: Trigger) {
        self.pending[trigger] = true;
    }

    pub fn clear(&mut self, trigger: Trigger) {
        self.pending[trigger] = false;
    }

    /// Set or clear depending on `on`
    pub fn assign(&mut self, trigger: Trigger, on: bool) {
        self.pending[trigger] = on;
    }

    pub fn is_set(&self, trigger: Trigger) -> bool {
        self.pending[trigger]
    }

    /// Consume the trigger, returning whether it was pending
    pub fn take(&mut self, trigger: Trigger) -> bool {
        core::mem::replace(&mut self.pending[trigger], false)
    }

    /// Iterate over every pending trigger
    pub fn pending(&self) -> impl Iterator<Item = Trigger> + '_ {
        self.pending.iter().filter(|(_, on)| **on).map(|(t, _)| t)
    }
}

/// Remaining renderer ticks for each indication
#[derive(Debug, Clone, Default)]
pub struct FeedbackTable {
    remaining: KeyedArray<Feedback, u8, 8>,
}

impl FeedbackTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or restart) an indication
    pub fn show(&mut self, feedback: Feedback, ticks: u8) {
        self.remaining[feedback] = ticks;
    }

    pub fn clear(&mut self, feedback: Feedback) {
        self.remaining[feedback] = 0;
    }

    pub fn remaining(&self, feedback: Feedback) -> u8 {
        self.remaining[feedback]
    }

    pub fn is_active(&self, feedback: Feedback) -> bool {
        self.remaining[feedback] > 0
    }

    /// Count every active indication down by one renderer tick
    pub fn decay(&mut self) {
        for (_, ticks) in self.remaining.iter_mut() {
            *ticks = ticks.saturating_sub(1);
        }
    }
}
