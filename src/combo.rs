//! Button + Knob Combo Gestures
//!
//! Holding a button while turning one of its paired knobs reaches a
//! secondary parameter: a bank number, a channel's volume, or a trim
//! setting in edit mode. Each valid (button, knob) pair owns one
//! [`ComboCell`] in a flat table addressed by [`ComboKey`].
//!
//! A bank number is split over two knobs (ones digit on one, tens digit on
//! the other), so both cells of a bank gesture share a single hover record
//! addressed by [`HoverGesture`] instead of mirroring into each other.
//!
//! ```text
//!            knob turned               button released
//! Inactive ───────────────▶ Active ───────────────────▶ Latched
//!    ▲                                                      │
//!    └──────────────── plain pot moved ─────────────────────┘
//! ```

use crate::channel::{Button, PlayChannel, PotChannel, NUM_BANKS};
use crate::host::{bank_usable, SampleLibrary};
use crate::keyed::{Key, KeyedArray};
use serde::{Deserialize, Serialize};

/// Lifecycle of one combo gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ComboState {
    /// The pot drives its normal parameter
    #[default]
    Inactive,
    /// Button held and the knob has moved; the hover value is tentative
    Active,
    /// Button released after a gesture; the latched value stays in effect
    Latched,
}

/// A (button, knob) pair that forms a gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComboKey {
    /// Bank button of `bank` with the sample knob of `knob`.
    /// Channel one's knob sets the ones digit, channel two's the tens.
    BankSample { bank: PlayChannel, knob: PlayChannel },
    /// Record bank button with the record sample knob
    RecBankSample,
    /// Reverse button with the same channel's start knob: volume override
    ReverseStart(PlayChannel),
    /// Edit with channel two's start knob: trim start
    EditStart,
    /// Edit with channel two's length knob: trim size
    EditLength,
    /// Edit with channel two's sample knob: sample gain
    EditSample,
}

impl ComboKey {
    /// The gesture formed by `button` and `knob`, if they pair up
    pub fn new(button: Button, knob: PotChannel) -> Option<Self> {
        match (button, knob) {
            (Button::Bank(bank), PotChannel::Sample(knob)) => Some(ComboKey::BankSample { bank, knob }),
            (Button::RecBank, PotChannel::RecSample) => Some(ComboKey::RecBankSample),
            (Button::Reverse(c), PotChannel::Start(k)) if c == k => Some(ComboKey::ReverseStart(c)),
            (Button::Edit, PotChannel::Start(PlayChannel::Two)) => Some(ComboKey::EditStart),
            (Button::Edit, PotChannel::Length(PlayChannel::Two)) => Some(ComboKey::EditLength),
            (Button::Edit, PotChannel::Sample(PlayChannel::Two)) => Some(ComboKey::EditSample),
            _ => None,
        }
    }

    pub fn button(self) -> Button {
        match self {
            ComboKey::BankSample { bank, .. } => Button::Bank(bank),
            ComboKey::RecBankSample => Button::RecBank,
            ComboKey::ReverseStart(c) => Button::Reverse(c),
            ComboKey::EditStart | ComboKey::EditLength | ComboKey::EditSample => Button::Edit,
        }
    }

    pub fn knob(self) -> PotChannel {
        match self {
            ComboKey::BankSample { knob, .. } => PotChannel::Sample(knob),
            ComboKey::RecBankSample => PotChannel::RecSample,
            ComboKey::ReverseStart(c) => PotChannel::Start(c),
            ComboKey::EditStart => PotChannel::Start(PlayChannel::Two),
            ComboKey::EditLength => PotChannel::Length(PlayChannel::Two),
            ComboKey::EditSample => PotChannel::Sample(PlayChannel::Two),
        }
    }

    /// Shared hover record, for gestures that pick a bank
    pub fn hover_gesture(self) -> Option<HoverGesture> {
        match self {
            ComboKey::BankSample { bank, .. } => Some(HoverGesture::Bank(bank)),
            ComboKey::RecBankSample => Some(HoverGesture::RecBank),
            _ => None,
        }
    }

    /// Whether the button's press and release drive this cell.
    /// Edit cells follow edit mode instead.
    pub fn follows_button(self) -> bool {
        !matches!(self, ComboKey::EditStart | ComboKey::EditLength | ComboKey::EditSample)
    }

    /// Every gesture that `button` takes part in
    pub fn for_button(button: Button) -> impl Iterator<Item = ComboKey> {
        Self::ALL.iter().copied().filter(move |key| key.button() == button)
    }
}

impl Key for ComboKey {
    const COUNT: usize = 10;
    const ALL: &'static [Self] = &[
        ComboKey::BankSample {
            bank: PlayChannel::One,
            knob: PlayChannel::One,
        },
        ComboKey::BankSample {
            bank: PlayChannel::One,
            knob: PlayChannel::Two,
        },
        ComboKey::BankSample {
            bank: PlayChannel::Two,
            knob: PlayChannel::One,
        },
        ComboKey::BankSample {
            bank: PlayChannel::Two,
            knob: PlayChannel::Two,
        },
        ComboKey::RecBankSample,
        ComboKey::ReverseStart(PlayChannel::One),
        ComboKey::ReverseStart(PlayChannel::Two),
        ComboKey::EditStart,
        ComboKey::EditLength,
        ComboKey::EditSample,
    ];

    fn index(self) -> usize {
        match self {
            ComboKey::BankSample { bank, knob } => bank.index() * 2 + knob.index(),
            ComboKey::RecBankSample => 4,
            ComboKey::ReverseStart(c) => 5 + c.index(),
            ComboKey::EditStart => 7,
            ComboKey::EditLength => 8,
            ComboKey::EditSample => 9,
        }
    }
}

/// Gestures whose tentative target is a bank number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HoverGesture {
    Bank(PlayChannel),
    RecBank,
}

impl Key for HoverGesture {
    const COUNT: usize = 3;
    const ALL: &'static [Self] = &[
        HoverGesture::Bank(PlayChannel::One),
        HoverGesture::Bank(PlayChannel::Two),
        HoverGesture::RecBank,
    ];

    fn index(self) -> usize {
        match self {
            HoverGesture::Bank(c) => c.index(),
            HoverGesture::RecBank => 2,
        }
    }
}

/// State of one (button, knob) pair
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ComboCell {
    pub state: ComboState,
    /// Pot reading substituted for the live pot while engaged
    pub latched_value: i32,
    /// Volume override only: the pot has reached the current volume
    pub value_crossed: bool,
}

impl ComboCell {
    /// Active or latched
    pub fn is_engaged(&self) -> bool {
        self.state != ComboState::Inactive
    }
}

/// Copy of a combo cell and its hover target, for the UI
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComboSnapshot {
    pub key: ComboKey,
    pub cell: ComboCell,
    pub hover: Option<u8>,
}

/// Every combo cell plus the shared bank hover records
#[derive(Debug, Clone, Default)]
pub struct ComboTable {
    cells: KeyedArray<ComboKey, ComboCell, 10>,
    hover: KeyedArray<HoverGesture, u8, 3>,
}

impl ComboTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cell(&self, key: ComboKey) -> &ComboCell {
        &self.cells[key]
    }

    pub fn state(&self, key: ComboKey) -> ComboState {
        self.cells[key].state
    }

    pub fn is_engaged(&self, key: ComboKey) -> bool {
        self.cells[key].is_engaged()
    }

    pub fn latched_value(&self, key: ComboKey) -> i32 {
        self.cells[key].latched_value
    }

    pub fn set_latched_value(&mut self, key: ComboKey, value: i32) {
        self.cells[key].latched_value = value;
    }

    /// Start a gesture. Resets the volume crossing latch.
    pub fn activate(&mut self, key: ComboKey) {
        self.transition(key, ComboState::Active);
        self.cells[key].value_crossed = false;
    }

    /// Commit an active gesture; other states are left alone
    pub fn latch(&mut self, key: ComboKey) {
        if self.cells[key].state == ComboState::Active {
            self.transition(key, ComboState::Latched);
        }
    }

    pub fn invalidate(&mut self, key: ComboKey) {
        self.transition(key, ComboState::Inactive);
    }

    /// Invalidate only if latched, keeping a gesture in progress
    pub fn invalidate_latch(&mut self, key: ComboKey) {
        if self.cells[key].state == ComboState::Latched {
            self.transition(key, ComboState::Inactive);
        }
    }

    pub fn mark_crossed(&mut self, key: ComboKey) {
        self.cells[key].value_crossed = true;
    }

    fn transition(&mut self, key: ComboKey, to: ComboState) {
        let cell = &mut self.cells[key];
        if cell.state != to {
            log::trace!("combo {:?}: {:?} -> {:?}", key, cell.state, to);
            cell.state = to;
        }
    }

    pub fn hover(&self, gesture: HoverGesture) -> u8 {
        self.hover[gesture]
    }

    /// Seed a hover record, usually with the bank currently in use
    pub fn set_hover(&mut self, gesture: HoverGesture, bank: u8) {
        self.hover[gesture] = bank;
    }

    /// Offer a detent from one of a play bank gesture's knobs.
    ///
    /// The ones knob keeps the hover's tens digit and the tens knob keeps its
    /// ones digit. The candidate is accepted only if the bank is enabled.
    /// Returns whether the hover moved.
    pub fn propose_bank_hover(
        &mut self,
        bank: PlayChannel,
        knob: PlayChannel,
        detent: u8,
        library: &impl SampleLibrary,
    ) -> bool {
        let gesture = HoverGesture::Bank(bank);
        let current = self.hover[gesture];
        let trial = match knob {
            PlayChannel::One => detent + library.bank_blink_digit(current) * 10,
            PlayChannel::Two => library.bank_color_digit(current) + detent * 10,
        };

        if trial == current || !bank_usable(library, trial) {
            return false;
        }
        log::trace!("bank {:?} hover {} -> {}", bank, current, trial);
        self.hover[gesture] = trial;
        true
    }

    /// Offer a tens digit for the record bank.
    ///
    /// Recording may target an empty bank, so the candidate is only pulled
    /// down by tens until it is in range. Returns whether the hover moved.
    pub fn propose_rec_bank_hover(&mut self, detent: u8, library: &impl SampleLibrary) -> bool {
        let current = self.hover[HoverGesture::RecBank];
        let mut trial = library.bank_color_digit(current) + detent * 10;
        while trial >= NUM_BANKS {
            trial -= 10;
        }

        if trial == current {
            return false;
        }
        log::trace!("rec bank hover {} -> {}", current, trial);
        self.hover[HoverGesture::RecBank] = trial;
        true
    }

    pub fn snapshot(&self, key: ComboKey) -> ComboSnapshot {
        ComboSnapshot {
            key,
            cell: self.cells[key],
            hover: key.hover_gesture().map(|g| self.hover[g]),
        }
    }
}
