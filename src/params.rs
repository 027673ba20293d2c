//! Parameter Mapper
//!
//! Combines conditioned pots and CVs with combo overrides into the
//! parameter set the sampler engine reads every audio block. Pots and CVs
//! add: `(pot + cv) / 4096`. An engaged combo substitutes its latched
//! reading for the pot so a knob borrowed by a gesture does not also move
//! its normal parameter.

use crate::buttons::ButtonPanel;
use crate::channel::{clamp_adc, Button, CvChannel, PerChannel, PlayChannel, PotChannel, ADC_RANGE};
use crate::combo::{ComboKey, ComboState, ComboTable, HoverGesture};
use crate::conditioning::{CvConditioner, PotConditioner};
use crate::config::{EngineConfig, SystemCalibrations};
use crate::detent::{detent, detent_antihys_with_guard};
use crate::flags::{Feedback, FeedbackTable, Trigger, TriggerTable};
use crate::host::{Host, PlayState};
use crate::keyed::Key;
use crate::pitch::{pitch_multiplier, PitchInput, PitchTables};
use libm::fabsf;
use serde::{Deserialize, Serialize};

/// Lengths above this play the whole sample
const LENGTH_FULL: f32 = 0.990;

/// Shortest length, keeps short segments clear of envelope noise
const LENGTH_MIN: f32 = 0.01;

/// Starts above this jump to the end of the sample
const START_END: f32 = 0.99;

/// Starts at or below this snap to the beginning
const START_ZERO: f32 = 0.0003;

/// How close the pot must come to the current volume before it takes over
const VOLUME_CROSSING: f32 = 0.04;

/// Channel one's segment while auditioning a trim edit
const TRIM_AUDITION_LENGTH: f32 = 0.201;

/// Playback parameters of one channel
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelParams {
    /// Resample rate multiplier
    pub pitch: f32,
    /// Normalized start position, `[0, 1]`
    pub start: f32,
    /// Normalized play length, `(0, 1]`
    pub length: f32,
    /// `[0, 1]`
    pub volume: f32,
    pub bank: u8,
    pub sample: u8,
    pub reverse: bool,
    pub looping: bool,
}

impl Default for ChannelParams {
    fn default() -> Self {
        Self {
            pitch: 1.0,
            start: 0.0,
            length: 1.0,
            volume: 1.0,
            bank: 0,
            sample: 0,
            reverse: false,
            looping: false,
        }
    }
}

/// Where the recorder writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RecParams {
    pub bank: u8,
    pub sample: u8,
}

/// Everything the sampler engine and recorder read from the controls
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlaybackParams {
    pub channels: PerChannel<ChannelParams>,
    pub rec: RecParams,
}

/// Global mode switches
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GlobalModes {
    /// The calibration routine owns the inputs
    pub calibrate: bool,
    /// The system settings menu owns the inputs
    pub system_mode: bool,
    /// Channel two's knobs edit channel one's sample
    pub edit_mode: bool,
    /// Snap pitch CV to semitones
    pub quantize: PerChannel<bool>,
    pub monitor_recording: bool,
    pub enable_recording: bool,
}

/// Clamp a normalized length, snapping near-full to full
pub fn clamp_length(length: f32) -> f32 {
    if length > LENGTH_FULL {
        1.0
    } else if length <= LENGTH_MIN {
        LENGTH_MIN
    } else {
        length
    }
}

/// Clamp a normalized start, snapping both ends
pub fn clamp_start(start: f32) -> f32 {
    if start > START_END {
        1.0
    } else if start <= START_ZERO {
        0.0
    } else {
        start
    }
}

/// Gain for a pot position: 0.1 at zero, unity across the centre, 5 at full
pub fn sample_gain(adc: i32) -> f32 {
    if adc < 2020 {
        adc as f32 / 2244.44 + 0.1
    } else if adc < 2080 {
        1.0
    } else {
        (adc as f32 - 1577.5) / 503.5
    }
}

/// Borrowed view of the engine for one mapping pass
pub(crate) struct Mapper<'a, H: Host> {
    pub config: &'a EngineConfig,
    pub cal: &'a SystemCalibrations,
    pub tables: &'a PitchTables,
    pub pots: &'a mut PotConditioner,
    pub cvs: &'a CvConditioner,
    pub buttons: &'a ButtonPanel,
    pub combos: &'a mut ComboTable,
    pub params: &'a mut PlaybackParams,
    pub modes: &'a GlobalModes,
    pub triggers: &'a mut TriggerTable,
    pub feedback: &'a mut FeedbackTable,
    pub pitch_latch: &'a PerChannel<i32>,
    pub host: &'a mut H,
}

impl<H: Host> Mapper<'_, H> {
    pub fn run(&mut self) {
        self.update_edit();

        for &chan in PlayChannel::ALL {
            // Channel one's segment belongs to the trim editor in edit mode
            if !(self.modes.edit_mode && chan == PlayChannel::One) {
                self.update_length(chan);
                self.update_start(chan);
            }
            self.update_pitch(chan);

            if self.buttons.is_down(Button::Bank(chan)) {
                self.update_bank_gesture(chan);
            }
            let sample_pot = self.sample_pot(chan);
            self.update_sample(chan, sample_pot);
            self.update_volume(chan);
        }

        self.update_rec();
    }

    fn update_edit(&mut self) {
        const LENGTH2: PotChannel = PotChannel::Length(PlayChannel::Two);
        const START2: PotChannel = PotChannel::Start(PlayChannel::Two);
        const SAMPLE2: PotChannel = PotChannel::Sample(PlayChannel::Two);

        if !self.modes.edit_mode {
            for key in [ComboKey::EditStart, ComboKey::EditLength, ComboKey::EditSample] {
                if self.pots.changed(key.knob()) {
                    self.combos.invalidate(key);
                }
            }
            return;
        }

        let one = self.params.channels[PlayChannel::One];
        let (bank, slot) = (one.bank, one.sample);

        if self.pots.changed(LENGTH2) {
            self.host.nudge_trim_size(bank, slot, self.pots.delta(LENGTH2));
            self.pots.consume_change(LENGTH2);
            self.audition_trim(0.999);
        }

        if self.pots.changed(START2) {
            self.host.nudge_trim_start(bank, slot, self.pots.delta(START2));
            self.pots.consume_change(START2);
            self.audition_trim(0.0);
        }

        if self.pots.changed(SAMPLE2) {
            let gain = sample_gain(self.pots.bracketed(SAMPLE2));
            self.host.set_sample_gain(bank, slot, gain);
        }
    }

    /// Loop the edited end of channel one's sample so the trim can be heard
    fn audition_trim(&mut self, start: f32) {
        let one = &mut self.params.channels[PlayChannel::One];
        one.start = start;
        one.length = TRIM_AUDITION_LENGTH;
        one.looping = true;
        one.reverse = false;
        if self.host.play_state(PlayChannel::One) == PlayState::Silent {
            self.triggers.set(Trigger::PlayTrig(PlayChannel::One));
        }
    }

    fn update_length(&mut self, chan: PlayChannel) {
        let pot = if chan == PlayChannel::Two && self.combos.is_engaged(ComboKey::EditLength) {
            self.combos.latched_value(ComboKey::EditLength)
        } else {
            self.pots.bracketed(PotChannel::Length(chan))
        };
        let cv = self.cvs.bracketed(CvChannel::Length(chan));
        self.params.channels[chan].length = clamp_length((pot + cv) as f32 / ADC_RANGE);
    }

    fn update_start(&mut self, chan: PlayChannel) {
        let volume = ComboKey::ReverseStart(chan);
        let pot = if chan == PlayChannel::Two && self.combos.is_engaged(ComboKey::EditStart) {
            self.combos.latched_value(ComboKey::EditStart)
        } else if self.combos.is_engaged(volume) {
            self.combos.latched_value(volume)
        } else {
            self.pots.bracketed(PotChannel::Start(chan))
        };
        let cv = self.cvs.bracketed(CvChannel::Start(chan));
        self.params.channels[chan].start = clamp_start((pot + cv) as f32 / ADC_RANGE);
    }

    fn update_pitch(&mut self, chan: PlayChannel) {
        let pot = clamp_adc(
            self.pots.bracketed(PotChannel::Pitch(chan)) + self.cal.pitch_pot_detent_offset(chan),
        );
        let cv = if self.triggers.is_set(Trigger::LatchPitchCv(chan)) {
            self.pitch_latch[chan]
        } else {
            self.cvs.bracketed(CvChannel::Pitch(chan))
        };

        let input = PitchInput {
            pot,
            cv,
            quantize: self.modes.quantize[chan],
            tracking: self.cal.tracking_comp(chan),
        };
        self.params.channels[chan].pitch =
            pitch_multiplier(self.tables, input, self.config.max_resample_rate);
    }

    /// Bank button held: either sample knob may start or steer the hover
    fn update_bank_gesture(&mut self, chan: PlayChannel) {
        for &knob in PlayChannel::ALL {
            let key = ComboKey::BankSample { bank: chan, knob };
            let partner = ComboKey::BankSample {
                bank: chan,
                knob: knob.other(),
            };
            let pot = PotChannel::Sample(knob);
            let position = detent(self.pots.bracketed(pot));

            if self.combos.state(key) == ComboState::Active {
                if self.combos.propose_bank_hover(chan, knob, position, &*self.host) {
                    self.feedback
                        .show(Feedback::BankHover(chan), self.config.feedback.bank_hover);
                }
            } else if self.pots.changed(pot)
                && position != detent(self.combos.latched_value(key))
            {
                self.combos.activate(key);
                if self.combos.state(partner) != ComboState::Active {
                    let bank = self.params.channels[chan].bank;
                    self.combos.set_hover(HoverGesture::Bank(chan), bank);
                }
            }
        }
    }

    /// Sample knob reading, or the snapshot of a bank gesture that borrowed it
    fn sample_pot(&mut self, chan: PlayChannel) -> i32 {
        let cross = ComboKey::BankSample {
            bank: chan.other(),
            knob: chan,
        };
        let own = ComboKey::BankSample { bank: chan, knob: chan };

        if self.pots.changed(PotChannel::Sample(chan)) {
            self.combos.invalidate_latch(cross);
            self.combos.invalidate_latch(own);
        }

        if self.combos.is_engaged(cross) {
            self.combos.latched_value(cross)
        } else if self.combos.is_engaged(own) {
            self.combos.latched_value(own)
        } else {
            self.pots.bracketed(PotChannel::Sample(chan))
        }
    }

    fn update_sample(&mut self, chan: PlayChannel, sample_pot: i32) {
        let pot = if chan == PlayChannel::Two && self.combos.is_engaged(ComboKey::EditSample) {
            self.combos.latched_value(ComboKey::EditSample)
        } else {
            sample_pot
        };
        let value = pot + self.cvs.bracketed(CvChannel::Sample(chan));

        let params = &mut self.params.channels[chan];
        let old = params.sample;
        let new = detent_antihys_with_guard(value, old, self.config.timing.detent_guard);
        if new == old {
            return;
        }

        params.sample = new;
        self.triggers.set(Trigger::SampleChanged(chan));

        let durations = self.config.feedback;
        if self.host.has_sample(params.bank, new) {
            self.feedback.clear(Feedback::SampleEmpty(chan));
            self.feedback.show(Feedback::SampleValid(chan), durations.sample_valid);
        } else {
            self.feedback.clear(Feedback::SampleValid(chan));
            self.feedback.show(Feedback::SampleEmpty(chan), durations.sample_empty);
        }
    }

    /// Reverse held + start knob: volume, once the knob reaches the current level
    fn update_volume(&mut self, chan: PlayChannel) {
        let key = ComboKey::ReverseStart(chan);
        let knob = PotChannel::Start(chan);
        let held = self.buttons.is_down(Button::Reverse(chan));
        let moved = self.pots.changed(knob);

        if held && moved && self.combos.state(key) != ComboState::Active {
            self.combos.activate(key);
        }

        if self.combos.state(key) == ComboState::Active {
            let level = self.pots.bracketed(knob) as f32 / ADC_RANGE;
            let volume = &mut self.params.channels[chan].volume;
            if !self.combos.cell(key).value_crossed && fabsf(*volume - level) < VOLUME_CROSSING {
                self.combos.mark_crossed(key);
            }
            if self.combos.cell(key).value_crossed {
                *volume = level;
            }
        }

        if !held && moved {
            self.combos.invalidate(key);
        }
    }

    /// Record sample knob: picks the record slot, or with RecBank held the
    /// record bank's tens digit
    fn update_rec(&mut self) {
        let key = ComboKey::RecBankSample;
        let position = detent(self.pots.bracketed(PotChannel::RecSample));

        if self.buttons.is_down(Button::RecBank) {
            if self.combos.state(key) != ComboState::Active {
                if position != detent(self.combos.latched_value(key)) {
                    self.combos.activate(key);
                    self.combos.set_hover(HoverGesture::RecBank, self.params.rec.bank);
                }
            } else if self.combos.propose_rec_bank_hover(position, &*self.host) {
                self.feedback
                    .show(Feedback::RecBankHover, self.config.feedback.bank_hover);
            }
            return;
        }

        if self.pots.changed(PotChannel::RecSample) {
            self.combos.invalidate_latch(key);
        }
        if self.combos.is_engaged(key) || position == self.params.rec.sample {
            return;
        }

        self.params.rec.sample = position;
        self.triggers.set(Trigger::RecSampleChanged);
        if self.modes.monitor_recording {
            self.feedback
                .show(Feedback::RecSampleLight, self.config.feedback.rec_sample_light);
        }
    }
}
