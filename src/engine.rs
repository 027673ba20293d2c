//! Control Engine
//!
//! [`ControlEngine`] owns every table the control path touches. The ADC
//! timer interrupt calls [`ControlEngine::tick`] once per period with the
//! latest readings and the collaborators; button and trigger-jack handlers
//! report edges through [`press`](ControlEngine::press),
//! [`release`](ControlEngine::release) and
//! [`play_trigger`](ControlEngine::play_trigger) between ticks.
//!
//! # Example
//!
//! ```rust,ignore
//! use sampler_controls::prelude::*;
//!
//! let mut engine = ControlEngine::new(EngineConfig::fast_adc(), SystemCalibrations::default())?;
//!
//! // In the ADC timer interrupt
//! match engine.tick(&frame, &mut host) {
//!     TickMode::Normal => {}
//!     TickMode::Calibration => calibration.update(engine.cv(cv)),
//!     TickMode::SystemMode => menu.update(),
//! }
//!
//! // In the audio callback
//! let pitch = engine.channel(PlayChannel::One).pitch;
//! ```

use crate::buttons::{ButtonPanel, Release};
use crate::channel::{AdcFrame, Button, CvChannel, PerChannel, PlayChannel, PotChannel};
use crate::combo::{ComboKey, ComboSnapshot, ComboTable};
use crate::conditioning::{AnalogState, CvConditioner, PotConditioner};
use crate::config::{ConfigError, EngineConfig, SystemCalibrations};
use crate::dispatch::{Dispatcher, PlayTrigTimers};
use crate::flags::{FeedbackTable, Trigger, TriggerTable};
use crate::host::Host;
use crate::params::{ChannelParams, GlobalModes, Mapper, PlaybackParams};
use crate::pitch::PitchTables;

const EDIT_KEYS: [ComboKey; 3] = [ComboKey::EditStart, ComboKey::EditLength, ComboKey::EditSample];

/// Which routine owns the inputs this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickMode {
    /// Parameters were mapped and triggers dispatched
    Normal,
    /// Inputs were conditioned without calibration offsets; the caller
    /// runs the calibration routine
    Calibration,
    /// Inputs were conditioned; the caller runs the system menu
    SystemMode,
}

/// Control-input state of the sampler
#[derive(Debug, Clone)]
pub struct ControlEngine {
    config: EngineConfig,
    cal: SystemCalibrations,
    tables: PitchTables,
    pots: PotConditioner,
    cvs: CvConditioner,
    buttons: ButtonPanel,
    combos: ComboTable,
    params: PlaybackParams,
    modes: GlobalModes,
    triggers: TriggerTable,
    feedback: FeedbackTable,
    timers: PlayTrigTimers,
    pitch_latch: PerChannel<i32>,
    now: u32,
}

impl ControlEngine {
    /// Validate the configuration and build the engine at rest
    pub fn new(config: EngineConfig, cal: SystemCalibrations) -> Result<Self, ConfigError> {
        config.validate()?;
        cal.validate()?;

        let cvs = CvConditioner::new(&config);
        let pitch_latch = PerChannel::from_fn(|c| cvs.bracketed(CvChannel::Pitch(c)));
        Ok(Self {
            pots: PotConditioner::new(&config),
            cvs,
            tables: PitchTables::new(),
            buttons: ButtonPanel::new(),
            combos: ComboTable::new(),
            params: PlaybackParams::default(),
            modes: GlobalModes::default(),
            triggers: TriggerTable::new(),
            feedback: FeedbackTable::new(),
            timers: PlayTrigTimers::default(),
            pitch_latch,
            now: 0,
            config,
            cal,
        })
    }

    /// Run one timer period
    pub fn tick<H: Host>(&mut self, frame: &AdcFrame, host: &mut H) -> TickMode {
        self.now = self.now.wrapping_add(1);

        self.pots.process(&frame.pots);
        self.cvs.process(&frame.cvs, &self.cal, self.modes.calibrate);

        if self.modes.calibrate {
            return TickMode::Calibration;
        }
        if self.modes.system_mode {
            return TickMode::SystemMode;
        }

        host.set_recording_enabled(true);

        Mapper {
            config: &self.config,
            cal: &self.cal,
            tables: &self.tables,
            pots: &mut self.pots,
            cvs: &self.cvs,
            buttons: &self.buttons,
            combos: &mut self.combos,
            params: &mut self.params,
            modes: &self.modes,
            triggers: &mut self.triggers,
            feedback: &mut self.feedback,
            pitch_latch: &self.pitch_latch,
            host: &mut *host,
        }
        .run();

        Dispatcher {
            now: self.now,
            timing: &self.config.timing,
            timers: &self.timers,
            triggers: &mut self.triggers,
            params: &mut self.params,
            modes: &mut self.modes,
            host,
        }
        .run();

        TickMode::Normal
    }

    /// A play trigger arrived on `chan`'s jack.
    ///
    /// Playback starts once the settle delay has passed; until the latch
    /// window closes, pitch is computed from the CV as it was right now.
    pub fn play_trigger(&mut self, chan: PlayChannel) {
        self.timers.stamp(chan, self.now);
        self.pitch_latch[chan] = self.cvs.bracketed(CvChannel::Pitch(chan));
        self.triggers.set(Trigger::PlayTrigDelaying(chan));
        if self.config.timing.play_trig_latch_pitch > 0 {
            self.triggers.set(Trigger::LatchPitchCv(chan));
        }
    }

    pub fn press(&mut self, button: Button) {
        self.buttons.press(button, &mut self.combos, &self.pots);
    }

    pub fn release(&mut self, button: Button) -> Release {
        self.buttons
            .release(button, &mut self.combos, &mut self.params, &mut self.triggers)
    }

    pub fn is_down(&self, button: Button) -> bool {
        self.buttons.is_down(button)
    }

    /// Enter or leave edit mode.
    ///
    /// Entering freezes channel two's start, length and sample knobs at
    /// their current readings, since they now edit channel one's sample.
    /// Leaving keeps the frozen readings until each knob is moved again.
    pub fn set_edit_mode(&mut self, on: bool) {
        if on == self.modes.edit_mode {
            return;
        }
        for key in EDIT_KEYS {
            if on {
                self.combos.set_latched_value(key, self.pots.bracketed(key.knob()));
                self.combos.activate(key);
            } else {
                self.combos.latch(key);
            }
        }
        self.modes.edit_mode = on;
        log::debug!("edit mode {}", on);
    }

    pub fn set_quantize(&mut self, chan: PlayChannel, on: bool) {
        self.modes.quantize[chan] = on;
    }

    pub fn set_calibrate(&mut self, on: bool) {
        self.modes.calibrate = on;
        log::debug!("calibration mode {}", on);
    }

    pub fn set_system_mode(&mut self, on: bool) {
        self.modes.system_mode = on;
        log::debug!("system mode {}", on);
    }

    /// Replace the calibration record, e.g. after the calibration routine
    pub fn set_calibrations(&mut self, cal: SystemCalibrations) -> Result<(), ConfigError> {
        cal.validate()?;
        self.cal = cal;
        Ok(())
    }

    /// Raise a trigger from outside the tick, e.g. a menu toggling monitoring
    pub fn raise(&mut self, trigger: Trigger) {
        self.triggers.set(trigger);
    }

    /// Consume a trigger meant for another task, e.g. `SampleChanged` for
    /// the sample loader
    pub fn take(&mut self, trigger: Trigger) -> bool {
        self.triggers.take(trigger)
    }

    pub fn triggers(&self) -> &TriggerTable {
        &self.triggers
    }

    pub fn feedback(&self) -> &FeedbackTable {
        &self.feedback
    }

    /// The LED renderer decays indications through this
    pub fn feedback_mut(&mut self) -> &mut FeedbackTable {
        &mut self.feedback
    }

    pub fn params(&self) -> &PlaybackParams {
        &self.params
    }

    pub fn channel(&self, chan: PlayChannel) -> &ChannelParams {
        &self.params.channels[chan]
    }

    pub fn modes(&self) -> &GlobalModes {
        &self.modes
    }

    /// Copy of a combo cell and its hover target
    pub fn combo(&self, key: ComboKey) -> ComboSnapshot {
        self.combos.snapshot(key)
    }

    pub fn pot(&self, pot: PotChannel) -> &AnalogState {
        self.pots.state(pot)
    }

    pub fn cv(&self, cv: CvChannel) -> &AnalogState {
        self.cvs.state(cv)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn calibrations(&self) -> &SystemCalibrations {
        &self.cal
    }

    /// Ticks since construction, wrapping
    pub fn now(&self) -> u32 {
        self.now
    }
}
