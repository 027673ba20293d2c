//! Engine Configuration and Calibration
//!
//! Tuning constants for the conditioning pipeline, the trigger timers and the
//! pitch mapper, plus the read-only calibration record produced by the
//! calibration routine. Both are plain serde types so they can be stored
//! alongside patches and loaded as JSON when `alloc` is available.

use crate::channel::{CvChannel, PlayChannel, PotChannel, ADC_MAX};
use crate::conditioning::MAX_FIR_WINDOW;
use crate::keyed::Key;
use serde::{Deserialize, Serialize};

#[cfg(feature = "alloc")]
use alloc::string::String;

#[cfg(feature = "alloc")]
type JsonError = serde_json::Error;

#[cfg(not(feature = "alloc"))]
type JsonError = core::convert::Infallible;

/// Errors raised while building or loading a configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("smoothing coefficient {coef} for {input} must be in [0, 1)")]
    Coefficient { input: &'static str, coef: f32 },

    #[error("FIR window {window} for {input} must be in 1..={max}")]
    FirWindow {
        input: &'static str,
        window: usize,
        max: usize,
    },

    #[error("bracket width {width} for {input} must not be negative")]
    Bracket { input: &'static str, width: i32 },

    #[error("pitch latch window ({latch} ticks) must not exceed the trigger delay ({delay} ticks)")]
    LatchWindow { latch: u32, delay: u32 },

    #[error("{what} offset {offset} is outside -{max}..={max}")]
    Offset {
        what: &'static str,
        offset: i32,
        max: i32,
    },

    #[error("{what} must be positive and finite, got {value}")]
    NotPositive { what: &'static str, value: f32 },

    #[error("invalid JSON: {0}")]
    Json(#[from] JsonError),
}

/// Smoothing and bracketing for one pair of pots
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PotTuning {
    /// One-pole coefficient, higher is slower
    pub coef: f32,
    /// Movement threshold in ADC counts
    pub bracket: i32,
}

impl PotTuning {
    /// Coefficient for a filter that settles in roughly `ticks` ticks
    pub fn settling(ticks: f32, bracket: i32) -> Self {
        Self {
            coef: 1.0 - 1.0 / ticks,
            bracket,
        }
    }
}

/// FIR window and bracketing for one pair of CV jacks
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CvTuning {
    /// Number of samples averaged
    pub window: usize,
    /// Anti-jitter band in ADC counts
    pub bracket: i32,
}

/// Tick-counted timers for play triggers and pot movement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Ticks between a play trigger and `start_playing`
    pub play_trig_delay: u32,
    /// Ticks the pitch CV stays latched after a play trigger
    pub play_trig_latch_pitch: u32,
    /// Ticks a pot keeps tracking after its last large move
    pub pot_moving_ticks: u32,
    /// Counts a detent must be passed before a change commits
    pub detent_guard: i32,
}

/// How long each UI feedback indication lasts, in renderer ticks
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeedbackDurations {
    pub sample_valid: u8,
    pub sample_empty: u8,
    pub bank_hover: u8,
    pub rec_sample_light: u8,
}

impl Default for FeedbackDurations {
    fn default() -> Self {
        Self {
            sample_valid: 6,
            sample_empty: 6,
            bank_hover: 3,
            rec_sample_light: 10,
        }
    }
}

/// Complete tuning for a [`ControlEngine`](crate::engine::ControlEngine)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub pitch_pot: PotTuning,
    pub start_pot: PotTuning,
    pub length_pot: PotTuning,
    pub sample_pot: PotTuning,
    pub rec_sample_pot: PotTuning,

    pub pitch_cv: CvTuning,
    pub start_cv: CvTuning,
    pub length_cv: CvTuning,
    pub sample_cv: CvTuning,

    pub timing: TimingConfig,
    pub feedback: FeedbackDurations,

    /// Upper bound on the pitch multiplier handed to the resampler
    pub max_resample_rate: f32,
}

impl EngineConfig {
    /// Tuning for the fast (newer) ADC clocking
    pub fn fast_adc() -> Self {
        Self {
            pitch_cv: CvTuning {
                window: 80,
                bracket: 2,
            },
            start_cv: CvTuning {
                window: 20,
                bracket: 20,
            },
            length_cv: CvTuning {
                window: 20,
                bracket: 20,
            },
            sample_cv: CvTuning {
                window: 1,
                bracket: 20,
            },
            timing: TimingConfig {
                play_trig_delay: 520,
                play_trig_latch_pitch: 256,
                ..Self::shared_timing()
            },
            ..Self::shared()
        }
    }

    /// Tuning for the classic, slower ADC clocking
    pub fn classic_adc() -> Self {
        Self {
            pitch_cv: CvTuning {
                window: 40,
                bracket: 20,
            },
            start_cv: CvTuning {
                window: 20,
                bracket: 20,
            },
            length_cv: CvTuning {
                window: 20,
                bracket: 20,
            },
            sample_cv: CvTuning {
                window: 20,
                bracket: 20,
            },
            timing: TimingConfig {
                play_trig_delay: 1024,
                play_trig_latch_pitch: 768,
                ..Self::shared_timing()
            },
            ..Self::shared()
        }
    }

    fn shared_timing() -> TimingConfig {
        TimingConfig {
            play_trig_delay: 0,
            play_trig_latch_pitch: 0,
            pot_moving_ticks: 300,
            detent_guard: 40,
        }
    }

    fn shared() -> Self {
        let unused_cv = CvTuning {
            window: 1,
            bracket: 0,
        };
        Self {
            pitch_pot: PotTuning::settling(20.0, 12),
            start_pot: PotTuning::settling(50.0, 20),
            length_pot: PotTuning::settling(50.0, 20),
            sample_pot: PotTuning::settling(50.0, 60),
            rec_sample_pot: PotTuning::settling(50.0, 60),
            pitch_cv: unused_cv,
            start_cv: unused_cv,
            length_cv: unused_cv,
            sample_cv: unused_cv,
            timing: Self::shared_timing(),
            feedback: FeedbackDurations::default(),
            max_resample_rate: 20.0,
        }
    }

    /// Tuning for a pot
    pub fn pot(&self, pot: PotChannel) -> PotTuning {
        match pot {
            PotChannel::Pitch(_) => self.pitch_pot,
            PotChannel::Start(_) => self.start_pot,
            PotChannel::Length(_) => self.length_pot,
            PotChannel::Sample(_) => self.sample_pot,
            PotChannel::RecSample => self.rec_sample_pot,
        }
    }

    /// Tuning for a CV jack
    pub fn cv(&self, cv: CvChannel) -> CvTuning {
        match cv {
            CvChannel::Pitch(_) => self.pitch_cv,
            CvChannel::Start(_) => self.start_cv,
            CvChannel::Length(_) => self.length_cv,
            CvChannel::Sample(_) => self.sample_cv,
        }
    }

    /// Check every value the tick path relies on
    pub fn validate(&self) -> Result<(), ConfigError> {
        let pots = [
            ("pitch pot", self.pitch_pot),
            ("start pot", self.start_pot),
            ("length pot", self.length_pot),
            ("sample pot", self.sample_pot),
            ("rec sample pot", self.rec_sample_pot),
        ];
        for (input, tuning) in pots {
            if !(0.0..1.0).contains(&tuning.coef) {
                return Err(reject(ConfigError::Coefficient {
                    input,
                    coef: tuning.coef,
                }));
            }
            if tuning.bracket < 0 {
                return Err(reject(ConfigError::Bracket {
                    input,
                    width: tuning.bracket,
                }));
            }
        }

        let cvs = [
            ("pitch cv", self.pitch_cv),
            ("start cv", self.start_cv),
            ("length cv", self.length_cv),
            ("sample cv", self.sample_cv),
        ];
        for (input, tuning) in cvs {
            if tuning.window == 0 || tuning.window > MAX_FIR_WINDOW {
                return Err(reject(ConfigError::FirWindow {
                    input,
                    window: tuning.window,
                    max: MAX_FIR_WINDOW,
                }));
            }
            if tuning.bracket < 0 {
                return Err(reject(ConfigError::Bracket {
                    input,
                    width: tuning.bracket,
                }));
            }
        }

        if self.timing.play_trig_latch_pitch > self.timing.play_trig_delay {
            return Err(reject(ConfigError::LatchWindow {
                latch: self.timing.play_trig_latch_pitch,
                delay: self.timing.play_trig_delay,
            }));
        }

        if !(self.max_resample_rate.is_finite() && self.max_resample_rate > 0.0) {
            return Err(reject(ConfigError::NotPositive {
                what: "max resample rate",
                value: self.max_resample_rate,
            }));
        }

        Ok(())
    }

    /// Serialize to JSON string
    #[cfg(feature = "alloc")]
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize and validate from JSON string
    #[cfg(feature = "alloc")]
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::fast_adc()
    }
}

fn reject(err: ConfigError) -> ConfigError {
    log::warn!("rejecting engine configuration: {}", err);
    err
}

/// Values measured by the calibration routine
///
/// The engine only reads this record. Offsets are in ADC counts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SystemCalibrations {
    /// Added to each raw CV sample outside calibration mode
    pub cv_offset: [i32; 8],
    /// Shifts each pitch pot so its centre detent lands on unity
    pub pitch_pot_detent_offset: [i32; 2],
    /// Scales distance from 0V on each pitch jack
    pub tracking_comp: [f32; 2],
}

impl SystemCalibrations {
    /// Offset for `cv`, limited to one ADC span either way
    pub fn cv_offset(&self, cv: CvChannel) -> i32 {
        self.cv_offset[cv.index()].clamp(-ADC_MAX, ADC_MAX)
    }

    pub fn pitch_pot_detent_offset(&self, chan: PlayChannel) -> i32 {
        self.pitch_pot_detent_offset[chan.index()].clamp(-ADC_MAX, ADC_MAX)
    }

    pub fn tracking_comp(&self, chan: PlayChannel) -> f32 {
        self.tracking_comp[chan.index()]
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let offsets = self
            .cv_offset
            .iter()
            .map(|&offset| ("CV", offset))
            .chain(self.pitch_pot_detent_offset.iter().map(|&offset| ("pitch pot detent", offset)));
        for (what, offset) in offsets {
            if !(-ADC_MAX..=ADC_MAX).contains(&offset) {
                return Err(reject(ConfigError::Offset {
                    what,
                    offset,
                    max: ADC_MAX,
                }));
            }
        }

        for &comp in &self.tracking_comp {
            if !(comp.is_finite() && comp > 0.0) {
                return Err(reject(ConfigError::NotPositive {
                    what: "tracking compensation",
                    value: comp,
                }));
            }
        }
        Ok(())
    }

    /// Serialize to JSON string
    #[cfg(feature = "alloc")]
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize and validate from JSON string
    #[cfg(feature = "alloc")]
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let cal: Self = serde_json::from_str(json)?;
        cal.validate()?;
        Ok(cal)
    }
}

impl Default for SystemCalibrations {
    fn default() -> Self {
        Self {
            cv_offset: [0; 8],
            pitch_pot_detent_offset: [0; 2],
            tracking_comp: [1.0; 2],
        }
    }
}
