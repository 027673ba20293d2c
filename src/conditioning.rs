//! ADC Conditioning Pipeline
//!
//! Turns raw 12-bit pot and CV readings into values stable enough to drive
//! detents and playback parameters.
//!
//! - Pots use a one-pole lowpass and a movement tracker: a move larger than
//!   the bracket arms a countdown, and while it runs the bracketed value
//!   follows the smoothed value directly and the pot reports "changed".
//! - CV jacks use a moving-average FIR over a per-jack window, then a
//!   bracket that only moves when the smoothed value leaves the band and
//!   stops at the band edge. Pitch jacks collapse `2046..=2050` to 2048.

use crate::channel::{clamp_adc, CvArray, CvChannel, PotArray, PotChannel, ADC_CENTER};
use crate::config::{EngineConfig, SystemCalibrations};
use crate::keyed::Key;

/// Longest FIR window any CV jack may use
pub const MAX_FIR_WINDOW: usize = 80;

/// Half-width of the 0V dead zone on pitch jacks
const PITCH_DEAD_ZONE: i32 = 2;

/// Step `bracketed` toward `smoothed`, stopping `width` short of it
///
/// Returns the signed distance that caused the move, or `None` when
/// `smoothed` is still inside the band.
#[inline]
pub fn bracket(bracketed: &mut i32, smoothed: i32, width: i32) -> Option<i32> {
    let delta = smoothed - *bracketed;
    if delta > width {
        *bracketed = smoothed - width;
        Some(delta)
    } else if delta < -width {
        *bracketed = smoothed + width;
        Some(delta)
    } else {
        None
    }
}

/// One-pole lowpass: higher `coef` is slower
#[inline]
pub fn low_pass(previous: f32, input: f32, coef: f32) -> f32 {
    previous * coef + input * (1.0 - coef)
}

/// Conditioned state of one analog input
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AnalogState {
    /// Most recent raw reading (after calibration offset for CV jacks)
    pub raw: i32,
    /// Filter output
    pub smoothed: f32,
    /// `smoothed` truncated and clamped to the ADC range
    pub smoothed_int: i32,
    /// Anti-jitter output read by everything downstream
    pub bracketed: i32,
    /// Signed distance that last moved `bracketed`
    pub delta: i32,
}

/// Smoothing, movement tracking and bracketing for every pot
#[derive(Debug, Clone)]
pub struct PotConditioner {
    state: PotArray<AnalogState>,
    coef: PotArray<f32>,
    width: PotArray<i32>,
    moving: PotArray<u32>,
    changed: PotArray<bool>,
    moving_ticks: u32,
}

impl PotConditioner {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            state: PotArray::default(),
            coef: PotArray::from_fn(|pot| config.pot(pot).coef),
            width: PotArray::from_fn(|pot| config.pot(pot).bracket),
            moving: PotArray::splat(0),
            changed: PotArray::splat(false),
            moving_ticks: config.timing.pot_moving_ticks,
        }
    }

    /// Run one tick over every pot
    pub fn process(&mut self, raw: &PotArray<u16>) {
        for &pot in PotChannel::ALL {
            self.process_one(pot, raw[pot]);
        }
    }

    fn process_one(&mut self, pot: PotChannel, raw: u16) {
        let s = &mut self.state[pot];
        self.changed[pot] = false;

        s.raw = i32::from(raw);
        s.smoothed = low_pass(s.smoothed, f32::from(raw), self.coef[pot]);
        s.smoothed_int = clamp_adc(s.smoothed as i32);

        let delta = s.smoothed_int - s.bracketed;
        if delta.abs() > self.width[pot] {
            self.moving[pot] = self.moving_ticks;
        }

        if self.moving[pot] > 0 {
            self.moving[pot] -= 1;
            self.changed[pot] = true;
            s.delta = delta;
            s.bracketed = s.smoothed_int;
        }
    }

    pub fn state(&self, pot: PotChannel) -> &AnalogState {
        &self.state[pot]
    }

    pub fn bracketed(&self, pot: PotChannel) -> i32 {
        self.state[pot].bracketed
    }

    pub fn delta(&self, pot: PotChannel) -> i32 {
        self.state[pot].delta
    }

    /// Whether the pot is tracking a move this tick
    pub fn changed(&self, pot: PotChannel) -> bool {
        self.changed[pot]
    }

    /// Mark this tick's change as handled
    pub fn consume_change(&mut self, pot: PotChannel) {
        self.changed[pot] = false;
    }
}

/// Fixed-capacity moving average over the most recent `len` samples
#[derive(Debug, Clone, Copy)]
pub struct FirWindow {
    history: [i32; MAX_FIR_WINDOW],
    len: usize,
    pos: usize,
    sum: i32,
}

impl FirWindow {
    /// A window of `len` samples, all preset to `fill`
    ///
    /// `len` is clamped to `1..=MAX_FIR_WINDOW`.
    pub fn new(len: usize, fill: i32) -> Self {
        let len = len.clamp(1, MAX_FIR_WINDOW);
        Self {
            history: [fill; MAX_FIR_WINDOW],
            len,
            pos: 0,
            sum: fill * len as i32,
        }
    }

    /// Number of samples averaged
    pub fn window(&self) -> usize {
        self.len
    }

    /// Replace the oldest sample with `sample` and return the new mean
    #[inline]
    pub fn push(&mut self, sample: i32) -> f32 {
        let oldest = self.history[self.pos];
        self.history[self.pos] = sample;
        self.pos += 1;
        if self.pos >= self.len {
            self.pos = 0;
        }
        self.sum += sample - oldest;
        self.mean()
    }

    pub fn mean(&self) -> f32 {
        self.sum as f32 / self.len as f32
    }
}

/// FIR smoothing and bracketing for every CV jack
#[derive(Debug, Clone)]
pub struct CvConditioner {
    state: CvArray<AnalogState>,
    fir: CvArray<FirWindow>,
    width: CvArray<i32>,
}

impl CvConditioner {
    pub fn new(config: &EngineConfig) -> Self {
        let fir = CvArray::from_fn(|cv| FirWindow::new(config.cv(cv).window, rest_value(cv)));
        let state = CvArray::from_fn(|cv| {
            let rest = rest_value(cv);
            AnalogState {
                raw: rest,
                smoothed: rest as f32,
                smoothed_int: rest,
                bracketed: rest,
                delta: 0,
            }
        });
        Self {
            state,
            fir,
            width: CvArray::from_fn(|cv| config.cv(cv).bracket),
        }
    }

    /// Run one tick over every CV jack
    ///
    /// The calibration offset is skipped while `calibrating`, since the
    /// calibration routine is measuring the uncorrected input.
    pub fn process(&mut self, raw: &CvArray<u16>, cal: &SystemCalibrations, calibrating: bool) {
        for &cv in CvChannel::ALL {
            let offset = if calibrating { 0 } else { cal.cv_offset(cv) };
            self.process_one(cv, i32::from(raw[cv]) + offset);
        }
    }

    fn process_one(&mut self, cv: CvChannel, sample: i32) {
        let s = &mut self.state[cv];
        s.raw = sample;
        s.smoothed = self.fir[cv].push(sample);
        s.smoothed_int = clamp_adc(s.smoothed as i32);

        if let Some(delta) = bracket(&mut s.bracketed, s.smoothed_int, self.width[cv]) {
            s.delta = delta;
        }

        if cv.is_pitch() && (s.bracketed - ADC_CENTER).abs() <= PITCH_DEAD_ZONE {
            s.bracketed = ADC_CENTER;
        }
    }

    pub fn state(&self, cv: CvChannel) -> &AnalogState {
        &self.state[cv]
    }

    pub fn bracketed(&self, cv: CvChannel) -> i32 {
        self.state[cv].bracketed
    }
}

/// Value a jack reads with nothing patched
fn rest_value(cv: CvChannel) -> i32 {
    if cv.is_pitch() {
        ADC_CENTER
    } else {
        0
    }
}
