//! Pitch Quantizer and Tracking Compensation
//!
//! The pitch jacks follow 1V/octave through an inverting input stage, so a
//! *lower* ADC reading means a *higher* pitch. 2048 is 0V and one octave
//! spans 408 counts (12 semitones of 34 counts).
//!
//! A channel's pitch multiplier is the pitch pot's curve times a CV factor
//! that is either snapped to semitones or tracking-compensated and read from
//! a continuous table, clamped to the resampler's maximum rate.

use crate::channel::{clamp_adc, ADC_CENTER, ADC_MAX};
use libm::powf;

/// ADC counts per semitone on a pitch jack
pub const SEMITONE_ADC_WIDTH: f32 = 34.0;

/// ADC counts per octave on a pitch jack
pub const OCTAVE_ADC_WIDTH: f32 = SEMITONE_ADC_WIDTH * 12.0;

const TWELFTH_ROOT_TWO: f32 = 1.059_463_1;

/// Octaves reachable above and below 0V
const OCTAVE_SPAN: i32 = 5;

/// Half-width of the pitch pot's centre detent, where the curve is exactly 1
pub const PITCH_POT_DETENT: i32 = 48;

/// Octaves the pitch pot reaches at either end of its travel
const PITCH_POT_OCTAVES: f32 = 2.0;

const TABLE_SIZE: usize = 4096;

/// Multiplier for a pitch reading snapped to the nearest semitone
///
/// 2048 returns exactly 1.0. Octaves from -5 to +5 are found by scanning
/// down from the +5 octave root, then the semitone within the octave by
/// scanning at most 12 steps below that root.
pub fn quantized_semitone_voct(adc: i32) -> f32 {
    if adc == ADC_CENTER {
        return 1.0;
    }

    let mut octave_mult = 32.0_f32;
    let mut root_adc = ADC_CENTER;
    for oct in (-OCTAVE_SPAN..=OCTAVE_SPAN).rev() {
        root_adc = ADC_CENTER - (OCTAVE_ADC_WIDTH * oct as f32) as i32;
        if adc <= root_adc {
            break;
        }
        octave_mult /= 2.0;
    }

    let root_midpoint = (root_adc as f32 - SEMITONE_ADC_WIDTH / 2.0) as i32;
    let mut semitone_mult = 1.0_f32;
    for semitone in 0..12 {
        if adc > root_midpoint - (SEMITONE_ADC_WIDTH * semitone as f32) as i32 {
            break;
        }
        semitone_mult *= TWELFTH_ROOT_TWO;
    }

    octave_mult * semitone_mult
}

/// Scale a pitch reading's distance from 0V by `cal`
///
/// The scaled distance is rounded half-up and the result clamped to the ADC
/// range. 2048 maps to itself for any `cal`.
pub fn apply_tracking_compensation(adc: i32, cal: f32) -> i32 {
    let above = adc > ADC_CENTER;
    let distance = (adc - ADC_CENTER).abs();

    let scaled = distance as f32 * cal;
    let mut rounded = scaled as i32;
    if scaled - rounded as f32 >= 0.5 {
        rounded += 1;
    }

    let compensated = if above {
        ADC_CENTER + rounded
    } else {
        ADC_CENTER - rounded
    };
    clamp_adc(compensated)
}

/// Precomputed curves indexed by ADC count
#[derive(Clone)]
pub struct PitchTables {
    voltoct: [f32; TABLE_SIZE],
    pitch_pot: [f32; TABLE_SIZE],
}

impl PitchTables {
    pub fn new() -> Self {
        let mut voltoct = [0.0; TABLE_SIZE];
        let mut pitch_pot = [0.0; TABLE_SIZE];

        for (adc, (v, p)) in voltoct.iter_mut().zip(pitch_pot.iter_mut()).enumerate() {
            let adc = adc as i32;
            *v = powf(2.0, (ADC_CENTER - adc) as f32 / OCTAVE_ADC_WIDTH);
            *p = pitch_pot_curve(adc);
        }

        Self { voltoct, pitch_pot }
    }

    /// Continuous 1V/oct multiplier for a (compensated) pitch reading
    #[inline]
    pub fn voltoct(&self, adc: i32) -> f32 {
        self.voltoct[clamp_adc(adc) as usize]
    }

    /// Multiplier for a pitch pot position
    #[inline]
    pub fn pitch_pot(&self, adc: i32) -> f32 {
        self.pitch_pot[clamp_adc(adc) as usize]
    }
}

impl Default for PitchTables {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for PitchTables {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PitchTables")
            .field("entries", &TABLE_SIZE)
            .finish()
    }
}

/// Exponential pot curve with a flat unity detent in the middle
fn pitch_pot_curve(adc: i32) -> f32 {
    let low_edge = ADC_CENTER - PITCH_POT_DETENT;
    let high_edge = ADC_CENTER + PITCH_POT_DETENT;

    let octaves = if adc < low_edge {
        -PITCH_POT_OCTAVES * (low_edge - adc) as f32 / low_edge as f32
    } else if adc > high_edge {
        PITCH_POT_OCTAVES * (adc - high_edge) as f32 / (ADC_MAX - high_edge) as f32
    } else {
        return 1.0;
    };
    powf(2.0, octaves)
}

/// Inputs to one channel's pitch computation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchInput {
    /// Bracketed pitch pot plus its detent calibration offset
    pub pot: i32,
    /// Bracketed (or latched) pitch CV
    pub cv: i32,
    /// Snap the CV to semitones
    pub quantize: bool,
    /// Tracking compensation factor for this jack. Scales the ADC distance
    /// from centre in continuous mode and the snapped multiplier when
    /// quantizing.
    pub tracking: f32,
}

/// Final pitch multiplier for one channel
pub fn pitch_multiplier(tables: &PitchTables, input: PitchInput, max_rate: f32) -> f32 {
    let pot = tables.pitch_pot(input.pot);
    let cv = if input.quantize {
        quantized_semitone_voct(input.cv) * input.tracking
    } else {
        tables.voltoct(apply_tracking_compensation(input.cv, input.tracking))
    };
    (pot * cv).min(max_rate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const OCTAVE: i32 = 408;

    #[test]
    fn test_quantized_centre_is_unity() {
        assert_eq!(quantized_semitone_voct(2048), 1.0);
    }

    #[test]
    fn test_quantized_octaves() {
        assert_relative_eq!(quantized_semitone_voct(2048 - OCTAVE), 2.0, epsilon = 1e-3);
        assert_relative_eq!(quantized_semitone_voct(2048 - 2 * OCTAVE), 4.0, epsilon = 1e-3);
        assert_relative_eq!(quantized_semitone_voct(2048 + OCTAVE), 0.5, epsilon = 1e-3);
        assert_relative_eq!(quantized_semitone_voct(2048 - 5 * OCTAVE), 32.0, epsilon = 1e-3);
    }

    #[test]
    fn test_quantized_semitone_steps() {
        // Within half a semitone of the root snaps to the root
        assert_eq!(quantized_semitone_voct(2047), 1.0);
        assert_eq!(quantized_semitone_voct(2048 - 16), 1.0);
        // One semitone below the root reading is one semitone up in pitch
        assert_relative_eq!(quantized_semitone_voct(2048 - 34), TWELFTH_ROOT_TWO, epsilon = 1e-4);
        assert_relative_eq!(
            quantized_semitone_voct(2048 - 7 * 34),
            powf(2.0, 7.0 / 12.0),
            epsilon = 1e-3
        );
    }

    #[test]
    fn test_quantized_is_monotonic() {
        let mut previous = quantized_semitone_voct(0);
        for adc in 1..=4095 {
            let mult = quantized_semitone_voct(adc);
            // Twelve semitone steps land a hair above the next octave root
            assert!(mult <= previous * (1.0 + 1e-5), "adc {} rose to {}", adc, mult);
            previous = mult;
        }
    }

    #[test]
    fn test_tracking_centre_is_fixed_point() {
        for cal in [0.5, 0.98, 1.0, 1.02, 2.0] {
            assert_eq!(apply_tracking_compensation(2048, cal), 2048);
        }
    }

    #[test]
    fn test_tracking_scales_distance() {
        assert_eq!(apply_tracking_compensation(2148, 1.0), 2148);
        assert_eq!(apply_tracking_compensation(2148, 1.1), 2158);
        assert_eq!(apply_tracking_compensation(1948, 1.1), 1938);
        // 2 * 1.25 = 2.5 rounds up, away from centre on both sides
        assert_eq!(apply_tracking_compensation(2050, 1.25), 2051);
        assert_eq!(apply_tracking_compensation(2046, 1.25), 2045);
    }

    #[test]
    fn test_tracking_clamps() {
        assert_eq!(apply_tracking_compensation(4095, 2.0), 4095);
        assert_eq!(apply_tracking_compensation(0, 2.0), 0);
    }

    #[test]
    fn test_voltoct_table() {
        let tables = PitchTables::new();
        assert_eq!(tables.voltoct(2048), 1.0);
        assert_relative_eq!(tables.voltoct(2048 - OCTAVE), 2.0, epsilon = 1e-4);
        assert_relative_eq!(tables.voltoct(2048 + OCTAVE), 0.5, epsilon = 1e-4);
    }

    #[test]
    fn test_pitch_pot_curve() {
        let tables = PitchTables::new();
        assert_eq!(tables.pitch_pot(2048), 1.0);
        assert_eq!(tables.pitch_pot(2048 - PITCH_POT_DETENT), 1.0);
        assert_eq!(tables.pitch_pot(2048 + PITCH_POT_DETENT), 1.0);
        assert_relative_eq!(tables.pitch_pot(0), 0.25, epsilon = 1e-4);
        assert_relative_eq!(tables.pitch_pot(4095), 4.0, epsilon = 1e-4);
        assert!(tables.pitch_pot(1000) < 1.0);
        assert!(tables.pitch_pot(3000) > 1.0);
    }

    #[test]
    fn test_multiplier_clamped() {
        let tables = PitchTables::new();
        let input = PitchInput {
            pot: 4095,
            cv: 0,
            quantize: false,
            tracking: 1.0,
        };
        assert_eq!(pitch_multiplier(&tables, input, 20.0), 20.0);
        assert_eq!(pitch_multiplier(&tables, PitchInput { quantize: true, ..input }, 20.0), 20.0);
    }

    #[test]
    fn test_multiplier_modes_agree_on_semitones() {
        let tables = PitchTables::new();
        let input = PitchInput {
            pot: 2048,
            cv: 2048 - 3 * 34,
            quantize: false,
            tracking: 1.0,
        };
        let continuous = pitch_multiplier(&tables, input, 20.0);
        let quantized = pitch_multiplier(&tables, PitchInput { quantize: true, ..input }, 20.0);
        assert_relative_eq!(continuous, quantized, epsilon = 1e-3);
    }

    #[test]
    fn test_quantized_multiplier_applies_tracking() {
        let tables = PitchTables::new();
        let input = PitchInput {
            pot: 2048,
            cv: 2048 - OCTAVE,
            quantize: true,
            tracking: 1.05,
        };
        assert_relative_eq!(pitch_multiplier(&tables, input, 20.0), 2.1, epsilon = 1e-3);
        let unity = PitchInput { tracking: 1.0, ..input };
        assert_relative_eq!(pitch_multiplier(&tables, unity, 20.0), 2.0, epsilon = 1e-3);
    }
}
