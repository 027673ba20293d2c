//! Detent Quantizer
//!
//! Maps a bracketed pot reading onto one of ten knob positions. The
//! thresholds are uneven because they follow the physical click-stops.

/// Number of detent positions
pub const NUM_DETENTS: u8 = 10;

/// Counts a reading must pass a boundary by before the detent changes
pub const DETENT_GUARD: i32 = 40;

/// Highest reading belonging to each detent, except the last
const DETENT_TOPS: [i32; 9] = [212, 625, 1131, 1562, 1995, 2475, 2825, 3355, 3840];

/// Detent position for a reading
///
/// Readings below zero count as detent 0 and readings above the range as 9.
pub fn detent(adc: i32) -> u8 {
    DETENT_TOPS
        .iter()
        .position(|&top| adc <= top)
        .unwrap_or(DETENT_TOPS.len()) as u8
}

/// Detent position that resists chatter at a boundary
///
/// A new position is only accepted once `adc` is at least `guard` counts
/// inside it; otherwise `current` is kept.
pub fn detent_antihys_with_guard(adc: i32, current: u8, guard: i32) -> u8 {
    let raw = detent(adc);
    let confirmed = if raw > current {
        detent(adc - guard) == raw
    } else if raw < current {
        detent(adc + guard) == raw
    } else {
        false
    };

    if confirmed {
        raw
    } else {
        current
    }
}

/// [`detent_antihys_with_guard`] with the standard guard of 40 counts
pub fn detent_antihys(adc: i32, current: u8) -> u8 {
    detent_antihys_with_guard(adc, current, DETENT_GUARD)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_detent_boundaries() {
        assert_eq!(detent(0), 0);
        assert_eq!(detent(212), 0);
        assert_eq!(detent(213), 1);
        assert_eq!(detent(1562), 3);
        assert_eq!(detent(1563), 4);
        assert_eq!(detent(3840), 8);
        assert_eq!(detent(3841), 9);
        assert_eq!(detent(4095), 9);
    }

    #[test]
    fn test_detent_out_of_range() {
        assert_eq!(detent(-40), 0);
        assert_eq!(detent(8190), 9);
    }

    #[test]
    fn test_antihys_holds_at_boundary() {
        // Sitting exactly on the 3/4 boundary keeps detent 3
        assert_eq!(detent_antihys(1562, 3), 3);
        // Just past it, but not by the guard
        assert_eq!(detent_antihys(1563, 3), 3);
        assert_eq!(detent_antihys(1602, 3), 3);
        // Guard satisfied
        assert_eq!(detent_antihys(1603, 3), 4);
    }

    #[test]
    fn test_antihys_decrease() {
        assert_eq!(detent_antihys(1562, 4), 4);
        assert_eq!(detent_antihys(1523, 4), 4);
        assert_eq!(detent_antihys(1522, 4), 3);
    }

    #[test]
    fn test_antihys_jumps_several_detents() {
        assert_eq!(detent_antihys(4095, 0), 9);
        assert_eq!(detent_antihys(0, 9), 0);
    }

    #[test]
    fn test_antihys_custom_guard() {
        assert_eq!(detent_antihys_with_guard(1573, 3, 10), 4);
        assert_eq!(detent_antihys_with_guard(1572, 3, 10), 3);
    }

    proptest! {
        #[test]
        fn prop_antihys_in_range(adc in -100i32..5000, current in 0u8..NUM_DETENTS) {
            prop_assert!(detent_antihys(adc, current) < NUM_DETENTS);
        }

        #[test]
        fn prop_antihys_change_is_deep(adc in 0i32..=4095, current in 0u8..NUM_DETENTS) {
            let next = detent_antihys(adc, current);
            if next > current {
                prop_assert_eq!(detent(adc - DETENT_GUARD), next);
            } else if next < current {
                prop_assert_eq!(detent(adc + DETENT_GUARD), next);
            }
        }

        #[test]
        fn prop_antihys_ignores_shallow_crossing(edge in 0usize..9, past in 1i32..DETENT_GUARD) {
            let top = DETENT_TOPS[edge];
            let below = edge as u8;
            prop_assert_eq!(detent_antihys(top + past, below), below);
            prop_assert_eq!(detent_antihys(top + 1 - past, below + 1), below + 1);
        }
    }
}
